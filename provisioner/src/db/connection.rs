use mongodb::{bson::doc, options::ClientOptions, Client};
use std::time::Duration;

use crate::config::{redact_uri_credentials, Config};
use crate::error::ProvisionError;

const APP_NAME: &str = "provision_bot_user";

/// Opens the administrative client described by `config`.
///
/// The driver connects lazily, so this only fails on a malformed URI; use
/// [`ping`] to find out whether the server is actually there.
pub async fn create_client(config: &Config) -> Result<Client, ProvisionError> {
    let mut options = ClientOptions::parse(config.admin_uri.as_str())
        .await
        .map_err(|err| ProvisionError::InvalidConfig {
            name: crate::config::ADMIN_URI_VAR,
            reason: err.to_string(),
        })?;
    options.app_name = Some(APP_NAME.to_string());
    options.server_selection_timeout =
        Some(Duration::from_secs(config.server_selection_timeout_secs));

    let client = Client::with_options(options).map_err(ProvisionError::from_driver)?;
    tracing::debug!(
        admin_uri = %redact_uri_credentials(&config.admin_uri),
        "MongoDB client created"
    );
    Ok(client)
}

/// Round-trips a `ping` through the `admin` database.
pub async fn ping(client: &Client) -> Result<(), ProvisionError> {
    client
        .database("admin")
        .run_command(doc! { "ping": 1 })
        .await
        .map_err(ProvisionError::from_driver)?;
    Ok(())
}
