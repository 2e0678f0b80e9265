use mongo_provisioner::{
    config::{redact_uri_credentials, Config},
    db::connection::create_client,
    repositories::MongoUserAdmin,
    services::provisioner::run_provisioning,
    utils::secrets::mask_secret,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mongo_provisioner=info,provision_bot_user=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(err) = run().await {
        tracing::error!(error = %err, "Provisioning failed");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    tracing::info!(
        admin_uri = %redact_uri_credentials(&config.admin_uri),
        database = %config.account.database_name,
        username = %config.account.username,
        password = %mask_secret(&config.account.password),
        server_selection_timeout_secs = config.server_selection_timeout_secs,
        "Loaded configuration from environment/.env"
    );

    let client = create_client(&config).await?;
    let admin = MongoUserAdmin::new(client);

    run_provisioning(&admin, &config.account).await?;

    Ok(())
}
