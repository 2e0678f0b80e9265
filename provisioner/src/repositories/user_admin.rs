//! User-management operations on the administrative connection.
//!
//! `UserAdmin` is the seam between the provisioner and the server; it can be
//! mocked using mockall for testing purposes.

use async_trait::async_trait;
use mongodb::{
    bson::{self, doc},
    Client,
};
use serde::Deserialize;

use crate::db::connection;
use crate::error::ProvisionError;
use crate::models::account::{AccountDescriptor, GrantedRole};

/// Administrative operations the provisioner needs from the server.
///
/// Use `MockUserAdmin` in tests to mock the behavior.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserAdmin: Send + Sync {
    /// Checks that the server answers on this connection.
    async fn ping(&self) -> Result<(), ProvisionError>;

    /// Runs `createUser` for `account` on its own database.
    async fn create_user(&self, account: &AccountDescriptor) -> Result<(), ProvisionError>;

    /// Looks up the roles granted to `username` on `database`.
    /// Returns `None` when no such user exists.
    async fn user_roles(
        &self,
        database: &str,
        username: &str,
    ) -> Result<Option<Vec<GrantedRole>>, ProvisionError>;
}

/// `UserAdmin` backed by a live MongoDB client.
#[derive(Clone)]
pub struct MongoUserAdmin {
    client: Client,
}

#[derive(Debug, Deserialize)]
struct UsersInfoReply {
    users: Vec<UserInfo>,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    user: String,
    #[serde(default)]
    roles: Vec<GrantedRole>,
}

impl MongoUserAdmin {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl UserAdmin for MongoUserAdmin {
    async fn ping(&self) -> Result<(), ProvisionError> {
        connection::ping(&self.client).await
    }

    async fn create_user(&self, account: &AccountDescriptor) -> Result<(), ProvisionError> {
        self.client
            .database(&account.database_name)
            .run_command(account.create_user_command())
            .await
            .map_err(|err| {
                ProvisionError::from_create_user(err, &account.username, &account.database_name)
            })?;
        Ok(())
    }

    async fn user_roles(
        &self,
        database: &str,
        username: &str,
    ) -> Result<Option<Vec<GrantedRole>>, ProvisionError> {
        let reply = self
            .client
            .database(database)
            .run_command(doc! { "usersInfo": { "user": username, "db": database } })
            .await
            .map_err(ProvisionError::from_driver)?;

        let reply: UsersInfoReply = bson::from_document(reply)
            .map_err(|err| ProvisionError::Database(err.into()))?;

        Ok(reply
            .users
            .into_iter()
            .find(|info| info.user == username)
            .map(|info| info.roles))
    }
}
