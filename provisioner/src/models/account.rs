//! The service account that a provisioning run creates.

use std::fmt;

use mongodb::bson::{doc, Document};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::secrets::mask_secret;
use crate::validation::rules;

/// The only role ever granted to a provisioned account.
pub const READ_WRITE_ROLE: &str = "readWrite";

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
/// Credentials and scope of the account to create.
pub struct AccountDescriptor {
    /// Database the account is created in and scoped to.
    #[validate(custom(function = "rules::validate_database_name"))]
    pub database_name: String,
    /// Login name of the account.
    #[validate(custom(function = "rules::validate_not_blank"))]
    pub username: String,
    /// Plain-text password handed to the server.
    #[validate(custom(function = "rules::validate_not_empty"))]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A role grant as reported by `usersInfo`.
pub struct GrantedRole {
    pub role: String,
    pub db: String,
}

impl fmt::Display for GrantedRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.role, self.db)
    }
}

impl AccountDescriptor {
    pub fn new(
        database_name: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            database_name: database_name.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Roles the account must end up with: `readWrite` on its own database.
    pub fn expected_roles(&self) -> Vec<GrantedRole> {
        vec![GrantedRole {
            role: READ_WRITE_ROLE.to_string(),
            db: self.database_name.clone(),
        }]
    }

    /// Builds the `createUser` command for this account.
    pub fn create_user_command(&self) -> Document {
        doc! {
            "createUser": self.username.as_str(),
            "pwd": self.password.as_str(),
            "roles": [
                { "role": READ_WRITE_ROLE, "db": self.database_name.as_str() },
            ],
        }
    }
}

impl fmt::Debug for AccountDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountDescriptor")
            .field("database_name", &self.database_name)
            .field("username", &self.username)
            .field("password", &mask_secret(&self.password))
            .finish()
    }
}
