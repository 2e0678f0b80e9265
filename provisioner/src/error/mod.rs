use mongodb::error::{Error as MongoError, ErrorKind};
use thiserror::Error;

/// Server error code returned by `createUser` when the account already exists.
pub const CODE_USER_EXISTS: i32 = 51003;
/// Server error code for an operation the session is not allowed to perform.
pub const CODE_UNAUTHORIZED: i32 = 13;
/// Server error code for rejected administrative credentials.
pub const CODE_AUTHENTICATION_FAILED: i32 = 18;

/// Every way a provisioning run can fail. All of them are fatal to the process.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("missing required configuration value {0}")]
    MissingConfig(&'static str),

    #[error("invalid configuration value {name}: {reason}")]
    InvalidConfig { name: &'static str, reason: String },

    #[error("account descriptor failed validation: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("user {username} already exists on database {database}")]
    AccountExists { username: String, database: String },

    #[error("administrative connection is not authorized: {0}")]
    Unauthorized(String),

    #[error("database server is unreachable: {0}")]
    Unreachable(String),

    #[error("user {username} has roles [{actual}], expected [{expected}]")]
    RoleMismatch {
        username: String,
        expected: String,
        actual: String,
    },

    #[error("user {0} was not found after provisioning")]
    AccountMissing(String),

    #[error(transparent)]
    Database(#[from] MongoError),
}

impl ProvisionError {
    /// Maps a driver error raised while creating `username` on `database`
    /// onto the provisioning taxonomy.
    pub fn from_create_user(err: MongoError, username: &str, database: &str) -> Self {
        if let ErrorKind::Command(command) = err.kind.as_ref() {
            if command.code == CODE_USER_EXISTS {
                return ProvisionError::AccountExists {
                    username: username.to_string(),
                    database: database.to_string(),
                };
            }
        }
        Self::from_driver(err)
    }

    /// Maps a driver error from any administrative command.
    pub fn from_driver(err: MongoError) -> Self {
        match err.kind.as_ref() {
            ErrorKind::Command(command) => classify_command_failure(command.code, &command.message)
                .unwrap_or(ProvisionError::Database(err)),
            ErrorKind::Authentication { message, .. } => {
                ProvisionError::Unauthorized(message.clone())
            }
            ErrorKind::ServerSelection { message, .. } => {
                ProvisionError::Unreachable(message.clone())
            }
            ErrorKind::Io(io) => ProvisionError::Unreachable(io.to_string()),
            _ => ProvisionError::Database(err),
        }
    }
}

/// Classifies a server command failure by its numeric code. Returns `None`
/// for codes that have no dedicated variant.
pub fn classify_command_failure(code: i32, message: &str) -> Option<ProvisionError> {
    match code {
        CODE_UNAUTHORIZED | CODE_AUTHENTICATION_FAILED => {
            Some(ProvisionError::Unauthorized(message.to_string()))
        }
        _ => None,
    }
}

impl From<validator::ValidationErrors> for ProvisionError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    let code = e.code.as_ref();
                    format!("{}: {}", field, code)
                })
            })
            .collect();
        messages.sort();
        ProvisionError::Validation(messages)
    }
}
