//! Creates the bot account and confirms what the server granted it.

use validator::Validate;

use crate::error::ProvisionError;
use crate::models::account::{AccountDescriptor, GrantedRole};
use crate::repositories::UserAdmin;

/// Creates `account` with `readWrite` on its own database.
///
/// The descriptor is validated before anything is sent to the server. An
/// existing account is an error; nothing is retried or updated in place.
pub async fn provision_account<A>(
    admin: &A,
    account: &AccountDescriptor,
) -> Result<(), ProvisionError>
where
    A: UserAdmin + ?Sized,
{
    account.validate()?;

    admin.ping().await?;
    tracing::debug!("Administrative connection answered ping");

    admin.create_user(account).await?;
    tracing::info!(
        username = %account.username,
        database = %account.database_name,
        "Created service account"
    );
    Ok(())
}

/// Checks that `account` exists with exactly its expected role grant and
/// returns the roles the server reported.
pub async fn confirm_account<A>(
    admin: &A,
    account: &AccountDescriptor,
) -> Result<Vec<GrantedRole>, ProvisionError>
where
    A: UserAdmin + ?Sized,
{
    let roles = admin
        .user_roles(&account.database_name, &account.username)
        .await?
        .ok_or_else(|| ProvisionError::AccountMissing(account.username.clone()))?;

    let expected = account.expected_roles();
    if roles != expected {
        return Err(ProvisionError::RoleMismatch {
            username: account.username.clone(),
            expected: join_roles(&expected),
            actual: join_roles(&roles),
        });
    }

    Ok(roles)
}

/// Provisions `account` and then confirms its role grant.
///
/// Once `createUser` has succeeded the account exists, so a failed
/// `usersInfo` read only logs a warning. A role mismatch is still fatal.
pub async fn run_provisioning<A>(
    admin: &A,
    account: &AccountDescriptor,
) -> Result<(), ProvisionError>
where
    A: UserAdmin + ?Sized,
{
    provision_account(admin, account).await?;

    match confirm_account(admin, account).await {
        Ok(roles) => {
            tracing::info!(
                username = %account.username,
                roles = %join_roles(&roles),
                "Service account confirmed"
            );
            Ok(())
        }
        Err(err @ ProvisionError::RoleMismatch { .. }) => Err(err),
        Err(err) => {
            tracing::warn!(
                username = %account.username,
                error = %err,
                "Service account created but its roles could not be read back"
            );
            Ok(())
        }
    }
}

fn join_roles(roles: &[GrantedRole]) -> String {
    roles
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
