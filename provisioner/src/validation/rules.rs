//! Rules for the fields of an account descriptor.

use validator::ValidationError;

/// Characters MongoDB forbids in database names on every platform.
const FORBIDDEN_DB_NAME_CHARS: &[char] = &['/', '\\', '.', ' ', '"', '$', '*', '<', '>', ':', '|', '?'];

/// Longest database name the server accepts, in bytes.
pub const MAX_DB_NAME_BYTES: usize = 63;

/// Rejects empty and whitespace-only values.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Rejects only the empty string; whitespace is a legal password.
pub fn validate_not_empty(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new("empty"));
    }
    Ok(())
}

/// Validates a MongoDB database name.
///
/// Requirements:
/// - Not blank
/// - At most 63 bytes
/// - None of `/ \ . " $ * < > : | ?`, space or NUL
pub fn validate_database_name(name: &str) -> Result<(), ValidationError> {
    validate_not_blank(name)?;

    if name.len() > MAX_DB_NAME_BYTES {
        return Err(ValidationError::new("database_name_too_long"));
    }

    if name
        .chars()
        .any(|c| c == '\0' || FORBIDDEN_DB_NAME_CHARS.contains(&c))
    {
        return Err(ValidationError::new("database_name_invalid_characters"));
    }

    Ok(())
}
