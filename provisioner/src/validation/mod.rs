//! Validation rules applied to the account descriptor before it reaches the
//! database server.

pub mod rules;

pub use validator::Validate;
