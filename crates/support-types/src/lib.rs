//! Shared domain records for the support service.
//!
//! These types sit between the request-parsing layer and the database layer:
//! [`NewUser`] is the validated signup input handed to the registration
//! transaction, [`User`] is a persisted row read back from the store.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum username length accepted by the `users` table.
pub const MAX_USERNAME_LEN: usize = 50;

/// Maximum stored password length accepted by the `users` table.
pub const MAX_PASSWORD_LEN: usize = 255;

/// Maximum display name length accepted by the `users` table.
pub const MAX_NAME_LEN: usize = 100;

/// Errors raised while building a [`NewUser`] from raw input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// A required field was empty or whitespace only.
    #[error("{0} is required")]
    Missing(&'static str),

    /// A field exceeded the column width of the `users` table.
    #[error("{field} must be at most {max} characters")]
    TooLong {
        /// The offending field name.
        field: &'static str,
        /// The maximum permitted length in characters.
        max: usize,
    },
}

/// A user registration request with all three required fields present.
///
/// Construct through [`NewUser::new`], which rejects blank values. Every
/// field is stored exactly as given; whitespace only matters for deciding
/// whether a field is blank.
#[derive(Clone, PartialEq, Eq)]
pub struct NewUser {
    username: String,
    password: String,
    name: String,
}

impl NewUser {
    /// Validates and builds a registration record.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Missing`] for an empty or whitespace-only field
    /// and [`InputError::TooLong`] when a field exceeds its column width.
    pub fn new(username: &str, password: &str, name: &str) -> Result<Self, InputError> {
        if username.trim().is_empty() {
            return Err(InputError::Missing("username"));
        }
        if password.is_empty() {
            return Err(InputError::Missing("password"));
        }
        if name.trim().is_empty() {
            return Err(InputError::Missing("name"));
        }

        check_len("username", username, MAX_USERNAME_LEN)?;
        check_len("password", password, MAX_PASSWORD_LEN)?;
        check_len("name", name, MAX_NAME_LEN)?;

        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
            name: name.to_string(),
        })
    }

    /// The unique login name.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The password, stored as given.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// The display name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

// Keep the password out of logs.
impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .finish()
    }
}

fn check_len(field: &'static str, value: &str, max: usize) -> Result<(), InputError> {
    if value.chars().count() > max {
        return Err(InputError::TooLong { field, max });
    }
    Ok(())
}

/// A row of the `users` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Store-assigned identity.
    pub id: i64,
    /// Unique login name.
    pub username: String,
    /// Display name, if one was recorded.
    pub name: Option<String>,
    /// Store-assigned creation timestamp (`YYYY-MM-DD HH:MM:SS`, UTC).
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_keeps_values_as_given() {
        let user = NewUser::new("  alice ", "pw123", " Alice A ").unwrap();
        assert_eq!(user.username(), "  alice ");
        assert_eq!(user.name(), " Alice A ");
        assert_eq!(user.password(), "pw123");
    }

    #[test]
    fn whitespace_only_username_is_rejected() {
        assert_eq!(
            NewUser::new(" \t ", "pw", "Name").unwrap_err(),
            InputError::Missing("username")
        );
    }

    #[test]
    fn password_is_kept_verbatim() {
        let user = NewUser::new("bob", "  spaced  ", "Bob").unwrap();
        assert_eq!(user.password(), "  spaced  ");
    }

    #[test]
    fn empty_fields_are_rejected() {
        assert_eq!(
            NewUser::new("", "pw", "Name").unwrap_err(),
            InputError::Missing("username")
        );
        assert_eq!(
            NewUser::new("alice", "", "Name").unwrap_err(),
            InputError::Missing("password")
        );
        assert_eq!(
            NewUser::new("alice", "pw", "   ").unwrap_err(),
            InputError::Missing("name")
        );
    }

    #[test]
    fn overlong_username_is_rejected() {
        let long = "a".repeat(MAX_USERNAME_LEN + 1);
        let err = NewUser::new(&long, "pw", "Name").unwrap_err();
        assert_eq!(
            err,
            InputError::TooLong {
                field: "username",
                max: MAX_USERNAME_LEN
            }
        );
        assert_eq!(err.to_string(), "username must be at most 50 characters");
    }

    #[test]
    fn debug_output_redacts_password() {
        let user = NewUser::new("alice", "hunter2", "Alice").unwrap();
        let rendered = format!("{user:?}");
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn user_serializes_with_snake_case_fields() {
        let user = User {
            id: 7,
            username: "alice".to_string(),
            name: Some("Alice A".to_string()),
            created_at: "2026-01-01 00:00:00".to_string(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["username"], "alice");
        assert_eq!(json["created_at"], "2026-01-01 00:00:00");
    }
}
