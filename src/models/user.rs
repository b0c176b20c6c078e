use jiff::Timestamp;
use serde::{Deserialize, Serialize};

pub const MAX_USERNAME_LENGTH: usize = 32;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct User {
    /// Lowercased login name, unique across the store
    pub username: String,
    /// Argon2 PHC string of the user's password
    pub password_hash: String,
    /// When the account was registered
    pub created_at: Timestamp,
}

/// Usernames are compared case-insensitively, so they are stored lowercased
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

/// Letters, digits, `_`, `-` and `.`, not starting with `_`.
/// Names starting with `_` are reserved for internal boards.
pub fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username.len() <= MAX_USERNAME_LENGTH
        && !username.starts_with('_')
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_username() {
        assert_eq!(normalize_username("  Alice "), "alice");
    }

    #[test]
    fn test_username_validation() {
        assert!(is_valid_username("data.analyst-01"));
        assert!(!is_valid_username(""));
        assert!(!is_valid_username("_unassigned"));
        assert!(!is_valid_username("with space"));
        assert!(!is_valid_username(&"a".repeat(MAX_USERNAME_LENGTH + 1)));
    }
}
