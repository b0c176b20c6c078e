use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{
    board::Board,
    user::{User, normalize_username},
};

/// Current schema version
pub const CURRENT_VERSION: u32 = 2;

/// Board holding tasks that had no owner before boards existed
pub const UNASSIGNED_BOARD: &str = "_unassigned";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Store {
    pub version: u32,
    pub users: Vec<User>,
    /// Boards keyed by normalized username
    pub boards: BTreeMap<String, Board>,
}

impl Default for Store {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            users: vec![],
            boards: BTreeMap::new(),
        }
    }
}

impl Store {
    pub fn find_user(&self, username: &str) -> Option<&User> {
        let username = normalize_username(username);
        self.users.iter().find(|u| u.username == username)
    }

    pub fn add_user(&mut self, user: User) {
        self.boards.entry(user.username.clone()).or_default();
        self.users.push(user);
    }

    pub fn board(&self, owner: &str) -> Option<&Board> {
        self.boards.get(&normalize_username(owner))
    }

    /// Returns the owner's board, creating an empty one if needed
    pub fn board_mut(&mut self, owner: &str) -> &mut Board {
        self.boards.entry(normalize_username(owner)).or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> User {
        User {
            username: name.to_string(),
            password_hash: String::new(),
            created_at: jiff::Timestamp::now(),
        }
    }

    #[test]
    fn test_find_user_is_case_insensitive() {
        let mut store = Store::default();
        store.add_user(user("alice"));

        assert!(store.find_user("ALICE").is_some());
        assert!(store.find_user(" Alice ").is_some());
        assert!(store.find_user("bob").is_none());
    }

    #[test]
    fn test_boards_are_isolated_per_user() {
        let mut store = Store::default();
        store.add_user(user("alice"));
        store.add_user(user("bob"));

        store.board_mut("alice").add_task(Default::default());

        assert_eq!(store.board("alice").unwrap().tasks.len(), 1);
        assert!(store.board("bob").unwrap().tasks.is_empty());
    }
}
