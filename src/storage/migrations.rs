use std::path::PathBuf;

use serde_json::{Map, Value, json};

use crate::{models::store::UNASSIGNED_BOARD, storage::StorageError};

type MigrationFn = fn(Value) -> Result<Value, StorageError>;

fn get_migrations() -> Vec<MigrationFn> {
    vec![migrate_v1_to_v2]
}

/// Returns 1 if version field is missing (assumes v1, our first versioned schema)
pub fn detect_version(content: &str) -> Result<u32, StorageError> {
    let value: Value = serde_json::from_str(content).map_err(|e| StorageError::ParseFailed {
        path: PathBuf::from("<unknown>"),
        source: e,
    })?;

    match value.get("version") {
        Some(v) => v
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| StorageError::InvalidVersion(v.to_string())),
        None => Ok(1), // No version field = v1
    }
}

/// Migrations are applied sequentially: v1→v2→v3→...→target
pub fn apply_migrations(
    mut data: Value,
    from_version: u32,
    to_version: u32,
) -> Result<Value, StorageError> {
    if from_version == to_version {
        return Ok(data);
    }

    if from_version > to_version {
        return Err(StorageError::FutureVersion(from_version));
    }

    let migrations = get_migrations();

    for version in from_version..to_version {
        let migration_idx = (version - 1) as usize; // v1→v2 is at index 0

        if migration_idx >= migrations.len() {
            return Err(StorageError::UnsupportedVersion(version));
        }

        log::debug!("Migrating store from v{} to v{}", version, version + 1);
        data = migrations[migration_idx](data)?;
    }

    Ok(data)
}

/// v1 kept every task in one flat `tasks` array with an optional `owner`
/// and called the tag `category`. v2 groups tasks into per-user boards.
fn migrate_v1_to_v2(mut value: Value) -> Result<Value, StorageError> {
    let Some(obj) = value.as_object_mut() else {
        return Err(StorageError::UnsupportedVersion(1));
    };

    let mut boards: Map<String, Value> = Map::new();

    if let Some(users) = obj.get_mut("users").and_then(|u| u.as_array_mut()) {
        for user in users {
            let Some(user_obj) = user.as_object_mut() else {
                continue;
            };
            if let Some(name) = user_obj.get("username").and_then(|n| n.as_str()) {
                let name = name.trim().to_lowercase();
                boards.insert(name.clone(), json!({ "next_task_number": 1, "tasks": [] }));
                user_obj.insert("username".to_string(), Value::from(name));
            }
        }
    }

    let tasks = match obj.remove("tasks") {
        Some(Value::Array(tasks)) => tasks,
        _ => vec![],
    };

    for mut task in tasks {
        let Some(task_obj) = task.as_object_mut() else {
            continue;
        };

        let owner = task_obj
            .remove("owner")
            .and_then(|o| o.as_str().map(|s| s.trim().to_lowercase()))
            .filter(|o| !o.is_empty())
            .unwrap_or_else(|| UNASSIGNED_BOARD.to_string());

        if let Some(category) = task_obj.remove("category")
            && !task_obj.contains_key("tag")
        {
            task_obj.insert("tag".to_string(), category);
        }

        let board = boards
            .entry(owner)
            .or_insert_with(|| json!({ "next_task_number": 1, "tasks": [] }));

        let task_number = board["next_task_number"].as_u64().unwrap_or(1);
        task_obj.insert("task_number".to_string(), Value::from(task_number));
        board["next_task_number"] = Value::from(task_number + 1);
        if let Some(board_tasks) = board["tasks"].as_array_mut() {
            board_tasks.push(task);
        }
    }

    obj.insert("boards".to_string(), Value::Object(boards));
    obj.entry("users").or_insert_with(|| json!([]));
    obj.insert("version".to_string(), Value::from(2));

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_version_with_version_field() {
        let json = r#"{"version": 2, "users": [], "boards": {}}"#;
        assert_eq!(detect_version(json).unwrap(), 2);
    }

    #[test]
    fn test_detect_version_without_version_field() {
        let json = r#"{"users": [], "tasks": []}"#;
        assert_eq!(detect_version(json).unwrap(), 1);
    }

    #[test]
    fn test_detect_version_rejects_non_numeric_version() {
        let json = r#"{"version": "two"}"#;
        assert!(matches!(
            detect_version(json),
            Err(StorageError::InvalidVersion(_))
        ));
    }

    #[test]
    fn test_apply_migrations_same_version() {
        let data = serde_json::json!({"version": 2});
        let result = apply_migrations(data.clone(), 2, 2).unwrap();
        assert_eq!(result, data);
    }

    #[test]
    fn test_apply_migrations_future_version() {
        let data = serde_json::json!({"version": 5});
        let result = apply_migrations(data, 5, 2);
        assert!(matches!(result, Err(StorageError::FutureVersion(5))));
    }

    #[test]
    fn test_apply_migrations_missing_step() {
        let data = serde_json::json!({"version": 2});
        let result = apply_migrations(data, 2, 3);
        assert!(matches!(result, Err(StorageError::UnsupportedVersion(2))));
    }

    #[test]
    fn test_v1_tasks_are_grouped_into_boards() {
        let data = serde_json::json!({
            "users": [{"username": "Alice", "password_hash": "x", "created_at": "2026-01-01T00:00:00Z"}],
            "tasks": [
                {"title": "a", "owner": "alice", "category": "work"},
                {"title": "b", "owner": "ALICE"},
                {"title": "c"}
            ]
        });

        let migrated = apply_migrations(data, 1, 2).unwrap();

        assert_eq!(migrated["version"], 2);
        assert!(migrated.get("tasks").is_none());
        assert_eq!(migrated["users"][0]["username"], "alice");

        let alice = &migrated["boards"]["alice"];
        assert_eq!(alice["next_task_number"], 3);
        assert_eq!(alice["tasks"][0]["tag"], "work");
        assert!(alice["tasks"][0].get("category").is_none());
        assert!(alice["tasks"][0].get("owner").is_none());
        assert_eq!(alice["tasks"][1]["task_number"], 2);

        let unassigned = &migrated["boards"][UNASSIGNED_BOARD];
        assert_eq!(unassigned["tasks"][0]["title"], "c");
        assert_eq!(unassigned["tasks"][0]["task_number"], 1);
    }
}
