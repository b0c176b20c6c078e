use std::path::PathBuf;

use jiff::{Timestamp, civil::Date};
use rusqlite::{Connection, params};
use uuid::Uuid;

use crate::{
    models::{
        board::Board,
        store::{CURRENT_VERSION, Store},
        task::{Priority, Status, Task},
        user::User,
    },
    storage::{Storage, StorageError},
};

/// Columns added after the first release of the tasks table
const LATE_TASK_COLUMNS: [(&str, &str); 3] = [
    ("tag", "TEXT"),
    ("estimated_hours", "REAL"),
    ("actual_hours", "REAL"),
];

pub struct SqliteStorage {
    path: PathBuf,
}

/// A tasks row before validation
struct TaskRow {
    owner: String,
    id: String,
    task_number: i64,
    title: String,
    status: String,
    priority: i64,
    tag: Option<String>,
    due_date: Option<String>,
    estimated_hours: Option<f64>,
    actual_hours: Option<f64>,
    created_at: String,
    completed_at: Option<String>,
}

impl SqliteStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn db_error(&self, source: rusqlite::Error) -> StorageError {
        StorageError::Database {
            path: self.path.clone(),
            source,
        }
    }

    fn invalid(&self, reason: String) -> StorageError {
        StorageError::InvalidRecord {
            path: self.path.clone(),
            reason,
        }
    }

    fn connect(&self) -> Result<Connection, StorageError> {
        let conn = Connection::open(&self.path).map_err(|e| self.db_error(e))?;
        self.init_schema(&conn)?;
        self.ensure_task_columns(&conn)?;
        Ok(conn)
    }

    fn init_schema(&self, conn: &Connection) -> Result<(), StorageError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                username        TEXT PRIMARY KEY,
                password_hash   TEXT NOT NULL,
                created_at      TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS boards (
                owner               TEXT PRIMARY KEY,
                next_task_number    INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS tasks (
                id              TEXT PRIMARY KEY,
                owner           TEXT NOT NULL,
                task_number     INTEGER NOT NULL,
                title           TEXT NOT NULL,
                status          TEXT NOT NULL,
                priority        INTEGER NOT NULL,
                tag             TEXT,
                due_date        TEXT,
                estimated_hours REAL,
                actual_hours    REAL,
                created_at      TEXT NOT NULL,
                completed_at    TEXT
            );",
        )
        .map_err(|e| self.db_error(e))
    }

    /// Upgrades tables created before the late columns existed
    fn ensure_task_columns(&self, conn: &Connection) -> Result<(), StorageError> {
        let existing = {
            let mut stmt = conn
                .prepare("PRAGMA table_info(tasks)")
                .map_err(|e| self.db_error(e))?;
            let names = stmt
                .query_map([], |row| row.get::<_, String>(1))
                .map_err(|e| self.db_error(e))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| self.db_error(e))?;
            names
        };

        for (column, sql_type) in LATE_TASK_COLUMNS {
            if existing.iter().any(|name| name == column) {
                continue;
            }
            log::debug!("Adding column tasks.{} to {}", column, self.path.display());
            conn.execute(
                &format!("ALTER TABLE tasks ADD COLUMN {} {}", column, sql_type),
                [],
            )
            .map_err(|e| self.db_error(e))?;
        }

        Ok(())
    }

    fn parse_timestamp(&self, value: &str) -> Result<Timestamp, StorageError> {
        value
            .parse()
            .map_err(|e| self.invalid(format!("bad timestamp '{}': {}", value, e)))
    }

    fn parse_task(&self, row: TaskRow) -> Result<Task, StorageError> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| self.invalid(format!("bad task id '{}': {}", row.id, e)))?;
        let status: Status = row
            .status
            .parse()
            .map_err(|e| self.invalid(format!("task {}: {}", row.id, e)))?;
        let priority = Priority::try_from(row.priority)
            .map_err(|e| self.invalid(format!("task {}: {}", row.id, e)))?;
        let task_number = u64::try_from(row.task_number)
            .map_err(|_| self.invalid(format!("task {}: negative task number", row.id)))?;
        let due_date = row
            .due_date
            .as_deref()
            .map(|d| {
                d.parse::<Date>()
                    .map_err(|e| self.invalid(format!("bad due date '{}': {}", d, e)))
            })
            .transpose()?;
        let completed_at = row
            .completed_at
            .as_deref()
            .map(|t| self.parse_timestamp(t))
            .transpose()?;

        Ok(Task {
            id,
            task_number,
            title: row.title,
            status,
            priority,
            tag: row.tag,
            due_date,
            estimated_hours: row.estimated_hours,
            actual_hours: row.actual_hours,
            created_at: self.parse_timestamp(&row.created_at)?,
            completed_at,
        })
    }
}

impl Storage for SqliteStorage {
    fn load(&self) -> Result<Store, StorageError> {
        let conn = self.connect()?;
        let mut store = Store::default();

        let mut stmt = conn
            .prepare("SELECT username, password_hash, created_at FROM users ORDER BY rowid")
            .map_err(|e| self.db_error(e))?;
        let users = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(|e| self.db_error(e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| self.db_error(e))?;
        for (username, password_hash, created_at) in users {
            store.users.push(User {
                username,
                password_hash,
                created_at: self.parse_timestamp(&created_at)?,
            });
        }

        let mut stmt = conn
            .prepare("SELECT owner, next_task_number FROM boards")
            .map_err(|e| self.db_error(e))?;
        let boards = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })
            .map_err(|e| self.db_error(e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| self.db_error(e))?;
        for (owner, next_task_number) in boards {
            let board = Board {
                next_task_number: u64::try_from(next_task_number).unwrap_or(1),
                tasks: vec![],
            };
            store.boards.insert(owner, board);
        }

        let mut stmt = conn
            .prepare(
                "SELECT owner, id, task_number, title, status, priority, tag, due_date,
                        estimated_hours, actual_hours, created_at, completed_at
                 FROM tasks ORDER BY owner, task_number",
            )
            .map_err(|e| self.db_error(e))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(TaskRow {
                    owner: row.get(0)?,
                    id: row.get(1)?,
                    task_number: row.get(2)?,
                    title: row.get(3)?,
                    status: row.get(4)?,
                    priority: row.get(5)?,
                    tag: row.get(6)?,
                    due_date: row.get(7)?,
                    estimated_hours: row.get(8)?,
                    actual_hours: row.get(9)?,
                    created_at: row.get(10)?,
                    completed_at: row.get(11)?,
                })
            })
            .map_err(|e| self.db_error(e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| self.db_error(e))?;

        for row in rows {
            let owner = row.owner.clone();
            let task = self.parse_task(row)?;
            let board = store.boards.entry(owner).or_default();
            // Boards rows may be missing in databases written by hand
            board.next_task_number = board.next_task_number.max(task.task_number + 1);
            board.tasks.push(task);
        }

        store.version = CURRENT_VERSION;
        log::debug!(
            "Loaded {} user(s) from {}",
            store.users.len(),
            self.path.display()
        );
        Ok(store)
    }

    fn save(&self, store: &Store) -> Result<(), StorageError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction().map_err(|e| self.db_error(e))?;

        tx.execute_batch("DELETE FROM tasks; DELETE FROM boards; DELETE FROM users;")
            .map_err(|e| self.db_error(e))?;

        for user in &store.users {
            tx.execute(
                "INSERT INTO users (username, password_hash, created_at) VALUES (?1, ?2, ?3)",
                params![user.username, user.password_hash, user.created_at.to_string()],
            )
            .map_err(|e| self.db_error(e))?;
        }

        for (owner, board) in &store.boards {
            tx.execute(
                "INSERT INTO boards (owner, next_task_number) VALUES (?1, ?2)",
                params![owner, board.next_task_number as i64],
            )
            .map_err(|e| self.db_error(e))?;

            for task in &board.tasks {
                tx.execute(
                    "INSERT INTO tasks (id, owner, task_number, title, status, priority, tag,
                                        due_date, estimated_hours, actual_hours, created_at,
                                        completed_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                    params![
                        task.id.to_string(),
                        owner,
                        task.task_number as i64,
                        task.title,
                        task.status.as_str(),
                        task.priority.value(),
                        task.tag,
                        task.due_date.map(|d| d.to_string()),
                        task.estimated_hours,
                        task.actual_hours,
                        task.created_at.to_string(),
                        task.completed_at.map(|t| t.to_string()),
                    ],
                )
                .map_err(|e| self.db_error(e))?;
            }
        }

        tx.commit().map_err(|e| self.db_error(e))?;
        log::debug!("Saved store to {}", self.path.display());
        Ok(())
    }
}
