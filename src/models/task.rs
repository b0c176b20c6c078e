use std::{fmt, str::FromStr};

use jiff::Timestamp;
use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
pub struct Task {
    /// UUID to identify the task
    pub id: Uuid,
    /// User-facing auto-incremental task number, unique per board
    pub task_number: u64,
    /// Title of the task
    pub title: String,
    /// Kanban column the task sits in
    pub status: Status,
    /// Priority from 1 (lowest) to 5 (highest)
    pub priority: Priority,
    /// Free text category of the task
    pub tag: Option<String>,
    /// When the task is due
    pub due_date: Option<Date>,
    /// Hours the user expects the task to take
    #[serde(default)]
    pub estimated_hours: Option<f64>,
    /// Hours the task actually took
    #[serde(default)]
    pub actual_hours: Option<f64>,
    /// When the task was created
    pub created_at: Timestamp,
    /// When the task was completed. Only set while the task is Done.
    pub completed_at: Option<Timestamp>,
}

impl Task {
    /// Moves the task to `status`.
    ///
    /// Entering `Done` stamps `completed_at`, leaving it clears the stamp and
    /// `Done -> Done` keeps the original one. Returns the previous status.
    pub fn set_status(&mut self, status: Status, now: Timestamp) -> Status {
        let previous = self.status;
        match (previous, status) {
            (Status::Done, Status::Done) => {}
            (_, Status::Done) => self.completed_at = Some(now),
            (_, _) => self.completed_at = None,
        }
        self.status = status;
        previous
    }

    pub fn is_overdue(&self, today: Date) -> bool {
        self.status != Status::Done && self.due_date.is_some_and(|due| due < today)
    }

    /// Case and whitespace insensitive comparison used by the duplicate check
    pub fn is_duplicate_of(&self, title: &str, priority: Priority) -> bool {
        self.priority == priority && normalize_title(&self.title) == normalize_title(title)
    }
}

/// Collapses runs of whitespace and lowercases the title
pub fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Trims a user supplied tag, mapping blank input to no tag
pub fn normalize_tag(tag: Option<String>) -> Option<String> {
    tag.map(|t| t.trim().trim_start_matches('#').to_string())
        .filter(|t| !t.is_empty())
}

#[derive(Serialize, Deserialize, Default, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    #[default]
    #[serde(rename = "To Do")]
    ToDo,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Done")]
    Done,
}

impl Status {
    /// Board column order
    pub const ALL: [Status; 3] = [Status::ToDo, Status::InProgress, Status::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::ToDo => "To Do",
            Status::InProgress => "In Progress",
            Status::Done => "Done",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
#[error("Unknown status '{0}'. Expected one of: to-do, in-progress, done")]
pub struct ParseStatusError(pub String);

impl FromStr for Status {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .trim()
            .to_lowercase()
            .replace(['-', '_'], " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        match normalized.as_str() {
            "to do" | "todo" => Ok(Status::ToDo),
            "in progress" | "inprogress" | "doing" | "wip" => Ok(Status::InProgress),
            "done" | "complete" | "completed" => Ok(Status::Done),
            _ => Err(ParseStatusError(s.to_string())),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "u8", into = "u8")]
pub struct Priority(u8);

impl Priority {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Every valid priority, lowest first
    pub fn all() -> impl Iterator<Item = Priority> {
        (Self::MIN..=Self::MAX).map(Priority)
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority(3)
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PriorityError {
    #[error("Priority must be between 1 and 5, got {0}")]
    OutOfRange(i64),

    #[error("Invalid priority '{0}'. Use a number from 1 to 5 or low/medium/high/urgent")]
    Unrecognized(String),
}

impl TryFrom<u8> for Priority {
    type Error = PriorityError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Priority(value))
        } else {
            Err(PriorityError::OutOfRange(value.into()))
        }
    }
}

impl TryFrom<i64> for Priority {
    type Error = PriorityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .map_err(|_| PriorityError::OutOfRange(value))
            .and_then(Priority::try_from)
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority.0
    }
}

impl FromStr for Priority {
    type Err = PriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(number) = trimmed.parse::<i64>() {
            return Priority::try_from(number);
        }
        match trimmed.to_lowercase().as_str() {
            "lowest" => Ok(Priority(1)),
            "low" => Ok(Priority(2)),
            "medium" | "normal" => Ok(Priority(3)),
            "high" => Ok(Priority(4)),
            "urgent" | "highest" => Ok(Priority(5)),
            _ => Err(PriorityError::Unrecognized(s.to_string())),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(title: &str, priority: u8) -> Task {
        Task {
            title: title.to_string(),
            priority: Priority::try_from(priority).unwrap(),
            ..Task::default()
        }
    }

    #[test]
    fn test_entering_done_stamps_completion() {
        let mut task = task("Write report", 3);
        let now = Timestamp::now();

        let previous = task.set_status(Status::Done, now);

        assert_eq!(previous, Status::ToDo);
        assert_eq!(task.status, Status::Done);
        assert_eq!(task.completed_at, Some(now));
    }

    #[test]
    fn test_done_to_done_keeps_original_stamp() {
        let mut task = task("Write report", 3);
        let first: Timestamp = "2026-01-01T10:00:00Z".parse().unwrap();
        let later: Timestamp = "2026-01-02T10:00:00Z".parse().unwrap();

        task.set_status(Status::Done, first);
        task.set_status(Status::Done, later);

        assert_eq!(task.completed_at, Some(first));
    }

    #[test]
    fn test_leaving_done_clears_completion() {
        let mut task = task("Write report", 3);
        task.set_status(Status::Done, Timestamp::now());

        task.set_status(Status::InProgress, Timestamp::now());

        assert_eq!(task.status, Status::InProgress);
        assert!(task.completed_at.is_none());
    }

    #[test]
    fn test_any_status_reachable_from_any_status() {
        for from in Status::ALL {
            for to in Status::ALL {
                let mut task = task("t", 1);
                task.set_status(from, Timestamp::now());
                task.set_status(to, Timestamp::now());
                assert_eq!(task.status, to);
                assert_eq!(task.completed_at.is_some(), to == Status::Done);
            }
        }
    }

    #[test]
    fn test_duplicate_ignores_case_and_spacing() {
        let existing = task("Clean  the Data", 2);
        let p2 = Priority::try_from(2u8).unwrap();
        let p3 = Priority::try_from(3u8).unwrap();

        assert!(existing.is_duplicate_of("clean the data", p2));
        assert!(existing.is_duplicate_of("  CLEAN THE DATA ", p2));
        assert!(!existing.is_duplicate_of("clean the data", p3));
        assert!(!existing.is_duplicate_of("clean data", p2));
    }

    #[test]
    fn test_overdue_only_when_not_done() {
        let today: Date = "2026-03-10".parse().unwrap();
        let mut task = task("t", 3);
        task.due_date = Some("2026-03-09".parse().unwrap());
        assert!(task.is_overdue(today));

        task.set_status(Status::Done, Timestamp::now());
        assert!(!task.is_overdue(today));

        task.due_date = Some(today);
        task.set_status(Status::ToDo, Timestamp::now());
        assert!(!task.is_overdue(today));
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("To Do".parse(), Ok(Status::ToDo));
        assert_eq!("todo".parse(), Ok(Status::ToDo));
        assert_eq!("in-progress".parse(), Ok(Status::InProgress));
        assert_eq!("DOING".parse(), Ok(Status::InProgress));
        assert_eq!("done".parse(), Ok(Status::Done));
        assert!("later".parse::<Status>().is_err());
    }

    #[test]
    fn test_priority_range() {
        assert!(Priority::try_from(0u8).is_err());
        assert!(Priority::try_from(6u8).is_err());
        assert_eq!("5".parse::<Priority>().unwrap().value(), 5);
        assert_eq!("high".parse::<Priority>().unwrap().value(), 4);
        assert_eq!("9".parse::<Priority>(), Err(PriorityError::OutOfRange(9)));
        assert_eq!(Priority::default().value(), 3);
    }

    #[test]
    fn test_priority_rejected_on_deserialize() {
        let result = serde_json::from_str::<Priority>("7");
        assert!(result.is_err());
        let priority: Priority = serde_json::from_str("4").unwrap();
        assert_eq!(priority.value(), 4);
    }

    #[test]
    fn test_status_serializes_with_display_names() {
        let json = serde_json::to_string(&Status::InProgress).unwrap();
        assert_eq!(json, "\"In Progress\"");
    }

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag(Some("  #work ".to_string())), Some("work".to_string()));
        assert_eq!(normalize_tag(Some("   ".to_string())), None);
        assert_eq!(normalize_tag(None), None);
    }
}
