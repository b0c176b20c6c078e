use jiff::civil::Date;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    models::{
        board::Board,
        store::Store,
        task::{Priority, Status, Task, normalize_tag},
    },
    storage::{Storage, StorageError},
};

#[derive(Debug, Error, PartialEq)]
pub enum TaskLookupError {
    #[error("Task '{0}' not found")]
    TaskNotFound(String),

    #[error("Task name is ambiguous. Multiple tasks found: {}", .0.join(", "))]
    AmbiguousTaskName(Vec<String>),
}

/// Resolves a task number, or failing that a case-insensitive title fragment
pub fn find_task<'a>(
    board: &'a Board,
    task_number_or_fuzzy_name: &str,
) -> Result<&'a Task, TaskLookupError> {
    let identifier = task_number_or_fuzzy_name.trim().trim_start_matches('#');

    if let Ok(task_number) = identifier.parse::<u64>() {
        return board
            .get_task_by_number(task_number)
            .ok_or_else(|| TaskLookupError::TaskNotFound(task_number_or_fuzzy_name.to_string()));
    }

    let needle = identifier.to_lowercase();
    let matching_tasks: Vec<_> = board
        .tasks
        .iter()
        .filter(|t| t.title.to_lowercase().contains(&needle))
        .collect();

    // An exact title wins over fragments it happens to contain
    if let Some(exact) = matching_tasks
        .iter()
        .copied()
        .find(|t| t.title.to_lowercase() == needle)
    {
        return Ok(exact);
    }

    match matching_tasks.len() {
        0 => Err(TaskLookupError::TaskNotFound(
            task_number_or_fuzzy_name.to_string(),
        )),
        1 => Ok(matching_tasks[0]),
        _ => Err(TaskLookupError::AmbiguousTaskName(
            matching_tasks.iter().map(|t| t.title.clone()).collect(),
        )),
    }
}

#[derive(Debug, Error)]
pub enum AddTaskError {
    #[error("Task title cannot be empty")]
    EmptyTitle,

    #[error("Task '{title}' with priority {priority} already exists as #{task_number}")]
    DuplicateTask {
        title: String,
        priority: Priority,
        task_number: u64,
    },

    #[error("Hours must be a non-negative number, got {0}")]
    InvalidHours(f64),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct AddTaskParameters {
    pub title: String,
    pub priority: Priority,
    pub tag: Option<String>,
    pub due_date: Option<Date>,
    pub estimated_hours: Option<f64>,
}

pub fn add_task(
    store: &mut Store,
    storage: &impl Storage,
    owner: &str,
    parameters: AddTaskParameters,
) -> Result<Task, AddTaskError> {
    let title = parameters.title.trim().to_string();
    if title.is_empty() {
        return Err(AddTaskError::EmptyTitle);
    }
    if let Some(hours) = parameters.estimated_hours.filter(|h| !is_valid_hours(*h)) {
        return Err(AddTaskError::InvalidHours(hours));
    }

    let board = store.board_mut(owner);

    if let Some(existing) = board.find_duplicate(&title, parameters.priority, None) {
        return Err(AddTaskError::DuplicateTask {
            title: existing.title.clone(),
            priority: existing.priority,
            task_number: existing.task_number,
        });
    }

    let mut task = Task {
        id: Uuid::new_v4(),
        task_number: 0,
        title,
        status: Status::ToDo,
        priority: parameters.priority,
        tag: normalize_tag(parameters.tag),
        due_date: parameters.due_date,
        estimated_hours: parameters.estimated_hours,
        actual_hours: None,
        created_at: jiff::Timestamp::now(),
        completed_at: None,
    };

    task.task_number = board.add_task(task.clone());

    storage.save(store)?;

    log::debug!("Added task #{} for {}", task.task_number, owner);
    Ok(task)
}

#[derive(Debug, Error)]
pub enum UpdateStatusError {
    #[error(transparent)]
    Lookup(#[from] TaskLookupError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct UpdateStatusParameters {
    pub task_number_or_fuzzy_name: String,
    pub status: Status,
}

pub struct UpdateStatusResult {
    pub task: Task,
    pub previous_status: Status,
}

pub fn update_status(
    store: &mut Store,
    storage: &impl Storage,
    owner: &str,
    parameters: UpdateStatusParameters,
) -> Result<UpdateStatusResult, UpdateStatusError> {
    let board = store.board_mut(owner);
    let task_id = find_task(board, &parameters.task_number_or_fuzzy_name)?.id;

    let Some(task) = board.get_task_mut(task_id) else {
        return Err(TaskLookupError::TaskNotFound(parameters.task_number_or_fuzzy_name).into());
    };
    let previous_status = task.set_status(parameters.status, jiff::Timestamp::now());
    let task = task.clone();

    storage.save(store)?;

    Ok(UpdateStatusResult {
        task,
        previous_status,
    })
}

#[derive(Debug, Error)]
pub enum EditTaskError {
    #[error(transparent)]
    Lookup(#[from] TaskLookupError),

    #[error("Task title cannot be empty")]
    EmptyTitle,

    #[error("Nothing to change")]
    NothingToChange,

    #[error("Task '{title}' with priority {priority} already exists as #{task_number}")]
    DuplicateTask {
        title: String,
        priority: Priority,
        task_number: u64,
    },

    #[error("Hours must be a non-negative number, got {0}")]
    InvalidHours(f64),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Fields left as `None` are unchanged. `Some(None)` clears an optional field.
#[derive(Default)]
pub struct EditTaskParameters {
    pub task_number_or_fuzzy_name: String,
    pub title: Option<String>,
    pub priority: Option<Priority>,
    pub tag: Option<Option<String>>,
    pub due_date: Option<Option<Date>>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
}

impl EditTaskParameters {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.priority.is_none()
            && self.tag.is_none()
            && self.due_date.is_none()
            && self.estimated_hours.is_none()
            && self.actual_hours.is_none()
    }
}

pub fn edit_task(
    store: &mut Store,
    storage: &impl Storage,
    owner: &str,
    parameters: EditTaskParameters,
) -> Result<Task, EditTaskError> {
    if parameters.is_empty() {
        return Err(EditTaskError::NothingToChange);
    }
    for hours in [parameters.estimated_hours, parameters.actual_hours]
        .into_iter()
        .flatten()
    {
        if !is_valid_hours(hours) {
            return Err(EditTaskError::InvalidHours(hours));
        }
    }

    let board = store.board_mut(owner);
    let current = find_task(board, &parameters.task_number_or_fuzzy_name)?;
    let task_id = current.id;

    let title = match parameters.title {
        Some(title) if title.trim().is_empty() => return Err(EditTaskError::EmptyTitle),
        Some(title) => title.trim().to_string(),
        None => current.title.clone(),
    };
    let priority = parameters.priority.unwrap_or(current.priority);

    if let Some(existing) = board.find_duplicate(&title, priority, Some(task_id)) {
        return Err(EditTaskError::DuplicateTask {
            title: existing.title.clone(),
            priority: existing.priority,
            task_number: existing.task_number,
        });
    }

    let Some(task) = board.get_task_mut(task_id) else {
        return Err(TaskLookupError::TaskNotFound(parameters.task_number_or_fuzzy_name).into());
    };
    task.title = title;
    task.priority = priority;
    if let Some(tag) = parameters.tag {
        task.tag = normalize_tag(tag);
    }
    if let Some(due_date) = parameters.due_date {
        task.due_date = due_date;
    }
    if let Some(hours) = parameters.estimated_hours {
        task.estimated_hours = Some(hours);
    }
    if let Some(hours) = parameters.actual_hours {
        task.actual_hours = Some(hours);
    }
    let task = task.clone();

    storage.save(store)?;

    Ok(task)
}

#[derive(Debug, Error)]
pub enum DeleteTaskError {
    #[error(transparent)]
    Lookup(#[from] TaskLookupError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct DeleteTaskParameters {
    pub task_number_or_fuzzy_name: String,
}

pub fn delete_task(
    store: &mut Store,
    storage: &impl Storage,
    owner: &str,
    parameters: DeleteTaskParameters,
) -> Result<Task, DeleteTaskError> {
    let board = store.board_mut(owner);
    let task_id = find_task(board, &parameters.task_number_or_fuzzy_name)?.id;

    let Some(task) = board.remove_task(task_id) else {
        return Err(TaskLookupError::TaskNotFound(parameters.task_number_or_fuzzy_name).into());
    };

    storage.save(store)?;

    Ok(task)
}

/// Filters for the list view. Empty filters match everything.
#[derive(Default)]
pub struct TaskFilter {
    pub status: Option<Status>,
    pub tag: Option<String>,
    pub priority: Option<Priority>,
    pub overdue_on: Option<Date>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        self.status.is_none_or(|s| task.status == s)
            && self.priority.is_none_or(|p| task.priority == p)
            && normalize_tag(self.tag.clone()).is_none_or(|tag| {
                task.tag
                    .as_ref()
                    .is_some_and(|t| t.to_lowercase() == tag.to_lowercase())
            })
            && self.overdue_on.is_none_or(|today| task.is_overdue(today))
    }
}

/// Tasks matching `filter`, most urgent first: priority descending, then due date, then number
pub fn list_tasks<'a>(board: &'a Board, filter: &TaskFilter) -> Vec<&'a Task> {
    let mut tasks: Vec<_> = board.tasks.iter().filter(|t| filter.matches(t)).collect();
    tasks.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| match (a.due_date, b.due_date) {
                (Some(a), Some(b)) => a.cmp(&b),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            })
            .then_with(|| a.task_number.cmp(&b.task_number))
    });
    tasks
}

fn is_valid_hours(hours: f64) -> bool {
    hours.is_finite() && hours >= 0.0
}
