use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::task::{Priority, Status, Task};

/// One user's ordered collection of tasks
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Board {
    /// Number handed to the next task added. Never reused after deletion.
    pub next_task_number: u64,
    pub tasks: Vec<Task>,
}

impl Default for Board {
    fn default() -> Self {
        Self {
            next_task_number: 1,
            tasks: vec![],
        }
    }
}

impl Board {
    /// Appends the task, assigning it the next task number
    pub fn add_task(&mut self, mut task: Task) -> u64 {
        let task_number = self.next_task_number;
        task.task_number = task_number;
        self.next_task_number += 1;
        self.tasks.push(task);
        task_number
    }

    pub fn get_task_mut(&mut self, id: Uuid) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    pub fn get_task_by_number(&self, task_number: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.task_number == task_number)
    }

    pub fn remove_task(&mut self, id: Uuid) -> Option<Task> {
        let index = self.tasks.iter().position(|t| t.id == id)?;
        Some(self.tasks.remove(index))
    }

    /// Finds a task with the same normalized title and priority, skipping `except`
    pub fn find_duplicate(
        &self,
        title: &str,
        priority: Priority,
        except: Option<Uuid>,
    ) -> Option<&Task> {
        self.tasks
            .iter()
            .filter(|t| Some(t.id) != except)
            .find(|t| t.is_duplicate_of(title, priority))
    }

    pub fn tasks_with_status(&self, status: Status) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(move |t| t.status == status)
    }
}
