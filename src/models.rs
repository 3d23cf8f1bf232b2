use crate::tasks::{Task, TaskId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TaskCounts {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskView {
    pub id: TaskId,
    pub text: String,
    pub completed: bool,
}

impl From<&Task> for TaskView {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            text: task.text.clone(),
            completed: task.completed,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct ConfirmRequest {
    #[serde(default)]
    pub confirmed: bool,
}

#[derive(Debug, Deserialize)]
pub struct CityRequest {
    pub city: String,
}

#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<TaskView>,
    pub counts: TaskCounts,
}

/// Result of one task mutation: what the page must redraw.
#[derive(Debug, Serialize, Default)]
pub struct ChangeResponse {
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<TaskView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed_id: Option<TaskId>,
    pub counts: TaskCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CityResponse {
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}
