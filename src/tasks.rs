use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

pub const REMOVE_PROMPT: &str = "¿Deseas eliminar esta tarea?";
pub const CLEAR_PROMPT: &str = "¿Deseas eliminar todas las tareas?";

static LAST_EPOCH: AtomicU64 = AtomicU64::new(0);

/// Identifies a task within the repository that created it.
///
/// `epoch` is unique per repository instance, including across process
/// restarts, so ids held by a page from an earlier run never resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId {
    pub epoch: u64,
    pub seq: u64,
}

impl TaskId {
    pub fn new(epoch: u64, seq: u64) -> Self {
        Self { epoch, seq }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}-{}", self.epoch, self.seq)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("malformed task id")]
pub struct ParseTaskIdError;

impl FromStr for TaskId {
    type Err = ParseTaskIdError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (epoch, seq) = raw.split_once('-').ok_or(ParseTaskIdError)?;
        let epoch = u64::from_str_radix(epoch, 16).map_err(|_| ParseTaskIdError)?;
        let seq = seq.parse().map_err(|_| ParseTaskIdError)?;
        Ok(Self { epoch, seq })
    }
}

impl Serialize for TaskId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Microseconds since the unix epoch, bumped so no two calls in one process
/// return the same value.
fn next_epoch() -> u64 {
    let now = u64::try_from(Utc::now().timestamp_micros()).unwrap_or(0);
    let prev = LAST_EPOCH
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or(0);
    now.max(prev + 1)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub completed: bool,
}

/// Persisted shape of a task. Ids are session-local and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub text: String,
    pub completed: bool,
}

impl From<&Task> for TaskRecord {
    fn from(task: &Task) -> Self {
        Self {
            text: task.text.clone(),
            completed: task.completed,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("Añade una tarea, por favor")]
    EmptyText,
}

/// Asks the user to affirm a destructive action before it proceeds.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

/// An answer the user already gave, e.g. from the page's dialog.
impl Confirm for bool {
    fn confirm(&self, _prompt: &str) -> bool {
        *self
    }
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Updated,
    /// The new text trimmed to empty; the previous text is kept.
    Discarded,
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed(Task),
    Declined,
    Missing,
}

#[derive(Debug)]
pub struct TaskRepository {
    tasks: Vec<Task>,
    epoch: u64,
    next_seq: u64,
}

impl Default for TaskRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskRepository {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            epoch: next_epoch(),
            next_seq: 0,
        }
    }

    /// Rebuilds the repository from stored records, assigning fresh ids in
    /// stored order.
    pub fn restore(records: Vec<TaskRecord>) -> Self {
        let mut repo = Self::new();
        for record in records {
            let id = repo.allocate_id();
            repo.tasks.push(Task {
                id,
                text: record.text,
                completed: record.completed,
            });
        }
        repo
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn records(&self) -> Vec<TaskRecord> {
        self.tasks.iter().map(TaskRecord::from).collect()
    }

    pub fn add(&mut self, text: &str) -> Result<&Task, TaskError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TaskError::EmptyText);
        }

        let id = self.allocate_id();
        self.tasks.push(Task {
            id,
            text: text.to_string(),
            completed: false,
        });
        Ok(&self.tasks[self.tasks.len() - 1])
    }

    pub fn toggle(&mut self, id: TaskId) -> Option<&Task> {
        let task = self.get_mut(id)?;
        task.completed = !task.completed;
        Some(task)
    }

    pub fn edit(&mut self, id: TaskId, text: &str) -> EditOutcome {
        let Some(task) = self.get_mut(id) else {
            return EditOutcome::Missing;
        };
        let text = text.trim();
        if text.is_empty() {
            return EditOutcome::Discarded;
        }
        task.text = text.to_string();
        EditOutcome::Updated
    }

    pub fn remove(&mut self, id: TaskId, confirm: &impl Confirm) -> RemoveOutcome {
        let Some(index) = self.tasks.iter().position(|task| task.id == id) else {
            return RemoveOutcome::Missing;
        };
        if !confirm.confirm(REMOVE_PROMPT) {
            return RemoveOutcome::Declined;
        }
        RemoveOutcome::Removed(self.tasks.remove(index))
    }

    /// Empties the repository. Returns `false` when the user declined.
    pub fn clear(&mut self, confirm: &impl Confirm) -> bool {
        if !confirm.confirm(CLEAR_PROMPT) {
            return false;
        }
        self.tasks.clear();
        true
    }

    fn get_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == id)
    }

    fn allocate_id(&mut self) -> TaskId {
        self.next_seq += 1;
        TaskId::new(self.epoch, self.next_seq)
    }
}
