use crate::tasks::TaskRecord;
use serde_json::{Map, Value};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};
use tokio::fs;
use tracing::error;

pub const TASKS_KEY: &str = "tasks";
pub const WEATHER_CITY_KEY: &str = "weatherCity";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to encode store value: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write store file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// String-keyed store backed by a single JSON object file.
///
/// Every `set` rewrites the whole file through a temporary sibling and a
/// rename. Entries stay readable in memory even when the write fails.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = load_entries(&path).await;
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub async fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        persist_entries(&self.path, &self.entries).await
    }

    /// Reads the task collection. Absent or unparsable values yield an
    /// empty collection.
    pub fn load_tasks(&self) -> Vec<TaskRecord> {
        let Some(raw) = self.get(TASKS_KEY) else {
            return Vec::new();
        };
        match decode_tasks(raw) {
            Ok(records) => records,
            Err(err) => {
                error!("failed to parse stored tasks, starting empty: {err}");
                Vec::new()
            }
        }
    }

    pub async fn save_tasks(&mut self, records: &[TaskRecord]) -> Result<(), StoreError> {
        let value = encode_tasks(records)?;
        self.set(TASKS_KEY, value).await
    }
}

pub fn encode_tasks(records: &[TaskRecord]) -> Result<String, serde_json::Error> {
    serde_json::to_string(records)
}

pub fn decode_tasks(raw: &str) -> Result<Vec<TaskRecord>, serde_json::Error> {
    serde_json::from_str(raw)
}

async fn load_entries(path: &Path) -> BTreeMap<String, String> {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice::<Map<String, Value>>(&bytes) {
            Ok(raw) => string_entries(raw),
            Err(err) => {
                error!("failed to parse store file {}: {err}", path.display());
                BTreeMap::new()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
        Err(err) => {
            error!("failed to read store file {}: {err}", path.display());
            BTreeMap::new()
        }
    }
}

fn string_entries(raw: Map<String, Value>) -> BTreeMap<String, String> {
    raw.into_iter()
        .filter_map(|(key, value)| match value {
            Value::String(value) => Some((key, value)),
            other => {
                error!("ignoring non-string store entry {key}: {other}");
                None
            }
        })
        .collect()
}

async fn persist_entries(path: &Path, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
    let payload = serde_json::to_vec_pretty(entries)?;
    let tmp = tmp_path(path);
    let write_err = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };
    fs::write(&tmp, payload).await.map_err(write_err)?;
    fs::rename(&tmp, path).await.map_err(write_err)?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
