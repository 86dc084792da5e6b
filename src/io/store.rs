use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

use crate::model::task::{NewTask, Status, Task};

/// Error type for backing store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not serialize tasks: {0}")]
    SerializeError(#[from] serde_json::Error),
    #[error("task not found in store: {0}")]
    NotFound(Uuid),
}

/// Everything the store considers live, split the way Taskwarrior reports it
#[derive(Debug, Clone, Default)]
pub struct StoredTasks {
    pub pending: Vec<Task>,
    pub completed: Vec<Task>,
}

impl StoredTasks {
    /// Pending tasks followed by completed ones
    pub fn into_all(self) -> Vec<Task> {
        let mut all = self.pending;
        all.extend(self.completed);
        all
    }
}

/// The durable source of truth behind the store-backed task API.
pub trait TaskStore {
    /// Load every pending and completed task.
    fn load_all(&self) -> Result<StoredTasks, StoreError>;

    /// Persist a new task, returning it with its assigned `uuid` and `id`.
    fn create(&mut self, new: NewTask) -> Result<Task, StoreError>;

    /// Remove a task from the live set.
    fn delete(&mut self, uuid: Uuid) -> Result<(), StoreError>;

    /// Replace the stored record carrying the same `uuid`.
    fn update(&mut self, task: &Task) -> Result<(), StoreError>;
}

/// A task store kept as a JSON array of Taskwarrior export records.
///
/// Deleted tasks stay in the file with status `deleted` and are hidden
/// from `load_all`. Working-set ids are renumbered after every write.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record in the file, including deleted ones.
    pub fn read_records(&self) -> Result<Vec<Task>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&self.path).map_err(|e| StoreError::ReadError {
            path: self.path.clone(),
            source: e,
        })?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&text).map_err(|e| StoreError::ParseError {
            path: self.path.clone(),
            source: e,
        })
    }

    fn write_records(&self, records: &mut [Task]) -> Result<(), StoreError> {
        renumber(records);
        let content = serde_json::to_string_pretty(records)?;
        crate::io::atomic_write(&self.path, content.as_bytes()).map_err(|e| {
            StoreError::WriteError {
                path: self.path.clone(),
                source: e,
            }
        })
    }
}

impl TaskStore for FileStore {
    fn load_all(&self) -> Result<StoredTasks, StoreError> {
        let mut stored = StoredTasks::default();
        for task in self.read_records()? {
            match task.status {
                Status::Pending | Status::Waiting => stored.pending.push(task),
                Status::Completed => stored.completed.push(task),
                Status::Deleted | Status::Recurring => {}
            }
        }
        Ok(stored)
    }

    fn create(&mut self, new: NewTask) -> Result<Task, StoreError> {
        let mut records = self.read_records()?;
        let uuid = Uuid::new_v4();
        records.push(new.into_task(uuid, 0, Utc::now()));
        self.write_records(&mut records)?;

        records
            .into_iter()
            .find(|t| t.uuid == uuid)
            .ok_or(StoreError::NotFound(uuid))
    }

    fn delete(&mut self, uuid: Uuid) -> Result<(), StoreError> {
        let mut records = self.read_records()?;
        let task = records
            .iter_mut()
            .find(|t| t.uuid == uuid)
            .ok_or(StoreError::NotFound(uuid))?;
        let now = Utc::now();
        task.status = Status::Deleted;
        task.end = Some(now);
        task.modified = Some(now);
        self.write_records(&mut records)
    }

    fn update(&mut self, task: &Task) -> Result<(), StoreError> {
        let mut records = self.read_records()?;
        let slot = records
            .iter_mut()
            .find(|t| t.uuid == task.uuid)
            .ok_or(StoreError::NotFound(task.uuid))?;

        let now = Utc::now();
        let was_completed = slot.status == Status::Completed;
        let mut updated = task.clone();
        updated.entry = updated.entry.or(slot.entry);
        updated.modified = Some(now);
        if updated.status == Status::Completed && !was_completed {
            updated.end = Some(now);
        } else if updated.status != Status::Completed && was_completed {
            updated.end = None;
        }
        *slot = updated;
        self.write_records(&mut records)
    }
}

/// Pending and waiting tasks get ids `1..n` in file order; the rest get 0.
fn renumber(records: &mut [Task]) {
    let mut next = 1;
    for task in records.iter_mut() {
        if matches!(task.status, Status::Pending | Status::Waiting) {
            task.id = next;
            next += 1;
        } else {
            task.id = 0;
        }
    }
}
