use std::path::PathBuf;

use indexmap::IndexMap;
use uuid::Uuid;

use crate::io::store::{FileStore, StoreError};
use crate::model::sort_metric::SortMetric;
use crate::model::task::{DEFAULT_MODULE, NewTask, Task};
use crate::ops::fake_api::FakeTaskApi;
use crate::ops::sort::sort_tasks;
use crate::ops::store_api::StoreTaskApi;

/// Error type for task API operations
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("unknown module: {0}")]
    UnknownModule(String),
    #[error("task not found: {0}")]
    NotFound(Uuid),
    #[error("clear_tasks is only available on the in-memory task API")]
    ClearRefused,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Tasks partitioned by module, each list kept in sort order.
///
/// The key set is the module list: a module registered with `add_module`
/// keeps an (empty) entry until tasks arrive. Every task sits in exactly
/// the list named by its `module` field.
#[derive(Debug, Clone)]
pub struct TaskIndex {
    modules: IndexMap<String, Vec<Task>>,
    sort_metric: SortMetric,
}

impl TaskIndex {
    pub fn new(sort_metric: SortMetric) -> Self {
        let mut modules = IndexMap::new();
        modules.insert(DEFAULT_MODULE.to_string(), Vec::new());
        TaskIndex {
            modules,
            sort_metric,
        }
    }

    pub fn sort_metric(&self) -> SortMetric {
        self.sort_metric
    }

    /// Register a module. Returns false if it was already known.
    pub fn add_module(&mut self, name: &str) -> bool {
        if self.modules.contains_key(name) {
            return false;
        }
        self.modules.insert(name.to_string(), Vec::new());
        true
    }

    pub fn has_module(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Module names in registration order
    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(|k| k.as_str())
    }

    pub fn tasks(&self, module: &str) -> Result<&[Task], ApiError> {
        self.modules
            .get(module)
            .map(|v| v.as_slice())
            .ok_or_else(|| ApiError::UnknownModule(module.to_string()))
    }

    pub fn num_tasks(&self, module: &str) -> Result<usize, ApiError> {
        self.tasks(module).map(|t| t.len())
    }

    /// The task at `index` in `module`, or `None` when out of range.
    pub fn task_at(&self, index: usize, module: &str) -> Option<&Task> {
        self.modules.get(module).and_then(|tasks| tasks.get(index))
    }

    /// Every task, module by module
    pub fn all_tasks(&self) -> impl Iterator<Item = &Task> {
        self.modules.values().flatten()
    }

    pub fn total_tasks(&self) -> usize {
        self.modules.values().map(|v| v.len()).sum()
    }

    pub fn find(&self, uuid: Uuid) -> Option<&Task> {
        self.all_tasks().find(|t| t.uuid == uuid)
    }

    pub fn index_of(&self, uuid: Uuid, module: &str) -> Option<usize> {
        self.modules
            .get(module)
            .and_then(|tasks| tasks.iter().position(|t| t.uuid == uuid))
    }

    fn locate(&self, uuid: Uuid) -> Option<(usize, usize)> {
        self.modules
            .values()
            .enumerate()
            .find_map(|(m, tasks)| tasks.iter().position(|t| t.uuid == uuid).map(|i| (m, i)))
    }

    /// Append a task to its module list, registering the module if needed.
    /// Call `resort` afterwards.
    pub fn insert(&mut self, task: Task) {
        self.modules.entry(task.module.clone()).or_default().push(task);
    }

    /// Remove and return the task at `index`, or `None` when out of range.
    pub fn remove_at(&mut self, index: usize, module: &str) -> Option<Task> {
        let tasks = self.modules.get_mut(module)?;
        if index >= tasks.len() {
            return None;
        }
        Some(tasks.remove(index))
    }

    /// Replace the task with the same uuid, moving it if its module changed.
    pub fn replace(&mut self, task: Task) -> Result<(), ApiError> {
        let (m, i) = self.locate(task.uuid).ok_or(ApiError::NotFound(task.uuid))?;
        let (current, tasks) = self
            .modules
            .get_index_mut(m)
            .ok_or(ApiError::NotFound(task.uuid))?;
        if *current == task.module {
            tasks[i] = task;
        } else {
            tasks.remove(i);
            self.insert(task);
        }
        Ok(())
    }

    /// Drop every task and re-partition `tasks` by module. Known modules
    /// are kept even when they end up empty.
    pub fn rebuild(&mut self, tasks: Vec<Task>) {
        for list in self.modules.values_mut() {
            list.clear();
        }
        for task in tasks {
            self.insert(task);
        }
        self.resort();
    }

    /// Empty every module, keeping the module list.
    pub fn clear(&mut self) {
        for list in self.modules.values_mut() {
            list.clear();
        }
    }

    pub fn set_sort_metric(&mut self, metric: SortMetric) {
        self.sort_metric = metric;
        self.resort();
    }

    /// Re-sort every module from scratch.
    pub fn resort(&mut self) {
        for tasks in self.modules.values_mut() {
            sort_tasks(tasks, self.sort_metric);
        }
        tracing::debug!(
            metric = %self.sort_metric,
            modules = self.modules.len(),
            tasks = self.total_tasks(),
            "task index re-sorted"
        );
    }
}

/// The task repository: module-partitioned, sorted access to tasks plus
/// the mutations that keep it in step with the backing store.
///
/// Every mutation re-derives the sorted view before returning.
pub trait TaskApi {
    fn index(&self) -> &TaskIndex;

    fn index_mut(&mut self) -> &mut TaskIndex;

    /// Create a task and return it with its assigned `uuid` and `id`.
    fn add_new_task(&mut self, new: NewTask) -> Result<Task, ApiError>;

    /// Persist field changes for the task with the same `uuid`.
    fn update_task(&mut self, task: &Task) -> Result<(), ApiError>;

    /// Remove the task at `index`; out of range is a no-op.
    fn delete_at(&mut self, index: usize, module: &str) -> Result<(), ApiError>;

    /// Remove every task. Only test doubles allow this.
    fn clear_tasks(&mut self) -> Result<(), ApiError>;

    /// Re-derive the sorted view from the source of truth.
    fn refresh(&mut self) -> Result<(), ApiError>;

    fn num_tasks(&self, module: &str) -> Result<usize, ApiError> {
        self.index().num_tasks(module)
    }

    fn task_at(&self, index: usize, module: &str) -> Option<&Task> {
        self.index().task_at(index, module)
    }

    fn add_module(&mut self, name: &str) {
        if self.index_mut().add_module(name) {
            tracing::info!(module = name, "module added");
        }
    }

    fn set_sort_metric(&mut self, metric: SortMetric) {
        self.index_mut().set_sort_metric(metric);
    }

    fn sort_metric(&self) -> SortMetric {
        self.index().sort_metric()
    }

    fn modules(&self) -> Vec<String> {
        self.index().modules().map(str::to_string).collect()
    }
}

/// Which task API implementation to construct
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// Durable tasks in a JSON file
    Store(PathBuf),
    /// In-memory tasks for tests
    Fake,
}

impl Backend {
    /// Build the selected implementation. The returned API is handed to its
    /// consumers directly; nothing else holds a global reference.
    pub fn open(self, sort_metric: SortMetric) -> Result<Box<dyn TaskApi>, ApiError> {
        match self {
            Backend::Store(path) => {
                tracing::debug!(path = %path.display(), "opening task store");
                Ok(Box::new(StoreTaskApi::new(FileStore::new(path), sort_metric)?))
            }
            Backend::Fake => Ok(Box::new(FakeTaskApi::new(sort_metric))),
        }
    }
}
