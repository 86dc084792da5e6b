use crate::io::store::TaskStore;
use crate::model::sort_metric::SortMetric;
use crate::model::task::{NewTask, Task};
use crate::ops::task_api::{ApiError, TaskApi, TaskIndex};

/// Task API over a durable store.
///
/// The store is the source of truth: after every mutation the whole index
/// is reloaded from it, partitioned by module, and re-sorted.
pub struct StoreTaskApi<S: TaskStore> {
    store: S,
    index: TaskIndex,
}

impl<S: TaskStore> StoreTaskApi<S> {
    /// Wrap `store` and load its tasks.
    pub fn new(store: S, sort_metric: SortMetric) -> Result<Self, ApiError> {
        let mut api = StoreTaskApi {
            store,
            index: TaskIndex::new(sort_metric),
        };
        api.refresh()?;
        Ok(api)
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: TaskStore> TaskApi for StoreTaskApi<S> {
    fn index(&self) -> &TaskIndex {
        &self.index
    }

    fn index_mut(&mut self) -> &mut TaskIndex {
        &mut self.index
    }

    fn refresh(&mut self) -> Result<(), ApiError> {
        let stored = self.store.load_all()?;
        self.index.rebuild(stored.into_all());
        Ok(())
    }

    fn add_new_task(&mut self, new: NewTask) -> Result<Task, ApiError> {
        let created = self.store.create(new)?;
        tracing::info!(uuid = %created.uuid, module = %created.module, "task added");
        self.refresh()?;
        Ok(created)
    }

    fn update_task(&mut self, task: &Task) -> Result<(), ApiError> {
        if self.index.find(task.uuid).is_none() {
            return Err(ApiError::NotFound(task.uuid));
        }
        self.store.update(task)?;
        tracing::info!(uuid = %task.uuid, status = %task.status, "task updated");
        self.refresh()
    }

    fn delete_at(&mut self, index: usize, module: &str) -> Result<(), ApiError> {
        let Some(uuid) = self.index.task_at(index, module).map(|t| t.uuid) else {
            return Ok(());
        };
        self.store.delete(uuid)?;
        tracing::info!(%uuid, module, "task deleted");
        self.refresh()
    }

    fn clear_tasks(&mut self) -> Result<(), ApiError> {
        Err(ApiError::ClearRefused)
    }
}
