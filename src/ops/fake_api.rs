use chrono::Utc;
use uuid::Uuid;

use crate::model::sort_metric::SortMetric;
use crate::model::task::{NewTask, Task};
use crate::ops::task_api::{ApiError, TaskApi, TaskIndex};

/// In-memory task API for tests. Nothing is persisted; ids are handed out
/// sequentially and uuids are fresh per task.
pub struct FakeTaskApi {
    index: TaskIndex,
    next_id: u64,
}

impl FakeTaskApi {
    pub fn new(sort_metric: SortMetric) -> Self {
        FakeTaskApi {
            index: TaskIndex::new(sort_metric),
            next_id: 1,
        }
    }
}

impl Default for FakeTaskApi {
    fn default() -> Self {
        Self::new(SortMetric::default())
    }
}

impl TaskApi for FakeTaskApi {
    fn index(&self) -> &TaskIndex {
        &self.index
    }

    fn index_mut(&mut self) -> &mut TaskIndex {
        &mut self.index
    }

    fn refresh(&mut self) -> Result<(), ApiError> {
        self.index.resort();
        Ok(())
    }

    fn add_new_task(&mut self, new: NewTask) -> Result<Task, ApiError> {
        let task = new.into_task(Uuid::new_v4(), self.next_id, Utc::now());
        self.next_id += 1;
        self.index.insert(task.clone());
        self.index.resort();
        Ok(task)
    }

    fn update_task(&mut self, task: &Task) -> Result<(), ApiError> {
        let mut updated = task.clone();
        updated.modified = Some(Utc::now());
        self.index.replace(updated)?;
        self.index.resort();
        Ok(())
    }

    fn delete_at(&mut self, index: usize, module: &str) -> Result<(), ApiError> {
        self.index.remove_at(index, module);
        Ok(())
    }

    fn clear_tasks(&mut self) -> Result<(), ApiError> {
        self.index.clear();
        self.next_id = 1;
        Ok(())
    }
}
