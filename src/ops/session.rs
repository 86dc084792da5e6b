use chrono::Utc;

use crate::model::config::XpConfig;
use crate::model::sort_metric::SortMetric;
use crate::model::task::{NewTask, Status, Task, TaskError};
use crate::ops::completion::Xp;
use crate::ops::task_api::{ApiError, TaskApi};
use crate::ops::xp_controller::XpController;

/// Error type for session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no task at index {index} in module {module}")]
    NoSuchTask { module: String, index: usize },
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

type TaskAddedHook = Box<dyn FnMut(&Task)>;
type BarsUpdatedHook = Box<dyn FnMut(&XpController)>;

/// The task repository and XP controller wired together.
///
/// Structural changes (add, edit, delete, new multipliers) trigger a full
/// bar recompute. Completion toggles take the incremental path instead.
/// Subscribers are told after each change.
pub struct Session {
    api: Box<dyn TaskApi>,
    xp: XpController,
    task_added: Vec<TaskAddedHook>,
    bars_updated: Vec<BarsUpdatedHook>,
}

impl Session {
    /// Wire `api` and `xp` together and bring the bars up to date.
    pub fn new(api: Box<dyn TaskApi>, mut xp: XpController) -> Self {
        xp.update_bars(api.index());
        Session {
            api,
            xp,
            task_added: Vec::new(),
            bars_updated: Vec::new(),
        }
    }

    pub fn api(&self) -> &dyn TaskApi {
        self.api.as_ref()
    }

    pub fn xp(&self) -> &XpController {
        &self.xp
    }

    pub fn on_task_added(&mut self, hook: impl FnMut(&Task) + 'static) {
        self.task_added.push(Box::new(hook));
    }

    pub fn on_bars_updated(&mut self, hook: impl FnMut(&XpController) + 'static) {
        self.bars_updated.push(Box::new(hook));
    }

    fn notify_bars(&mut self) {
        for hook in &mut self.bars_updated {
            hook(&self.xp);
        }
    }

    fn recompute(&mut self) {
        self.xp.update_bars(self.api.index());
        self.notify_bars();
    }

    fn task_at(&self, index: usize, module: &str) -> Result<Task, SessionError> {
        self.api
            .task_at(index, module)
            .cloned()
            .ok_or_else(|| SessionError::NoSuchTask {
                module: module.to_string(),
                index,
            })
    }

    pub fn add_module(&mut self, name: &str) {
        self.api.add_module(name);
    }

    pub fn add_task(&mut self, new: NewTask) -> Result<Task, SessionError> {
        let task = self.api.add_new_task(new)?;
        self.recompute();
        for hook in &mut self.task_added {
            hook(&task);
        }
        Ok(task)
    }

    /// Apply `FIELD=VALUE` style edits to the task at `index` and persist.
    pub fn edit_task(
        &mut self,
        index: usize,
        module: &str,
        fields: &[(String, String)],
    ) -> Result<Task, SessionError> {
        let mut task = self.task_at(index, module)?;
        for (field, value) in fields {
            task.set(field, value)?;
        }
        self.api.update_task(&task)?;
        self.recompute();
        Ok(task)
    }

    /// Delete the task at `index`. Returns the removed task, or `None` when
    /// the index was out of range.
    pub fn delete_at(&mut self, index: usize, module: &str) -> Result<Option<Task>, SessionError> {
        let removed = self.api.task_at(index, module).cloned();
        if removed.is_none() {
            return Ok(None);
        }
        self.api.delete_at(index, module)?;
        self.recompute();
        Ok(removed)
    }

    /// Mark the task at `index` completed or reopen it (pending, or waiting
    /// while a future `wait` date is set). Returns the XP applied to each
    /// relevant bar, or 0 if the status did not change.
    pub fn set_completed(
        &mut self,
        index: usize,
        module: &str,
        completed: bool,
    ) -> Result<Xp, SessionError> {
        let mut task = self.task_at(index, module)?;
        if task.is_completed() == completed {
            return Ok(0.0);
        }
        task.status = if completed {
            Status::Completed
        } else {
            task.reopened_status(Utc::now())
        };
        self.api.update_task(&task)?;
        let value = self.xp.on_task_toggled(&task, completed);
        self.notify_bars();
        Ok(value)
    }

    /// Replace the XP multipliers and re-score every task.
    pub fn apply_xp_config(&mut self, config: XpConfig) {
        self.xp.update_priority_mult_map(config, self.api.index());
        self.notify_bars();
    }

    pub fn set_sort_metric(&mut self, metric: SortMetric) {
        self.api.set_sort_metric(metric);
    }
}
