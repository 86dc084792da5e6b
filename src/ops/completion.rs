use crate::model::config::{UNSET_PRIORITY_KEY, XpConfig};
use crate::model::task::{Priority, Task};

/// Experience points. Fractional because unprioritized tasks are worth 0.5.
pub type Xp = f64;

/// Base value for a task whose priority has no multiplier entry
pub const UNSET_PRIORITY_VALUE: Xp = 0.5;

/// XP awarded for completing a task with these attributes.
///
/// Starts from the priority multiplier (0.5 when the priority is unset or
/// missing from the table), then multiplies by every matching project and
/// tag multiplier in order. Stacking is multiplicative and uncapped.
pub fn completion_value(
    multipliers: &XpConfig,
    priority: Option<Priority>,
    projects: &[String],
    tags: &[String],
) -> Xp {
    let key = priority.map(Priority::code).unwrap_or(UNSET_PRIORITY_KEY);
    let mut value = multipliers
        .priorities
        .get(key)
        .copied()
        .unwrap_or(UNSET_PRIORITY_VALUE);

    for project in projects {
        if let Some(mult) = multipliers.projects.get(project) {
            value *= mult;
        }
    }
    for tag in tags {
        if let Some(mult) = multipliers.tags.get(tag) {
            value *= mult;
        }
    }
    value
}

/// `completion_value` for a task's own priority, project and tags
pub fn task_value(multipliers: &XpConfig, task: &Task) -> Xp {
    completion_value(multipliers, task.priority, &task.projects(), &task.tags)
}
