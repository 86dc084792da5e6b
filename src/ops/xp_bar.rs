use std::collections::BTreeSet;

use crate::model::config::BarConfig;
use crate::model::task::{Priority, Task};
use crate::ops::completion::Xp;
use crate::ops::task_api::TaskIndex;

/// Fixed resolution of a bar regardless of its capacity, so a renderer can
/// animate between values smoothly.
pub const SCALE: u32 = 50_000;

/// Which tasks count toward a category bar
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BarAttributes {
    pub priority: Option<Priority>,
    pub project: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl BarAttributes {
    /// True when the task matches on any one criterion: same priority, same
    /// project, or the same set of tags. Unset criteria never match.
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(priority) = self.priority
            && task.priority == Some(priority)
        {
            return true;
        }
        if let Some(project) = &self.project
            && task.project.as_ref() == Some(project)
        {
            return true;
        }
        if let Some(tags) = &self.tags
            && !tags.is_empty()
            && same_tags(tags, &task.tags)
        {
            return true;
        }
        false
    }
}

/// Tag lists compare as sets: order and repeats do not matter.
fn same_tags(a: &[String], b: &[String]) -> bool {
    let a: BTreeSet<&str> = a.iter().map(String::as_str).collect();
    let b: BTreeSet<&str> = b.iter().map(String::as_str).collect();
    a == b
}

/// Split `total` into whole wraps of `max` and a remainder in `[0, max)`.
///
/// `rem_euclid` can round a tiny negative total up to exactly `max`; that
/// case is a remainder of 0 with no wrap.
fn wrap(total: Xp, max: Xp) -> (Xp, f64) {
    let mut wraps = (total / max).floor();
    let mut rem = total - wraps * max;
    if rem >= max {
        rem -= max;
        wraps += 1.0;
    }
    if rem < 0.0 {
        rem = 0.0;
    }
    (rem, wraps)
}

/// A wraparound XP counter.
///
/// `cur_xp` always stays in `[0, max_xp)`. Overflowing the capacity rolls
/// the counter over and bumps `level`.
#[derive(Debug, Clone, PartialEq)]
pub struct XpBar {
    name: String,
    max_xp: Xp,
    cur_xp: Xp,
    level: u64,
    completion_value: Xp,
    attributes: Option<BarAttributes>,
}

impl XpBar {
    pub fn new(name: impl Into<String>, completion_value: Xp) -> Self {
        XpBar {
            name: name.into(),
            max_xp: 1.0,
            cur_xp: 0.0,
            level: 0,
            completion_value,
            attributes: None,
        }
    }

    /// Build a category bar from its config entry.
    pub fn from_config(config: &BarConfig) -> Self {
        let mut bar = XpBar::new(config.name.clone(), config.completion_value);
        let tags = if config.tags.is_empty() {
            None
        } else {
            Some(config.tags.clone())
        };
        bar.set_attributes(config.priority, config.project.clone(), tags);
        bar
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_xp(&self) -> Xp {
        self.max_xp
    }

    pub fn cur_xp(&self) -> Xp {
        self.cur_xp
    }

    pub fn level(&self) -> u64 {
        self.level
    }

    pub fn completion_value(&self) -> Xp {
        self.completion_value
    }

    pub fn attributes(&self) -> Option<&BarAttributes> {
        self.attributes.as_ref()
    }

    /// Set the capacity. Zero (or less) becomes 1.
    pub fn set_max_xp(&mut self, value: Xp) {
        self.max_xp = if value <= 0.0 { 1.0 } else { value };
        self.cur_xp = wrap(self.cur_xp, self.max_xp).0;
    }

    /// Internal units per XP point
    pub fn scale(&self) -> f64 {
        f64::from(SCALE) / self.max_xp
    }

    /// Current fill in internal units, `0..SCALE`
    pub fn scaled_value(&self) -> u32 {
        (self.cur_xp * self.scale()).round().min(f64::from(SCALE)) as u32
    }

    /// Fill as a fraction in `[0, 1)`
    pub fn progress(&self) -> f64 {
        self.cur_xp / self.max_xp
    }

    /// Add XP, wrapping at capacity. Returns the number of levels gained.
    pub fn add_xp(&mut self, value: Xp) -> u64 {
        let (cur_xp, wraps) = wrap(self.cur_xp + value, self.max_xp);
        self.cur_xp = cur_xp;
        if wraps > 0.0 {
            self.level += wraps as u64;
            wraps as u64
        } else {
            self.level = self.level.saturating_sub((-wraps) as u64);
            0
        }
    }

    /// Remove XP, wrapping below zero. A wrap below zero drops a level.
    pub fn sub_xp(&mut self, value: Xp) {
        self.add_xp(-value);
    }

    /// Back to an empty counter at level 0
    pub fn reset_xp(&mut self) {
        self.cur_xp = 0.0;
        self.level = 0;
    }

    pub fn complete_task(&mut self) -> u64 {
        self.add_xp(self.completion_value)
    }

    pub fn uncomplete_task(&mut self) {
        self.sub_xp(self.completion_value);
    }

    /// Set the relevance filter. Later calls overwrite only the fields that
    /// differ.
    pub fn set_attributes(
        &mut self,
        priority: Option<Priority>,
        project: Option<String>,
        tags: Option<Vec<String>>,
    ) {
        let Some(attrs) = self.attributes.as_mut() else {
            self.attributes = Some(BarAttributes {
                priority,
                project,
                tags,
            });
            return;
        };
        if attrs.priority != priority {
            attrs.priority = priority;
        }
        if attrs.project != project {
            attrs.project = project;
        }
        if attrs.tags != tags {
            attrs.tags = tags;
        }
    }

    /// Whether the task counts toward this bar. Bars without attributes
    /// match nothing.
    pub fn is_relevant(&self, task: &Task) -> bool {
        self.attributes.as_ref().is_some_and(|a| a.matches(task))
    }

    /// Recompute from every task in the index: each matching task adds this
    /// bar's completion value to the capacity, and completed ones also to
    /// the earned total. Call `reset_xp` first.
    pub fn update_xp(&mut self, index: &TaskIndex) {
        let mut possible = 0.0;
        let mut earned = 0.0;
        for task in index.all_tasks().filter(|t| self.is_relevant(t)) {
            possible += self.completion_value;
            if task.is_completed() {
                earned += self.completion_value;
            }
        }
        self.set_max_xp(possible);
        self.add_xp(earned);
    }
}
