use crate::model::config::{BarConfig, XpConfig};
use crate::model::task::Task;
use crate::ops::completion::{self, Xp};
use crate::ops::task_api::TaskIndex;
use crate::ops::xp_bar::{BarAttributes, XpBar};

pub const MAIN_BAR_NAME: &str = "Main XP Bar";

/// Capacity of a freshly created main bar, before the first recompute
const INITIAL_MAIN_MAX_XP: Xp = 5.0;

/// Handle to one bar owned by an `XpController`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarId {
    Main,
    Category(usize),
}

/// Owns the XP multipliers, the main bar and every category bar, and keeps
/// them consistent with the task repository.
#[derive(Debug, Clone)]
pub struct XpController {
    multipliers: XpConfig,
    main_bar: XpBar,
    bars: Vec<XpBar>,
}

impl XpController {
    pub fn new(multipliers: XpConfig) -> Self {
        let mut main_bar = XpBar::new(MAIN_BAR_NAME, 1.0);
        main_bar.set_max_xp(INITIAL_MAIN_MAX_XP);
        XpController {
            multipliers,
            main_bar,
            bars: Vec::new(),
        }
    }

    /// Controller with one category bar per config entry
    pub fn with_bars(multipliers: XpConfig, bars: &[BarConfig]) -> Self {
        let mut controller = XpController::new(multipliers);
        controller
            .bars
            .extend(bars.iter().map(XpBar::from_config));
        controller
    }

    pub fn multipliers(&self) -> &XpConfig {
        &self.multipliers
    }

    pub fn main_bar(&self) -> &XpBar {
        &self.main_bar
    }

    pub fn bars(&self) -> &[XpBar] {
        &self.bars
    }

    pub fn bar(&self, id: BarId) -> Option<&XpBar> {
        match id {
            BarId::Main => Some(&self.main_bar),
            BarId::Category(i) => self.bars.get(i),
        }
    }

    fn bar_mut(&mut self, id: BarId) -> Option<&mut XpBar> {
        match id {
            BarId::Main => Some(&mut self.main_bar),
            BarId::Category(i) => self.bars.get_mut(i),
        }
    }

    /// XP for completing `task` under the current multipliers
    pub fn task_value(&self, task: &Task) -> Xp {
        completion::task_value(&self.multipliers, task)
    }

    /// Register a category bar. A bar without attributes is kept but never
    /// counts any task.
    pub fn add_xp_bar(
        &mut self,
        name: &str,
        attributes: Option<BarAttributes>,
        completion_value: Xp,
        max_xp: Xp,
    ) -> BarId {
        let mut bar = XpBar::new(name, completion_value);
        if let Some(attrs) = attributes {
            bar.set_attributes(attrs.priority, attrs.project, attrs.tags);
        }
        bar.set_max_xp(max_xp);
        tracing::debug!(name = bar.name(), max_xp = bar.max_xp(), "xp bar added");
        self.bars.push(bar);
        BarId::Category(self.bars.len() - 1)
    }

    /// Register a bar that tracks tasks like `task`: same priority, same
    /// project, or the same tags. Its completion value is the task's own.
    pub fn add_xp_bar_for_task(&mut self, task: &Task, max_xp: Xp, title: &str) -> BarId {
        let attributes = BarAttributes {
            priority: task.priority,
            project: task.project.clone(),
            tags: (!task.tags.is_empty()).then(|| task.tags.clone()),
        };
        let value = self.task_value(task);
        self.add_xp_bar(title, Some(attributes), value, max_xp)
    }

    /// Ids of the category bars `task` counts toward, then the main bar.
    pub fn relevant_bar_ids(&self, task: &Task) -> Vec<BarId> {
        let mut ids: Vec<BarId> = self
            .bars
            .iter()
            .enumerate()
            .filter(|(_, bar)| bar.is_relevant(task))
            .map(|(i, _)| BarId::Category(i))
            .collect();
        ids.push(BarId::Main);
        ids
    }

    /// The bars `task` counts toward. The main bar is always last.
    pub fn get_relevant_xp_bars(&self, task: &Task) -> Vec<&XpBar> {
        self.relevant_bar_ids(task)
            .into_iter()
            .filter_map(|id| self.bar(id))
            .collect()
    }

    /// Recompute every bar from scratch against the repository.
    ///
    /// Category bars count their own completion value per matching task.
    /// The main bar's capacity is the resolved value of every task in every
    /// module, and its fill is the same sum over completed tasks.
    pub fn update_bars(&mut self, index: &TaskIndex) {
        for bar in &mut self.bars {
            bar.reset_xp();
            bar.update_xp(index);
        }

        let mut possible = 0.0;
        let mut earned = 0.0;
        for task in index.all_tasks() {
            let value = self.task_value(task);
            possible += value;
            if task.is_completed() {
                earned += value;
            }
        }
        self.main_bar.reset_xp();
        self.main_bar.set_max_xp(possible);
        self.main_bar.add_xp(earned);

        tracing::debug!(
            bars = self.bars.len() + 1,
            main_max = self.main_bar.max_xp(),
            main_cur = self.main_bar.cur_xp(),
            "xp bars recomputed"
        );
    }

    /// Swap in new multipliers and recompute every bar.
    pub fn update_priority_mult_map(&mut self, multipliers: XpConfig, index: &TaskIndex) {
        self.multipliers = multipliers;
        self.update_bars(index);
    }

    /// Apply a completion toggle to every relevant bar: add the task's
    /// resolved value when it became completed, subtract it otherwise.
    /// Returns the value applied.
    pub fn on_task_toggled(&mut self, task: &Task, completed: bool) -> Xp {
        let value = self.task_value(task);
        for id in self.relevant_bar_ids(task) {
            let Some(bar) = self.bar_mut(id) else {
                continue;
            };
            if completed {
                let levels = bar.add_xp(value);
                if levels > 0 {
                    tracing::info!(bar = bar.name(), level = bar.level(), "level up");
                }
            } else {
                bar.sub_xp(value);
            }
        }
        value
    }
}
