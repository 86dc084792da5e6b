use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::sort_metric::SortMetric;
use super::task::Priority;

/// Key in the priority multiplier table used for tasks with no priority
pub const UNSET_PRIORITY_KEY: &str = "none";

/// Application settings from config.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Ordering applied to every module
    #[serde(default)]
    pub sort: SortMetric,
    /// Modules shown even before they hold any task
    #[serde(default)]
    pub modules: Vec<String>,
    /// Task store file, relative to the data directory
    #[serde(default = "default_store_file")]
    pub store: String,
    /// XP multiplier file, relative to the data directory
    #[serde(default = "default_xp_config_file")]
    pub xp_config: String,
    /// Category XP bars
    #[serde(default)]
    pub bars: Vec<BarConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            sort: SortMetric::default(),
            modules: Vec::new(),
            store: default_store_file(),
            xp_config: default_xp_config_file(),
            bars: Vec::new(),
        }
    }
}

fn default_store_file() -> String {
    "tasks.json".to_string()
}

fn default_xp_config_file() -> String {
    "user_defined_xp.json".to_string()
}

/// A category XP bar definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// XP each matching task is worth toward this bar
    #[serde(default = "default_completion_value")]
    pub completion_value: f64,
}

fn default_completion_value() -> f64 {
    1.0
}

/// XP multiplier tables, persisted as user_defined_xp.json.
///
/// Priority keys are `H`, `M`, `L`, and optionally `none`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XpConfig {
    pub priorities: IndexMap<String, f64>,
    #[serde(default)]
    pub tags: IndexMap<String, f64>,
    #[serde(default)]
    pub projects: IndexMap<String, f64>,
}

impl Default for XpConfig {
    fn default() -> Self {
        let mut priorities = IndexMap::new();
        priorities.insert(Priority::High.code().to_string(), 10.0);
        priorities.insert(Priority::Medium.code().to_string(), 5.0);
        priorities.insert(Priority::Low.code().to_string(), 1.0);
        XpConfig {
            priorities,
            tags: IndexMap::new(),
            projects: IndexMap::new(),
        }
    }
}
