use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Module every task lands in unless told otherwise
pub const DEFAULT_MODULE: &str = "Main";

/// Modules offered as one-click presets
pub const PRESET_MODULES: [&str; 3] = ["Workouts", "Personal Finance", "Programming Project"];

/// Error type for field parsing and assignment
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("invalid priority: {0} (expected H, M, L, or empty)")]
    InvalidPriority(String),
    #[error("invalid status: {0}")]
    InvalidStatus(String),
    #[error("invalid date: {0}")]
    InvalidDate(String),
    #[error("invalid id: {0}")]
    InvalidId(String),
    #[error("field cannot be changed: {0}")]
    Immutable(String),
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    #[serde(rename = "H")]
    High,
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "L")]
    Low,
}

impl Priority {
    /// The single-letter code used by Taskwarrior
    pub fn code(self) -> &'static str {
        match self {
            Priority::High => "H",
            Priority::Medium => "M",
            Priority::Low => "L",
        }
    }

    /// Sort rank: unset first, then High, Medium, Low
    pub fn rank(priority: Option<Priority>) -> u8 {
        match priority {
            None => 0,
            Some(Priority::High) => 1,
            Some(Priority::Medium) => 2,
            Some(Priority::Low) => 3,
        }
    }

    /// Parse an optional priority; the empty string means unset.
    pub fn parse_optional(s: &str) -> Result<Option<Priority>, TaskError> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("none") {
            return Ok(None);
        }
        s.parse().map(Some)
    }
}

impl FromStr for Priority {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "h" | "high" => Ok(Priority::High),
            "m" | "medium" => Ok(Priority::Medium),
            "l" | "low" => Ok(Priority::Low),
            _ => Err(TaskError::InvalidPriority(s.to_string())),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Task status, as tracked by the backing store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Pending,
    Completed,
    Deleted,
    Waiting,
    Recurring,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Completed => "completed",
            Status::Deleted => "deleted",
            Status::Waiting => "waiting",
            Status::Recurring => "recurring",
        }
    }
}

impl FromStr for Status {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Status::Pending),
            "completed" => Ok(Status::Completed),
            "deleted" => Ok(Status::Deleted),
            "waiting" => Ok(Status::Waiting),
            "recurring" => Ok(Status::Recurring),
            _ => Err(TaskError::InvalidStatus(s.to_string())),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A timestamped note attached to a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(with = "tw_date")]
    pub entry: DateTime<Utc>,
    pub description: String,
}

/// A task record in Taskwarrior export shape.
///
/// `uuid` is fixed at creation. `id` is the working-set ordinal handed out
/// by the backing store and may change between loads. Columns the model
/// does not know about are kept verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub uuid: Uuid,
    #[serde(default)]
    pub id: u64,
    pub description: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "tw_date::option")]
    pub due: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recur: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "tw_date::option")]
    pub entry: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "tw_date::option")]
    pub modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "tw_date::option")]
    pub end: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    /// The grid this task is shown in
    #[serde(default = "default_module")]
    pub module: String,
    /// Non-standard columns (user-defined attributes, and computed ones such
    /// as `urgency` in Taskwarrior exports), kept as raw JSON
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

fn default_module() -> String {
    DEFAULT_MODULE.to_string()
}

impl Task {
    /// Create a pending task in the default module
    pub fn new(uuid: Uuid, description: impl Into<String>) -> Self {
        Task {
            uuid,
            id: 0,
            description: description.into(),
            status: Status::Pending,
            priority: None,
            project: None,
            tags: Vec::new(),
            due: None,
            recur: None,
            entry: None,
            modified: None,
            end: None,
            annotations: Vec::new(),
            module: default_module(),
            extra: BTreeMap::new(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == Status::Completed
    }

    /// Status a completed task returns to when reopened: `waiting` while its
    /// `wait` date is still ahead, `pending` otherwise.
    pub fn reopened_status(&self, now: DateTime<Utc>) -> Status {
        match self.get("wait").map(|wait| parse_date(&wait)) {
            Some(Ok(wait)) if wait > now => Status::Waiting,
            _ => Status::Pending,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Add a tag, keeping the list free of duplicates
    pub fn add_tag(&mut self, tag: &str) {
        let tag = tag.trim().trim_start_matches('+');
        if !tag.is_empty() && !self.has_tag(tag) {
            self.tags.push(tag.to_string());
        }
    }

    /// Projects as a list. Taskwarrior projects are single-valued, so this
    /// is empty or holds one entry.
    pub fn projects(&self) -> Vec<String> {
        self.project.iter().cloned().collect()
    }

    /// Assign a field by name from its string form.
    ///
    /// Empty values clear optional fields. Unknown names are stored as
    /// non-standard columns.
    pub fn set(&mut self, field: &str, value: &str) -> Result<(), TaskError> {
        let value = value.trim();
        match field {
            "uuid" => return Err(TaskError::Immutable(field.to_string())),
            "id" => {
                self.id = value
                    .parse()
                    .map_err(|_| TaskError::InvalidId(value.to_string()))?;
            }
            "description" => self.description = value.to_string(),
            "status" => self.status = value.parse()?,
            "priority" => self.priority = Priority::parse_optional(value)?,
            "project" => self.project = non_empty(value),
            "tags" => {
                self.tags.clear();
                for tag in value.split(|c: char| c == ',' || c.is_whitespace()) {
                    self.add_tag(tag);
                }
            }
            "due" => self.due = parse_optional_date(value)?,
            "recur" => self.recur = non_empty(value),
            "entry" => self.entry = parse_optional_date(value)?,
            "modified" => self.modified = parse_optional_date(value)?,
            "end" => self.end = parse_optional_date(value)?,
            "module" => {
                self.module = if value.is_empty() {
                    default_module()
                } else {
                    value.to_string()
                };
            }
            _ => {
                if value.is_empty() {
                    self.extra.remove(field);
                } else {
                    self.extra
                        .insert(field.to_string(), Value::String(value.to_string()));
                }
            }
        }
        Ok(())
    }

    /// Read a field by name in its string form; `None` when unset.
    pub fn get(&self, field: &str) -> Option<String> {
        match field {
            "uuid" => Some(self.uuid.to_string()),
            "id" => Some(self.id.to_string()),
            "description" => Some(self.description.clone()),
            "status" => Some(self.status.to_string()),
            "priority" => self.priority.map(|p| p.to_string()),
            "project" => self.project.clone(),
            "tags" if self.tags.is_empty() => None,
            "tags" => Some(self.tags.join(",")),
            "due" => self.due.map(tw_date::format),
            "recur" => self.recur.clone(),
            "entry" => self.entry.map(tw_date::format),
            "modified" => self.modified.map(tw_date::format),
            "end" => self.end.map(tw_date::format),
            "module" => Some(self.module.clone()),
            _ => self.extra.get(field).map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
        }
    }
}

/// Everything needed to create a task; the store fills in identity.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub description: String,
    pub tags: Vec<String>,
    pub module: String,
    pub priority: Option<Priority>,
    pub project: Option<String>,
    pub due: Option<DateTime<Utc>>,
    pub recur: Option<String>,
    pub nonstandard_cols: BTreeMap<String, String>,
}

impl NewTask {
    pub fn new(description: impl Into<String>) -> Self {
        NewTask {
            description: description.into(),
            tags: Vec::new(),
            module: default_module(),
            priority: None,
            project: None,
            due: None,
            recur: None,
            nonstandard_cols: BTreeMap::new(),
        }
    }

    pub fn in_module(mut self, module: impl Into<String>) -> Self {
        self.module = module.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_due(mut self, due: DateTime<Utc>) -> Self {
        self.due = Some(due);
        self
    }

    pub fn with_column(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.nonstandard_cols.insert(key.into(), value.into());
        self
    }

    /// Build the task record with a store-assigned identity.
    pub fn into_task(self, uuid: Uuid, id: u64, now: DateTime<Utc>) -> Task {
        let mut task = Task::new(uuid, self.description);
        task.id = id;
        for tag in &self.tags {
            task.add_tag(tag);
        }
        task.module = if self.module.is_empty() {
            default_module()
        } else {
            self.module
        };
        task.priority = self.priority;
        task.project = self.project.filter(|p| !p.is_empty());
        task.due = self.due;
        task.recur = self.recur.filter(|r| !r.is_empty());
        task.entry = Some(now);
        task.modified = Some(now);
        task.extra = self
            .nonstandard_cols
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        task
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn parse_optional_date(value: &str) -> Result<Option<DateTime<Utc>>, TaskError> {
    if value.is_empty() {
        return Ok(None);
    }
    parse_date(value).map(Some)
}

/// Parse `YYYY-MM-DD`, RFC 3339, or Taskwarrior's compact `YYYYMMDDTHHMMSSZ`.
pub fn parse_date(value: &str) -> Result<DateTime<Utc>, TaskError> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        && let Some(midnight) = date.and_hms_opt(0, 0, 0)
    {
        return Ok(midnight.and_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    tw_date::parse(value).map_err(|_| TaskError::InvalidDate(value.to_string()))
}

/// Taskwarrior's compact UTC timestamp format
pub mod tw_date {
    use super::*;
    use serde::{Deserializer, Serializer};

    const FORMAT: &str = "%Y%m%dT%H%M%SZ";

    pub fn format(dt: DateTime<Utc>) -> String {
        dt.format(FORMAT).to_string()
    }

    pub fn parse(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        NaiveDateTime::parse_from_str(s, FORMAT).map(|naive| naive.and_utc())
    }

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(*dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse(&s).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            dt: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match dt {
                Some(dt) => serializer.serialize_str(&format(*dt)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let s = Option::<String>::deserialize(deserializer)?;
            s.map(|s| parse(&s).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}
