use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How a module's task list is ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortMetric {
    IdAscending,
    IdDescending,
    PriorityAscending,
    PriorityDescending,
    #[default]
    DescriptionAscending,
    DescriptionDescending,
}

impl SortMetric {
    pub const ALL: [SortMetric; 6] = [
        SortMetric::IdAscending,
        SortMetric::IdDescending,
        SortMetric::PriorityAscending,
        SortMetric::PriorityDescending,
        SortMetric::DescriptionAscending,
        SortMetric::DescriptionDescending,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortMetric::IdAscending => "id-ascending",
            SortMetric::IdDescending => "id-descending",
            SortMetric::PriorityAscending => "priority-ascending",
            SortMetric::PriorityDescending => "priority-descending",
            SortMetric::DescriptionAscending => "description-ascending",
            SortMetric::DescriptionDescending => "description-descending",
        }
    }

    /// Whether this metric orders largest-first
    pub fn is_descending(self) -> bool {
        matches!(
            self,
            SortMetric::IdDescending
                | SortMetric::PriorityDescending
                | SortMetric::DescriptionDescending
        )
    }
}

impl fmt::Display for SortMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase().replace('_', "-");
        match s.as_str() {
            "id" | "id-asc" => return Ok(SortMetric::IdAscending),
            "id-desc" => return Ok(SortMetric::IdDescending),
            "priority" | "priority-asc" => return Ok(SortMetric::PriorityAscending),
            "priority-desc" => return Ok(SortMetric::PriorityDescending),
            "description" | "description-asc" => return Ok(SortMetric::DescriptionAscending),
            "description-desc" => return Ok(SortMetric::DescriptionDescending),
            _ => {}
        }
        SortMetric::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "invalid sort metric: {} (expected one of: {})",
                    s,
                    SortMetric::ALL.map(|m| m.as_str()).join(", ")
                )
            })
    }
}
