use serde::Serialize;

use crate::model::task::{Priority, Status, Task};
use crate::ops::completion::Xp;
use crate::ops::xp_bar::XpBar;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    /// 1-based position in the module listing
    pub index: usize,
    pub id: u64,
    pub uuid: String,
    pub description: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<String>,
    pub module: String,
}

#[derive(Serialize)]
pub struct ModuleListJson {
    pub module: String,
    pub tasks: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct ModuleInfoJson {
    pub name: String,
    pub tasks: usize,
    pub completed: usize,
}

#[derive(Serialize)]
pub struct BarJson {
    pub name: String,
    pub level: u64,
    pub cur_xp: Xp,
    pub max_xp: Xp,
    pub progress: f64,
}

#[derive(Serialize)]
pub struct XpJson {
    pub main: BarJson,
    pub bars: Vec<BarJson>,
}

#[derive(Serialize)]
pub struct ToggleJson {
    pub task: TaskJson,
    pub xp: Xp,
    pub bars: Vec<BarJson>,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn task_to_json(task: &Task, index: usize) -> TaskJson {
    TaskJson {
        index: index + 1,
        id: task.id,
        uuid: task.uuid.to_string(),
        description: task.description.clone(),
        status: task.status,
        priority: task.priority,
        project: task.project.clone(),
        tags: task.tags.clone(),
        due: task.due.map(|d| d.format("%Y-%m-%d").to_string()),
        module: task.module.clone(),
    }
}

pub fn bar_to_json(bar: &XpBar) -> BarJson {
    BarJson {
        name: bar.name().to_string(),
        level: bar.level(),
        cur_xp: bar.cur_xp(),
        max_xp: bar.max_xp(),
        progress: bar.progress(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

const BAR_WIDTH: usize = 20;

fn status_char(status: Status) -> char {
    match status {
        Status::Completed => 'x',
        Status::Deleted => '-',
        Status::Waiting => 'w',
        Status::Recurring => 'r',
        Status::Pending => ' ',
    }
}

/// Format a single task as a one-line summary
pub fn format_task_line(task: &Task, index: usize) -> String {
    let mut line = format!(
        "{:>3}. [{}] {}",
        index + 1,
        status_char(task.status),
        task.description
    );
    if let Some(p) = task.priority {
        line.push_str(&format!(" !{}", p));
    }
    if let Some(ref project) = task.project {
        line.push_str(&format!(" @{}", project));
    }
    for tag in &task.tags {
        line.push_str(&format!(" +{}", tag));
    }
    if let Some(due) = task.due {
        line.push_str(&format!(" due:{}", due.format("%Y-%m-%d")));
    }
    line
}

/// Format a module listing: header, then one line per task
pub fn format_module_listing(module: &str, tasks: &[Task]) -> Vec<String> {
    let mut lines = vec![format!("== {} ==", module)];
    if tasks.is_empty() {
        lines.push("  (no tasks)".to_string());
    }
    for (i, task) in tasks.iter().enumerate() {
        lines.push(format_task_line(task, i));
    }
    lines
}

/// Format a bar as `name  lvl N  [#####-----]  cur/max`
pub fn format_bar(bar: &XpBar) -> String {
    let filled = ((bar.progress() * BAR_WIDTH as f64).floor() as usize).min(BAR_WIDTH);
    format!(
        "{:<20} lvl {:<3} [{}{}] {}/{}",
        bar.name(),
        bar.level(),
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        format_xp(bar.cur_xp()),
        format_xp(bar.max_xp())
    )
}

/// Whole numbers without a trailing `.0`
pub fn format_xp(xp: Xp) -> String {
    if xp.fract() == 0.0 {
        format!("{}", xp as i64)
    } else {
        format!("{:.2}", xp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_task_line() {
        let mut task = Task::new(Uuid::nil(), "Run 5k");
        task.priority = Some(Priority::High);
        task.project = Some("Health".into());
        task.tags = vec!["outdoor".into()];
        assert_eq!(format_task_line(&task, 0), "  1. [ ] Run 5k !H @Health +outdoor");

        task.status = Status::Completed;
        task.priority = None;
        task.project = None;
        task.tags.clear();
        assert_eq!(format_task_line(&task, 11), " 12. [x] Run 5k");
    }

    #[test]
    fn test_bar_rendering() {
        let mut bar = XpBar::new("Main XP Bar", 1.0);
        bar.set_max_xp(10.0);
        bar.add_xp(5.0);
        let line = format_bar(&bar);
        assert!(line.contains("[##########----------]"));
        assert!(line.ends_with("5/10"));
    }

    #[test]
    fn test_format_xp() {
        assert_eq!(format_xp(10.0), "10");
        assert_eq!(format_xp(0.5), "0.50");
    }
}
