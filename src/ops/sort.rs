use std::cmp::Reverse;

use crate::model::sort_metric::SortMetric;
use crate::model::task::{Priority, Task};

/// A sortable projection of a task
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    Rank(u8),
    Text(String),
}

fn id_key(task: &Task) -> SortKey {
    SortKey::Text(task.id.to_string())
}

fn description_key(task: &Task) -> SortKey {
    SortKey::Text(task.description.to_lowercase())
}

fn priority_key(task: &Task) -> SortKey {
    SortKey::Rank(Priority::rank(task.priority))
}

/// Key function and reverse flag for a metric.
///
/// Ids compare as text, so id `10` sorts before id `2`. Descriptions
/// ignore case. Priorities rank unset, H, M, L.
pub fn sort_params(metric: SortMetric) -> (fn(&Task) -> SortKey, bool) {
    let key: fn(&Task) -> SortKey = match metric {
        SortMetric::IdAscending | SortMetric::IdDescending => id_key,
        SortMetric::PriorityAscending | SortMetric::PriorityDescending => priority_key,
        SortMetric::DescriptionAscending | SortMetric::DescriptionDescending => description_key,
    };
    (key, metric.is_descending())
}

/// Stable sort by `metric`. Ties keep their current relative order in both
/// directions.
pub fn sort_tasks(tasks: &mut [Task], metric: SortMetric) {
    let (key, reverse) = sort_params(metric);
    if reverse {
        tasks.sort_by_cached_key(|t| Reverse(key(t)));
    } else {
        tasks.sort_by_cached_key(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn task(id: u64, description: &str, priority: Option<Priority>) -> Task {
        let mut t = Task::new(Uuid::new_v4(), description);
        t.id = id;
        t.priority = priority;
        t
    }

    fn descriptions(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.description.as_str()).collect()
    }

    #[test]
    fn test_priority_ascending_ranks_unset_first() {
        let mut tasks = vec![
            task(1, "low", Some(Priority::Low)),
            task(2, "high", Some(Priority::High)),
            task(3, "medium", Some(Priority::Medium)),
            task(4, "none", None),
        ];
        sort_tasks(&mut tasks, SortMetric::PriorityAscending);
        assert_eq!(descriptions(&tasks), vec!["none", "high", "medium", "low"]);

        sort_tasks(&mut tasks, SortMetric::PriorityDescending);
        assert_eq!(descriptions(&tasks), vec!["low", "medium", "high", "none"]);
    }

    #[test]
    fn test_description_ignores_case() {
        let mut tasks = vec![
            task(1, "banana", None),
            task(2, "Apple", None),
            task(3, "cherry", None),
        ];
        sort_tasks(&mut tasks, SortMetric::DescriptionAscending);
        assert_eq!(descriptions(&tasks), vec!["Apple", "banana", "cherry"]);

        sort_tasks(&mut tasks, SortMetric::DescriptionDescending);
        assert_eq!(descriptions(&tasks), vec!["cherry", "banana", "Apple"]);
    }

    #[test]
    fn test_id_sorts_as_text() {
        let mut tasks = vec![task(2, "two", None), task(10, "ten", None), task(1, "one", None)];
        sort_tasks(&mut tasks, SortMetric::IdAscending);
        assert_eq!(descriptions(&tasks), vec!["one", "ten", "two"]);
    }

    #[test]
    fn test_resort_is_idempotent() {
        let mut tasks = vec![
            task(1, "a", Some(Priority::High)),
            task(2, "b", Some(Priority::High)),
            task(3, "c", None),
            task(4, "d", Some(Priority::Low)),
            task(5, "e", Some(Priority::High)),
        ];
        for metric in SortMetric::ALL {
            sort_tasks(&mut tasks, metric);
            let once: Vec<Uuid> = tasks.iter().map(|t| t.uuid).collect();
            sort_tasks(&mut tasks, metric);
            let twice: Vec<Uuid> = tasks.iter().map(|t| t.uuid).collect();
            assert_eq!(once, twice, "{metric} is not idempotent");
        }
    }

    #[test]
    fn test_descending_keeps_ties_in_order() {
        let mut tasks = vec![
            task(1, "first", Some(Priority::High)),
            task(2, "second", Some(Priority::High)),
            task(3, "low", Some(Priority::Low)),
        ];
        sort_tasks(&mut tasks, SortMetric::PriorityDescending);
        assert_eq!(descriptions(&tasks), vec!["low", "first", "second"]);
    }
}
