//! Optimistic completion estimate used to rank frontier states.

use crate::models::Task;

use super::feasibility::earliest_start_within_constraints;
use super::state::PartialSchedule;

/// Estimate the final horizon reachable from `state`.
///
/// Every unscheduled task is checked against its windows and deadline as if it
/// could start right at the current horizon. Reachable tasks add their duration
/// plus the rest buffer; unreachable ones add `duration * priority` as a penalty.
/// Tasks are treated independently, so this ranks states but is not an
/// admissible bound.
pub fn lower_bound(tasks: &[Task], state: &PartialSchedule, rest_time: i64) -> i64 {
    let horizon = state.frontier_end();
    let remaining: i64 = state
        .unscheduled()
        .filter_map(|i| tasks.get(i))
        .map(|task| match earliest_start_within_constraints(task, horizon) {
            Some(_) => task.duration.saturating_add(rest_time),
            None => task.duration.saturating_mul(task.priority as i64),
        })
        .fold(0i64, |acc, cost| acc.saturating_add(cost));
    horizon.saturating_add(remaining)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_state_scores_horizon() {
        let tasks = vec![Task::new(0, 600)];
        let state = PartialSchedule::root(1, 0).with_scheduled(0, 600);
        assert_eq!(lower_bound(&tasks, &state, 300), 600);
    }

    #[test]
    fn test_reachable_tasks_add_duration_and_rest() {
        let tasks = vec![Task::new(0, 600), Task::new(1, 1200), Task::new(2, 60)];
        let state = PartialSchedule::root(3, 0).with_scheduled(0, 600);
        assert_eq!(lower_bound(&tasks, &state, 100), 600 + (1200 + 100) + (60 + 100));
    }

    #[test]
    fn test_unreachable_task_penalized_by_priority() {
        let tasks = vec![
            Task::new(0, 600),
            Task::new(1, 100).with_deadline(500).with_priority(4),
        ];
        let state = PartialSchedule::root(2, 0).with_scheduled(0, 600);
        assert_eq!(lower_bound(&tasks, &state, 0), 600 + 400);
    }

    #[test]
    fn test_missing_a_task_scores_worse_than_placing_it() {
        // Placing the deadline task first keeps it; placing the long task first loses it
        let tasks = vec![
            Task::new(0, 3600),
            Task::new(1, 600).with_deadline(1200),
        ];
        let root = PartialSchedule::root(2, 0);
        let short_first = root.with_scheduled(1, 600);
        let long_first = root.with_scheduled(0, 3600);
        assert!(lower_bound(&tasks, &short_first, 0) < lower_bound(&tasks, &long_first, 0));
    }
}
