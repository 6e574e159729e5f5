//! Start-time feasibility checks and the one-task transition.

use crate::models::Task;

use super::state::PartialSchedule;

/// Earliest start allowed by the current horizon and the task's dependencies.
///
/// Returns `None` while any dependency is still unscheduled.
pub fn earliest_start_after_dependencies(
    tasks: &[Task],
    task: &Task,
    state: &PartialSchedule,
) -> Option<i64> {
    let mut start = state.frontier_end();
    for &dep in &task.dependencies {
        let dep_end = state.end_time(dep)?;
        let cooldown = tasks.get(dep).map_or(0, |t| t.cooldown);
        start = start.max(dep_end.saturating_add(cooldown));
    }
    Some(start)
}

/// Earliest start at or after `start` that satisfies windows and deadline.
///
/// Windows are scanned in order; the first one whose upper bound is not yet
/// passed is used, with the start clamped up to its lower bound.
pub fn earliest_start_within_constraints(task: &Task, start: i64) -> Option<i64> {
    let start = if task.windows.is_empty() {
        start
    } else {
        let window = task.windows.iter().find(|w| start <= w.latest)?;
        start.max(window.earliest)
    };

    if let Some(deadline) = task.deadline {
        if start.saturating_add(task.duration) > deadline {
            return None;
        }
    }
    Some(start)
}

/// Earliest feasible start for `task_index` from `state`, including the rest buffer.
pub fn earliest_feasible_start(
    tasks: &[Task],
    task_index: usize,
    state: &PartialSchedule,
    rest_time: i64,
) -> Option<i64> {
    let task = tasks.get(task_index)?;
    let start = earliest_start_after_dependencies(tasks, task, state)?;
    earliest_start_within_constraints(task, start.saturating_add(rest_time))
}

/// Place `task_index` at its earliest feasible start, producing a new state.
///
/// Returns the successor and the chosen start time, or `None` when infeasible.
pub fn extend(
    tasks: &[Task],
    state: &PartialSchedule,
    task_index: usize,
    rest_time: i64,
) -> Option<(PartialSchedule, i64)> {
    if state.is_scheduled(task_index) {
        return None;
    }
    let start = earliest_feasible_start(tasks, task_index, state, rest_time)?;
    let end = start.saturating_add(tasks[task_index].duration);
    Some((state.with_scheduled(task_index, end), start))
}
