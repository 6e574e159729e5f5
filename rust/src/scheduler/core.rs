//! Bounded best-first (branch-and-bound) search over partial schedules.

use std::cmp::Reverse;
use thiserror::Error;

use crate::config::SearchConfig;
use crate::heap::{Handle, IndexedHeap};
use crate::models::{
    ScheduleResult, ScheduleStatus, ScheduledTask, SearchStats, Task, PRIORITY_RANGE,
};
use crate::time::format_clock;
use crate::{log_checks, log_debug, log_progress};

use super::bound::lower_bound;
use super::feasibility::extend;
use super::state::PartialSchedule;

/// Errors raised when constructing a scheduler from invalid input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Task at position {position} carries index {index}")]
    IndexMismatch { position: usize, index: usize },
    #[error("Task {task} depends on unknown task {dependency}")]
    InvalidDependency { task: usize, dependency: usize },
    #[error("Task {task} has an inverted start window [{earliest}, {latest}]")]
    InvalidWindow {
        task: usize,
        earliest: i64,
        latest: i64,
    },
    #[error("Task {task} has a negative duration or cooldown")]
    NegativeDuration { task: usize },
    #[error("Task {task} has priority {priority}, expected 1 to 10")]
    InvalidPriority { task: usize, priority: i32 },
    #[error("Frontier bound must be at least 1")]
    EmptyFrontierBound,
}

/// Frontier ranking: estimate first, then deeper states among equal estimates.
type FrontierKey = (i64, Reverse<usize>);
/// Main frontier, best first.
type Frontier = IndexedHeap<FrontierKey, PartialSchedule>;
/// Eviction queue, worst first, pointing into the frontier.
type EvictionQueue = IndexedHeap<Reverse<FrontierKey>, Handle>;

fn frontier_key(score: i64, state: &PartialSchedule) -> FrontierKey {
    (score, Reverse(state.num_scheduled()))
}

/// Rebuild the eviction queue from the live frontier, dropping dead handles.
///
/// Entries are reinserted oldest first so ties are evicted in the same order.
fn compact_eviction(frontier: &Frontier, eviction: &mut EvictionQueue) {
    let mut live = IndexedHeap::with_capacity(frontier.len());
    for (handle, &key, _) in frontier.iter() {
        live.insert(Reverse(key), handle);
    }
    *eviction = live;
}

/// Best-first scheduler over a fixed task set.
pub struct BranchAndBoundScheduler {
    tasks: Vec<Task>,
    config: SearchConfig,
}

impl BranchAndBoundScheduler {
    /// Create a scheduler, validating the task list.
    pub fn new(mut tasks: Vec<Task>, config: SearchConfig) -> Result<Self, SchedulerError> {
        if config.max_frontier_size == 0 {
            return Err(SchedulerError::EmptyFrontierBound);
        }

        let n = tasks.len();
        for (position, task) in tasks.iter_mut().enumerate() {
            if task.index != position {
                return Err(SchedulerError::IndexMismatch {
                    position,
                    index: task.index,
                });
            }
            if task.duration < 0 || task.cooldown < 0 {
                return Err(SchedulerError::NegativeDuration { task: position });
            }
            if !PRIORITY_RANGE.contains(&task.priority) {
                return Err(SchedulerError::InvalidPriority {
                    task: position,
                    priority: task.priority,
                });
            }
            if let Some(&dependency) = task.dependencies.iter().find(|&&d| d >= n) {
                return Err(SchedulerError::InvalidDependency {
                    task: position,
                    dependency,
                });
            }
            if let Some(w) = task.windows.iter().find(|w| !w.is_valid()) {
                return Err(SchedulerError::InvalidWindow {
                    task: position,
                    earliest: w.earliest,
                    latest: w.latest,
                });
            }
            task.sort_windows();
        }

        Ok(Self { tasks, config })
    }

    /// Run the search to exhaustion or until every task is placed.
    pub fn schedule(&self) -> ScheduleResult {
        let verbosity = self.config.verbosity;
        let root = PartialSchedule::root(self.tasks.len(), self.config.global_start_time);

        let mut stats = SearchStats::default();
        let mut best = root.clone();
        let mut frontier: Frontier = IndexedHeap::new();
        let mut eviction: EvictionQueue = IndexedHeap::new();

        let key = frontier_key(0, &root);
        let handle = frontier.insert(key, root);
        eviction.insert(Reverse(key), handle);

        while let Some(((score, _), state)) = frontier.pop_min() {
            stats.steps += 1;

            if state.num_scheduled() > best.num_scheduled() {
                log_progress!(
                    verbosity,
                    "Step {}: best schedule now places {}/{} tasks (score={}, horizon={})",
                    stats.steps,
                    state.num_scheduled(),
                    self.tasks.len(),
                    score,
                    format_clock(state.frontier_end())
                );
                best = state.clone();
            }

            if best.is_complete() {
                break;
            }

            self.expand(&state, &mut frontier, &mut eviction, &mut stats);
            stats.peak_frontier = stats.peak_frontier.max(frontier.len());
            self.evict(&mut frontier, &mut eviction, &mut stats);
            if eviction.len() > 2 * frontier.len() {
                compact_eviction(&frontier, &mut eviction);
            }
        }

        log_progress!(
            verbosity,
            "Search finished. steps={} frontier={} evictions={}",
            stats.steps,
            frontier.len(),
            stats.evictions
        );

        self.build_result(&best, stats)
    }

    /// Push every feasible one-task extension of `state`.
    fn expand(
        &self,
        state: &PartialSchedule,
        frontier: &mut Frontier,
        eviction: &mut EvictionQueue,
        stats: &mut SearchStats,
    ) {
        let verbosity = self.config.verbosity;
        let rest_time = self.config.rest_time;

        for task_index in state.unscheduled() {
            let Some((next, start)) = extend(&self.tasks, state, task_index, rest_time) else {
                stats.infeasible_skips += 1;
                log_checks!(
                    verbosity,
                    "  Skipping task {} from horizon {}: not placeable yet",
                    task_index,
                    format_clock(state.frontier_end())
                );
                continue;
            };

            let score = lower_bound(&self.tasks, &next, rest_time);
            log_checks!(
                verbosity,
                "  Task {} fits at {} (depth={}, score={})",
                task_index,
                format_clock(start),
                next.num_scheduled(),
                score
            );

            let key = frontier_key(score, &next);
            let handle = frontier.insert(key, next);
            eviction.insert(Reverse(key), handle);
            stats.successors_generated += 1;
        }
    }

    /// Drop the worst-ranked states until the frontier fits its bound.
    ///
    /// The eviction queue is not updated when states leave the frontier through
    /// `pop_min`, so it may hold handles that are no longer live; those are
    /// skipped here and purged by [`compact_eviction`].
    fn evict(&self, frontier: &mut Frontier, eviction: &mut EvictionQueue, stats: &mut SearchStats) {
        while frontier.len() > self.config.max_frontier_size {
            let Some((Reverse((score, _)), handle)) = eviction.pop_min() else {
                break;
            };
            if frontier.remove(handle).is_some() {
                stats.evictions += 1;
                log_debug!(
                    self.config.verbosity,
                    "  Evicted state with score {} (frontier={})",
                    score,
                    frontier.len()
                );
            }
        }
    }

    fn build_result(&self, best: &PartialSchedule, stats: SearchStats) -> ScheduleResult {
        let schedule: Vec<ScheduledTask> = best
            .order()
            .into_iter()
            .filter_map(|i| {
                let end = best.end_time(i)?;
                Some(ScheduledTask {
                    task_index: i,
                    start: end - self.tasks[i].duration,
                    end,
                })
            })
            .collect();

        let incomplete_tasks: Vec<usize> = best.unscheduled().collect();
        let status = if incomplete_tasks.is_empty() {
            ScheduleStatus::Success
        } else {
            ScheduleStatus::Incomplete
        };
        let used_duration = schedule
            .iter()
            .map(|s| self.tasks[s.task_index].duration)
            .sum();

        ScheduleResult {
            status,
            schedule,
            incomplete_tasks,
            used_duration,
            total_duration: best.frontier_end() - self.config.global_start_time,
            stats,
        }
    }
}

/// Validate `tasks` and run one search with `config`.
pub fn make_schedule(
    tasks: Vec<Task>,
    config: &SearchConfig,
) -> Result<ScheduleResult, SchedulerError> {
    Ok(BranchAndBoundScheduler::new(tasks, config.clone())?.schedule())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimeWindow;

    fn run(tasks: Vec<Task>, config: SearchConfig) -> ScheduleResult {
        make_schedule(tasks, &config).unwrap()
    }

    /// Check every hard constraint of `result` against `tasks`.
    fn assert_valid(tasks: &[Task], config: &SearchConfig, result: &ScheduleResult) {
        for s in &result.schedule {
            let task = &tasks[s.task_index];
            assert_eq!(s.end - s.start, task.duration);
            assert!(s.start >= config.global_start_time);
            if let Some(deadline) = task.deadline {
                assert!(s.end <= deadline, "task {} misses deadline", s.task_index);
            }
            if !task.windows.is_empty() {
                assert!(
                    task.windows.iter().any(|w| w.contains(s.start)),
                    "task {} starts outside its windows",
                    s.task_index
                );
            }
            for &dep in &task.dependencies {
                let dep_sched = result.find(dep).expect("dependency must be scheduled");
                assert!(s.start >= dep_sched.end + tasks[dep].cooldown);
            }
        }
        assert!(result.schedule.windows(2).all(|w| w[0].end <= w[1].end));
        assert_eq!(
            result.schedule.len() + result.incomplete_tasks.len(),
            tasks.len()
        );
    }

    #[test]
    fn test_single_task() {
        let result = run(vec![Task::new(0, 1800)], SearchConfig::default());
        assert_eq!(result.status, ScheduleStatus::Success);
        assert_eq!(
            result.schedule,
            vec![ScheduledTask {
                task_index: 0,
                start: 0,
                end: 1800
            }]
        );
        assert_eq!(result.used_duration, 1800);
        assert_eq!(result.total_duration, 1800);
        assert!(result.incomplete_tasks.is_empty());
    }

    #[test]
    fn test_dependency_with_cooldown() {
        let tasks = vec![
            Task::new(0, 600).with_cooldown(300),
            Task::new(1, 600).with_dependencies(vec![0]),
        ];
        let config = SearchConfig::default();
        let result = run(tasks.clone(), config.clone());

        assert!(result.is_complete());
        let a = result.find(0).unwrap();
        let b = result.find(1).unwrap();
        assert_eq!((a.start, a.end), (0, 600));
        assert!(b.start >= 900);
        assert_eq!(b.end, b.start + 600);
        assert_valid(&tasks, &config, &result);
    }

    #[test]
    fn test_impossible_deadline_reported_incomplete() {
        let tasks = vec![Task::new(0, 3600).with_deadline(1800)];
        let config = SearchConfig::default().with_global_start_time(600);
        let result = run(tasks, config);

        assert_eq!(result.status, ScheduleStatus::Incomplete);
        assert!(result.schedule.is_empty());
        assert_eq!(result.incomplete_tasks, vec![0]);
        assert_eq!(result.used_duration, 0);
        assert_eq!(result.total_duration, 0);
        assert_eq!(result.utilization(), None);
    }

    #[test]
    fn test_frontier_bound_of_one_still_terminates() {
        let tasks = vec![Task::new(0, 600), Task::new(1, 900)];
        let config = SearchConfig::default().with_max_frontier_size(1);
        let result = run(tasks.clone(), config.clone());

        assert!(result.stats.evictions > 0);
        assert_valid(&tasks, &config, &result);
        assert!(result.is_complete());
    }

    #[test]
    fn test_rest_time_spacing() {
        let tasks = vec![Task::new(0, 600), Task::new(1, 600), Task::new(2, 600)];
        let config = SearchConfig::default()
            .with_global_start_time(8 * 3600)
            .with_rest_time(300);
        let result = run(tasks.clone(), config.clone());

        assert!(result.is_complete());
        assert_valid(&tasks, &config, &result);
        for pair in result.schedule.windows(2) {
            assert!(pair[1].start >= pair[0].end + 300);
        }
        assert_eq!(result.schedule[0].start, 8 * 3600 + 300);
    }

    #[test]
    fn test_window_and_deadline_respected() {
        let tasks = vec![
            Task::new(0, 1800).with_window(TimeWindow::new(3600, 4000)),
            Task::new(1, 600).with_deadline(1200),
            Task::new(2, 900).with_window(TimeWindow::starting_after(7200)),
        ];
        let config = SearchConfig::default();
        let result = run(tasks.clone(), config.clone());

        assert!(result.is_complete());
        assert_valid(&tasks, &config, &result);
        assert_eq!(result.find(0).unwrap().start, 3600);
        assert!(result.find(1).unwrap().end <= 1200);
        assert!(result.find(2).unwrap().start >= 7200);
    }

    #[test]
    fn test_deadline_task_scheduled_before_long_task() {
        let tasks = vec![
            Task::new(0, 7200),
            Task::new(1, 600).with_deadline(1800),
        ];
        let config = SearchConfig::default();
        let result = run(tasks.clone(), config.clone());

        assert!(result.is_complete());
        assert_valid(&tasks, &config, &result);
        assert_eq!(result.schedule[0].task_index, 1);
    }

    #[test]
    fn test_dependency_cycle_stalls() {
        let tasks = vec![
            Task::new(0, 600).with_dependencies(vec![1]),
            Task::new(1, 600).with_dependencies(vec![0]),
            Task::new(2, 300),
        ];
        let config = SearchConfig::default();
        let result = run(tasks.clone(), config.clone());

        assert_eq!(result.status, ScheduleStatus::Incomplete);
        assert_eq!(result.incomplete_tasks, vec![0, 1]);
        assert_eq!(result.find(2).map(|s| s.start), Some(0));
        assert_valid(&tasks, &config, &result);
    }

    #[test]
    fn test_many_to_many_dependencies() {
        let tasks = vec![
            Task::new(0, 600),
            Task::new(1, 900).with_cooldown(120),
            Task::new(2, 300).with_dependencies(vec![0, 1]),
            Task::new(3, 300).with_dependencies(vec![0, 1]),
        ];
        let config = SearchConfig::default().with_rest_time(60);
        let result = run(tasks.clone(), config.clone());

        assert!(result.is_complete());
        assert_valid(&tasks, &config, &result);
    }

    #[test]
    fn test_deterministic() {
        let tasks = vec![
            Task::new(0, 600).with_priority(3),
            Task::new(1, 1200).with_window(TimeWindow::new(1800, 5400)),
            Task::new(2, 300).with_deadline(4000),
            Task::new(3, 900).with_dependencies(vec![0]),
            Task::new(4, 450).with_cooldown(600),
        ];
        let config = SearchConfig::default()
            .with_rest_time(120)
            .with_max_frontier_size(8);
        let first = run(tasks.clone(), config.clone());
        let second = run(tasks.clone(), config.clone());
        assert_eq!(first, second);
        assert_valid(&tasks, &config, &first);
    }

    #[test]
    fn test_larger_frontier_does_not_lose_work() {
        // With one slot the search commits to the long task first, after which
        // the short task's window has closed.
        let tasks = vec![
            Task::new(0, 3600).with_priority(7),
            Task::new(1, 600)
                .with_priority(3)
                .with_window(TimeWindow::new(1800, 2400)),
            Task::new(2, 900)
                .with_priority(7)
                .with_window(TimeWindow::starting_after(3600)),
        ];

        let mut previous: Option<ScheduleResult> = None;
        for bound in [1, 2, 4, 16, 1000] {
            let config = SearchConfig::default().with_max_frontier_size(bound);
            let result = run(tasks.clone(), config.clone());
            assert_valid(&tasks, &config, &result);
            if let Some(prev) = &previous {
                assert!(result.schedule.len() >= prev.schedule.len());
                assert!(result.used_duration >= prev.used_duration);
            }
            previous = Some(result);
        }

        let small = run(
            tasks.clone(),
            SearchConfig::default().with_max_frontier_size(1),
        );
        let large = run(
            tasks.clone(),
            SearchConfig::default().with_max_frontier_size(1000),
        );
        assert_eq!(small.incomplete_tasks, vec![1]);
        assert_eq!(small.used_duration, 4500);
        assert!(large.is_complete());
        assert_eq!(large.used_duration, 5100);
        assert_eq!(large.find(1).map(|s| s.start), Some(1800));
    }

    #[test]
    fn test_negative_priority_rejected() {
        // A negative weight would turn the unplaceable-task penalty into a reward
        let tasks = vec![
            Task::new(0, 3600),
            Task::new(1, 600).with_deadline(1200).with_priority(-100),
        ];
        let config = SearchConfig::default().with_max_frontier_size(1);
        assert_eq!(
            make_schedule(tasks.clone(), &config).err(),
            Some(SchedulerError::InvalidPriority {
                task: 1,
                priority: -100
            })
        );

        let mut tasks = tasks;
        tasks[1].priority = 10;
        let result = run(tasks.clone(), config.clone());
        assert!(result.is_complete());
        assert_valid(&tasks, &config, &result);
    }

    #[test]
    fn test_compact_eviction_keeps_live_worst_first() {
        let mut frontier: Frontier = IndexedHeap::new();
        let mut eviction: EvictionQueue = IndexedHeap::new();
        let root = PartialSchedule::root(2, 0);
        for score in [40, 10, 30, 20, 30] {
            let key = (score, Reverse(0));
            let handle = frontier.insert(key, root.clone());
            eviction.insert(Reverse(key), handle);
        }
        // States leaving through pop_min leave dead handles behind
        frontier.pop_min();
        frontier.pop_min();
        assert_eq!(eviction.len(), 5);

        compact_eviction(&frontier, &mut eviction);
        assert_eq!(eviction.len(), frontier.len());

        let mut scores = Vec::new();
        while let Some((Reverse((score, _)), handle)) = eviction.pop_min() {
            assert!(frontier.contains(handle));
            scores.push(score);
        }
        assert_eq!(scores, vec![40, 30, 30]);
    }

    #[test]
    fn test_empty_task_list() {
        let result = run(vec![], SearchConfig::default());
        assert!(result.is_complete());
        assert!(result.schedule.is_empty());
        assert_eq!(result.search_steps(), 1);
    }

    #[test]
    fn test_invalid_dependency_rejected() {
        let tasks = vec![Task::new(0, 60).with_dependencies(vec![5])];
        let err = make_schedule(tasks, &SearchConfig::default()).err();
        assert_eq!(
            err,
            Some(SchedulerError::InvalidDependency {
                task: 0,
                dependency: 5
            })
        );
    }

    #[test]
    fn test_invalid_input_rejected() {
        let inverted = vec![Task::new(0, 60).with_window(TimeWindow::new(100, 50))];
        assert!(matches!(
            make_schedule(inverted, &SearchConfig::default()),
            Err(SchedulerError::InvalidWindow { task: 0, .. })
        ));

        let misplaced = vec![Task::new(1, 60)];
        assert!(matches!(
            make_schedule(misplaced, &SearchConfig::default()),
            Err(SchedulerError::IndexMismatch {
                position: 0,
                index: 1
            })
        ));

        let unranked = vec![Task::new(0, 60).with_priority(0)];
        assert_eq!(
            make_schedule(unranked, &SearchConfig::default()).err(),
            Some(SchedulerError::InvalidPriority {
                task: 0,
                priority: 0
            })
        );

        let no_room = SearchConfig::default().with_max_frontier_size(0);
        assert_eq!(
            make_schedule(vec![], &no_room).err(),
            Some(SchedulerError::EmptyFrontierBound)
        );
    }
}
