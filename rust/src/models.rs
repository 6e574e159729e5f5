//! Core data types for the scheduling system.
//!
//! All times are integer seconds since local midnight.

use std::fmt;
use std::ops::RangeInclusive;

/// Valid task priorities, lowest urgency first.
pub const PRIORITY_RANGE: RangeInclusive<i32> = 1..=10;
/// Default priority for tasks without an explicit one.
pub const DEFAULT_PRIORITY: i32 = 10;

/// Closed interval `[earliest, latest]` during which a task may start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimeWindow {
    pub earliest: i64,
    pub latest: i64,
}

impl TimeWindow {
    pub fn new(earliest: i64, latest: i64) -> Self {
        Self { earliest, latest }
    }

    /// Window with only a lower bound.
    pub fn starting_after(earliest: i64) -> Self {
        Self::new(earliest, i64::MAX)
    }

    /// Window with only an upper bound.
    pub fn starting_before(latest: i64) -> Self {
        Self::new(0, latest)
    }

    #[inline]
    pub fn contains(&self, t: i64) -> bool {
        self.earliest <= t && t <= self.latest
    }

    pub fn is_valid(&self) -> bool {
        self.earliest <= self.latest
    }
}

/// A task to be scheduled, with dependencies already resolved to indices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Task {
    /// Position in the task list.
    pub index: usize,
    pub duration: i64,
    /// Minimum gap between this task's end and the start of any dependent.
    pub cooldown: i64,
    /// The task must end no later than this.
    pub deadline: Option<i64>,
    /// Penalty weight applied when the task cannot be placed.
    pub priority: i32,
    /// Allowed start windows, sorted by `earliest`. Empty means unconstrained.
    pub windows: Vec<TimeWindow>,
    /// Tasks that must finish before this one starts.
    pub dependencies: Vec<usize>,
}

impl Task {
    pub fn new(index: usize, duration: i64) -> Self {
        Self {
            index,
            duration,
            cooldown: 0,
            deadline: None,
            priority: DEFAULT_PRIORITY,
            windows: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_cooldown(mut self, cooldown: i64) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn with_deadline(mut self, deadline: i64) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Add a start window, keeping windows sorted by their earliest start.
    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.windows.push(window);
        self.sort_windows();
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<usize>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub(crate) fn sort_windows(&mut self) {
        self.windows.sort_by_key(|w| (w.earliest, w.latest));
    }

    /// One-line description of the timing constraints.
    pub fn summary(&self) -> String {
        let mut s = format!("(dur={},cd={},", self.duration, self.cooldown);
        if let Some(deadline) = self.deadline {
            s.push_str(&format!("ddl={},", deadline));
        }
        if !self.windows.is_empty() {
            s.push_str("win=");
            for w in &self.windows {
                if w.latest == i64::MAX {
                    s.push_str(&format!("({},inf)", w.earliest));
                } else {
                    s.push_str(&format!("({},{})", w.earliest, w.latest));
                }
            }
            s.push(',');
        }
        s.push_str(&format!("pr={})", self.priority));
        s
    }
}

/// A task placed in the output schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduledTask {
    pub task_index: usize,
    pub start: i64,
    pub end: i64,
}

/// Final outcome of a search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScheduleStatus {
    /// Every task was placed.
    Success,
    /// Some tasks could not be placed; see `ScheduleResult::incomplete_tasks`.
    Incomplete,
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleStatus::Success => write!(f, "success"),
            ScheduleStatus::Incomplete => write!(f, "incomplete"),
        }
    }
}

/// Counters collected while searching.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// States popped from the frontier.
    pub steps: u64,
    /// Successor states pushed onto the frontier.
    pub successors_generated: u64,
    /// Transitions rejected by dependency, window or deadline checks.
    pub infeasible_skips: u64,
    /// States dropped to keep the frontier within its bound.
    pub evictions: u64,
    /// Largest frontier size seen after an expansion (before eviction).
    pub peak_frontier: usize,
}

/// Result of a scheduling run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduleResult {
    pub status: ScheduleStatus,
    /// Scheduled tasks sorted by end time.
    pub schedule: Vec<ScheduledTask>,
    /// Tasks never placed (empty on success).
    pub incomplete_tasks: Vec<usize>,
    /// Sum of the durations of scheduled tasks.
    pub used_duration: i64,
    /// Horizon of the best schedule minus the global start time.
    pub total_duration: i64,
    pub stats: SearchStats,
}

impl ScheduleResult {
    pub fn is_complete(&self) -> bool {
        self.status == ScheduleStatus::Success
    }

    pub fn search_steps(&self) -> u64 {
        self.stats.steps
    }

    /// Fraction of the horizon spent on task work; `None` for an empty horizon.
    pub fn utilization(&self) -> Option<f64> {
        if self.total_duration <= 0 {
            return None;
        }
        Some(self.used_duration as f64 / self.total_duration as f64)
    }

    pub fn find(&self, task_index: usize) -> Option<&ScheduledTask> {
        self.schedule.iter().find(|s| s.task_index == task_index)
    }
}
