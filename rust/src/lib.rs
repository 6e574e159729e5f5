//! Daily task scheduling by bounded best-first search.
//!
//! Tasks carry a duration, optional deadline and start windows, a cooldown
//! before dependents may begin, a priority, and dependencies on other tasks.
//! The search places as many tasks as it can on a single track without
//! breaking any hard constraint, within a bounded frontier.
//!
//! ```
//! use dayplan_rust::{make_schedule, SearchConfig, Task};
//!
//! let tasks = vec![
//!     Task::new(0, 600).with_cooldown(300),
//!     Task::new(1, 600).with_dependencies(vec![0]),
//! ];
//! let result = make_schedule(tasks, &SearchConfig::default()).unwrap();
//! assert!(result.is_complete());
//! assert!(result.find(1).unwrap().start >= 900);
//! ```

pub mod config;
pub mod heap;
pub mod labels;
pub mod logging;
mod models;
pub mod parser;
pub mod scheduler;
pub mod time;

#[cfg(feature = "python")]
mod python;

pub use config::{SearchConfig, DEFAULT_MAX_FRONTIER_SIZE};
pub use heap::{Handle, IndexedHeap};
pub use labels::LabelIndex;
pub use models::{
    ScheduleResult, ScheduleStatus, ScheduledTask, SearchStats, Task, TimeWindow,
    DEFAULT_PRIORITY, PRIORITY_RANGE,
};
pub use parser::{parse_line, parse_tasks, ParseError, ParsedTask, TaskList};
pub use scheduler::{make_schedule, BranchAndBoundScheduler, PartialSchedule, SchedulerError};
