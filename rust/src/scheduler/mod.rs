//! Bounded best-first search for a single-track daily schedule.
//!
//! The search keeps a size-capped frontier of partial schedules ranked by an
//! optimistic estimate, repeatedly expanding the best one by every task that can
//! be placed next, and reports the most complete schedule it sees.

mod bound;
mod core;
mod feasibility;
mod state;

pub use bound::lower_bound;
pub use core::{make_schedule, BranchAndBoundScheduler, SchedulerError};
pub use feasibility::{
    earliest_feasible_start, earliest_start_after_dependencies, earliest_start_within_constraints,
    extend,
};
pub use state::PartialSchedule;
