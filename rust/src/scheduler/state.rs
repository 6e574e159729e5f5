//! Partial-schedule snapshots explored by the search.

/// Snapshot of which tasks are placed and when they end.
///
/// States are never mutated after creation: [`PartialSchedule::with_scheduled`]
/// returns a fresh copy, so sibling branches of the search tree can live in the
/// frontier side by side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartialSchedule {
    num_scheduled: usize,
    /// End time per task; `None` while unscheduled.
    end_times: Vec<Option<i64>>,
    /// Latest end time among scheduled tasks (the global start for the root).
    frontier_end: i64,
}

impl PartialSchedule {
    /// All-unscheduled root state.
    pub fn root(num_tasks: usize, global_start_time: i64) -> Self {
        Self {
            num_scheduled: 0,
            end_times: vec![None; num_tasks],
            frontier_end: global_start_time,
        }
    }

    #[inline]
    pub fn num_scheduled(&self) -> usize {
        self.num_scheduled
    }

    #[inline]
    pub fn frontier_end(&self) -> i64 {
        self.frontier_end
    }

    #[inline]
    pub fn end_time(&self, task_index: usize) -> Option<i64> {
        self.end_times.get(task_index).copied().flatten()
    }

    #[inline]
    pub fn is_scheduled(&self, task_index: usize) -> bool {
        self.end_time(task_index).is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.num_scheduled == self.end_times.len()
    }

    pub fn unscheduled(&self) -> impl Iterator<Item = usize> + '_ {
        self.end_times
            .iter()
            .enumerate()
            .filter(|(_, end)| end.is_none())
            .map(|(i, _)| i)
    }

    /// New state with `task_index` placed so that it ends at `end`.
    ///
    /// The task must not be scheduled yet.
    pub fn with_scheduled(&self, task_index: usize, end: i64) -> Self {
        debug_assert!(!self.is_scheduled(task_index));
        let mut next = self.clone();
        next.end_times[task_index] = Some(end);
        next.num_scheduled += 1;
        next.frontier_end = next.frontier_end.max(end);
        next
    }

    /// Scheduled task indices ordered by end time (ties by index).
    pub fn order(&self) -> Vec<usize> {
        let mut pairs: Vec<(i64, usize)> = self
            .end_times
            .iter()
            .enumerate()
            .filter_map(|(i, end)| end.map(|e| (e, i)))
            .collect();
        pairs.sort_unstable();
        pairs.into_iter().map(|(_, i)| i).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_state() {
        let root = PartialSchedule::root(3, 3600);
        assert_eq!(root.num_scheduled(), 0);
        assert_eq!(root.frontier_end(), 3600);
        assert!(!root.is_complete());
        assert_eq!(root.unscheduled().collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_transition_leaves_parent_untouched() {
        let root = PartialSchedule::root(2, 0);
        let child = root.with_scheduled(1, 900);

        assert_eq!(root.num_scheduled(), 0);
        assert!(!root.is_scheduled(1));

        assert_eq!(child.num_scheduled(), 1);
        assert_eq!(child.end_time(1), Some(900));
        assert_eq!(child.frontier_end(), 900);
        assert_eq!(child.unscheduled().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_frontier_end_is_max() {
        let state = PartialSchedule::root(2, 0)
            .with_scheduled(0, 2000)
            .with_scheduled(1, 1000);
        assert_eq!(state.frontier_end(), 2000);
        assert!(state.is_complete());
        assert_eq!(state.order(), vec![1, 0]);
    }

    #[test]
    fn test_empty_task_set_is_complete() {
        let root = PartialSchedule::root(0, 0);
        assert!(root.is_complete());
        assert!(root.order().is_empty());
    }
}
