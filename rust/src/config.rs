//! Configuration for the schedule search.

/// Default cap on simultaneously retained frontier states.
pub const DEFAULT_MAX_FRONTIER_SIZE: usize = 500_000;

/// Scheduling parameters for one search run.
///
/// All times are seconds since local midnight.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchConfig {
    /// Earliest time any task may start.
    pub global_start_time: i64,
    /// Buffer inserted before every task start.
    pub rest_time: i64,
    /// Frontier size above which the worst-ranked states are evicted.
    pub max_frontier_size: usize,
    /// Verbosity level: 0=silent, 1=progress, 2=checks, 3=debug.
    pub verbosity: u8,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            global_start_time: 0,
            rest_time: 0,
            max_frontier_size: DEFAULT_MAX_FRONTIER_SIZE,
            verbosity: 0,
        }
    }
}

impl SearchConfig {
    pub fn with_global_start_time(mut self, global_start_time: i64) -> Self {
        self.global_start_time = global_start_time;
        self
    }

    pub fn with_rest_time(mut self, rest_time: i64) -> Self {
        self.rest_time = rest_time;
        self
    }

    pub fn with_max_frontier_size(mut self, max_frontier_size: usize) -> Self {
        self.max_frontier_size = max_frontier_size;
        self
    }

    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.global_start_time, 0);
        assert_eq!(config.rest_time, 0);
        assert_eq!(config.max_frontier_size, 500_000);
        assert_eq!(config.verbosity, 0);
    }

    #[test]
    fn test_config_builders() {
        let config = SearchConfig::default()
            .with_global_start_time(8 * 3600)
            .with_rest_time(300)
            .with_max_frontier_size(10)
            .with_verbosity(2);
        assert_eq!(config.global_start_time, 28_800);
        assert_eq!(config.rest_time, 300);
        assert_eq!(config.max_frontier_size, 10);
        assert_eq!(config.verbosity, 2);
    }
}
