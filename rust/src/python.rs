//! Python bindings for the scheduler.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::config::SearchConfig;
use crate::models::{ScheduleResult, ScheduledTask, Task, TimeWindow, DEFAULT_PRIORITY};
use crate::parser::parse_tasks;
use crate::scheduler::make_schedule;
use crate::time::format_clock;

/// A task to be scheduled (PyO3 wrapper).
#[pyclass(name = "Task")]
#[derive(Clone, Debug)]
pub struct PyTask {
    #[pyo3(get, set)]
    pub duration: i64,
    #[pyo3(get, set)]
    pub cooldown: i64,
    #[pyo3(get, set)]
    pub deadline: Option<i64>,
    #[pyo3(get, set)]
    pub priority: i32,
    /// Start windows as `(earliest, latest)` pairs.
    #[pyo3(get, set)]
    pub windows: Vec<(i64, i64)>,
    /// Indices of tasks that must finish first.
    #[pyo3(get, set)]
    pub dependencies: Vec<usize>,
}

#[pymethods]
impl PyTask {
    #[new]
    #[pyo3(signature = (duration, cooldown=0, deadline=None, priority=None, windows=None, dependencies=None))]
    fn new(
        duration: i64,
        cooldown: i64,
        deadline: Option<i64>,
        priority: Option<i32>,
        windows: Option<Vec<(i64, i64)>>,
        dependencies: Option<Vec<usize>>,
    ) -> Self {
        Self {
            duration,
            cooldown,
            deadline,
            priority: priority.unwrap_or(DEFAULT_PRIORITY),
            windows: windows.unwrap_or_default(),
            dependencies: dependencies.unwrap_or_default(),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "Task(duration={}, cooldown={}, deadline={:?}, priority={}, deps={})",
            self.duration,
            self.cooldown,
            self.deadline,
            self.priority,
            self.dependencies.len()
        )
    }
}

impl PyTask {
    fn to_task(&self, index: usize) -> Task {
        let mut task = Task::new(index, self.duration)
            .with_cooldown(self.cooldown)
            .with_priority(self.priority)
            .with_dependencies(self.dependencies.clone());
        task.deadline = self.deadline;
        for &(earliest, latest) in &self.windows {
            task = task.with_window(TimeWindow::new(earliest, latest));
        }
        task
    }
}

/// A task placed in the schedule.
#[pyclass(name = "ScheduledTask")]
#[derive(Clone, Debug)]
pub struct PyScheduledTask {
    #[pyo3(get)]
    pub task_index: usize,
    #[pyo3(get)]
    pub start: i64,
    #[pyo3(get)]
    pub end: i64,
}

#[pymethods]
impl PyScheduledTask {
    fn __repr__(&self) -> String {
        format!(
            "ScheduledTask(task_index={}, start={}, end={})",
            self.task_index,
            format_clock(self.start),
            format_clock(self.end)
        )
    }
}

impl From<&ScheduledTask> for PyScheduledTask {
    fn from(s: &ScheduledTask) -> Self {
        Self {
            task_index: s.task_index,
            start: s.start,
            end: s.end,
        }
    }
}

/// Result of a scheduling run.
#[pyclass(name = "ScheduleResult")]
#[derive(Clone, Debug)]
pub struct PyScheduleResult {
    /// "success" or "incomplete"
    #[pyo3(get)]
    pub status: String,
    #[pyo3(get)]
    pub schedule: Vec<PyScheduledTask>,
    #[pyo3(get)]
    pub incomplete_tasks: Vec<usize>,
    #[pyo3(get)]
    pub search_steps: u64,
    #[pyo3(get)]
    pub used_duration: i64,
    #[pyo3(get)]
    pub total_duration: i64,
}

#[pymethods]
impl PyScheduleResult {
    fn utilization(&self) -> Option<f64> {
        if self.total_duration <= 0 {
            return None;
        }
        Some(self.used_duration as f64 / self.total_duration as f64)
    }

    fn __repr__(&self) -> String {
        format!(
            "ScheduleResult(status={:?}, scheduled={}, incomplete={}, steps={})",
            self.status,
            self.schedule.len(),
            self.incomplete_tasks.len(),
            self.search_steps
        )
    }
}

impl From<ScheduleResult> for PyScheduleResult {
    fn from(result: ScheduleResult) -> Self {
        Self {
            status: result.status.to_string(),
            schedule: result.schedule.iter().map(PyScheduledTask::from).collect(),
            incomplete_tasks: result.incomplete_tasks,
            search_steps: result.stats.steps,
            used_duration: result.used_duration,
            total_duration: result.total_duration,
        }
    }
}

fn search_config(
    global_start_time: i64,
    rest_time: i64,
    max_frontier_size: usize,
    verbosity: u8,
) -> SearchConfig {
    SearchConfig::default()
        .with_global_start_time(global_start_time)
        .with_rest_time(rest_time)
        .with_max_frontier_size(max_frontier_size)
        .with_verbosity(verbosity)
}

/// Schedule tasks whose dependencies are given as list indices.
///
/// # Raises
/// * ValueError if a dependency index or window is invalid
#[pyfunction]
#[pyo3(name = "make_schedule")]
#[pyo3(signature = (tasks, global_start_time=0, rest_time=0, max_frontier_size=500000, verbosity=0))]
fn py_make_schedule(
    tasks: Vec<PyTask>,
    global_start_time: i64,
    rest_time: i64,
    max_frontier_size: usize,
    verbosity: u8,
) -> PyResult<PyScheduleResult> {
    let tasks: Vec<Task> = tasks
        .iter()
        .enumerate()
        .map(|(i, t)| t.to_task(i))
        .collect();
    let config = search_config(global_start_time, rest_time, max_frontier_size, verbosity);

    match make_schedule(tasks, &config) {
        Ok(result) => Ok(result.into()),
        Err(e) => Err(PyValueError::new_err(e.to_string())),
    }
}

/// Parse task lines and schedule them.
///
/// Returns the parsed task names (indexed like the schedule) and the result.
#[pyfunction]
#[pyo3(signature = (text, global_start_time=0, rest_time=0, max_frontier_size=500000, verbosity=0))]
fn parse_and_schedule(
    text: &str,
    global_start_time: i64,
    rest_time: i64,
    max_frontier_size: usize,
    verbosity: u8,
) -> PyResult<(Vec<String>, PyScheduleResult)> {
    let list = parse_tasks(text, verbosity);
    let names: Vec<String> = list.entries().iter().map(|e| e.name.clone()).collect();
    let config = search_config(global_start_time, rest_time, max_frontier_size, verbosity);

    match make_schedule(list.tasks(), &config) {
        Ok(result) => Ok((names, result.into())),
        Err(e) => Err(PyValueError::new_err(e.to_string())),
    }
}

/// The dayplan_rust Python module.
#[pymodule]
fn dayplan_rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyTask>()?;
    m.add_class::<PyScheduledTask>()?;
    m.add_class::<PyScheduleResult>()?;

    m.add_function(wrap_pyfunction!(py_make_schedule, m)?)?;
    m.add_function(wrap_pyfunction!(parse_and_schedule, m)?)?;

    Ok(())
}
