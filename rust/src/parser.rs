//! Parser for the one-line-per-task description language.
//!
//! Each line has the form `[time-spec][label-spec] name`, the label block being
//! optional. The time-spec is a whitespace-separated list of tokens
//! `[prefix]HH[:MM][suffix]`:
//!
//! | prefix | meaning                                      |
//! |--------|----------------------------------------------|
//! | none   | duration (accumulates), or a clock start time when it has `:MM` or `a`/`p` |
//! | `=`    | extra duration (accumulates)                 |
//! | `+`    | cooldown before dependents may start         |
//! | `~`    | uncertainty around a clock start time        |
//! | `>`    | earliest start                               |
//! | `<`    | latest start                                 |
//! | `$`    | deadline                                     |
//! | `l`    | priority (1-10)                              |
//! | `x`/`c`| exclude the task                             |
//!
//! Durations take `s`, `m` or `h` suffixes; clock times take `a` or `p`.
//! The label-spec holds `#name` (the task's own label) and `,name` (labels of
//! tasks this one depends on). Lines that fail to parse are dropped.

use thiserror::Error;

use crate::labels::LabelIndex;
use crate::log_checks;
use crate::models::{Task, TimeWindow, DEFAULT_PRIORITY, PRIORITY_RANGE};
use crate::time::{SECONDS_PER_HOUR, SECONDS_PER_MINUTE};

/// Why a task line was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Line is not of the form `[time-spec][labels] name`: {0:?}")]
    MalformedLine(String),
    #[error("Malformed time token: {0:?}")]
    MalformedToken(String),
    #[error("Value out of range in token {0:?}")]
    InvalidNumber(String),
    #[error("Start window [{earliest}, {latest}] is empty")]
    EmptyWindow { earliest: i64, latest: i64 },
}

const TIME_PREFIXES: &str = "+~><=$lxc";

/// Timing constraints read from a time-spec block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeSpec {
    pub duration: i64,
    pub cooldown: i64,
    pub deadline: Option<i64>,
    pub priority: i32,
    pub windows: Vec<TimeWindow>,
    /// Normalized token text, for display.
    pub pattern: String,
}

/// One lexed time-spec token.
#[derive(Debug)]
struct TimeToken<'a> {
    raw: &'a str,
    prefix: Option<char>,
    value: i64,
    minutes: Option<i64>,
    suffix: Option<char>,
}

impl<'a> TimeToken<'a> {
    fn lex(raw: &'a str) -> Result<Self, ParseError> {
        let malformed = || ParseError::MalformedToken(raw.to_string());

        let (prefix, rest) = match raw.chars().next() {
            Some(c) if TIME_PREFIXES.contains(c) => (Some(c), &raw[c.len_utf8()..]),
            _ => (None, raw),
        };

        // Exclusion markers need no value
        if matches!(prefix, Some('x') | Some('c')) {
            return Ok(Self {
                raw,
                prefix,
                value: 0,
                minutes: None,
                suffix: None,
            });
        }

        let (value, rest) = split_number(raw, rest)?.ok_or_else(malformed)?;
        let (minutes, rest) = match rest.strip_prefix(':') {
            Some(after_colon) => {
                let (m, rest) = split_number(raw, after_colon)?.ok_or_else(malformed)?;
                (Some(m), rest)
            }
            None => (None, rest),
        };

        let mut tail = rest.chars();
        let suffix = match (tail.next(), tail.next()) {
            (None, _) => None,
            (Some(c), None) if "smhap".contains(c) => Some(c),
            _ => return Err(malformed()),
        };

        Ok(Self {
            raw,
            prefix,
            value,
            minutes,
            suffix,
        })
    }

    fn is_clock(&self) -> bool {
        self.minutes.is_some() || matches!(self.suffix, Some('a') | Some('p'))
    }

    /// Read as a duration in seconds.
    fn duration(&self) -> Result<i64, ParseError> {
        if self.minutes.is_some() {
            return Err(ParseError::MalformedToken(self.raw.to_string()));
        }
        let unit = match self.suffix {
            None | Some('s') => 1,
            Some('m') => SECONDS_PER_MINUTE,
            Some('h') => SECONDS_PER_HOUR,
            _ => return Err(ParseError::MalformedToken(self.raw.to_string())),
        };
        self.value
            .checked_mul(unit)
            .ok_or_else(|| ParseError::InvalidNumber(self.raw.to_string()))
    }

    /// Read as a clock time in seconds since midnight.
    fn clock(&self) -> Result<i64, ParseError> {
        let invalid = || ParseError::InvalidNumber(self.raw.to_string());
        let minutes = self.minutes.unwrap_or(0);
        if minutes >= 60 {
            return Err(invalid());
        }
        let hours = match self.suffix {
            None => self.value,
            Some('a') if self.value == 12 => 0,
            Some('a') => self.value,
            Some('p') if self.value < 12 => self.value + 12,
            Some('p') => self.value,
            _ => return Err(ParseError::MalformedToken(self.raw.to_string())),
        };
        hours
            .checked_mul(SECONDS_PER_HOUR)
            .and_then(|h| h.checked_add(minutes * SECONDS_PER_MINUTE))
            .ok_or_else(invalid)
    }

    fn priority(&self) -> Result<i32, ParseError> {
        if self.minutes.is_some() || self.suffix.is_some() {
            return Err(ParseError::MalformedToken(self.raw.to_string()));
        }
        match i32::try_from(self.value) {
            Ok(p) if PRIORITY_RANGE.contains(&p) => Ok(p),
            _ => Err(ParseError::InvalidNumber(self.raw.to_string())),
        }
    }
}

/// Split leading ASCII digits off `s`; `Ok(None)` when there are none.
fn split_number<'s>(raw: &str, s: &'s str) -> Result<Option<(i64, &'s str)>, ParseError> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if end == 0 {
        return Ok(None);
    }
    let value = s[..end]
        .parse::<i64>()
        .map_err(|_| ParseError::InvalidNumber(raw.to_string()))?;
    Ok(Some((value, &s[end..])))
}

/// Parse a time-spec block. Returns `Ok(None)` when the task is excluded.
pub fn parse_time_spec(spec: &str) -> Result<Option<TimeSpec>, ParseError> {
    let mut duration: i64 = 0;
    let mut cooldown: i64 = 0;
    let mut deadline: Option<i64> = None;
    let mut priority = DEFAULT_PRIORITY;
    let mut start_point: Option<i64> = None;
    let mut uncertainty: i64 = 0;
    let mut uncertainty_token = "";
    let mut after: Option<i64> = None;
    let mut before: Option<i64> = None;
    let mut excluded = false;
    let mut pattern: Vec<&str> = Vec::new();

    for raw in spec.split_whitespace() {
        let token = TimeToken::lex(raw)?;
        pattern.push(raw);
        match token.prefix {
            None if token.is_clock() => start_point = Some(token.clock()?),
            None | Some('=') => {
                duration = duration
                    .checked_add(token.duration()?)
                    .ok_or_else(|| ParseError::InvalidNumber(raw.to_string()))?;
            }
            Some('+') => cooldown = token.duration()?,
            Some('~') => {
                uncertainty = token.duration()?;
                uncertainty_token = raw;
            }
            Some('>') => after = Some(token.clock()?),
            Some('<') => before = Some(token.clock()?),
            Some('$') => deadline = Some(token.clock()?),
            Some('l') => priority = token.priority()?,
            Some('x') | Some('c') => excluded = true,
            Some(_) => return Err(ParseError::MalformedToken(raw.to_string())),
        }
    }

    if excluded {
        return Ok(None);
    }

    let window = match (start_point, after, before) {
        (Some(t), _, _) => {
            let out_of_range = || ParseError::InvalidNumber(uncertainty_token.to_string());
            Some(TimeWindow::new(
                t.checked_sub(uncertainty).ok_or_else(out_of_range)?,
                t.checked_add(uncertainty).ok_or_else(out_of_range)?,
            ))
        }
        (None, None, None) => None,
        (None, after, before) => Some(TimeWindow::new(
            after.unwrap_or(0),
            before.unwrap_or(i64::MAX),
        )),
    };
    if let Some(w) = window {
        if !w.is_valid() {
            return Err(ParseError::EmptyWindow {
                earliest: w.earliest,
                latest: w.latest,
            });
        }
    }

    Ok(Some(TimeSpec {
        duration,
        cooldown,
        deadline,
        priority,
        windows: window.into_iter().collect(),
        pattern: pattern.join(" "),
    }))
}

#[inline]
fn is_label_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

/// Parse a label block into the task's own label and its dependency labels.
///
/// Characters outside `#name` / `,name` groups are ignored; a later `#name`
/// replaces an earlier one.
pub fn parse_labels(spec: &str) -> (Option<String>, Vec<String>) {
    let bytes = spec.as_bytes();
    let mut label = None;
    let mut dependencies = Vec::new();

    let mut i = 0;
    while i < bytes.len() {
        let marker = bytes[i];
        if marker != b'#' && marker != b',' {
            i += 1;
            continue;
        }
        let start = i + 1;
        let mut end = start;
        while end < bytes.len() && is_label_byte(bytes[end]) {
            end += 1;
        }
        if end > start {
            let name = spec[start..end].to_string();
            if marker == b'#' {
                label = Some(name);
            } else {
                dependencies.push(name);
            }
        }
        i = end;
    }

    (label, dependencies)
}

/// A parsed task line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedTask {
    pub name: String,
    pub label: Option<String>,
    pub dependency_labels: Vec<String>,
    /// Time-spec tokens as written.
    pub pattern: String,
    /// Resolved task; `index` and `dependencies` are filled in by [`parse_tasks`].
    pub task: Task,
}

impl ParsedTask {
    pub fn summary(&self) -> String {
        let mut labels = format!("#{}", self.label.as_deref().unwrap_or(""));
        for dep in &self.dependency_labels {
            labels.push(',');
            labels.push_str(dep);
        }
        format!(
            "[{}]{}[{}] {}",
            self.pattern,
            self.task.summary(),
            labels,
            self.name
        )
    }
}

/// Split `[time][labels] name` into its three parts.
fn split_line(line: &str) -> Option<(&str, &str, &str)> {
    let rest = line.strip_prefix('[')?;
    let close = rest.find(']')?;
    let (time, rest) = (&rest[..close], &rest[close + 1..]);

    let (labels, rest) = match rest.strip_prefix('[') {
        Some(inner) => {
            let close = inner.find(']')?;
            (&inner[..close], &inner[close + 1..])
        }
        None => ("", rest),
    };

    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let name = rest.trim();
    if name.is_empty() {
        return None;
    }
    Some((time, labels, name))
}

/// Parse one line. Blank and excluded lines yield `Ok(None)`.
///
/// The returned task has index 0 and no resolved dependencies.
pub fn parse_line(line: &str) -> Result<Option<ParsedTask>, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (time, labels, name) =
        split_line(line).ok_or_else(|| ParseError::MalformedLine(line.to_string()))?;
    let Some(spec) = parse_time_spec(time)? else {
        return Ok(None);
    };
    let (label, dependency_labels) = parse_labels(labels);

    let task = Task {
        index: 0,
        duration: spec.duration,
        cooldown: spec.cooldown,
        deadline: spec.deadline,
        priority: spec.priority,
        windows: spec.windows,
        dependencies: Vec::new(),
    };

    Ok(Some(ParsedTask {
        name: name.to_string(),
        label,
        dependency_labels,
        pattern: spec.pattern,
        task,
    }))
}

/// Parsed tasks with indices assigned and dependencies resolved.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskList {
    entries: Vec<ParsedTask>,
}

impl TaskList {
    pub fn entries(&self) -> &[ParsedTask] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ParsedTask> {
        self.entries.get(index)
    }

    /// Task records for the scheduler.
    pub fn tasks(&self) -> Vec<Task> {
        self.entries.iter().map(|e| e.task.clone()).collect()
    }

    pub fn summary(&self) -> String {
        self.entries
            .iter()
            .map(|e| e.summary() + "\n")
            .collect()
    }
}

/// Parse every line of `input`, dropping lines that fail, and resolve dependency labels.
pub fn parse_tasks(input: &str, verbosity: u8) -> TaskList {
    let mut entries: Vec<ParsedTask> = Vec::new();
    for (line_number, line) in input.lines().enumerate() {
        match parse_line(line) {
            Ok(Some(entry)) => entries.push(entry),
            Ok(None) => {}
            Err(e) => log_checks!(verbosity, "Dropping line {}: {}", line_number + 1, e),
        }
    }

    let labels = LabelIndex::build(entries.iter().map(|e| e.label.as_deref()));
    for (index, entry) in entries.iter_mut().enumerate() {
        entry.task.index = index;
        entry.task.dependencies = labels.resolve(&entry.dependency_labels);
    }

    TaskList { entries }
}
