//! Label lookup for dependency resolution.
//!
//! Labels are not unique: several tasks may share one, and a dependency on a
//! label means a dependency on every task carrying it.

use rustc_hash::FxHashMap;

/// Maps each label to the indices of the tasks that carry it.
#[derive(Debug, Clone, Default)]
pub struct LabelIndex {
    by_label: FxHashMap<String, Vec<usize>>,
}

impl LabelIndex {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            by_label: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Build from the self-label of each task in list order.
    pub fn build<'a, I>(labels: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let labels = labels.into_iter();
        let mut index = Self::with_capacity(labels.size_hint().0);
        for (i, label) in labels.enumerate() {
            if let Some(label) = label {
                index.insert(label, i);
            }
        }
        index
    }

    pub fn insert(&mut self, label: &str, task_index: usize) {
        self.by_label
            .entry(label.to_string())
            .or_default()
            .push(task_index);
    }

    /// Tasks carrying `label`; empty if none do.
    #[inline]
    pub fn get(&self, label: &str) -> &[usize] {
        self.by_label.get(label).map_or(&[], |v| v.as_slice())
    }

    /// Resolve dependency labels to task indices, first occurrence order, no duplicates.
    pub fn resolve<S: AsRef<str>>(&self, dependency_labels: &[S]) -> Vec<usize> {
        let mut resolved: Vec<usize> = Vec::new();
        for label in dependency_labels {
            for &i in self.get(label.as_ref()) {
                if !resolved.contains(&i) {
                    resolved.push(i);
                }
            }
        }
        resolved
    }

    /// Number of distinct labels.
    pub fn len(&self) -> usize {
        self.by_label.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_label.is_empty()
    }
}
