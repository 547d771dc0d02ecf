//! Composite comparator / sorter.
//!
//! Ordering, outermost first:
//! 1. open tasks before completed ones (always, not configurable)
//! 2. primary key in its direction
//! 3. secondary key in its direction, if configured
//! 4. input order (the sort is stable)

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Title,
    CreatedAt,
    /// Tasks without a due date go last in both directions.
    DueDate,
    /// Ascending is low -> high. Ask for descending to get high first.
    Priority,
    Project,
    /// First tag, case-insensitive. Untagged tasks go last in both directions.
    Tags,
}

impl SortKey {
    pub const ALL: [SortKey; 6] = [
        SortKey::CreatedAt,
        SortKey::DueDate,
        SortKey::Priority,
        SortKey::Title,
        SortKey::Project,
        SortKey::Tags,
    ];

    /// Accepts the UI option names (`createdAt`, `dueDate`, ...) in any case,
    /// plus kebab/snake spellings. Unknown labels give `None`.
    pub fn from_label(s: &str) -> Option<Self> {
        let norm: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        match norm.as_str() {
            "title" => Some(Self::Title),
            "createdat" | "created" => Some(Self::CreatedAt),
            "duedate" | "due" => Some(Self::DueDate),
            "priority" => Some(Self::Priority),
            "project" => Some(Self::Project),
            "tags" | "tag" => Some(Self::Tags),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::CreatedAt => "createdAt",
            Self::DueDate => "dueDate",
            Self::Priority => "priority",
            Self::Project => "project",
            Self::Tags => "tags",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortConfig {
    pub primary: SortKey,
    pub primary_ascending: bool,
    #[serde(default)]
    pub secondary: Option<SortKey>,
    #[serde(default)]
    pub secondary_ascending: bool,
}

impl Default for SortConfig {
    /// Newest first.
    fn default() -> Self {
        Self {
            primary: SortKey::CreatedAt,
            primary_ascending: false,
            secondary: None,
            secondary_ascending: true,
        }
    }
}

impl SortConfig {
    pub fn by(primary: SortKey, ascending: bool) -> Self {
        Self {
            primary,
            primary_ascending: ascending,
            secondary: None,
            secondary_ascending: true,
        }
    }

    pub fn then_by(mut self, secondary: SortKey, ascending: bool) -> Self {
        self.secondary = Some(secondary);
        self.secondary_ascending = ascending;
        self
    }

    /// Build from UI labels. An unknown primary falls back to the default
    /// config; an unknown secondary is dropped.
    pub fn from_labels(
        primary: &str,
        primary_ascending: bool,
        secondary: Option<&str>,
        secondary_ascending: bool,
    ) -> Self {
        let Some(primary) = SortKey::from_label(primary) else {
            return Self::default();
        };
        let secondary = secondary.and_then(SortKey::from_label).filter(|s| *s != primary);
        Self {
            primary,
            primary_ascending,
            secondary,
            secondary_ascending,
        }
    }

    /// Column-header click: the active key flips direction, any other key
    /// becomes the primary in ascending order. The secondary is cleared if it
    /// would duplicate the new primary.
    pub fn toggle(self, key: SortKey) -> Self {
        if key == self.primary {
            return Self {
                primary_ascending: !self.primary_ascending,
                ..self
            };
        }
        Self {
            primary: key,
            primary_ascending: true,
            secondary: self.secondary.filter(|s| *s != key),
            ..self
        }
    }
}

fn directed(ord: Ordering, ascending: bool) -> Ordering {
    if ascending { ord } else { ord.reverse() }
}

/// Case-insensitive first, exact bytes to split case-only differences.
fn text_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Present values in the requested direction; absent values always last.
fn cmp_present_first<T: Ord>(a: Option<T>, b: Option<T>, ascending: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => directed(a.cmp(&b), ascending),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn first_tag(task: &Task) -> Option<String> {
    task.tags
        .first()
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

pub fn compare_by_key(a: &Task, b: &Task, key: SortKey, ascending: bool) -> Ordering {
    match key {
        SortKey::Title => directed(text_cmp(&a.title, &b.title), ascending),
        SortKey::CreatedAt => directed(a.created_at.cmp(&b.created_at), ascending),
        SortKey::DueDate => cmp_present_first(a.due_date, b.due_date, ascending),
        SortKey::Priority => directed(a.priority.rank().cmp(&b.priority.rank()), ascending),
        SortKey::Project => directed(text_cmp(&a.project, &b.project), ascending),
        SortKey::Tags => cmp_present_first(first_tag(a), first_tag(b), ascending),
    }
}

/// Full comparison: completion partition, primary, then secondary.
pub fn compare_tasks(a: &Task, b: &Task, config: &SortConfig) -> Ordering {
    a.completed
        .cmp(&b.completed)
        .then_with(|| compare_by_key(a, b, config.primary, config.primary_ascending))
        .then_with(|| match config.secondary {
            Some(key) => compare_by_key(a, b, key, config.secondary_ascending),
            None => Ordering::Equal,
        })
}

/// Stable sort into a new vector; the input is not touched.
pub fn sort_tasks<'a, I>(tasks: I, config: &SortConfig) -> Vec<&'a Task>
where
    I: IntoIterator<Item = &'a Task>,
{
    let mut out: Vec<&Task> = tasks.into_iter().collect();
    out.sort_by(|a, b| compare_tasks(a, b, config));
    out
}
