//! Aggregation: grouping, counting and the composed view pipeline.
//!
//! Pipeline for a view: flatten (so subtasks count) -> filter -> group ->
//! sort each group. Every view goes through [`build_view`] so they all agree.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::filter::{FilterSpec, filter_tasks};
use crate::flatten::flatten;
use crate::sort::{SortConfig, sort_tasks};
use crate::task::{Priority, Task, TimeFrame};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GroupBy {
    #[default]
    None,
    TimeFrame,
    Priority,
    Project,
    Tag,
    Completion,
}

impl GroupBy {
    pub fn from_label(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "timeframe" | "time-frame" | "time_frame" => Self::TimeFrame,
            "priority" => Self::Priority,
            "project" => Self::Project,
            "tag" | "tags" => Self::Tag,
            "completion" | "status" => Self::Completion,
            _ => Self::None,
        }
    }

    /// Group keys for one task. Tag grouping may yield several.
    pub fn keys(self, task: &Task) -> Vec<GroupKey> {
        match self {
            Self::None => vec![GroupKey::All],
            Self::TimeFrame => vec![GroupKey::TimeFrame(task.time_frame)],
            Self::Priority => vec![GroupKey::Priority(task.priority)],
            Self::Project => vec![GroupKey::Project(task.project.clone())],
            Self::Tag if task.tags.is_empty() => vec![GroupKey::Untagged],
            Self::Tag => {
                let unique: BTreeSet<&String> = task.tags.iter().collect();
                unique.into_iter().map(|t| GroupKey::Tag(t.clone())).collect()
            }
            Self::Completion => vec![GroupKey::Completed(task.completed)],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupKey {
    All,
    TimeFrame(TimeFrame),
    Priority(Priority),
    Project(String),
    Tag(String),
    Untagged,
    Completed(bool),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::TimeFrame(tf) => f.write_str(tf.label()),
            Self::Priority(p) => f.write_str(p.label()),
            Self::Project(p) if p.is_empty() => f.write_str("(no project)"),
            Self::Project(p) => f.write_str(p),
            Self::Tag(t) => write!(f, "#{t}"),
            Self::Untagged => f.write_str("(untagged)"),
            Self::Completed(true) => f.write_str("completed"),
            Self::Completed(false) => f.write_str("pending"),
        }
    }
}

/// Group tasks by one key each, keeping input order inside each group.
pub fn group_by<'a, I, K, F>(tasks: I, key_fn: F) -> BTreeMap<K, Vec<&'a Task>>
where
    I: IntoIterator<Item = &'a Task>,
    K: Ord,
    F: Fn(&Task) -> K,
{
    let mut groups: BTreeMap<K, Vec<&Task>> = BTreeMap::new();
    for task in tasks {
        groups.entry(key_fn(task)).or_default().push(task);
    }
    groups
}

/// Like [`group_by`], but a task joins every group its keys name.
pub fn group_by_many<'a, I, K, F>(tasks: I, keys_fn: F) -> BTreeMap<K, Vec<&'a Task>>
where
    I: IntoIterator<Item = &'a Task>,
    K: Ord,
    F: Fn(&Task) -> Vec<K>,
{
    let mut groups: BTreeMap<K, Vec<&Task>> = BTreeMap::new();
    for task in tasks {
        for key in keys_fn(task) {
            groups.entry(key).or_default().push(task);
        }
    }
    groups
}

pub fn count_by<'a, I, K, F>(tasks: I, key_fn: F) -> BTreeMap<K, usize>
where
    I: IntoIterator<Item = &'a Task>,
    K: Ord,
    F: Fn(&Task) -> K,
{
    let mut counts = BTreeMap::new();
    for task in tasks {
        *counts.entry(key_fn(task)).or_insert(0) += 1;
    }
    counts
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskSummary {
    pub total: usize,
    pub completed: usize,
    pub overdue: usize,
    pub due_today: usize,
    /// Due from tomorrow up to (not including) a week from today.
    pub upcoming: usize,
}

/// Dashboard counts over the whole forest, subtasks included.
pub fn summarize(roots: &[Task], today: NaiveDate) -> TaskSummary {
    let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);
    let next_week = today.checked_add_days(Days::new(7)).unwrap_or(today);

    let mut s = TaskSummary::default();
    for task in flatten(roots) {
        s.total += 1;
        if task.completed {
            s.completed += 1;
        }
        if task.is_overdue(today) {
            s.overdue += 1;
        }
        match task.due_day() {
            Some(d) if d == today => s.due_today += 1,
            Some(d) if d >= tomorrow && d < next_week => s.upcoming += 1,
            _ => {}
        }
    }
    s
}

/// Every tag used anywhere in the forest, sorted and deduplicated.
pub fn all_used_tags(roots: &[Task]) -> Vec<String> {
    let tags: BTreeSet<&str> = flatten(roots)
        .into_iter()
        .flat_map(|t| t.tags.iter().map(String::as_str))
        .collect();
    tags.into_iter().map(str::to_string).collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewQuery {
    pub filter: FilterSpec,
    pub sort: SortConfig,
    pub group_by: GroupBy,
    /// Per-group sort that replaces `sort` for that group only.
    pub overrides: HashMap<GroupKey, SortConfig>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Group<'a> {
    pub key: GroupKey,
    pub tasks: Vec<&'a Task>,
}

/// Flatten, filter, group and sort: the one path every view uses.
pub fn build_view<'a>(roots: &'a [Task], query: &ViewQuery, today: NaiveDate) -> Vec<Group<'a>> {
    let kept = filter_tasks(flatten(roots), &query.filter, today);
    group_by_many(kept, |t| query.group_by.keys(t))
        .into_iter()
        .map(|(key, tasks)| {
            let sort = query.overrides.get(&key).unwrap_or(&query.sort);
            let tasks = sort_tasks(tasks, sort);
            Group { key, tasks }
        })
        .collect()
}
