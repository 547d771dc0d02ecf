//! Predicate filter over a task sequence.
//!
//! Every field of [`FilterSpec`] defaults to "no constraint"; active
//! constraints are AND-combined. Filtering is stable.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::task::{Priority, Task, TaskType, TimeFrame};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionState {
    #[default]
    All,
    Completed,
    Pending,
    /// Open with a due day before today.
    Overdue,
}

impl CompletionState {
    pub fn from_label(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "completed" => Self::Completed,
            "pending" => Self::Pending,
            "overdue" => Self::Overdue,
            _ => Self::All,
        }
    }

    fn admits(self, task: &Task, today: NaiveDate) -> bool {
        match self {
            Self::All => true,
            Self::Completed => task.completed,
            Self::Pending => !task.completed,
            Self::Overdue => task.is_overdue(today),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub search_text: Option<String>,
    pub time_frame: Option<TimeFrame>,
    pub priority: Option<Priority>,
    pub project: Option<String>,
    pub completion: CompletionState,
    /// OR semantics: any shared tag admits the task.
    pub tags: Vec<String>,
    pub types: Vec<TaskType>,
}

impl FilterSpec {
    /// Build from UI control values. `"all"`, blanks and unknown labels mean
    /// "no constraint".
    pub fn from_labels(
        search: &str,
        time_frame: &str,
        priority: &str,
        project: &str,
        completion: &str,
        tags: &[String],
        types: &[String],
    ) -> Self {
        let project = project.trim();
        Self {
            search_text: Some(search.to_string()).filter(|s| !s.is_empty()),
            time_frame: TimeFrame::from_label(time_frame),
            priority: Priority::from_label(priority),
            project: (!project.is_empty() && !project.eq_ignore_ascii_case("all"))
                .then(|| project.to_string()),
            completion: CompletionState::from_label(completion),
            tags: tags.iter().filter(|t| !t.is_empty()).cloned().collect(),
            types: types.iter().filter_map(|t| TaskType::from_label(t)).collect(),
        }
    }

    /// Number of active constraints.
    pub fn active_constraints(&self) -> usize {
        [
            self.search_text.as_deref().is_some_and(|s| !s.is_empty()),
            self.time_frame.is_some(),
            self.priority.is_some(),
            self.project.is_some(),
            self.completion != CompletionState::All,
            !self.tags.is_empty(),
            !self.types.is_empty(),
        ]
        .into_iter()
        .filter(|b| *b)
        .count()
    }

    pub fn matches(&self, task: &Task, today: NaiveDate) -> bool {
        if let Some(q) = self.search_text.as_deref().filter(|q| !q.is_empty()) {
            if !matches_search(task, q) {
                return false;
            }
        }
        if let Some(tf) = self.time_frame {
            if task.time_frame != tf {
                return false;
            }
        }
        if let Some(p) = self.priority {
            if task.priority != p {
                return false;
            }
        }
        if let Some(ref project) = self.project {
            if &task.project != project {
                return false;
            }
        }
        if !self.completion.admits(task, today) {
            return false;
        }
        if !self.tags.is_empty() && !task.tags.iter().any(|t| self.tags.contains(t)) {
            return false;
        }
        if !self.types.is_empty() && !self.types.contains(&task.kind) {
            return false;
        }
        true
    }
}

fn matches_search(task: &Task, query: &str) -> bool {
    let q = query.to_lowercase();
    task.title.to_lowercase().contains(&q)
        || task
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(&q))
        || task.tags.iter().any(|t| t.to_lowercase().contains(&q))
}

/// Keep the tasks `spec` admits, in input order.
pub fn filter_tasks<'a, I>(tasks: I, spec: &FilterSpec, today: NaiveDate) -> Vec<&'a Task>
where
    I: IntoIterator<Item = &'a Task>,
{
    tasks
        .into_iter()
        .filter(|t| spec.matches(t, today))
        .collect()
}
