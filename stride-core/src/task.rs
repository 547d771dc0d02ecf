//! Task model shared by the filter, sort, recurrence and aggregation engines.
//!
//! Field names serialize in camelCase to match the records the persistence
//! layer hands us.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time::{lenient_naive, lenient_utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Task,
    Event,
    Assignment,
}

impl TaskType {
    pub const ALL: [TaskType; 3] = [TaskType::Task, TaskType::Event, TaskType::Assignment];

    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "task" => Some(Self::Task),
            "event" => Some(Self::Event),
            "assignment" => Some(Self::Assignment),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Event => "event",
            Self::Assignment => "assignment",
        }
    }
}

/// User-declared scheduling bucket. Independent of `due_date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeFrame {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl TimeFrame {
    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            "yearly" => Some(Self::Yearly),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

/// Ordinal: `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn rank(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Custom,
}

fn default_interval() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recurrence {
    pub enabled: bool,
    pub frequency: Frequency,

    /// Every `interval` periods. Zero is read as one.
    #[serde(default = "default_interval")]
    pub interval: u32,

    /// Weekday indices, Sunday = 0. Only meaningful for weekly/custom.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub days_of_week: Vec<u8>,

    /// Inclusive bound on generated due dates (compared by calendar day).
    #[serde(
        default,
        deserialize_with = "lenient_naive",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_date: Option<NaiveDateTime>,

    #[serde(
        default,
        deserialize_with = "lenient_utc",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_generated: Option<DateTime<Utc>>,
}

impl Recurrence {
    pub fn new(frequency: Frequency, interval: u32) -> Self {
        Self {
            enabled: true,
            frequency,
            interval,
            days_of_week: Vec::new(),
            end_date: None,
            last_generated: None,
        }
    }

    pub fn on_days(mut self, days: impl IntoIterator<Item = u8>) -> Self {
        self.days_of_week = days.into_iter().collect();
        self
    }

    pub fn until(mut self, end: NaiveDateTime) -> Self {
        self.end_date = Some(end);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default)]
    pub uploaded_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absolute_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_amount: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub triggered: bool,
}

/// Core task type.
///
/// `subtasks` are owned by the parent; `parent_id` is only a back-reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub completed: bool,

    #[serde(rename = "type")]
    pub kind: TaskType,
    pub time_frame: TimeFrame,

    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub list_id: String,

    pub priority: Priority,

    #[serde(
        default,
        deserialize_with = "lenient_naive",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<NaiveDateTime>,

    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<Task>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reminders: Vec<Reminder>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring: Option<Recurrence>,
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            completed: false,
            kind: TaskType::Task,
            time_frame: TimeFrame::Daily,
            project: String::new(),
            list_id: String::new(),
            priority: Priority::Medium,
            due_date: None,
            created_at,
            parent_id: None,
            subtasks: Vec::new(),
            tags: Vec::new(),
            attachments: Vec::new(),
            reminders: Vec::new(),
            recurring: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_kind(mut self, kind: TaskType) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_time_frame(mut self, time_frame: TimeFrame) -> Self {
        self.time_frame = time_frame;
        self
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = project.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_due(mut self, due: NaiveDateTime) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Attach children, pointing their `parent_id` at this task.
    pub fn with_subtasks(mut self, subtasks: Vec<Task>) -> Self {
        self.subtasks = subtasks
            .into_iter()
            .map(|mut t| {
                t.parent_id = Some(self.id.clone());
                t
            })
            .collect();
        self
    }

    pub fn with_recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurring = Some(recurrence);
        self
    }

    pub fn completed(mut self) -> Self {
        self.completed = true;
        self
    }

    /// Recurrence config, only when it is switched on.
    pub fn active_recurrence(&self) -> Option<&Recurrence> {
        self.recurring.as_ref().filter(|r| r.enabled)
    }

    pub fn is_recurring(&self) -> bool {
        self.active_recurrence().is_some()
    }

    /// Due calendar day strictly before `today`, and still open.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.completed && self.due_date.is_some_and(|d| d.date() < today)
    }

    pub fn due_day(&self) -> Option<NaiveDate> {
        self.due_date.map(|d| d.date())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    pub fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, day, 9, 0, 0).unwrap()
    }

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    pub fn task(id: &str) -> Task {
        Task::new(id, id, at(1))
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn overdue_needs_past_due_and_open() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let late = task("a").with_due(date(2025, 3, 9));
        assert!(late.is_overdue(today));
        assert!(!late.clone().completed().is_overdue(today));
        assert!(!task("b").with_due(date(2025, 3, 10)).is_overdue(today));
        assert!(!task("c").is_overdue(today));
    }

    #[test]
    fn disabled_recurrence_is_not_recurring() {
        let mut r = Recurrence::new(Frequency::Daily, 1);
        r.enabled = false;
        assert!(!task("a").with_recurrence(r).is_recurring());
    }

    #[test]
    fn deserializes_app_record_with_bad_due_date() {
        let json = r#"{
            "id": "t1",
            "title": "Read chapter 4",
            "completed": false,
            "type": "assignment",
            "timeFrame": "weekly",
            "project": "p-school",
            "listId": "l1",
            "priority": "high",
            "dueDate": "not a date",
            "createdAt": "2025-01-02T10:00:00Z",
            "subtasks": [],
            "tags": ["exam"],
            "attachments": [],
            "reminders": [],
            "recurring": {
                "enabled": true,
                "frequency": "weekly",
                "interval": 2,
                "daysOfWeek": [1, 3],
                "endDate": "2025-06-01"
            }
        }"#;
        let t: Task = serde_json::from_str(json).unwrap();
        assert_eq!(t.kind, TaskType::Assignment);
        assert_eq!(t.priority, Priority::High);
        assert!(t.due_date.is_none());
        let r = t.recurring.unwrap();
        assert_eq!(r.days_of_week, vec![1, 3]);
        assert_eq!(r.end_date, Some(date(2025, 6, 1)));
    }

    #[test]
    fn non_string_dates_are_absent() {
        let json = r#"{
            "id": "t2",
            "title": "Water plants",
            "type": "task",
            "timeFrame": "daily",
            "priority": "low",
            "dueDate": 20250301,
            "createdAt": "2025-01-02T10:00:00Z",
            "recurring": {
                "enabled": true,
                "frequency": "daily",
                "endDate": {"seconds": 1735689600},
                "lastGenerated": false
            }
        }"#;
        let t: Task = serde_json::from_str(json).unwrap();
        assert!(t.due_date.is_none());
        let r = t.recurring.unwrap();
        assert!(r.end_date.is_none());
        assert!(r.last_generated.is_none());
        assert_eq!(r.interval, 1);
    }

    #[test]
    fn with_subtasks_sets_back_reference() {
        let t = task("p").with_subtasks(vec![task("c")]);
        assert_eq!(t.subtasks[0].parent_id.as_deref(), Some("p"));
    }
}
