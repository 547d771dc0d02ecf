//! stride-core: task ordering, filtering and recurrence engine.
//!
//! Everything here is a synchronous function of its inputs. The caller owns
//! persistence and the clock; the engine only sees plain task data.

pub mod aggregate;
pub mod filter;
pub mod flatten;
pub mod forest;
pub mod recurrence;
pub mod scan;
pub mod sort;
pub mod tags;
pub mod task;
pub mod time;

pub use aggregate::{
    Group, GroupBy, GroupKey, TaskSummary, ViewQuery, all_used_tags, build_view, count_by,
    group_by, group_by_many, summarize,
};
pub use filter::{CompletionState, FilterSpec, filter_tasks};
pub use flatten::{count_nodes, depth_map, flatten};
pub use forest::{DeletePolicy, TaskForest};
pub use recurrence::{RecurrenceOutcome, UnsupportedRecurrence, evaluate, next_occurrence};
pub use scan::{RecurrenceScanner, ScanPolicy, ScanReport, SkipReason};
pub use sort::{SortConfig, SortKey, compare_tasks, sort_tasks};
pub use tags::{normalize_tag, tag_color};
pub use task::{
    Attachment, Frequency, Priority, Recurrence, Reminder, Task, TaskType, TimeFrame,
};
