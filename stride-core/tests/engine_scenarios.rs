use chrono::{NaiveDate, TimeZone, Utc};
use stride_core::{
    CompletionState, FilterSpec, GroupBy, GroupKey, Priority, RecurrenceScanner, ScanPolicy,
    SortConfig, SortKey, Task, TaskForest, ViewQuery, build_view, filter_tasks, flatten,
    next_occurrence, sort_tasks, summarize,
};

/// Records the way the persistence layer hands them over: flat, linked by parentId.
const RECORDS: &str = r#"[
  {"id": "course", "title": "Finish course", "type": "assignment", "timeFrame": "monthly",
   "project": "school", "priority": "high", "createdAt": "2025-01-01T08:00:00Z",
   "dueDate": "2025-03-20", "tags": ["exam", "urgent"]},
  {"id": "ch1", "parentId": "course", "title": "Chapter 1", "type": "task", "timeFrame": "weekly",
   "project": "school", "priority": "medium", "createdAt": "2025-01-02T08:00:00Z",
   "dueDate": "2025-03-01", "tags": ["exam"]},
  {"id": "ch1-quiz", "parentId": "ch1", "title": "Quiz 1", "type": "task", "timeFrame": "weekly",
   "project": "school", "priority": "low", "createdAt": "2025-01-03T08:00:00Z",
   "completed": true, "tags": []},
  {"id": "ch2", "parentId": "course", "title": "Chapter 2", "type": "task", "timeFrame": "weekly",
   "project": "school", "priority": "medium", "createdAt": "2025-01-04T08:00:00Z",
   "dueDate": "garbage", "tags": []},
  {"id": "ch2-quiz", "parentId": "ch2", "title": "Quiz 2", "type": "task", "timeFrame": "weekly",
   "project": "school", "priority": "low", "createdAt": "2025-01-05T08:00:00Z", "tags": ["exam"]},
  {"id": "standup", "title": "Standup", "type": "event", "timeFrame": "daily",
   "project": "work", "priority": "high", "createdAt": "2025-02-01T08:00:00Z",
   "dueDate": "2025-03-05T09:30", "completed": true, "tags": ["urgent"],
   "recurring": {"enabled": true, "frequency": "weekly", "interval": 1, "daysOfWeek": [1, 3]}}
]"#;

fn load() -> TaskForest {
    let records: Vec<Task> = serde_json::from_str(RECORDS).unwrap();
    TaskForest::from_records(records)
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
}

fn ids(tasks: &[&Task]) -> Vec<String> {
    tasks.iter().map(|t| t.id.clone()).collect()
}

#[test]
fn flattened_tree_is_pre_order() {
    let tree = load().to_tree();
    let flat = flatten(&tree);
    assert_eq!(
        ids(&flat),
        vec!["course", "ch1", "ch1-quiz", "ch2", "ch2-quiz", "standup"]
    );
}

#[test]
fn malformed_due_date_sorts_with_the_dateless() {
    let tree = load().to_tree();
    let flat = flatten(&tree);
    for asc in [true, false] {
        let sorted = sort_tasks(flat.iter().copied(), &SortConfig::by(SortKey::DueDate, asc));
        let open: Vec<&str> = sorted
            .iter()
            .filter(|t| !t.completed)
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(&open[open.len() - 2..], ["ch2", "ch2-quiz"]);
    }
}

#[test]
fn urgent_tag_filter_then_priority_sort() {
    let tree = load().to_tree();
    let spec = FilterSpec {
        tags: vec!["urgent".into()],
        ..Default::default()
    };
    let urgent = filter_tasks(flatten(&tree), &spec, today());
    assert_eq!(ids(&urgent), vec!["course", "standup"]);

    let sorted = sort_tasks(urgent, &SortConfig::by(SortKey::Priority, false));
    // Both high; the completed standup still goes last.
    assert_eq!(ids(&sorted), vec!["course", "standup"]);
}

#[test]
fn overdue_view_grouped_by_priority() {
    let tree = load().to_tree();
    let query = ViewQuery {
        filter: FilterSpec {
            completion: CompletionState::Overdue,
            ..Default::default()
        },
        group_by: GroupBy::Priority,
        ..Default::default()
    };
    let groups = build_view(&tree, &query, today());
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].key, GroupKey::Priority(Priority::Medium));
    assert_eq!(ids(&groups[0].tasks), vec!["ch1"]);

    let s = summarize(&tree, today());
    assert_eq!((s.total, s.completed, s.overdue), (6, 2, 1));
}

#[test]
fn completed_standup_spawns_monday_instance() {
    let mut forest = load();
    let standup = forest.get("standup").unwrap().clone();
    let monday = NaiveDate::from_ymd_opt(2025, 3, 10)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap();
    assert_eq!(next_occurrence(&standup), Some(monday));

    let scanner = RecurrenceScanner::new(ScanPolicy::default(), chrono_tz::UTC);
    let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
    let report = scanner.scan(&forest, now);
    assert_eq!(report.generated.len(), 1);
    report.apply(&mut forest).unwrap();

    assert_eq!(forest.len(), 7);
    let fresh: Vec<&Task> = forest
        .root_ids()
        .iter()
        .filter_map(|id| forest.get(id))
        .filter(|t| t.title == "Standup" && !t.completed)
        .collect();
    assert_eq!(fresh.len(), 1);
    assert_eq!(fresh[0].due_date, Some(monday));

    // Same hour again: nothing new.
    assert!(scanner.scan(&forest, now).is_empty());
}
