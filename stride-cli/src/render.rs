//! Plain-text table output for the CLI.

use std::collections::HashMap;

use chrono::NaiveDate;
use stride_core::{Group, GroupBy, Task, TaskSummary, tag_color};

/// "today", "tomorrow", "in 3d", "2d late", or "-".
pub fn format_due_relative(due: Option<NaiveDate>, today: NaiveDate) -> String {
    let Some(d) = due else {
        return "-".into();
    };
    match (d - today).num_days() {
        0 => "today".into(),
        1 => "tomorrow".into(),
        n if n > 1 => format!("in {n}d"),
        n => format!("{}d late", -n),
    }
}

/// Cut to `width` chars, ending in an ellipsis when shortened.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn row(t: &Task, today: NaiveDate, depth: usize) -> String {
    let tags = if t.tags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", t.tags.join(","))
    };
    let project = if t.project.is_empty() { "-" } else { t.project.as_str() };
    format!(
        "{:<10} {:<4} {:<10} {:<6} {:<10} {:<14} {}{}{}{}",
        truncate(&t.id, 10),
        if t.completed { "x" } else { " " },
        t.kind.label(),
        t.priority.label(),
        format_due_relative(t.due_day(), today),
        truncate(project, 14),
        "  ".repeat(depth),
        t.title,
        tags,
        if t.is_recurring() { " (recurring)" } else { "" },
    )
}

pub fn print_table(tasks: &[&Task], today: NaiveDate, depths: Option<&HashMap<&str, usize>>) {
    println!(
        "{:<10} {:<4} {:<10} {:<6} {:<10} {:<14} {}",
        "ID", "Done", "Type", "Pri", "Due", "Project", "Title [tags]"
    );
    for t in tasks {
        let depth = depths
            .and_then(|m| m.get(t.id.as_str()).copied())
            .unwrap_or(0);
        println!("{}", row(t, today, depth));
    }
}

pub fn print_groups(
    groups: &[Group<'_>],
    group_by: GroupBy,
    today: NaiveDate,
    depths: Option<&HashMap<&str, usize>>,
) {
    if group_by == GroupBy::None {
        let tasks: Vec<&Task> = groups.iter().flat_map(|g| g.tasks.iter().copied()).collect();
        print_table(&tasks, today, depths);
        return;
    }
    for g in groups {
        println!("## {} ({})", g.key, g.tasks.len());
        print_table(&g.tasks, today, depths);
        println!();
    }
}

pub fn print_summary(s: &TaskSummary) {
    println!("Total:     {}", s.total);
    println!("Completed: {}", s.completed);
    println!("Overdue:   {}", s.overdue);
    println!("Today:     {}", s.due_today);
    println!("Upcoming:  {}", s.upcoming);
}

pub fn print_tags(tags: &[String], counts: &HashMap<&str, usize>) {
    for t in tags {
        println!(
            "{:<7} #{:<20} {}",
            tag_color(t),
            t,
            counts.get(t.as_str()).copied().unwrap_or(0)
        );
    }
}
