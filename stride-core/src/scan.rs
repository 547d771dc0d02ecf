//! Recurrence scan: turn completed recurring tasks into their next instance.
//!
//! The calculator in [`crate::recurrence`] is pure; this module decides which
//! series are due for a successor and materializes it. The clock is an
//! argument so a scan is reproducible. Callers must run one scan at a time
//! per forest (single writer); the scan itself holds no state.

use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use chrono_tz::Tz;
use tracing::{debug, info};
use uuid::Uuid;

use crate::forest::TaskForest;
use crate::recurrence::{RecurrenceOutcome, evaluate};
use crate::task::{Recurrence, Task};
use crate::time::local_naive;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanPolicy {
    /// Minimum age of `last_generated` before a series may generate again.
    pub throttle: Duration,
}

impl Default for ScanPolicy {
    fn default() -> Self {
        Self {
            throttle: Duration::hours(24),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Next occurrence is still in the future.
    NotYetDue(NaiveDateTime),
    /// Generated too recently.
    Throttled(DateTime<Utc>),
    /// A successor for this occurrence was already generated.
    AlreadyGenerated(DateTime<Utc>),
    /// The series produced no next date (ended, unsupported, dateless).
    NoNextOccurrence(RecurrenceOutcome),
}

#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub generated: Vec<Task>,
    /// (origin id, new `last_generated`)
    pub stamped: Vec<(String, DateTime<Utc>)>,
    pub skipped: Vec<(String, SkipReason)>,
}

impl ScanReport {
    pub fn is_empty(&self) -> bool {
        self.generated.is_empty()
    }

    /// Insert the new instances next to their origins and stamp the origins.
    pub fn apply(self, forest: &mut TaskForest) -> Result<()> {
        for task in self.generated {
            match task.parent_id.clone() {
                Some(parent) if forest.contains(&parent) => forest.add_subtask(&parent, task)?,
                _ => forest.insert_root(task)?,
            }
        }
        for (id, stamp) in self.stamped {
            forest.update(&id, |t| {
                if let Some(r) = t.recurring.as_mut() {
                    r.last_generated = Some(stamp);
                }
            })?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RecurrenceScanner {
    pub policy: ScanPolicy,
    /// Zone due dates are written in.
    pub tz: Tz,
}

impl RecurrenceScanner {
    pub fn new(policy: ScanPolicy, tz: Tz) -> Self {
        Self { policy, tz }
    }

    /// One pass over the forest in pre-order. At most one successor per series.
    pub fn scan(&self, forest: &TaskForest, now: DateTime<Utc>) -> ScanReport {
        let local_now = local_naive(now, self.tz);
        let mut report = ScanReport::default();

        for task in forest.to_records() {
            if !task.completed || !task.is_recurring() {
                continue;
            }

            match self.check(&task, now, local_now) {
                Ok(next) => {
                    let instance = successor(&task, next, now);
                    info!(origin = %task.id, new_id = %instance.id, due = %next, "generated recurring instance");
                    report.stamped.push((task.id.clone(), now));
                    report.generated.push(instance);
                }
                Err(reason) => {
                    debug!(origin = %task.id, ?reason, "recurring series skipped");
                    report.skipped.push((task.id, reason));
                }
            }
        }

        report
    }

    fn check(
        &self,
        task: &Task,
        now: DateTime<Utc>,
        local_now: NaiveDateTime,
    ) -> Result<NaiveDateTime, SkipReason> {
        let next = match evaluate(task) {
            RecurrenceOutcome::Next(next) => next,
            other => return Err(SkipReason::NoNextOccurrence(other)),
        };
        if next > local_now {
            return Err(SkipReason::NotYetDue(next));
        }

        let last = task.active_recurrence().and_then(|r| r.last_generated);
        if let Some(last) = last {
            if now - last < self.policy.throttle {
                return Err(SkipReason::Throttled(last));
            }
            if local_naive(last, self.tz) >= next {
                return Err(SkipReason::AlreadyGenerated(last));
            }
        }
        Ok(next)
    }
}

/// Fresh open instance of the series, due at `next`.
fn successor(origin: &Task, next: NaiveDateTime, now: DateTime<Utc>) -> Task {
    let recurring = origin.recurring.as_ref().map(|r| Recurrence {
        last_generated: None,
        ..r.clone()
    });
    Task {
        id: Uuid::now_v7().to_string(),
        completed: false,
        due_date: Some(next),
        created_at: now,
        subtasks: Vec::new(),
        attachments: Vec::new(),
        reminders: Vec::new(),
        recurring,
        ..origin.clone()
    }
}
