//! Recurrence calculator: next due date for a recurring series.
//!
//! Pure date arithmetic on the task's current `due_date` (the anchor). The
//! time of day of the anchor carries over to the next occurrence.
//!
//! Policies:
//! - monthly/yearly clamp to the end of the month (Jan 31 + 1 month = Feb 28/29,
//!   Feb 29 + 1 year = Feb 28)
//! - `end_date` is inclusive and compared by calendar day
//! - weekday indices follow Sunday = 0; out-of-range indices are ignored
//! - an `interval` of 0 is read as 1

use chrono::{Datelike, Days, Months, NaiveDateTime};

use crate::task::{Frequency, Recurrence, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedRecurrence {
    /// `custom` needs at least one weekday to mean anything.
    CustomWithoutDays,
    /// Arithmetic left chrono's representable range.
    OutOfRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurrenceOutcome {
    Next(NaiveDateTime),
    /// No recurrence config, or it is switched off.
    NotRecurring,
    MissingDueDate,
    /// The computed date falls after the series' end date.
    Ended {
        next: NaiveDateTime,
        end_date: NaiveDateTime,
    },
    Unsupported(UnsupportedRecurrence),
}

impl RecurrenceOutcome {
    pub fn next(self) -> Option<NaiveDateTime> {
        match self {
            Self::Next(dt) => Some(dt),
            _ => None,
        }
    }
}

/// Next due date, or `None` when the series cannot or should not continue.
pub fn next_occurrence(task: &Task) -> Option<NaiveDateTime> {
    evaluate(task).next()
}

/// Like [`next_occurrence`], but says why there is no next date.
pub fn evaluate(task: &Task) -> RecurrenceOutcome {
    let Some(rule) = task.active_recurrence() else {
        return RecurrenceOutcome::NotRecurring;
    };
    let Some(anchor) = task.due_date else {
        return RecurrenceOutcome::MissingDueDate;
    };

    let next = match advance(anchor, rule) {
        Ok(next) => next,
        Err(reason) => return RecurrenceOutcome::Unsupported(reason),
    };

    match rule.end_date {
        Some(end_date) if next.date() > end_date.date() => {
            RecurrenceOutcome::Ended { next, end_date }
        }
        _ => RecurrenceOutcome::Next(next),
    }
}

fn advance(anchor: NaiveDateTime, rule: &Recurrence) -> Result<NaiveDateTime, UnsupportedRecurrence> {
    let interval = rule.interval.max(1);
    let days = selected_weekdays(&rule.days_of_week);

    let next = match rule.frequency {
        Frequency::Daily => anchor.checked_add_days(Days::new(u64::from(interval))),
        Frequency::Weekly | Frequency::Custom if !days.is_empty() => {
            anchor.checked_add_days(Days::new(weekday_offset(anchor, &days, interval)))
        }
        Frequency::Weekly => anchor.checked_add_days(Days::new(7 * u64::from(interval))),
        Frequency::Custom => return Err(UnsupportedRecurrence::CustomWithoutDays),
        Frequency::Monthly => anchor.checked_add_months(Months::new(interval)),
        Frequency::Yearly => interval
            .checked_mul(12)
            .and_then(|m| anchor.checked_add_months(Months::new(m))),
    };

    next.ok_or(UnsupportedRecurrence::OutOfRange)
}

/// Sorted, deduplicated indices in 0..=6.
fn selected_weekdays(raw: &[u8]) -> Vec<u64> {
    let mut days: Vec<u64> = raw.iter().filter(|d| **d <= 6).map(|d| u64::from(*d)).collect();
    days.sort_unstable();
    days.dedup();
    days
}

/// Days to add: the next selected weekday later this week, otherwise the
/// first selected weekday of the week `interval` weeks on.
fn weekday_offset(anchor: NaiveDateTime, days: &[u64], interval: u32) -> u64 {
    let current = u64::from(anchor.weekday().num_days_from_sunday());
    match days.iter().find(|d| **d > current) {
        Some(d) => d - current,
        None => 7 * u64::from(interval) - current + days[0],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::fixtures::{date, task};
    use chrono::Weekday;

    fn recurring(due: NaiveDateTime, rule: Recurrence) -> Task {
        task("r").with_due(due).with_recurrence(rule)
    }

    #[test]
    fn wednesday_with_mon_wed_goes_to_next_monday() {
        let wed = date(2025, 3, 5);
        assert_eq!(wed.weekday(), Weekday::Wed);
        let t = recurring(wed, Recurrence::new(Frequency::Weekly, 1).on_days([1, 3]));
        assert_eq!(next_occurrence(&t), Some(date(2025, 3, 10)));
    }

    #[test]
    fn monday_with_mon_wed_stays_in_week() {
        let t = recurring(date(2025, 3, 3), Recurrence::new(Frequency::Weekly, 1).on_days([3, 1]));
        assert_eq!(next_occurrence(&t), Some(date(2025, 3, 5)));
    }

    #[test]
    fn wrap_honours_interval() {
        // Friday, only Fridays selected, every 2 weeks.
        let fri = date(2025, 3, 7);
        let t = recurring(fri, Recurrence::new(Frequency::Weekly, 2).on_days([5]));
        assert_eq!(next_occurrence(&t), Some(date(2025, 3, 21)));
    }

    #[test]
    fn custom_with_days_behaves_like_weekly() {
        let t = recurring(date(2025, 3, 5), Recurrence::new(Frequency::Custom, 1).on_days([6]));
        assert_eq!(next_occurrence(&t), Some(date(2025, 3, 8)));
    }

    #[test]
    fn custom_without_days_is_unsupported() {
        let t = recurring(date(2025, 3, 5), Recurrence::new(Frequency::Custom, 1));
        assert_eq!(
            evaluate(&t),
            RecurrenceOutcome::Unsupported(UnsupportedRecurrence::CustomWithoutDays)
        );
        assert_eq!(next_occurrence(&t), None);
    }

    #[test]
    fn daily_and_plain_weekly() {
        let d = recurring(date(2025, 3, 30), Recurrence::new(Frequency::Daily, 3));
        assert_eq!(next_occurrence(&d), Some(date(2025, 4, 2)));

        let w = recurring(date(2025, 3, 5), Recurrence::new(Frequency::Weekly, 2));
        assert_eq!(next_occurrence(&w), Some(date(2025, 3, 19)));
    }

    #[test]
    fn monthly_clamps_to_month_end() {
        let t = recurring(date(2025, 1, 31), Recurrence::new(Frequency::Monthly, 1));
        assert_eq!(next_occurrence(&t), Some(date(2025, 2, 28)));

        let leap = recurring(date(2024, 1, 31), Recurrence::new(Frequency::Monthly, 1));
        assert_eq!(next_occurrence(&leap), Some(date(2024, 2, 29)));

        let quarter = recurring(date(2025, 11, 15), Recurrence::new(Frequency::Monthly, 3));
        assert_eq!(next_occurrence(&quarter), Some(date(2026, 2, 15)));
    }

    #[test]
    fn yearly_from_leap_day() {
        let t = recurring(date(2024, 2, 29), Recurrence::new(Frequency::Yearly, 1));
        assert_eq!(next_occurrence(&t), Some(date(2025, 2, 28)));
    }

    #[test]
    fn keeps_time_of_day() {
        let due = date(2025, 3, 5).date().and_hms_opt(17, 45, 0).unwrap();
        let t = recurring(due, Recurrence::new(Frequency::Daily, 1));
        assert_eq!(
            next_occurrence(&t),
            Some(date(2025, 3, 6).date().and_hms_opt(17, 45, 0).unwrap())
        );
    }

    #[test]
    fn end_date_is_inclusive() {
        let on_boundary = Recurrence::new(Frequency::Daily, 1).until(date(2025, 3, 6));
        let t = recurring(date(2025, 3, 5), on_boundary);
        assert_eq!(next_occurrence(&t), Some(date(2025, 3, 6)));

        let past = Recurrence::new(Frequency::Daily, 1).until(date(2025, 3, 5));
        let t = recurring(date(2025, 3, 5), past);
        assert_eq!(
            evaluate(&t),
            RecurrenceOutcome::Ended {
                next: date(2025, 3, 6),
                end_date: date(2025, 3, 5)
            }
        );
    }

    #[test]
    fn end_date_time_of_day_does_not_matter() {
        let due = date(2025, 3, 5).date().and_hms_opt(18, 0, 0).unwrap();
        let rule = Recurrence::new(Frequency::Daily, 1).until(date(2025, 3, 6));
        assert!(next_occurrence(&recurring(due, rule)).is_some());
    }

    #[test]
    fn not_recurring_or_dateless_is_none() {
        assert_eq!(evaluate(&task("plain")), RecurrenceOutcome::NotRecurring);

        let mut off = Recurrence::new(Frequency::Daily, 1);
        off.enabled = false;
        let t = recurring(date(2025, 3, 5), off);
        assert_eq!(evaluate(&t), RecurrenceOutcome::NotRecurring);

        let dateless = task("d").with_recurrence(Recurrence::new(Frequency::Daily, 1));
        assert_eq!(evaluate(&dateless), RecurrenceOutcome::MissingDueDate);
    }

    #[test]
    fn zero_interval_reads_as_one_and_bad_days_are_ignored() {
        let t = recurring(date(2025, 3, 5), Recurrence::new(Frequency::Weekly, 0).on_days([9, 4]));
        assert_eq!(next_occurrence(&t), Some(date(2025, 3, 6)));
    }
}
