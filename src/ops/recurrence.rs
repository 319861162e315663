use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};

use crate::model::recurrence::{Frequency, RecurrenceRule};

/// The first occurrence of `rule` strictly after `anchor`.
///
/// Weeks start on Sunday. Month arithmetic clamps to the last day of a
/// shorter month (Jan 31 + 1 month = Feb 28/29). Returns `None` only if
/// the result is outside the representable date range.
pub fn next_occurrence(rule: &RecurrenceRule, anchor: NaiveDate) -> Option<NaiveDate> {
    let interval = rule.interval.get();
    match rule.frequency {
        Frequency::Daily => anchor.checked_add_days(Days::new(u64::from(interval))),
        Frequency::Weekly => {
            let days: Vec<u32> = rule
                .weekdays()
                .iter()
                .map(|w| w.num_days_from_sunday())
                .collect();
            if days.is_empty() {
                return anchor.checked_add_days(Days::new(7 * u64::from(interval)));
            }
            let today = anchor.weekday().num_days_from_sunday();
            if let Some(&later) = days.iter().find(|&&d| d > today) {
                return anchor.checked_add_days(Days::new(u64::from(later - today)));
            }
            let week_start = anchor.checked_sub_days(Days::new(u64::from(today)))?;
            // days is sorted ascending (BTreeSet order)
            let first = u64::from(days[0]);
            week_start.checked_add_days(Days::new(7 * u64::from(interval) + first))
        }
        Frequency::Monthly => anchor.checked_add_months(Months::new(interval)),
        Frequency::Yearly => anchor.checked_add_months(Months::new(interval.checked_mul(12)?)),
    }
}

/// Like [`next_occurrence`], keeping the anchor's time of day.
pub fn next_due(rule: &RecurrenceRule, anchor: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let date = next_occurrence(rule, anchor.date_naive())?;
    Some(date.and_time(anchor.time()).and_utc())
}

/// Successive occurrences after an anchor.
///
/// Monthly and yearly rules are measured from the original anchor each
/// step, so a rule anchored on the 31st returns to the 31st whenever the
/// month allows it instead of drifting to the 28th.
#[derive(Debug, Clone)]
pub struct Occurrences<'r> {
    rule: &'r RecurrenceRule,
    anchor: NaiveDate,
    previous: Option<NaiveDate>,
    step: u32,
}

pub fn occurrences(rule: &RecurrenceRule, anchor: NaiveDate) -> Occurrences<'_> {
    Occurrences {
        rule,
        anchor,
        previous: Some(anchor),
        step: 0,
    }
}

impl Iterator for Occurrences<'_> {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let previous = self.previous?;
        self.step = self.step.checked_add(1)?;
        let next = match self.rule.frequency {
            Frequency::Monthly | Frequency::Yearly => {
                let per_step = match self.rule.frequency {
                    Frequency::Yearly => self.rule.interval.get().checked_mul(12),
                    _ => Some(self.rule.interval.get()),
                };
                per_step
                    .and_then(|m| m.checked_mul(self.step))
                    .and_then(|months| self.anchor.checked_add_months(Months::new(months)))
            }
            Frequency::Daily | Frequency::Weekly => next_occurrence(self.rule, previous),
        };
        self.previous = next;
        next
    }
}
