//! Progress and streak values derived from an entry log.
//!
//! Both are recomputed from the log on every read and never stored.

use chrono::NaiveDate;
use serde::Serialize;

use super::habit::HabitEntry;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub completed: u32,
    pub total: u32,
    pub percentage: u8,
}

impl Progress {
    #[must_use]
    pub fn compute(entries: &[HabitEntry]) -> Self {
        let total = u32::try_from(entries.len()).unwrap_or(u32::MAX);
        let completed = u32::try_from(entries.iter().filter(|e| e.completed).count())
            .unwrap_or(u32::MAX);

        Self {
            completed,
            total,
            percentage: percentage(completed, total),
        }
    }

    #[must_use]
    pub const fn missed(&self) -> u32 {
        self.total - self.completed
    }
}

/// `round(100 * completed / total)` with halves rounded up, 0 for an empty log.
fn percentage(completed: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = u64::from(completed);
    let total = u64::from(total);
    let rounded = (200 * completed + total) / (2 * total);
    u8::try_from(rounded.min(100)).unwrap_or(100)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Streak {
    /// Consecutive completed days ending at the newest entry.
    pub count: u32,
    /// Longest run of consecutive completed days anywhere in the log.
    pub longest: u32,
}

impl Streak {
    /// `entries` must be ordered oldest to newest.
    #[must_use]
    pub fn compute(entries: &[HabitEntry]) -> Self {
        Self {
            count: current_run(entries),
            longest: longest_run(entries),
        }
    }
}

fn is_next_day(earlier: NaiveDate, later: NaiveDate) -> bool {
    earlier.succ_opt() == Some(later)
}

fn current_run(entries: &[HabitEntry]) -> u32 {
    let mut count = 0;
    let mut next: Option<NaiveDate> = None;

    for entry in entries.iter().rev() {
        if !entry.completed {
            break;
        }
        if let Some(next_date) = next
            && !is_next_day(entry.date, next_date)
        {
            break;
        }
        count += 1;
        next = Some(entry.date);
    }

    count
}

fn longest_run(entries: &[HabitEntry]) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut prev: Option<&HabitEntry> = None;

    for entry in entries {
        run = match (entry.completed, prev) {
            (false, _) => 0,
            (true, Some(p)) if p.completed && is_next_day(p.date, entry.date) => run + 1,
            (true, _) => 1,
        };
        longest = longest.max(run);
        prev = Some(entry);
    }

    longest
}
