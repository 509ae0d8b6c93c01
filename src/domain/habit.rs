//! The `Habit` aggregate and its append-only entry log.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use super::stats::{Progress, Streak};
use super::{HabitId, Outcome, UserId};

/// Reasons an entry cannot be appended to a habit's log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryError {
    #[error("An entry for {0} has already been recorded")]
    DuplicateDate(NaiveDate),

    #[error("Entry date {date} is before the latest recorded entry ({latest})")]
    OutOfOrder { date: NaiveDate, latest: NaiveDate },
}

/// One dated outcome recorded against a habit. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HabitEntry {
    pub entry_id: Uuid,
    pub date: NaiveDate,
    pub completed: bool,
}

impl HabitEntry {
    #[must_use]
    pub fn new(date: NaiveDate, outcome: Outcome) -> Self {
        Self {
            entry_id: Uuid::new_v4(),
            date,
            completed: outcome.is_completed(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Habit {
    pub habit_id: HabitId,
    pub user_id: UserId,
    pub title: String,
    pub description: String,
    entries: Vec<HabitEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Habit {
    #[must_use]
    pub fn create(
        habit_id: HabitId,
        user_id: UserId,
        title: impl Into<String>,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            habit_id,
            user_id,
            title: title.into(),
            description: description.into(),
            entries: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Entries in chronological (insertion) order.
    #[must_use]
    pub fn entries(&self) -> &[HabitEntry] {
        &self.entries
    }

    #[must_use]
    pub fn latest_entry(&self) -> Option<&HabitEntry> {
        self.entries.last()
    }

    #[must_use]
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    /// Appends an outcome for `on`.
    ///
    /// Entry dates must be strictly increasing: a second entry for the same
    /// day is rejected, as is back-filling a day before the latest entry.
    /// The log is left untouched on error.
    ///
    /// # Errors
    ///
    /// Returns [`EntryError::DuplicateDate`] or [`EntryError::OutOfOrder`].
    pub fn append(
        &mut self,
        outcome: Outcome,
        on: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<&HabitEntry, EntryError> {
        if let Some(latest) = self.latest_entry() {
            if latest.date == on {
                return Err(EntryError::DuplicateDate(on));
            }
            if on < latest.date {
                return Err(EntryError::OutOfOrder {
                    date: on,
                    latest: latest.date,
                });
            }
        }

        self.entries.push(HabitEntry::new(on, outcome));
        self.updated_at = now;
        Ok(&self.entries[self.entries.len() - 1])
    }

    #[must_use]
    pub fn progress(&self) -> Progress {
        Progress::compute(&self.entries)
    }

    #[must_use]
    pub fn streak(&self) -> Streak {
        Streak::compute(&self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap() + Duration::days(n)
    }

    fn habit() -> Habit {
        Habit::create(
            HabitId::new(),
            UserId::new(),
            "Morning Exercise",
            "30 minutes",
            Utc::now(),
        )
    }

    #[test]
    fn test_create_starts_empty() {
        let habit = habit();
        assert!(habit.entries().is_empty());
        assert_eq!(habit.created_at, habit.updated_at);
        assert_eq!(habit.progress(), Progress::default());
        assert_eq!(habit.streak().count, 0);
    }

    #[test]
    fn test_append_updates_timestamp() {
        let mut habit = habit();
        let later = habit.created_at + Duration::hours(3);

        let entry = habit.append(Outcome::Completed, day(0), later).unwrap();
        assert!(entry.completed);
        assert_eq!(entry.date, day(0));
        assert_eq!(habit.updated_at, later);
        assert_eq!(habit.entries().len(), 1);
    }

    #[test]
    fn test_append_rejects_duplicate_date() {
        let mut habit = habit();
        habit.append(Outcome::Completed, day(0), Utc::now()).unwrap();
        let before = habit.clone();

        let err = habit.append(Outcome::Missed, day(0), Utc::now()).unwrap_err();
        assert_eq!(err, EntryError::DuplicateDate(day(0)));
        assert_eq!(habit, before);
    }

    #[test]
    fn test_append_rejects_earlier_date() {
        let mut habit = habit();
        habit.append(Outcome::Completed, day(5), Utc::now()).unwrap();

        let err = habit.append(Outcome::Completed, day(2), Utc::now()).unwrap_err();
        assert!(matches!(err, EntryError::OutOfOrder { .. }));
        assert_eq!(habit.entries().len(), 1);
    }

    #[test]
    fn test_entries_have_unique_ids() {
        let mut habit = habit();
        habit.append(Outcome::Completed, day(0), Utc::now()).unwrap();
        habit.append(Outcome::Completed, day(1), Utc::now()).unwrap();
        assert_ne!(habit.entries()[0].entry_id, habit.entries()[1].entry_id);
    }
}
