use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::domain::habit::EntryError;
use crate::domain::{Habit, HabitId, Outcome, UserId};

pub type HabitTable = Arc<RwLock<HashMap<HabitId, Habit>>>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HabitAccessError {
    #[error("Habit with id {0} not found")]
    NotFound(HabitId),

    #[error("Not authorized to access this habit")]
    Forbidden(HabitId),

    #[error(transparent)]
    Entry(#[from] EntryError),
}

pub struct HabitRepository {
    table: HabitTable,
}

impl HabitRepository {
    #[must_use]
    pub const fn new(table: HabitTable) -> Self {
        Self { table }
    }

    /// Creates and stores a habit under a fresh identifier.
    pub async fn create(
        &self,
        owner: UserId,
        title: &str,
        description: &str,
        now: DateTime<Utc>,
    ) -> Habit {
        let mut habits = self.table.write().await;

        // Retry on id collision.
        loop {
            let habit_id = HabitId::new();
            if let Entry::Vacant(slot) = habits.entry(habit_id) {
                let habit = Habit::create(habit_id, owner, title, description, now);
                slot.insert(habit.clone());
                return habit;
            }
        }
    }

    /// Get a habit, checking that `requester` owns it.
    pub async fn get(&self, id: HabitId, requester: UserId) -> Result<Habit, HabitAccessError> {
        let habits = self.table.read().await;
        let habit = habits.get(&id).ok_or(HabitAccessError::NotFound(id))?;
        check_owner(habit, requester)?;
        Ok(habit.clone())
    }

    /// Append an outcome under the write lock so concurrent appends to one
    /// habit are serialized.
    pub async fn record_outcome(
        &self,
        id: HabitId,
        requester: UserId,
        outcome: Outcome,
        on: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Habit, HabitAccessError> {
        let mut habits = self.table.write().await;
        let habit = habits.get_mut(&id).ok_or(HabitAccessError::NotFound(id))?;
        check_owner(habit, requester)?;
        habit.append(outcome, on, now)?;
        Ok(habit.clone())
    }

    /// All habits owned by `owner`, oldest first.
    pub async fn list_for_owner(&self, owner: UserId) -> Vec<Habit> {
        let habits = self.table.read().await;
        let mut owned: Vec<Habit> = habits
            .values()
            .filter(|h| h.is_owned_by(owner))
            .cloned()
            .collect();
        owned.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.habit_id.cmp(&b.habit_id))
        });
        owned
    }

    pub async fn count(&self) -> usize {
        self.table.read().await.len()
    }
}

fn check_owner(habit: &Habit, requester: UserId) -> Result<(), HabitAccessError> {
    if habit.is_owned_by(requester) {
        Ok(())
    } else {
        Err(HabitAccessError::Forbidden(habit.habit_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::collections::HashSet;

    fn repo() -> HabitRepository {
        HabitRepository::new(HabitTable::default())
    }

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 1).unwrap() + Duration::days(n)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = repo();
        let owner = UserId::new();
        let habit = repo.create(owner, "Read", "20 pages", Utc::now()).await;

        let fetched = repo.get(habit.habit_id, owner).await.unwrap();
        assert_eq!(fetched, habit);
        assert_eq!(fetched.progress().total, 0);
        assert_eq!(fetched.streak().count, 0);
    }

    #[tokio::test]
    async fn test_get_unknown_is_not_found() {
        let repo = repo();
        let id = HabitId::new();
        let err = repo.get(id, UserId::new()).await.unwrap_err();
        assert_eq!(err, HabitAccessError::NotFound(id));
    }

    #[tokio::test]
    async fn test_other_user_is_forbidden() {
        let repo = repo();
        let owner = UserId::new();
        let intruder = UserId::new();
        let habit = repo.create(owner, "Read", "", Utc::now()).await;

        let err = repo.get(habit.habit_id, intruder).await.unwrap_err();
        assert_eq!(err, HabitAccessError::Forbidden(habit.habit_id));

        let err = repo
            .record_outcome(habit.habit_id, intruder, Outcome::Completed, day(0), Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err, HabitAccessError::Forbidden(habit.habit_id));

        // the forbidden append left the log untouched
        let stored = repo.get(habit.habit_id, owner).await.unwrap();
        assert!(stored.entries().is_empty());
    }

    #[tokio::test]
    async fn test_record_outcome_appends() {
        let repo = repo();
        let owner = UserId::new();
        let habit = repo.create(owner, "Run", "", Utc::now()).await;

        for (i, outcome) in [Outcome::Completed, Outcome::Missed, Outcome::Completed, Outcome::Completed]
            .into_iter()
            .enumerate()
        {
            repo.record_outcome(habit.habit_id, owner, outcome, day(i as i64), Utc::now())
                .await
                .unwrap();
        }

        let stored = repo.get(habit.habit_id, owner).await.unwrap();
        let progress = stored.progress();
        assert_eq!((progress.completed, progress.total, progress.percentage), (3, 4, 75));
        assert_eq!(stored.streak().count, 2);
    }

    #[tokio::test]
    async fn test_duplicate_date_is_rejected() {
        let repo = repo();
        let owner = UserId::new();
        let habit = repo.create(owner, "Run", "", Utc::now()).await;

        repo.record_outcome(habit.habit_id, owner, Outcome::Completed, day(0), Utc::now())
            .await
            .unwrap();
        let err = repo
            .record_outcome(habit.habit_id, owner, Outcome::Completed, day(0), Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err, HabitAccessError::Entry(EntryError::DuplicateDate(day(0))));
        assert_eq!(repo.get(habit.habit_id, owner).await.unwrap().entries().len(), 1);
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let repo = repo();
        let owner = UserId::new();
        let mut ids = HashSet::new();
        for i in 0..500 {
            let habit = repo.create(owner, &format!("Habit {i}"), "", Utc::now()).await;
            assert!(ids.insert(habit.habit_id));
        }
        assert_eq!(repo.count().await, 500);
    }

    #[tokio::test]
    async fn test_list_for_owner_filters() {
        let repo = repo();
        let alice = UserId::new();
        let bob = UserId::new();
        let start = Utc::now();

        let first = repo.create(alice, "A1", "", start).await;
        repo.create(bob, "B1", "", start).await;
        let second = repo.create(alice, "A2", "", start + Duration::seconds(1)).await;

        let listed = repo.list_for_owner(alice).await;
        let ids: Vec<HabitId> = listed.iter().map(|h| h.habit_id).collect();
        assert_eq!(ids, vec![first.habit_id, second.habit_id]);
        assert_eq!(repo.list_for_owner(bob).await.len(), 1);
        assert!(repo.list_for_owner(UserId::new()).await.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_not_lost() {
        let table = HabitTable::default();
        let owner = UserId::new();
        let habit = HabitRepository::new(table.clone())
            .create(owner, "Meditate", "", Utc::now())
            .await;

        let mut handles = Vec::new();
        for i in 0..50 {
            let repo = HabitRepository::new(table.clone());
            let id = habit.habit_id;
            handles.push(tokio::spawn(async move {
                // distinct dates; any ordering that loses the race is rejected
                repo.record_outcome(id, owner, Outcome::Completed, day(i), Utc::now())
                    .await
                    .is_ok()
            }));
        }

        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                accepted += 1;
            }
        }

        let stored = HabitRepository::new(table).get(habit.habit_id, owner).await.unwrap();
        assert_eq!(stored.entries().len(), accepted);
        assert!(stored.entries().windows(2).all(|w| w[0].date < w[1].date));
    }
}
