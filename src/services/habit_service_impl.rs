//! In-memory implementation of the `HabitService` trait.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info};

use crate::db::Store;
use crate::domain::{Habit, HabitId, Outcome, UserId};
use crate::services::clock::Clock;
use crate::services::habit_service::{HabitError, HabitService, HabitStats, NewHabit};

pub struct InMemoryHabitService {
    store: Store,
    clock: Arc<dyn Clock>,
}

impl InMemoryHabitService {
    #[must_use]
    pub fn new(store: Store, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }
}

#[async_trait]
impl HabitService for InMemoryHabitService {
    async fn create_habit(&self, owner: UserId, input: NewHabit) -> Result<Habit, HabitError> {
        let habit = self
            .store
            .create_habit(owner, input.title(), input.description(), self.clock.now())
            .await;

        metrics::counter!("habits_created_total").increment(1);
        info!(habit_id = %habit.habit_id, user_id = %owner, "Habit created");
        Ok(habit)
    }

    async fn get_habit(&self, id: HabitId, requester: UserId) -> Result<Habit, HabitError> {
        Ok(self.store.get_habit(id, requester).await?)
    }

    async fn list_habits(&self, owner: UserId) -> Result<Vec<Habit>, HabitError> {
        Ok(self.store.list_habits(owner).await)
    }

    async fn record_outcome(
        &self,
        id: HabitId,
        requester: UserId,
        outcome: Outcome,
        on: Option<NaiveDate>,
    ) -> Result<Habit, HabitError> {
        let now = self.clock.now();
        let on = on.unwrap_or_else(|| now.date_naive());

        let habit = self
            .store
            .record_outcome(id, requester, outcome, on, now)
            .await
            .inspect_err(|e| debug!(habit_id = %id, error = %e, "Outcome rejected"))?;

        metrics::counter!("habit_entries_recorded_total", "outcome" => outcome.as_str())
            .increment(1);
        info!(habit_id = %id, %outcome, date = %on, "Outcome recorded");
        Ok(habit)
    }

    async fn get_stats(&self, id: HabitId, requester: UserId) -> Result<HabitStats, HabitError> {
        let habit = self.store.get_habit(id, requester).await?;
        Ok(HabitStats::from(&habit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Progress;
    use crate::services::clock::FixedClock;
    use chrono::{TimeZone, Utc};

    fn service() -> (InMemoryHabitService, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2026, 1, 9, 8, 0, 0).unwrap(),
        ));
        (InMemoryHabitService::new(Store::new(), clock.clone()), clock)
    }

    async fn record_days(
        service: &InMemoryHabitService,
        clock: &FixedClock,
        id: HabitId,
        owner: UserId,
        outcomes: &[Outcome],
    ) -> Habit {
        let mut last = None;
        for &outcome in outcomes {
            last = Some(service
                .record_outcome(id, owner, outcome, None)
                .await
                .unwrap());
            clock.advance_days(1);
        }
        last.unwrap()
    }

    fn new_habit(title: &str) -> NewHabit {
        NewHabit::new(title, "description").unwrap()
    }

    #[tokio::test]
    async fn test_create_starts_at_zero() {
        let (service, _) = service();
        let owner = UserId::new();
        let habit = service.create_habit(owner, new_habit("Read")).await.unwrap();

        let stats = service.get_stats(habit.habit_id, owner).await.unwrap();
        assert_eq!(stats.progress, Progress::default());
        assert_eq!(stats.streak.count, 0);
        assert_eq!(habit.user_id, owner);
    }

    #[tokio::test]
    async fn test_scenarios_on_consecutive_days() {
        use Outcome::{Completed as C, Missed as M};

        let cases: [(&[Outcome], (u32, u32, u8), u32); 3] = [
            (&[C, C, C], (3, 3, 100), 3),
            (&[C, M, C, C], (3, 4, 75), 2),
            (&[C, C, M], (2, 3, 67), 0),
        ];

        for (outcomes, (completed, total, percentage), streak) in cases {
            let (service, clock) = service();
            let owner = UserId::new();
            let habit = service.create_habit(owner, new_habit("Run")).await.unwrap();
            record_days(&service, &clock, habit.habit_id, owner, outcomes).await;

            let stats = service.get_stats(habit.habit_id, owner).await.unwrap();
            assert_eq!(
                stats.progress,
                Progress {
                    completed,
                    total,
                    percentage
                }
            );
            assert_eq!(stats.streak.count, streak);
        }
    }

    #[tokio::test]
    async fn test_record_defaults_to_today() {
        let (service, clock) = service();
        let owner = UserId::new();
        let habit = service.create_habit(owner, new_habit("Run")).await.unwrap();

        let updated = service
            .record_outcome(habit.habit_id, owner, Outcome::Completed, None)
            .await
            .unwrap();
        assert_eq!(updated.entries()[0].date, clock.today());
        assert_eq!(updated.updated_at, clock.now());
    }

    #[tokio::test]
    async fn test_same_day_twice_conflicts() {
        let (service, _) = service();
        let owner = UserId::new();
        let habit = service.create_habit(owner, new_habit("Run")).await.unwrap();

        service
            .record_outcome(habit.habit_id, owner, Outcome::Completed, None)
            .await
            .unwrap();
        let err = service
            .record_outcome(habit.habit_id, owner, Outcome::Missed, None)
            .await
            .unwrap_err();
        assert!(matches!(err, HabitError::Conflict(_)));

        let stats = service.get_stats(habit.habit_id, owner).await.unwrap();
        assert_eq!(stats.progress.total, 1);
        assert_eq!(stats.streak.count, 1);
    }

    #[tokio::test]
    async fn test_backfill_before_latest_is_rejected() {
        let (service, clock) = service();
        let owner = UserId::new();
        let habit = service.create_habit(owner, new_habit("Run")).await.unwrap();
        let yesterday = clock.today().pred_opt().unwrap();

        service
            .record_outcome(habit.habit_id, owner, Outcome::Completed, None)
            .await
            .unwrap();
        let err = service
            .record_outcome(habit.habit_id, owner, Outcome::Completed, Some(yesterday))
            .await
            .unwrap_err();
        assert!(matches!(err, HabitError::Validation(_)));
    }

    #[tokio::test]
    async fn test_skipped_day_breaks_streak() {
        let (service, clock) = service();
        let owner = UserId::new();
        let habit = service.create_habit(owner, new_habit("Run")).await.unwrap();

        record_days(&service, &clock, habit.habit_id, owner, &[Outcome::Completed; 3]).await;
        clock.advance_days(1);
        record_days(&service, &clock, habit.habit_id, owner, &[Outcome::Completed]).await;

        let stats = service.get_stats(habit.habit_id, owner).await.unwrap();
        assert_eq!(stats.progress.percentage, 100);
        assert_eq!(stats.streak.count, 1);
        assert_eq!(stats.streak.longest, 3);
    }

    #[tokio::test]
    async fn test_other_users_are_forbidden() {
        let (service, _) = service();
        let owner = UserId::new();
        let other = UserId::new();
        let habit = service.create_habit(owner, new_habit("Read")).await.unwrap();

        assert!(matches!(
            service.get_habit(habit.habit_id, other).await,
            Err(HabitError::Forbidden(_))
        ));
        assert!(matches!(
            service.get_stats(habit.habit_id, other).await,
            Err(HabitError::Forbidden(_))
        ));
        assert!(matches!(
            service
                .record_outcome(habit.habit_id, other, Outcome::Completed, None)
                .await,
            Err(HabitError::Forbidden(_))
        ));
        assert!(matches!(
            service.get_habit(HabitId::new(), owner).await,
            Err(HabitError::NotFound(_))
        ));
        assert!(service.list_habits(other).await.unwrap().is_empty());
    }
}
