//! In-memory storage for users and habits.
//!
//! `Store` is cheap to clone; every clone shares the same tables. Nothing is
//! persisted: the tables live for as long as the process does.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::info;

use crate::config::{SecurityConfig, SeedUser};
use crate::domain::{Habit, HabitId, Outcome, UserId};

pub mod repositories;

pub use repositories::habit::{HabitAccessError, HabitTable};
pub use repositories::user::{User, UserTable, hash_password};

#[derive(Clone, Default)]
pub struct Store {
    habits: HabitTable,
    users: UserTable,
}

impl Store {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the configured seed users. A `password_hash` is stored as is;
    /// a plaintext password is hashed first.
    pub async fn seed_users(&self, users: &[SeedUser], security: &SecurityConfig) -> Result<()> {
        let repo = self.user_repo();
        for seed in users {
            match &seed.password_hash {
                Some(hash) => repo.create_with_hash(&seed.username, hash).await?,
                None => repo.create(&seed.username, &seed.password, security).await?,
            };
        }
        info!("Seeded {} user(s)", users.len());
        Ok(())
    }

    fn habit_repo(&self) -> repositories::habit::HabitRepository {
        repositories::habit::HabitRepository::new(self.habits.clone())
    }

    pub fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.users.clone())
    }

    // ========================================================================
    // Habits
    // ========================================================================

    pub async fn create_habit(
        &self,
        owner: UserId,
        title: &str,
        description: &str,
        now: DateTime<Utc>,
    ) -> Habit {
        self.habit_repo().create(owner, title, description, now).await
    }

    pub async fn get_habit(
        &self,
        id: HabitId,
        requester: UserId,
    ) -> Result<Habit, HabitAccessError> {
        self.habit_repo().get(id, requester).await
    }

    pub async fn record_outcome(
        &self,
        id: HabitId,
        requester: UserId,
        outcome: Outcome,
        on: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Habit, HabitAccessError> {
        self.habit_repo()
            .record_outcome(id, requester, outcome, on, now)
            .await
    }

    pub async fn list_habits(&self, owner: UserId) -> Vec<Habit> {
        self.habit_repo().list_for_owner(owner).await
    }

    // ========================================================================
    // Users
    // ========================================================================

    pub async fn get_user_by_id(&self, id: UserId) -> Option<User> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn verify_user_password(&self, username: &str, password: &str) -> Result<Option<User>> {
        self.user_repo().verify_password(username, password).await
    }

    pub async fn user_count(&self) -> usize {
        self.user_repo().count().await
    }
}
