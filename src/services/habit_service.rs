//! Domain service for habit tracking operations.
//!
//! This module provides the [`HabitService`] trait: creating habits, recording
//! a day's outcome, and reading derived progress and streak values. Every
//! operation except creation is scoped to the requesting user.

use chrono::NaiveDate;
use thiserror::Error;

use crate::db::HabitAccessError;
use crate::domain::habit::EntryError;
use crate::domain::{Habit, HabitId, Outcome, Progress, Streak, UserId};

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 2000;

/// Domain errors for habit operations.
#[derive(Debug, Error)]
pub enum HabitError {
    #[error("Habit with id {0} not found")]
    NotFound(HabitId),

    #[error("Not authorized to access this habit")]
    Forbidden(HabitId),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl From<HabitAccessError> for HabitError {
    fn from(err: HabitAccessError) -> Self {
        match err {
            HabitAccessError::NotFound(id) => Self::NotFound(id),
            HabitAccessError::Forbidden(id) => Self::Forbidden(id),
            HabitAccessError::Entry(entry @ EntryError::DuplicateDate(_)) => {
                Self::Conflict(entry.to_string())
            }
            HabitAccessError::Entry(entry @ EntryError::OutOfOrder { .. }) => {
                Self::Validation(entry.to_string())
            }
        }
    }
}

/// Validated input for creating a habit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHabit {
    title: String,
    description: String,
}

impl NewHabit {
    /// Trims the title, which must then be non-empty. The description is
    /// kept as given.
    ///
    /// # Errors
    ///
    /// Returns [`HabitError::Validation`] for an empty or oversized title or
    /// an oversized description.
    pub fn new(title: &str, description: &str) -> Result<Self, HabitError> {
        let title = title.trim();

        if title.is_empty() {
            return Err(HabitError::Validation("Title cannot be empty".to_string()));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(HabitError::Validation(format!(
                "Title must be {MAX_TITLE_LEN} characters or less"
            )));
        }
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(HabitError::Validation(format!(
                "Description must be {MAX_DESCRIPTION_LEN} characters or less"
            )));
        }

        Ok(Self {
            title: title.to_string(),
            description: description.to_string(),
        })
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Progress and streak of one habit, computed from the same snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HabitStats {
    pub habit_id: HabitId,
    pub progress: Progress,
    pub streak: Streak,
}

impl From<&Habit> for HabitStats {
    fn from(habit: &Habit) -> Self {
        Self {
            habit_id: habit.habit_id,
            progress: habit.progress(),
            streak: habit.streak(),
        }
    }
}

/// Domain service trait for habit operations.
#[async_trait::async_trait]
pub trait HabitService: Send + Sync {
    /// Creates a habit owned by `owner` with an empty entry log.
    async fn create_habit(&self, owner: UserId, input: NewHabit) -> Result<Habit, HabitError>;

    /// Gets a habit owned by `requester`.
    ///
    /// # Errors
    ///
    /// Returns [`HabitError::NotFound`] or [`HabitError::Forbidden`].
    async fn get_habit(&self, id: HabitId, requester: UserId) -> Result<Habit, HabitError>;

    /// Lists the habits owned by `owner`.
    async fn list_habits(&self, owner: UserId) -> Result<Vec<Habit>, HabitError>;

    /// Records an outcome for `on`, defaulting to today.
    ///
    /// # Errors
    ///
    /// Returns [`HabitError::Conflict`] if the day is already recorded and
    /// [`HabitError::Validation`] if `on` is before the latest entry, in
    /// addition to the errors of [`HabitService::get_habit`].
    async fn record_outcome(
        &self,
        id: HabitId,
        requester: UserId,
        outcome: Outcome,
        on: Option<NaiveDate>,
    ) -> Result<Habit, HabitError>;

    /// Gets a habit's progress and streak.
    async fn get_stats(&self, id: HabitId, requester: UserId) -> Result<HabitStats, HabitError>;
}
