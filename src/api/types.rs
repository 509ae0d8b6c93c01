use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Habit, HabitEntry, Progress, Streak};
use crate::services::HabitStats;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateHabitRequest {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecordOutcomeQuery {
    /// Day to record, `YYYY-MM-DD`. Defaults to today.
    pub on: Option<NaiveDate>,
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressDto {
    pub completed_entries: u32,
    pub total_entries: u32,
    pub percentage: u8,
}

impl From<Progress> for ProgressDto {
    fn from(progress: Progress) -> Self {
        Self {
            completed_entries: progress.completed,
            total_entries: progress.total,
            percentage: progress.percentage,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct StreakDto {
    pub count: u32,
    pub longest: u32,
}

impl From<Streak> for StreakDto {
    fn from(streak: Streak) -> Self {
        Self {
            count: streak.count,
            longest: streak.longest,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitDto {
    pub habit_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub progress: ProgressDto,
    pub streak: StreakDto,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Habit> for HabitDto {
    fn from(habit: &Habit) -> Self {
        Self {
            habit_id: habit.habit_id.value(),
            user_id: habit.user_id.value(),
            title: habit.title.clone(),
            description: habit.description.clone(),
            progress: habit.progress().into(),
            streak: habit.streak().into(),
            created_at: habit.created_at,
            updated_at: habit.updated_at,
        }
    }
}

/// Returned after recording a completion or miss.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitCompletionDto {
    pub habit_id: Uuid,
    pub progress: ProgressDto,
    pub streak: StreakDto,
}

impl From<HabitStats> for HabitCompletionDto {
    fn from(stats: HabitStats) -> Self {
        Self {
            habit_id: stats.habit_id.value(),
            progress: stats.progress.into(),
            streak: stats.streak.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProgressResponseDto {
    pub progress: ProgressDto,
    pub streak: StreakDto,
}

impl From<HabitStats> for ProgressResponseDto {
    fn from(stats: HabitStats) -> Self {
        Self {
            progress: stats.progress.into(),
            streak: stats.streak.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryDto {
    pub entry_id: Uuid,
    pub date: NaiveDate,
    pub completed: bool,
}

impl From<&HabitEntry> for EntryDto {
    fn from(entry: &HabitEntry) -> Self {
        Self {
            entry_id: entry.entry_id,
            date: entry.date,
            completed: entry.completed,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RootInfoDto {
    pub message: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct HealthDto {
    pub status: String,
}
