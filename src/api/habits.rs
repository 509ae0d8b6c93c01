use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::parse_habit_id;
use super::{
    ApiError, ApiResponse, AppState, CreateHabitRequest, EntryDto, HabitCompletionDto, HabitDto,
    ProgressResponseDto, RecordOutcomeQuery,
};
use crate::domain::Outcome;
use crate::services::{HabitStats, NewHabit};

/// POST /habits
pub async fn create_habit(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<CreateHabitRequest>,
) -> Result<(StatusCode, Json<ApiResponse<HabitDto>>), ApiError> {
    let input = NewHabit::new(&payload.title, &payload.description)?;
    let habit = state.habit_service().create_habit(user.id, input).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(HabitDto::from(&habit))),
    ))
}

/// GET /habits
pub async fn list_habits(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<HabitDto>>>, ApiError> {
    let habits = state.habit_service().list_habits(user.id).await?;
    Ok(Json(ApiResponse::success(
        habits.iter().map(HabitDto::from).collect(),
    )))
}

/// GET /habits/{id}
pub async fn get_habit(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<HabitDto>>, ApiError> {
    let id = parse_habit_id(&id)?;
    let habit = state.habit_service().get_habit(id, user.id).await?;
    Ok(Json(ApiResponse::success(HabitDto::from(&habit))))
}

/// POST /habits/{id}/complete
pub async fn complete_habit(
    state: State<Arc<AppState>>,
    user: Extension<CurrentUser>,
    id: Path<String>,
    query: Query<RecordOutcomeQuery>,
) -> Result<Json<ApiResponse<HabitCompletionDto>>, ApiError> {
    record(state, user, id, query, Outcome::Completed).await
}

/// POST /habits/{id}/miss
pub async fn miss_habit(
    state: State<Arc<AppState>>,
    user: Extension<CurrentUser>,
    id: Path<String>,
    query: Query<RecordOutcomeQuery>,
) -> Result<Json<ApiResponse<HabitCompletionDto>>, ApiError> {
    record(state, user, id, query, Outcome::Missed).await
}

async fn record(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Query(query): Query<RecordOutcomeQuery>,
    outcome: Outcome,
) -> Result<Json<ApiResponse<HabitCompletionDto>>, ApiError> {
    let id = parse_habit_id(&id)?;
    let habit = state
        .habit_service()
        .record_outcome(id, user.id, outcome, query.on)
        .await?;

    Ok(Json(ApiResponse::success(HabitCompletionDto::from(
        HabitStats::from(&habit),
    ))))
}

/// GET /habits/{id}/progress
pub async fn get_progress(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ProgressResponseDto>>, ApiError> {
    let id = parse_habit_id(&id)?;
    let stats = state.habit_service().get_stats(id, user.id).await?;
    Ok(Json(ApiResponse::success(ProgressResponseDto::from(stats))))
}

/// GET /habits/{id}/entries
pub async fn list_entries(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<EntryDto>>>, ApiError> {
    let id = parse_habit_id(&id)?;
    let habit = state.habit_service().get_habit(id, user.id).await?;
    Ok(Json(ApiResponse::success(
        habit.entries().iter().map(EntryDto::from).collect(),
    )))
}
