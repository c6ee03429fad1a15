//! Read endpoints for saved workouts.

use axum::Json;
use axum::extract::State;
use tracing::error;

use super::current_user::CurrentUser;
use super::errors::ApiError;
use crate::api::{RoutinesResponse, WorkoutProgramsResponse};
use crate::server::AppState;

/// GET /api/routines
pub async fn list_routines(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<RoutinesResponse>, ApiError> {
    let routines = state.store.list_routines(&user.id).await.map_err(|e| {
        error!(user_id = %user.id, error = %e, "failed to load routines");
        ApiError::internal("Failed to fetch routines")
    })?;

    Ok(Json(RoutinesResponse {
        success: true,
        routines,
    }))
}

/// GET /api/workout-programs
pub async fn list_workout_programs(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<WorkoutProgramsResponse>, ApiError> {
    let programs = state.store.list_programs(&user.id).await.map_err(|e| {
        error!(user_id = %user.id, error = %e, "failed to load workout programs");
        ApiError::internal("Failed to fetch workout programs")
    })?;

    Ok(Json(programs))
}
