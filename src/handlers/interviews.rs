use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::handlers::auth::CurrentSession;
use crate::handlers::common::{load_rows, nav_err, refresh_rows};
use crate::session::Screen;
use crate::table;
use crate::types::{AppState, RowsResponse};

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

pub async fn activate(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
) -> Result<Json<RowsResponse>, (StatusCode, String)> {
    let sheet_id = state.config.google.sheets.interviews.clone();
    let rows = refresh_rows(&state, &state.interviews, &sheet_id).await?;
    state
        .sessions
        .navigate(&current.token, Screen::Interviews)
        .await
        .map_err(nav_err)?;
    Ok(Json(RowsResponse { rows }))
}

pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<RowsResponse>, (StatusCode, String)> {
    let sheet_id = state.config.google.sheets.interviews.clone();
    let rows = load_rows(&state, &state.interviews, &sheet_id).await?;
    let hits = table::filter_any_column(&rows, query.q.trim());
    Ok(Json(RowsResponse::borrowed(hits)))
}

/// Interviews that already carry an assigned project.
pub async fn assigned(
    State(state): State<AppState>,
) -> Result<Json<RowsResponse>, (StatusCode, String)> {
    let sheet_id = state.config.google.sheets.interviews.clone();
    let rows = load_rows(&state, &state.interviews, &sheet_id).await?;
    let hits = table::filter_column_nonempty(&rows, table::INTERVIEW_ASSIGNED_COL);
    Ok(Json(RowsResponse::borrowed(hits)))
}

/// Interviews whose project has been received back.
pub async fn received(
    State(state): State<AppState>,
) -> Result<Json<RowsResponse>, (StatusCode, String)> {
    let sheet_id = state.config.google.sheets.interviews.clone();
    let rows = load_rows(&state, &state.interviews, &sheet_id).await?;
    let hits = table::filter_column_nonempty(&rows, table::INTERVIEW_RECEIVED_COL);
    Ok(Json(RowsResponse::borrowed(hits)))
}
