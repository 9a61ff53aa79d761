use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::handlers::auth::CurrentSession;
use crate::handlers::common::{load_rows, nav_err, refresh_rows, service_err};
use crate::session::Screen;
use crate::table::{self, Row};
use crate::types::{AppState, RowsResponse, SaveResponse};

#[derive(Deserialize)]
pub struct CandidateQuery {
    #[serde(default)]
    pub name: String,
}

#[derive(Deserialize)]
pub struct CategoryQuery {
    #[serde(default)]
    pub category: String,
}

#[derive(Deserialize)]
pub struct SaveRequest {
    pub rows: Vec<Row>,
}

#[derive(Serialize)]
pub struct ActivateResponse {
    pub rows: Vec<Row>,
    /// Distinct category values for the selection filter.
    pub categories: Vec<String>,
}

pub async fn activate(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
) -> Result<Json<ActivateResponse>, (StatusCode, String)> {
    let sheet_id = state.config.google.sheets.mentors.clone();
    let rows = refresh_rows(&state, &state.mentors, &sheet_id).await?;
    state
        .sessions
        .navigate(&current.token, Screen::Mentors)
        .await
        .map_err(nav_err)?;
    let categories = table::distinct_column_values(&rows, table::MENTOR_CATEGORY_COL);
    Ok(Json(ActivateResponse { rows, categories }))
}

/// Candidate search over the candidate-name column.
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<CandidateQuery>,
) -> Result<Json<RowsResponse>, (StatusCode, String)> {
    let sheet_id = state.config.google.sheets.mentors.clone();
    let rows = load_rows(&state, &state.mentors, &sheet_id).await?;
    let needle = query.name.trim();
    if needle.is_empty() {
        return Ok(Json(RowsResponse { rows }));
    }
    let hits = table::filter_column_contains(&rows, table::MENTOR_CANDIDATE_COL, needle);
    Ok(Json(RowsResponse::borrowed(hits)))
}

/// Category selection filter; an empty selection means the full set.
pub async fn by_category(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<RowsResponse>, (StatusCode, String)> {
    let sheet_id = state.config.google.sheets.mentors.clone();
    let rows = load_rows(&state, &state.mentors, &sheet_id).await?;
    let wanted = query.category.trim();
    if wanted.is_empty() {
        return Ok(Json(RowsResponse { rows }));
    }
    let hits = table::filter_column_equals(&rows, table::MENTOR_CATEGORY_COL, wanted);
    Ok(Json(RowsResponse::borrowed(hits)))
}

/// Write the displayed grid back to the mentor sheet. This replaces the
/// sheet's entire contents; anything edited remotely since the last fetch
/// is overwritten.
pub async fn save(
    State(state): State<AppState>,
    Json(body): Json<SaveRequest>,
) -> Result<Json<SaveResponse>, (StatusCode, String)> {
    let sheet_id = state.config.google.sheets.mentors.clone();
    state
        .sheets
        .overwrite(&sheet_id, &body.rows)
        .await
        .map_err(service_err)?;
    info!("mentor sheet saved, {} rows", body.rows.len());
    // the saved grid becomes the current full set
    *state.mentors.write().await = Some(body.rows.clone());
    Ok(Json(SaveResponse {
        saved_rows: body.rows.len(),
    }))
}
