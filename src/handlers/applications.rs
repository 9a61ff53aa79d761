use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::handlers::auth::CurrentSession;
use crate::handlers::common::{load_applications, nav_err, refresh_applications};
use crate::session::Screen;
use crate::table;
use crate::types::{AppState, RowsResponse};

#[derive(Deserialize)]
pub struct SearchQuery {
    /// Matched against every column.
    #[serde(default)]
    pub q: String,
    /// Matched against the applicant-name column only.
    #[serde(default)]
    pub name: String,
}

/// Entering the screen fetches the current cohort and both previous ones.
/// A fetch failure here is fatal to the screen: nothing is cached.
pub async fn activate(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
) -> Result<Json<RowsResponse>, (StatusCode, String)> {
    // fetch first: a screen whose sources cannot be reached is never entered
    let tables = refresh_applications(&state).await?;
    state
        .sessions
        .navigate(&current.token, Screen::Applications)
        .await
        .map_err(nav_err)?;
    Ok(Json(RowsResponse {
        rows: tables.current,
    }))
}

pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<RowsResponse>, (StatusCode, String)> {
    let tables = load_applications(&state).await?;
    let hits = table::search_applications(&tables.current, &query.q, &query.name);
    Ok(Json(RowsResponse::borrowed(hits)))
}

/// One row per applicant name, first occurrence wins.
pub async fn unique(
    State(state): State<AppState>,
) -> Result<Json<RowsResponse>, (StatusCode, String)> {
    let tables = load_applications(&state).await?;
    let rows = table::first_occurrences(&tables.current, table::APPLICANT_NAME_COL);
    Ok(Json(RowsResponse::borrowed(rows)))
}

/// Applicants whose name shows up more than once across the current cohort
/// and the two previous ones.
pub async fn repeated(
    State(state): State<AppState>,
) -> Result<Json<RowsResponse>, (StatusCode, String)> {
    let tables = load_applications(&state).await?;
    let rows = table::repeated_rows(
        &[&tables.current, &tables.cohort1, &tables.cohort2],
        table::APPLICANT_NAME_COL,
    );
    Ok(Json(RowsResponse { rows }))
}

pub async fn previous(
    State(state): State<AppState>,
) -> Result<Json<RowsResponse>, (StatusCode, String)> {
    let tables = load_applications(&state).await?;
    let mut rows = tables.cohort1;
    rows.extend(tables.cohort2);
    Ok(Json(RowsResponse { rows }))
}

pub async fn assigned(
    State(state): State<AppState>,
) -> Result<Json<RowsResponse>, (StatusCode, String)> {
    let tables = load_applications(&state).await?;
    let rows = table::filter_column_equals(
        &tables.current,
        table::MENTOR_MARKER_COL,
        table::MENTOR_MARKER_OK,
    );
    Ok(Json(RowsResponse::borrowed(rows)))
}

pub async fn unassigned(
    State(state): State<AppState>,
) -> Result<Json<RowsResponse>, (StatusCode, String)> {
    let tables = load_applications(&state).await?;
    let rows = table::filter_column_not_equals(
        &tables.current,
        table::MENTOR_MARKER_COL,
        table::MENTOR_MARKER_OK,
    );
    Ok(Json(RowsResponse::borrowed(rows)))
}
