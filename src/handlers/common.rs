use axum::http::StatusCode;
use tracing::{error, warn};

use crate::session::NavigationError;
use crate::table::Row;
use crate::types::{AppState, ApplicationTables, RowsCache};

pub fn internal_err(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = ?e, "internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal server error".to_string(),
    )
}

/// An external collaborator (spreadsheet, calendar, mail) is unreachable or
/// rejecting. Reported per action; the session survives.
pub fn service_err(e: anyhow::Error) -> (StatusCode, String) {
    warn!(error = ?e, "external service error");
    (
        StatusCode::BAD_GATEWAY,
        "external service unavailable".to_string(),
    )
}

pub fn nav_err(e: NavigationError) -> (StatusCode, String) {
    match e {
        NavigationError::UnknownSession => {
            (StatusCode::UNAUTHORIZED, "no such session".to_string())
        }
        NavigationError::Forbidden(screen) => (
            StatusCode::FORBIDDEN,
            format!("screen {} requires the admin role", screen.name()),
        ),
    }
}

/// Fetch a screen's table and install it as the current full set.
pub async fn refresh_rows(
    state: &AppState,
    cache: &RowsCache,
    sheet_id: &str,
) -> Result<Vec<Row>, (StatusCode, String)> {
    let rows = state
        .sheets
        .fetch_table(sheet_id)
        .await
        .map_err(service_err)?;
    *cache.write().await = Some(rows.clone());
    Ok(rows)
}

/// The cached full set, refetched when nothing (or nothing useful) is held.
pub async fn load_rows(
    state: &AppState,
    cache: &RowsCache,
    sheet_id: &str,
) -> Result<Vec<Row>, (StatusCode, String)> {
    if let Some(rows) = cache.read().await.clone() {
        if !rows.is_empty() {
            return Ok(rows);
        }
    }
    refresh_rows(state, cache, sheet_id).await
}

/// Fetch the applications screen's three sources in one activation.
pub async fn refresh_applications(
    state: &AppState,
) -> Result<ApplicationTables, (StatusCode, String)> {
    let ids = &state.config.google.sheets;
    let current = state
        .sheets
        .fetch_table(&ids.applications)
        .await
        .map_err(service_err)?;
    let cohort1 = state
        .sheets
        .fetch_table(&ids.cohort1)
        .await
        .map_err(service_err)?;
    let cohort2 = state
        .sheets
        .fetch_table(&ids.cohort2)
        .await
        .map_err(service_err)?;
    let tables = ApplicationTables {
        current,
        cohort1,
        cohort2,
    };
    *state.applications.write().await = Some(tables.clone());
    Ok(tables)
}

pub async fn load_applications(
    state: &AppState,
) -> Result<ApplicationTables, (StatusCode, String)> {
    if let Some(tables) = state.applications.read().await.clone() {
        return Ok(tables);
    }
    refresh_applications(state).await
}
