use anyhow::anyhow;
use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::calendar::EventRecord;
use crate::handlers::auth::CurrentSession;
use crate::handlers::common::{internal_err, nav_err, service_err};
use crate::mail::DispatchReport;
use crate::session::Screen;
use crate::types::{AppState, EventDto};

#[derive(Deserialize)]
pub struct EventsQuery {
    /// Inclusive ISO dates bounding the listing.
    pub start: String,
    pub end: String,
}

#[derive(Deserialize)]
pub struct NotifyRequest {
    pub name: String,
    pub start: String,
    #[serde(default)]
    pub organizer: String,
    pub recipients: Vec<String>,
}

pub async fn activate(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
) -> Result<StatusCode, (StatusCode, String)> {
    state
        .sessions
        .navigate(&current.token, Screen::AdminEvents)
        .await
        .map_err(nav_err)?;
    Ok(StatusCode::NO_CONTENT)
}

fn parse_date(value: &str) -> Result<NaiveDate, (StatusCode, String)> {
    value.parse().map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            format!("{} is not an ISO date", value),
        )
    })
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<Vec<EventDto>>, (StatusCode, String)> {
    let start = parse_date(&query.start)?;
    let end = parse_date(&query.end)?;
    let events = state
        .calendar
        .list_events(start, end)
        .await
        .map_err(service_err)?;

    let dtos = events
        .into_iter()
        .map(|event| EventDto {
            participants: event.recipients.join(", "),
            name: event.name,
            start: event.start,
            organizer: event.organizer,
            recipients: event.recipients,
        })
        .collect();
    Ok(Json(dtos))
}

/// Send the invitation batch for one event. The SMTP session is scoped to
/// the batch; per-recipient failures are collected, not fatal.
pub async fn notify(
    State(state): State<AppState>,
    Json(body): Json<NotifyRequest>,
) -> Result<Json<DispatchReport>, (StatusCode, String)> {
    if body.recipients.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "no recipients for this event".to_string(),
        ));
    }

    let record = EventRecord {
        name: body.name,
        start: body.start,
        organizer: body.organizer,
        recipients: body.recipients,
    };
    let mailer = state.mailer.clone();
    // lettre's SMTP transport is blocking; keep it off the async workers
    let report = tokio::task::spawn_blocking(move || mailer.dispatch(&record))
        .await
        .map_err(|e| internal_err(anyhow!(e)))?;
    Ok(Json(report))
}
