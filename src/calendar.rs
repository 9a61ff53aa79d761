use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::google::GoogleAuth;

const API_BASE: &str = "https://www.googleapis.com/calendar/v3/calendars";
const MAX_RESULTS: u32 = 1000;

/// One calendar event reduced to what the notification flow needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventRecord {
    pub name: String,
    pub start: String,
    pub organizer: String,
    /// Attendees minus the organizer, or the organizer alone when nobody
    /// else is invited.
    pub recipients: Vec<String>,
}

#[derive(Deserialize)]
struct EventsResponse {
    #[serde(default)]
    items: Vec<EventItem>,
}

#[derive(Deserialize, Default)]
struct EventItem {
    summary: Option<String>,
    #[serde(default)]
    start: EventTime,
    organizer: Option<Organizer>,
    #[serde(default)]
    attendees: Vec<Attendee>,
}

#[derive(Deserialize, Default)]
struct EventTime {
    #[serde(rename = "dateTime")]
    date_time: Option<String>,
    date: Option<String>,
}

#[derive(Deserialize)]
struct Organizer {
    email: Option<String>,
}

#[derive(Deserialize)]
struct Attendee {
    email: Option<String>,
}

impl EventItem {
    fn into_record(self) -> EventRecord {
        let organizer = self
            .organizer
            .and_then(|o| o.email)
            .unwrap_or_else(|| "No Email".to_string());
        let mut recipients: Vec<String> = self
            .attendees
            .into_iter()
            .filter_map(|a| a.email)
            .filter(|email| *email != organizer)
            .collect();
        if recipients.is_empty() {
            recipients.push(organizer.clone());
        }
        EventRecord {
            name: self.summary.unwrap_or_else(|| "No Title".to_string()),
            start: self
                .start
                .date_time
                .or(self.start.date)
                .unwrap_or_default(),
            organizer,
            recipients,
        }
    }
}

#[derive(Clone)]
pub struct CalendarClient {
    http: reqwest::Client,
    auth: Arc<GoogleAuth>,
    calendar_id: String,
}

impl CalendarClient {
    pub fn new(http: reqwest::Client, auth: Arc<GoogleAuth>, calendar_id: String) -> Self {
        Self {
            http,
            auth,
            calendar_id,
        }
    }

    /// Single-occurrence events between the two dates inclusive, ordered by
    /// start time, capped at 1000. Dates expand to fixed UTC day boundaries.
    pub async fn list_events(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<EventRecord>> {
        let token = self.auth.bearer_token().await?;
        let url = format!("{}/{}/events", API_BASE, self.calendar_id);
        let response: EventsResponse = self
            .http
            .get(&url)
            .bearer_auth(&token)
            .query(&[
                ("timeMin", format!("{}T00:00:00Z", start)),
                ("timeMax", format!("{}T23:59:59Z", end)),
                ("maxResults", MAX_RESULTS.to_string()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
            ])
            .send()
            .await
            .context("calendar service unreachable")?
            .error_for_status()
            .context("calendar query rejected")?
            .json()
            .await
            .context("malformed calendar response")?;

        Ok(response
            .items
            .into_iter()
            .map(EventItem::into_record)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(json: &str) -> EventItem {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn attendees_exclude_the_organizer() {
        let record = item(
            r#"{
                "summary": "Kickoff",
                "start": {"dateTime": "2026-03-01T10:00:00Z"},
                "organizer": {"email": "host@example.org"},
                "attendees": [
                    {"email": "host@example.org"},
                    {"email": "a@example.org"},
                    {"email": "b@example.org"}
                ]
            }"#,
        )
        .into_record();
        assert_eq!(record.recipients, vec!["a@example.org", "b@example.org"]);
        assert_eq!(record.organizer, "host@example.org");
    }

    #[test]
    fn organizer_alone_when_no_other_attendees() {
        let record = item(
            r#"{
                "summary": "Solo",
                "start": {"date": "2026-03-02"},
                "organizer": {"email": "host@example.org"},
                "attendees": [{"email": "host@example.org"}]
            }"#,
        )
        .into_record();
        assert_eq!(record.recipients, vec!["host@example.org"]);
        assert_eq!(record.start, "2026-03-02");
    }

    #[test]
    fn missing_fields_fall_back_to_placeholders() {
        let record = item("{}").into_record();
        assert_eq!(record.name, "No Title");
        assert_eq!(record.organizer, "No Email");
        assert_eq!(record.recipients, vec!["No Email"]);
        assert_eq!(record.start, "");
    }

    #[test]
    fn all_day_start_falls_back_to_the_date() {
        let record = item(r#"{"start": {"date": "2026-04-01"}}"#).into_record();
        assert_eq!(record.start, "2026-04-01");
    }
}
