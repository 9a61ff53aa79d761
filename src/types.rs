use crate::auth::Authenticator;
use crate::calendar::CalendarClient;
use crate::config::Config;
use crate::mail::Mailer;
use crate::session::SessionStore;
use crate::sheets::SheetsClient;
use crate::table::Row;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// The applications screen's full sets: the current cohort plus the two
/// previous ones it is compared against.
#[derive(Clone, Debug)]
pub struct ApplicationTables {
    pub current: Vec<Row>,
    pub cohort1: Vec<Row>,
    pub cohort2: Vec<Row>,
}

pub type ApplicationsCache = Arc<RwLock<Option<ApplicationTables>>>;
pub type RowsCache = Arc<RwLock<Option<Vec<Row>>>>;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sessions: SessionStore,
    pub authenticator: Arc<RwLock<Authenticator>>,
    pub sheets: SheetsClient,
    pub calendar: CalendarClient,
    pub mailer: Arc<Mailer>,
    pub applications: ApplicationsCache,
    pub interviews: RowsCache,
    pub mentors: RowsCache,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub role: String,
    pub screen: &'static str,
}

#[derive(Serialize)]
pub struct RowsResponse {
    pub rows: Vec<Row>,
}

impl RowsResponse {
    pub fn borrowed(rows: Vec<&Row>) -> Self {
        Self {
            rows: rows.into_iter().cloned().collect(),
        }
    }
}

#[derive(Serialize)]
pub struct EventDto {
    pub name: String,
    pub start: String,
    pub organizer: String,
    pub participants: String,
    pub recipients: Vec<String>,
}

#[derive(Serialize)]
pub struct SaveResponse {
    pub saved_rows: usize,
}
