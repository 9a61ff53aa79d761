mod auth;
mod calendar;
mod config;
mod google;
mod handlers;
mod mail;
mod session;
mod sheets;
mod table;
mod types;

use anyhow::{Context, Result};
use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use auth::{Authenticator, CredentialRecord};
use calendar::CalendarClient;
use config::Config;
use google::GoogleAuth;
use mail::Mailer;
use session::SessionStore;
use sheets::SheetsClient;
use types::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,mentor_crm=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load("config.yml").await?;

    let http = reqwest::Client::new();
    let google = GoogleAuth::load(&config.google, http.clone())
        .context("cannot load Google credential files")?;
    let sheets = SheetsClient::new(http.clone(), google.clone());
    let calendar = CalendarClient::new(http, google, config.google.calendar_id.clone());
    let mailer = Arc::new(Mailer::new(&config.mail).context("cannot configure mail relay")?);

    // The user store is loaded once and held read-only; without it nobody
    // can log in, so failure here ends the process.
    let user_rows = sheets
        .fetch_table(&config.google.sheets.users)
        .await
        .context("cannot reach the user store")?;
    let records = CredentialRecord::from_rows(&user_rows);
    info!("loaded {} credential records", records.len());
    let authenticator = Arc::new(RwLock::new(Authenticator::new(records)));

    let host = config.server.host.clone();
    let port = config.server.port;

    let state = AppState {
        config,
        sessions: SessionStore::new(),
        authenticator,
        sheets,
        calendar,
        mailer,
        applications: Arc::new(RwLock::new(None)),
        interviews: Arc::new(RwLock::new(None)),
        mentors: Arc::new(RwLock::new(None)),
    };

    let admin_routes = Router::new()
        .route("/screens/events", post(handlers::events::activate))
        .route("/events", get(handlers::events::list))
        .route("/events/notify", post(handlers::events::notify))
        .layer(middleware::from_fn(handlers::require_admin));

    let session_routes = Router::new()
        .route("/logout", post(handlers::handle_logout))
        .route("/screens/applications", post(handlers::applications::activate))
        .route("/applications", get(handlers::applications::search))
        .route("/applications/unique", get(handlers::applications::unique))
        .route("/applications/repeated", get(handlers::applications::repeated))
        .route("/applications/previous", get(handlers::applications::previous))
        .route("/applications/assigned", get(handlers::applications::assigned))
        .route(
            "/applications/unassigned",
            get(handlers::applications::unassigned),
        )
        .route("/screens/interviews", post(handlers::interviews::activate))
        .route("/interviews", get(handlers::interviews::search))
        .route("/interviews/assigned", get(handlers::interviews::assigned))
        .route("/interviews/received", get(handlers::interviews::received))
        .route("/screens/mentors", post(handlers::mentors::activate))
        .route("/mentors", get(handlers::mentors::search))
        .route("/mentors/by-category", get(handlers::mentors::by_category))
        .route("/mentors", put(handlers::mentors::save))
        .nest("/admin", admin_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            handlers::require_session,
        ));

    let api_routes = Router::new()
        .route("/login", post(handlers::handle_login))
        .merge(session_routes);

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .context("invalid listen address")?;
    info!("listening on {}", addr);

    axum::serve(
        tokio::net::TcpListener::bind(addr).await?,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server error")?;
    Ok(())
}
