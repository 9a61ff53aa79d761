use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    Json,
    extract::{ConnectInfo, Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use tracing::info;

use crate::auth::{LoginOutcome, Rejection};
use crate::session::{Screen, Session};
use crate::types::{AppState, LoginResponse};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// The authenticated caller, attached to the request by `require_session`.
#[derive(Clone)]
pub struct CurrentSession {
    pub token: String,
    pub session: Session,
}

fn bearer_token(req: &Request) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.to_string())
}

pub async fn handle_login(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, (StatusCode, String)> {
    let outcome = state.authenticator.write().await.attempt_login(
        &body.username,
        &body.password,
        addr.ip(),
        Instant::now(),
    );

    match outcome {
        LoginOutcome::Authorized(role) => {
            info!("login from {} as role {}", addr.ip(), role.as_str());
            let token = state.sessions.create(role.clone()).await;
            Ok(Json(LoginResponse {
                token,
                screen: Screen::initial_for(&role).name(),
                role: role.as_str().to_string(),
            }))
        }
        LoginOutcome::Rejected(Rejection::InvalidCredentials { remaining_attempts }) => {
            Err((
                StatusCode::UNAUTHORIZED,
                format!(
                    "invalid username or password, {} attempts remaining",
                    remaining_attempts
                ),
            ))
        }
        LoginOutcome::Rejected(Rejection::LockedOut { retry_after }) => Err((
            StatusCode::TOO_MANY_REQUESTS,
            format!(
                "address {} is blocked, try again in {} seconds",
                addr.ip(),
                retry_after.as_secs()
            ),
        )),
    }
}

pub async fn handle_logout(
    State(state): State<AppState>,
    axum::Extension(current): axum::Extension<CurrentSession>,
) -> StatusCode {
    state.sessions.remove(&current.token).await;
    StatusCode::NO_CONTENT
}

/// Session gate for everything behind the login screen.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, (StatusCode, String)> {
    let token = bearer_token(&req).ok_or((
        StatusCode::UNAUTHORIZED,
        "missing session token".to_string(),
    ))?;
    let session = state.sessions.get(&token).await.ok_or((
        StatusCode::UNAUTHORIZED,
        "invalid or expired session".to_string(),
    ))?;
    req.extensions_mut().insert(CurrentSession { token, session });
    Ok(next.run(req).await)
}

/// Role gate for the admin screen set. Runs inside `require_session`.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, (StatusCode, String)> {
    let current = req.extensions().get::<CurrentSession>().ok_or((
        StatusCode::UNAUTHORIZED,
        "missing session token".to_string(),
    ))?;
    if !current.session.role.is_admin() {
        return Err((
            StatusCode::FORBIDDEN,
            "the admin screen set requires the admin role".to_string(),
        ));
    }
    Ok(next.run(req).await)
}
