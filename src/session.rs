use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

/// Role strings form an open set; only "admin" is special.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Role(String);

impl Role {
    pub fn new(role: &str) -> Self {
        Role(role.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_admin(&self) -> bool {
        self.0 == "admin"
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    AdminChoices,
    Choices,
    Applications,
    Interviews,
    Mentors,
    AdminEvents,
}

impl Screen {
    /// The menu a freshly logged-in session lands on.
    pub fn initial_for(role: &Role) -> Screen {
        if role.is_admin() {
            Screen::AdminChoices
        } else {
            Screen::Choices
        }
    }

    pub fn allowed_for(&self, role: &Role) -> bool {
        match self {
            Screen::AdminChoices | Screen::AdminEvents => role.is_admin(),
            Screen::Choices => !role.is_admin(),
            Screen::Applications | Screen::Interviews | Screen::Mentors => true,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Screen::AdminChoices => "admin_choices",
            Screen::Choices => "choices",
            Screen::Applications => "applications",
            Screen::Interviews => "interviews",
            Screen::Mentors => "mentors",
            Screen::AdminEvents => "admin_events",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Session {
    pub role: Role,
    /// The one active screen. Navigation replaces it, never stacks it.
    pub screen: Screen,
}

#[derive(Debug)]
pub enum NavigationError {
    UnknownSession,
    Forbidden(Screen),
}

/// All live sessions, keyed by bearer token. Process-lifetime state, no
/// persistence.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session for an authenticated role, landing on its menu.
    pub async fn create(&self, role: Role) -> String {
        let token = Uuid::new_v4().to_string();
        let screen = Screen::initial_for(&role);
        self.inner
            .write()
            .await
            .insert(token.clone(), Session { role, screen });
        token
    }

    pub async fn get(&self, token: &str) -> Option<Session> {
        self.inner.read().await.get(token).cloned()
    }

    /// Switch the session's active screen, enforcing the role gate.
    pub async fn navigate(&self, token: &str, screen: Screen) -> Result<(), NavigationError> {
        let mut sessions = self.inner.write().await;
        let session = sessions
            .get_mut(token)
            .ok_or(NavigationError::UnknownSession)?;
        if !screen.allowed_for(&session.role) {
            return Err(NavigationError::Forbidden(screen));
        }
        session.screen = screen;
        Ok(())
    }

    pub async fn remove(&self, token: &str) {
        self.inner.write().await.remove(token);
    }
}
