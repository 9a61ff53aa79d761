pub mod applications;
pub mod auth;
pub mod common;
pub mod events;
pub mod interviews;
pub mod mentors;

pub use auth::{handle_login, handle_logout, require_admin, require_session};
