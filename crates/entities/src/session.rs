//! Session types and auth-change events.

use serde::{Deserialize, Serialize};

use crate::User;

/// An active login session.
///
/// The token is an opaque marker, not a verifiable credential. At most one
/// session is active per backend instance, and sessions have no expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque session token.
    pub access_token: String,
    /// The user this session belongs to.
    pub user: User,
}

/// Auth state transitions delivered to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEvent {
    /// Fired once on subscription, carrying the current persisted session.
    InitialSession,
    /// A session was established by registration or login.
    SignedIn,
    /// The session was cleared.
    SignedOut,
}

impl AuthEvent {
    /// Returns the wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InitialSession => "INITIAL_SESSION",
            Self::SignedIn => "SIGNED_IN",
            Self::SignedOut => "SIGNED_OUT",
        }
    }
}
