//! The identity store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use doc_store::DocStore;
use entities::{AuthEvent, Session, User};
use kv_store::KeyValueStore;
use rand::Rng;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    AuthListener, AuthSubscription, IdentityError, IdentityResult, ListenerEntry, ListenerRegistry,
};

/// Key for the current-session slot.
const SESSION_KEY: &str = "session";

/// Key for the registered-users slot.
const USERS_KEY: &str = "users";

/// Collection receiving one auto-created profile per registration.
const PROFILES_COLLECTION: &str = "profiles";

/// Default artificial latency for register/login.
const DEFAULT_AUTH_DELAY: Duration = Duration::from_millis(500);

/// Default artificial latency for logout.
const DEFAULT_LOGOUT_DELAY: Duration = Duration::from_millis(200);

/// A successful registration or login: the user plus their new session.
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// The registered or matched user.
    pub user: User,
    /// The freshly persisted session.
    pub session: Session,
}

/// Local identity store backed by the key-value substrate.
///
/// At most one session is active at a time. Sessions have no expiry, so a
/// store opened over a substrate that still holds a session slot starts
/// out authenticated.
pub struct IdentityStore {
    kv: Arc<dyn KeyValueStore>,
    docs: Arc<DocStore>,
    listeners: ListenerRegistry,
    next_subscription_id: AtomicU64,
    auth_delay: Duration,
    logout_delay: Duration,
}

impl IdentityStore {
    /// Creates a store over the given substrate.
    ///
    /// `docs` must share the substrate; registration writes one profile
    /// document through it.
    pub fn new(kv: Arc<dyn KeyValueStore>, docs: Arc<DocStore>) -> Self {
        Self {
            kv,
            docs,
            listeners: Arc::new(Mutex::new(Vec::new())),
            next_subscription_id: AtomicU64::new(1),
            auth_delay: DEFAULT_AUTH_DELAY,
            logout_delay: DEFAULT_LOGOUT_DELAY,
        }
    }

    /// Overrides the artificial latency; `Duration::ZERO` disables it.
    pub fn with_delays(mut self, auth: Duration, logout: Duration) -> Self {
        self.auth_delay = auth;
        self.logout_delay = logout;
        self
    }

    /// Registers a new user and signs them in.
    ///
    /// Fails with [`IdentityError::AlreadyExists`] when the email is
    /// already registered (case-sensitive exact match); nothing is
    /// persisted in that case. On success one profile document is
    /// auto-created in the `profiles` collection and `SignedIn` is
    /// emitted to subscribers.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        metadata: HashMap<String, Value>,
    ) -> IdentityResult<AuthSession> {
        let mut users = self.load_users();
        if users.iter().any(|user| user.email == email) {
            return Err(IdentityError::AlreadyExists);
        }

        let user = User::new(email, password).with_metadata(metadata);
        users.push(user.clone());
        self.save_users(&users)?;

        let session = self.persist_session(&user)?;

        let mut profile = doc_store::Document::new();
        profile.insert("user_id".to_string(), Value::String(user.id.clone()));
        profile.insert(
            "display_name".to_string(),
            Value::String(user.display_name()),
        );
        self.docs.insert(PROFILES_COLLECTION, profile).await?;

        self.notify(AuthEvent::SignedIn, Some(&session));
        debug!(email, "registered user");

        self.emulate_latency(self.auth_delay).await;
        Ok(AuthSession { user, session })
    }

    /// Signs in an existing user.
    ///
    /// Fails with [`IdentityError::InvalidCredentials`] unless a
    /// registered user matches both email and password exactly.
    pub async fn login(&self, email: &str, password: &str) -> IdentityResult<AuthSession> {
        let user = self
            .load_users()
            .into_iter()
            .find(|user| user.email == email && user.password == password)
            .ok_or(IdentityError::InvalidCredentials)?;

        let session = self.persist_session(&user)?;
        self.notify(AuthEvent::SignedIn, Some(&session));
        debug!(email, "signed in");

        self.emulate_latency(self.auth_delay).await;
        Ok(AuthSession { user, session })
    }

    /// Clears the current session and emits `SignedOut`.
    ///
    /// Idempotent: calling with no active session is not an error.
    pub async fn logout(&self) {
        self.kv.remove(SESSION_KEY);
        self.notify(AuthEvent::SignedOut, None);
        debug!("signed out");

        self.emulate_latency(self.logout_delay).await;
    }

    /// Returns the persisted session, if any.
    ///
    /// Async for interface symmetry with a remote auth provider; the
    /// read itself is synchronous and adds no latency.
    pub async fn current_session(&self) -> Option<Session> {
        self.read_session()
    }

    /// Registers `listener` for auth state changes.
    ///
    /// The listener is invoked once immediately with `InitialSession` and
    /// the current persisted session, then synchronously on every
    /// `SignedIn`/`SignedOut` transition, in registration order.
    pub fn subscribe(
        &self,
        listener: impl Fn(AuthEvent, Option<&Session>) + Send + Sync + 'static,
    ) -> AuthSubscription {
        let listener: AuthListener = Arc::new(listener);
        let id = self.next_subscription_id.fetch_add(1, Ordering::SeqCst);
        {
            let mut listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
            listeners.push(ListenerEntry {
                id,
                listener: listener.clone(),
            });
        }

        let current = self.read_session();
        listener(AuthEvent::InitialSession, current.as_ref());

        AuthSubscription::new(id, self.listeners.clone())
    }

    fn notify(&self, event: AuthEvent, session: Option<&Session>) {
        // Iterate a snapshot so a listener may subscribe or unsubscribe
        // while being notified.
        let snapshot: Vec<AuthListener> = {
            let listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
            listeners.iter().map(|entry| entry.listener.clone()).collect()
        };
        for listener in snapshot {
            listener(event, session);
        }
    }

    fn persist_session(&self, user: &User) -> IdentityResult<Session> {
        let session = Session {
            access_token: generate_token(),
            user: user.clone(),
        };
        self.kv.set(SESSION_KEY, &serde_json::to_string(&session)?);
        Ok(session)
    }

    fn read_session(&self) -> Option<Session> {
        let raw = self.kv.get(SESSION_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(error = %e, "discarding malformed session slot");
                None
            }
        }
    }

    fn load_users(&self) -> Vec<User> {
        let Some(raw) = self.kv.get(USERS_KEY) else {
            return Vec::new();
        };
        match serde_json::from_str(&raw) {
            Ok(users) => users,
            Err(e) => {
                warn!(error = %e, "discarding malformed users slot");
                Vec::new()
            }
        }
    }

    fn save_users(&self, users: &[User]) -> IdentityResult<()> {
        self.kv.set(USERS_KEY, &serde_json::to_string(users)?);
        Ok(())
    }

    async fn emulate_latency(&self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Generates an opaque session token.
///
/// The token is a marker, not a credential; nothing validates it.
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: Vec<u8> = (0..32).map(|_| rng.random::<u8>()).collect();
    URL_SAFE_NO_PAD.encode(&bytes)
}
