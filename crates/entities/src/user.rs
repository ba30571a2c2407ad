//! User-related entity definitions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A registered user.
///
/// This models a local stand-in for a hosted auth provider's user record:
/// the password is stored verbatim and compared by exact match. It must
/// never be treated as real credential storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier.
    pub id: String,
    /// Email address (unique within the store).
    pub email: String,
    /// Password, kept verbatim for exact-match comparison.
    pub password: String,
    /// Arbitrary profile metadata supplied at registration.
    #[serde(default)]
    pub user_metadata: HashMap<String, Value>,
}

impl User {
    /// Creates a new user with a generated id.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.into(),
            password: password.into(),
            user_metadata: HashMap::new(),
        }
    }

    /// Sets the profile metadata.
    pub fn with_metadata(mut self, metadata: HashMap<String, Value>) -> Self {
        self.user_metadata = metadata;
        self
    }

    /// Returns the display name: the `display_name` metadata field if
    /// present, otherwise the local part of the email address.
    pub fn display_name(&self) -> String {
        self.user_metadata
            .get("display_name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| {
                self.email
                    .split('@')
                    .next()
                    .unwrap_or(&self.email)
                    .to_string()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_creation() {
        let user = User::new("clinician@example.com", "secret");

        assert_eq!(user.email, "clinician@example.com");
        assert!(!user.id.is_empty());
        assert!(user.user_metadata.is_empty());
    }

    #[test]
    fn test_display_name_from_metadata() {
        let mut metadata = HashMap::new();
        metadata.insert("display_name".to_string(), json!("Dr. Chen"));

        let user = User::new("chen@example.com", "secret").with_metadata(metadata);
        assert_eq!(user.display_name(), "Dr. Chen");
    }

    #[test]
    fn test_display_name_falls_back_to_email_local_part() {
        let user = User::new("chen@example.com", "secret");
        assert_eq!(user.display_name(), "chen");
    }

    #[test]
    fn test_unique_ids() {
        let a = User::new("a@example.com", "pw");
        let b = User::new("b@example.com", "pw");
        assert_ne!(a.id, b.id);
    }
}
