//! Attendee identity metadata attached to an intake session.

use serde::{Deserialize, Serialize};

/// Optional identity supplied by the client when the session is created.
///
/// Immutable for the lifetime of the session. When present, it is persisted
/// as the `Name`/`Email` columns of the response record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Identity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email: Some(email.into()),
        }
    }

    /// Name used in the greeting, falling back to "there".
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or("there")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_falls_back() {
        assert_eq!(Identity::default().display_name(), "there");
        let blank = Identity {
            name: Some("  ".to_string()),
            email: None,
        };
        assert_eq!(blank.display_name(), "there");
        assert_eq!(Identity::new("Ada", "ada@example.com").display_name(), "Ada");
    }

    #[test]
    fn missing_fields_deserialize_as_none() {
        let identity: Identity = serde_json::from_str(r#"{"name": "Grace"}"#).unwrap();
        assert_eq!(identity.name.as_deref(), Some("Grace"));
        assert!(identity.email.is_none());
    }
}
