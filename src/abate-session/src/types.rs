//! Type definitions for session state and identity-service payloads.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// The authenticated subject, as last confirmed by the identity service.
///
/// Always replaced as a whole; never patched field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub subject_id: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Build a session from an identity record that names a subject.
    ///
    /// Returns `None` when the record has no (or an empty) username.
    pub fn from_identity(record: &IdentityRecord) -> Option<Self> {
        let username = record.username.as_deref().map(str::trim)?;
        if username.is_empty() {
            return None;
        }
        let created_at = record
            .created_at
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or_else(Utc::now);
        Some(Self {
            subject_id: username.to_string(),
            active: record.is_active.unwrap_or(false),
            created_at,
        })
    }

    /// Session for a login the backend accepted but could not confirm.
    pub fn unconfirmed(username: &str) -> Self {
        Self {
            subject_id: username.to_string(),
            active: false,
            created_at: Utc::now(),
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(moment) = DateTime::parse_from_rfc3339(raw) {
        return Some(moment.with_timezone(&Utc));
    }
    // The backend serializes naive UTC datetimes without an offset.
    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Coarse gate state, derived from a [`GateSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    NoSession,
    Initializing,
    Ready,
}

impl std::fmt::Display for GateState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateState::NoSession => write!(f, "no_session"),
            GateState::Initializing => write!(f, "initializing"),
            GateState::Ready => write!(f, "ready"),
        }
    }
}

/// Everything the gate knows at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GateSnapshot {
    pub session: Option<Session>,
    /// An identity bootstrap is in flight.
    pub initializing: bool,
    /// A login, registration or logout is in flight.
    pub loading: bool,
    /// Last user-visible action error.
    pub error: Option<String>,
}

impl GateSnapshot {
    pub fn state(&self) -> GateState {
        if self.initializing {
            GateState::Initializing
        } else if self.session.is_some() {
            GateState::Ready
        } else {
            GateState::NoSession
        }
    }

    /// Session present and confirmed active.
    pub fn is_authenticated(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.active)
    }
}

/// Username and password submitted to the login endpoint.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    pub(crate) fn to_wire(&self) -> serde_json::Value {
        serde_json::json!({
            "username": self.username,
            "password": self.password.expose_secret(),
        })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Account registration form.
#[derive(Clone)]
pub struct Registration {
    pub nome_completo: String,
    pub email: String,
    pub username: String,
    password: SecretString,
    confirm_password: SecretString,
}

impl Registration {
    pub fn new(
        nome_completo: impl Into<String>,
        email: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        confirm_password: impl Into<String>,
    ) -> Self {
        Self {
            nome_completo: nome_completo.into(),
            email: email.into(),
            username: username.into(),
            password: SecretString::from(password.into()),
            confirm_password: SecretString::from(confirm_password.into()),
        }
    }

    pub(crate) fn to_wire(&self) -> serde_json::Value {
        serde_json::json!({
            "nome_completo": self.nome_completo,
            "email": self.email,
            "username": self.username,
            "password": self.password.expose_secret(),
            "confirm_password": self.confirm_password.expose_secret(),
        })
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("nome_completo", &self.nome_completo)
            .field("email", &self.email)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Body of `/auth/me`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nome_completo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Generic `{message}` / `{detail}` body returned by the auth endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub message: Option<String>,
    /// A string for handled errors, a list of `{msg, ...}` for validation errors.
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ApiMessage {
    /// Human-readable detail, if the server sent one.
    pub fn detail_text(&self) -> Option<String> {
        match self.detail.as_ref()? {
            serde_json::Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
            serde_json::Value::Array(items) => {
                let messages: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                    .collect();
                if messages.is_empty() {
                    None
                } else {
                    Some(messages.join("; "))
                }
            }
            _ => None,
        }
    }
}

/// Status plus optionally decoded body of one identity-service call.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceResponse<T> {
    pub status: u16,
    pub data: Option<T>,
}

impl<T> ServiceResponse<T> {
    pub fn new(status: u16, data: Option<T>) -> Self {
        Self { status, data }
    }

    /// 2xx status.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
