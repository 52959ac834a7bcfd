//! Core types for credential-core

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The part of an account the credential core is allowed to see.
///
/// Built from an [`Account`] after its password has been checked; the hash
/// never travels past that point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub id: u64,
    pub elevated: bool,
}

/// Registered account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: u64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    #[serde(rename = "is_admin")]
    pub elevated: bool,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            elevated: self.elevated,
        }
    }
}

/// Request to register a new account
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request to log in with email and password
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Administrative update of an existing account
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAccountRequest {
    pub name: Option<String>,
    #[serde(rename = "is_admin")]
    pub elevated: Option<bool>,
}

/// Normalize an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
