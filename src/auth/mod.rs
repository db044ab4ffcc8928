//! Authenticated caller context
//!
//! The middleware in [`crate::middleware::auth`] resolves a bearer token into an
//! [`AuthContext`] and stores it in the request extensions. Handlers that need
//! a caller take it as an explicit `Option<Extension<AuthContext>>` argument.

pub mod jwt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub use jwt::{Authenticator, Claims};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub principal_name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email_address: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>, principal_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            principal_name: principal_name.into(),
            first_name: None,
            last_name: None,
            email_address: None,
        }
    }

    pub fn with_email(mut self, email_address: impl Into<String>) -> Self {
        self.email_address = Some(email_address.into());
        self
    }

    pub fn with_name(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self.last_name = Some(last_name.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSession {
    pub id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionOverrides {
    pub enabled: bool,
    pub permissions: Vec<String>,
}

/// The authenticated principal of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub owner: User,
    pub session: UserSession,
    pub permission_overrides: PermissionOverrides,
}
