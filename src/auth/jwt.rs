//! HS256 bearer tokens

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AuthContext, PermissionOverrides, User, UserSession};
use crate::{
    config::AuthConfig,
    error::{Result, ServerError},
};

/// Token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    /// Session id
    pub sid: Uuid,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<String>,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies bearer tokens
pub struct Authenticator {
    keys: Option<(EncodingKey, DecodingKey)>,
    expiration: Duration,
}

impl Authenticator {
    pub fn new(config: &AuthConfig) -> Result<Self> {
        let expiration = i64::try_from(config.jwt_expiration)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| {
                ServerError::Config(::config::ConfigError::Message(format!(
                    "JWT expiration of {} seconds is out of range",
                    config.jwt_expiration
                )))
            })?;

        let keys = config.jwt_secret.as_deref().map(|secret| {
            (
                EncodingKey::from_secret(secret.as_bytes()),
                DecodingKey::from_secret(secret.as_bytes()),
            )
        });

        Ok(Self { keys, expiration })
    }

    pub fn is_configured(&self) -> bool {
        self.keys.is_some()
    }

    /// Issue a token for `user` with a fresh session
    pub fn issue_token(&self, user: &User) -> Result<String> {
        let (encoding, _) = self.keys()?;
        let now = Utc::now();

        let claims = Claims {
            sub: user.id.clone(),
            name: user.principal_name.clone(),
            email: user.email_address.clone(),
            given_name: user.first_name.clone(),
            family_name: user.last_name.clone(),
            sid: Uuid::new_v4(),
            permissions: Vec::new(),
            iat: now.timestamp(),
            exp: now
                .checked_add_signed(self.expiration)
                .ok_or_else(|| ServerError::Internal("Token expiry is out of range".to_string()))?
                .timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, encoding)
            .map_err(|e| ServerError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Verify a token and build the caller's context
    pub fn authenticate(&self, token: &str) -> Result<AuthContext> {
        let (_, decoding) = self.keys()?;

        let data = decode::<Claims>(token, decoding, &Validation::new(Algorithm::HS256))
            .map_err(|e| ServerError::Authentication(format!("Invalid token: {}", e)))?;
        let claims = data.claims;

        Ok(AuthContext {
            owner: User {
                id: claims.sub,
                principal_name: claims.name,
                first_name: claims.given_name,
                last_name: claims.family_name,
                email_address: claims.email,
            },
            session: UserSession {
                id: claims.sid,
                issued_at: timestamp(claims.iat),
                expires_at: timestamp(claims.exp),
            },
            permission_overrides: PermissionOverrides {
                enabled: !claims.permissions.is_empty(),
                permissions: claims.permissions,
            },
        })
    }

    fn keys(&self) -> Result<&(EncodingKey, DecodingKey)> {
        self.keys
            .as_ref()
            .ok_or_else(|| ServerError::Authentication("Token authentication is not configured".to_string()))
    }
}

fn timestamp(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(seconds, 0).single().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authenticator(secret: Option<&str>) -> Authenticator {
        Authenticator::new(&AuthConfig {
            jwt_secret: secret.map(str::to_string),
            jwt_expiration: 3600,
        })
        .unwrap()
    }

    #[test]
    fn test_issue_and_authenticate() {
        let auth = authenticator(Some("test-secret"));
        let user = User::new("user-1", "John")
            .with_name("John", "Doe")
            .with_email("johndoe@example.com");

        let token = auth.issue_token(&user).unwrap();
        let context = auth.authenticate(&token).unwrap();

        assert_eq!(context.owner, user);
        assert!(context.session.expires_at > context.session.issued_at);
        assert!(!context.permission_overrides.enabled);
    }

    #[test]
    fn test_rejects_token_signed_with_other_secret() {
        let issuer = authenticator(Some("one"));
        let verifier = authenticator(Some("two"));
        let token = issuer.issue_token(&User::new("user-1", "John")).unwrap();

        let err = verifier.authenticate(&token).unwrap_err();
        assert!(matches!(err, ServerError::Authentication(_)));
    }

    #[test]
    fn test_out_of_range_expiration_is_a_config_error() {
        for jwt_expiration in [u64::MAX / 2, u64::MAX] {
            let result = Authenticator::new(&AuthConfig {
                jwt_secret: Some("s".to_string()),
                jwt_expiration,
            });
            assert!(matches!(result, Err(ServerError::Config(_))));
        }
    }

    #[test]
    fn test_unconfigured_authenticator_rejects_everything() {
        let auth = authenticator(None);
        assert!(!auth.is_configured());
        assert!(auth.issue_token(&User::new("user-1", "John")).is_err());
        assert!(matches!(
            auth.authenticate("abc.def.ghi"),
            Err(ServerError::Authentication(_))
        ));
    }
}
