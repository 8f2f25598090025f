//! Session token entities minted after a completed registration.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims structure for the session JWT payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user ID)
    pub sub: String,

    /// Account email
    pub email: String,

    /// Account role
    pub role: String,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,

    /// JWT ID (unique identifier for the token)
    pub jti: String,
}

impl SessionClaims {
    /// Creates claims valid from `now` for `lifetime`
    pub fn new(
        user_id: Uuid,
        email: impl Into<String>,
        role: impl Into<String>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
        now: DateTime<Utc>,
        lifetime: Duration,
    ) -> Self {
        Self {
            sub: user_id.to_string(),
            email: email.into(),
            role: role.into(),
            iss: issuer.into(),
            aud: audience.into(),
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Gets the user ID from the claims
    pub fn user_id(&self) -> Result<Uuid, uuid::Error> {
        Uuid::parse_str(&self.sub)
    }
}

/// Signed session token handed back to the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionToken {
    /// Encoded JWT
    pub token: String,
    /// Seconds until expiry
    pub expires_in: i64,
    /// Absolute expiry
    pub expires_at: DateTime<Utc>,
}
