use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::domain::entities::token::{SessionClaims, SessionToken};
use crate::domain::entities::user::User;
use crate::errors::{AuthError, DomainError};

use super::config::TokenServiceConfig;

/// Mints and decodes session tokens
pub struct TokenService {
    config: TokenServiceConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(config: TokenServiceConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let mut validation = Validation::new(config.algorithm);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);
        validation.validate_exp = true;

        Self {
            config,
            encoding_key,
            decoding_key,
            validation,
        }
    }

    /// Mint a session token for `user`
    pub fn issue_session(&self, user: &User) -> Result<SessionToken, DomainError> {
        let now = Utc::now();
        let lifetime = Duration::seconds(self.config.session_token_expiry_seconds);
        let claims = SessionClaims::new(
            user.id,
            user.email.clone(),
            user.role.as_str(),
            self.config.issuer.clone(),
            self.config.audience.clone(),
            now,
            lifetime,
        );

        let header = Header::new(self.config.algorithm);
        let token = encode(&header, &claims, &self.encoding_key)
            .map_err(|_| DomainError::Auth(AuthError::TokenGenerationFailed))?;

        Ok(SessionToken {
            token,
            expires_in: self.config.session_token_expiry_seconds,
            expires_at: now + lifetime,
        })
    }

    /// Decode and validate a session token
    pub fn decode(&self, token: &str) -> Result<SessionClaims, DomainError> {
        decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| DomainError::Auth(AuthError::InvalidToken))
    }
}
