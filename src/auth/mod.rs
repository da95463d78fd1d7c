//! Request authentication.
//!
//! Every `/api/v1` request carries a bearer JWT validated by
//! [`auth_middleware`]. Token issuance and refresh are handled by an external
//! identity service; [`AuthService::issue_token`] exists for operators and
//! tests.

use axum::{
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Claim structure for JWT tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,          // Subject (user identifier)
    pub name: Option<String>, // Display name
    pub jti: String,          // Unique token id
    pub iat: i64,             // Issued at
    pub exp: i64,             // Expiration
    pub nbf: i64,             // Not valid before
    pub iss: String,          // Issuer
    pub aud: String,          // Audience
}

/// Authenticated principal extracted from a validated token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: String,
    pub name: Option<String>,
    pub token_id: String,
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub access_token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: String,
        jwt_issuer: String,
        jwt_audience: String,
        access_token_expiration: Duration,
    ) -> Self {
        Self {
            jwt_secret,
            jwt_issuer,
            jwt_audience,
            access_token_expiration,
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authentication token")]
    MissingToken,

    #[error("Invalid authentication token")]
    InvalidToken,

    #[error("Authentication token has expired")]
    TokenExpired,

    #[error("Failed to create token: {0}")]
    TokenCreation(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = crate::errors::ErrorResponse {
            error: "Unauthorized".to_string(),
            message: self.to_string(),
            details: None,
            timestamp: Utc::now().to_rfc3339(),
        };
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

/// Validates (and, for tests/operators, issues) JWT tokens.
#[derive(Debug, Clone)]
pub struct AuthService {
    pub config: AuthConfig,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Issue a signed access token for a subject.
    pub fn issue_token(&self, subject: &str, name: Option<&str>) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now
            + ChronoDuration::from_std(self.config.access_token_expiration)
                .map_err(|_| AuthError::TokenCreation("invalid token duration".to_string()))?;

        let claims = Claims {
            sub: subject.to_string(),
            name: name.map(str::to_string),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            nbf: now.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))
    }

    /// Validate a JWT and extract its claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.jwt_issuer]);
        validation.set_audience(&[&self.config.jwt_audience]);

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?
        .claims;

        Ok(claims)
    }
}

/// Authentication middleware: validates the bearer token and stores the
/// resulting [`AuthUser`] in request extensions.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication service not available",
            )
                .into_response();
        }
    };

    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim);

    let token = match token {
        Some(token) if !token.is_empty() => token,
        _ => return AuthError::MissingToken.into_response(),
    };

    match auth_service.validate_token(token) {
        Ok(claims) => {
            let user = AuthUser {
                user_id: claims.sub,
                name: claims.name,
                token_id: claims.jti,
            };
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Extractor that pulls the [`AuthUser`] placed by [`auth_middleware`].
#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> AuthService {
        AuthService::new(AuthConfig::new(
            "unit-test-secret-key-that-is-definitely-long-enough-for-hs256-use".to_string(),
            "mes-api".to_string(),
            "mes-clients".to_string(),
            Duration::from_secs(60),
        ))
    }

    #[test]
    fn issued_token_round_trips() {
        let service = test_service();
        let token = service.issue_token("operator-7", Some("Operator")).unwrap();
        let claims = service.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "operator-7");
        assert_eq!(claims.name.as_deref(), Some("Operator"));
        assert_eq!(claims.iss, "mes-api");
    }

    #[test]
    fn malformed_token_is_rejected() {
        let service = test_service();
        assert!(matches!(
            service.validate_token("not-a-jwt"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let issuer = test_service();
        let token = issuer.issue_token("operator-7", None).unwrap();

        let other = AuthService::new(AuthConfig::new(
            "a-completely-different-secret-key-that-is-also-long-enough-to-use".to_string(),
            "mes-api".to_string(),
            "mes-clients".to_string(),
            Duration::from_secs(60),
        ));
        assert!(other.validate_token(&token).is_err());
    }
}
