//! Identity authentication middleware.
//!
//! Claimants and issuers authenticate with a Bearer JWT minted by the external
//! identity provider. The verified subject is stored in request extensions.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared::jwt::{JwtError, JwtVerifier};

use crate::app::AppState;
use crate::error::ApiError;

/// Authenticated caller identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Opaque subject from the token; used as claimant or issuer id.
    pub subject: String,
    pub email: Option<String>,
}

impl Identity {
    /// Verifies a raw token and returns the identity it carries.
    pub fn from_token(verifier: &JwtVerifier, token: &str) -> Result<Self, JwtError> {
        let claims = verifier.validate_token(token)?;
        Ok(Identity {
            subject: claims.sub,
            email: claims.email.filter(|e| !e.trim().is_empty()),
        })
    }

    /// Authenticates from the `Authorization` header.
    pub fn from_headers(verifier: &JwtVerifier, headers: &HeaderMap) -> Result<Self, ApiError> {
        let token = bearer_token(headers)?;
        Identity::from_token(verifier, token).map_err(|e| {
            tracing::debug!("Identity token rejected: {}", e);
            match e {
                JwtError::TokenExpired => ApiError::Unauthorized("Token has expired".to_string()),
                _ => ApiError::Unauthorized("Invalid or expired token".to_string()),
            }
        })
    }
}

/// Extracts the Bearer token from the `Authorization` header.
fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            ApiError::Unauthorized("Invalid Authorization header format".to_string())
        })
}

/// Middleware that requires a valid identity token.
///
/// Runs before rate limiting, which keys its buckets on the identity.
pub async fn require_identity(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    match Identity::from_headers(&state.jwt_verifier, req.headers()) {
        Ok(identity) => {
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}
