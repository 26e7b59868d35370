//! Identity extractor.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::identity::Identity;

/// Authenticated caller, for handlers.
///
/// Reuses the identity inserted by `require_identity` when present and
/// verifies the Bearer token itself otherwise.
#[derive(Debug, Clone)]
pub struct Caller(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<Identity>() {
            return Ok(Caller(identity.clone()));
        }

        Identity::from_headers(&state.jwt_verifier, &parts.headers).map(Caller)
    }
}
