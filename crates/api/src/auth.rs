//! Opaque-user extraction for Axum handlers.
//!
//! Credential verification belongs to the external identity provider and
//! happens upstream of this service; by the time a request arrives here
//! the bearer value is an opaque, already-verified subject. Anonymous
//! requests (no `Authorization` header) are allowed — such jobs simply
//! have no owner.

use arcus_core::types::UserId;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::state::AppState;

/// Caller identity extracted from the `Authorization: Bearer <subject>`
/// header, if present.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The opaque user reference; `None` for anonymous callers.
    pub user: Option<UserId>,
}

impl AuthUser {
    /// Whether this caller may operate on a job owned by `owner`.
    ///
    /// Unowned jobs are open to everyone; owned jobs only to their owner.
    pub fn may_access(&self, owner: Option<&UserId>) -> bool {
        match owner {
            None => true,
            Some(owner) => self.user.as_ref() == Some(owner),
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(|header| {
                header
                    .strip_prefix("Bearer ")
                    .ok_or_else(|| {
                        AppError::BadRequest(
                            "Invalid Authorization format. Expected: Bearer <subject>".into(),
                        )
                    })
                    .map(UserId::from)
            })
            .transpose()?;

        Ok(AuthUser { user })
    }
}
