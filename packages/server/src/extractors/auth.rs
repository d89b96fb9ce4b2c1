use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
};
use sea_orm::EntityTrait;

use crate::entity::user;
use crate::error::AppError;
use crate::state::AppState;

/// Header set by the fronting authentication layer.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The calling user, resolved from the `X-User-Id` header.
///
/// Add this as a handler parameter to require an identified caller, or take
/// `Option<CurrentUser>` where anonymous callers are welcome. Ownership and
/// staff checks happen in the handler body.
pub struct CurrentUser {
    pub user: user::Model,
}

impl CurrentUser {
    pub fn id(&self) -> i32 {
        self.user.id
    }

    /// Returns `Ok(())` for staff accounts, `Err(PermissionDenied)` otherwise.
    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.user.is_staff {
            Ok(())
        } else {
            Err(AppError::PermissionDenied("Staff access required".into()))
        }
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id: i32 = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
            .ok_or(AppError::Unauthenticated)?;

        let user = user::Entity::find_by_id(user_id)
            .one(&state.db)
            .await?
            .ok_or(AppError::Unauthenticated)?;

        Ok(CurrentUser { user })
    }
}

/// No header means an anonymous caller; a header naming no known user is
/// still rejected.
impl OptionalFromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        if !parts.headers.contains_key(USER_ID_HEADER) {
            return Ok(None);
        }
        <CurrentUser as FromRequestParts<AppState>>::from_request_parts(parts, state)
            .await
            .map(Some)
    }
}
