//! Identity extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use ideaflow_core::error::CoreError;
use ideaflow_core::identity::Actor;
use ideaflow_core::roles::is_valid_role;
use ideaflow_core::types::DbId;

use crate::error::AppError;

pub const HEADER_USER_ID: &str = "x-user-id";
pub const HEADER_USER_NAME: &str = "x-user-name";
pub const HEADER_USER_EMAIL: &str = "x-user-email";
pub const HEADER_USER_ROLE: &str = "x-user-role";

/// The acting user, read from the `x-user-*` headers.
///
/// `x-user-id` and `x-user-role` are required; name and email default to
/// empty. Capability checks happen in the workflow engine, not here.
///
/// ```ignore
/// async fn my_handler(auth: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = auth.user_id, role = %auth.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: DbId,
    pub name: String,
    pub email: String,
    pub role: String,
}

impl AuthUser {
    pub fn actor(&self) -> Actor {
        Actor::new(self.user_id, self.name.clone(), self.email.clone(), self.role.clone())
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let raw_id = header(HEADER_USER_ID).ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Missing x-user-id header".into()))
        })?;
        let user_id: DbId = raw_id.parse().map_err(|_| {
            AppError::Core(CoreError::Unauthorized(format!("Invalid user id '{raw_id}'")))
        })?;

        let role = header(HEADER_USER_ROLE).ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Missing x-user-role header".into()))
        })?;
        if !is_valid_role(&role) {
            return Err(AppError::Core(CoreError::Unauthorized(format!(
                "Unknown role '{role}'"
            ))));
        }

        Ok(AuthUser {
            user_id,
            name: header(HEADER_USER_NAME).unwrap_or_default(),
            email: header(HEADER_USER_EMAIL).unwrap_or_default(),
            role,
        })
    }
}
