//! Request identity extraction.
//!
//! Authentication itself is handled upstream (gateway or session service);
//! this server trusts the identity headers the proxy injects. Requests
//! without a valid identity are rejected before any handler runs.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::AppError;

/// Header carrying the authenticated user id.
const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the authenticated display name.
const USERNAME_HEADER: &str = "x-username";

/// Identity of the authenticated caller, taken from trusted proxy headers.
#[derive(Debug, Clone)]
pub struct AuthedUser {
    /// Stable user identifier.
    pub user_id: Uuid,
    /// Display name used in rosters and leaderboards.
    pub username: String,
}

impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value).ok())
            .ok_or_else(|| {
                AppError::Unauthorized(format!("missing or invalid `{USER_ID_HEADER}` header"))
            })?;

        let username = parts
            .headers
            .get(USERNAME_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                AppError::Unauthorized(format!("missing `{USERNAME_HEADER}` header"))
            })?;

        Ok(AuthedUser { user_id, username })
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    async fn extract(request: Request<()>) -> Result<AuthedUser, AppError> {
        let (mut parts, _) = request.into_parts();
        AuthedUser::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn valid_headers_yield_an_identity() {
        let id = Uuid::new_v4();
        let request = Request::builder()
            .header(USER_ID_HEADER, id.to_string())
            .header(USERNAME_HEADER, "alice")
            .body(())
            .unwrap();

        let user = extract(request).await.unwrap();
        assert_eq!(user.user_id, id);
        assert_eq!(user.username, "alice");
    }

    #[tokio::test]
    async fn missing_or_malformed_headers_are_unauthorized() {
        let request = Request::builder()
            .header(USERNAME_HEADER, "alice")
            .body(())
            .unwrap();
        assert!(matches!(
            extract(request).await.unwrap_err(),
            AppError::Unauthorized(_)
        ));

        let request = Request::builder()
            .header(USER_ID_HEADER, "not-a-uuid")
            .header(USERNAME_HEADER, "alice")
            .body(())
            .unwrap();
        assert!(matches!(
            extract(request).await.unwrap_err(),
            AppError::Unauthorized(_)
        ));

        let request = Request::builder()
            .header(USER_ID_HEADER, Uuid::new_v4().to_string())
            .header(USERNAME_HEADER, "   ")
            .body(())
            .unwrap();
        assert!(matches!(
            extract(request).await.unwrap_err(),
            AppError::Unauthorized(_)
        ));
    }
}
