use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::CookieJar;

use crate::{db::AuthUser, names, rejections::AppError, AppState};

/// Guard extractor that resolves the user session cookie.
///
/// A token seen for the first time since start-up (or since its context was
/// torn down) is checked against the database and gets a fresh context.
pub struct AuthGuard {
    pub user: AuthUser,
    pub token: String,
}

impl FromRequestParts<AppState> for AuthGuard {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let Some(token) = jar
            .get(names::USER_SESSION_COOKIE_NAME)
            .map(|c| c.value().to_string())
        else {
            return Err(AppError::Unauthorized);
        };

        if let Some(user) = state.contexts.user(&token) {
            return Ok(AuthGuard { user, token });
        }

        let seen = state.contexts.epoch();
        match state.auth.restore(&token).await {
            Ok(Some(user)) => {
                if !state.contexts.init_restored(&token, user.clone(), seen) {
                    return Err(AppError::Unauthorized);
                }
                Ok(AuthGuard { user, token })
            }
            Ok(None) => Err(AppError::Unauthorized),
            Err(e) => {
                tracing::error!("could not restore session: {e}");
                Err(AppError::Internal("could not restore session"))
            }
        }
    }
}

/// Role gate for screens only educators may open. Students are sent home
/// with an access-denied notice.
pub struct EducatorGuard {
    pub user: AuthUser,
    pub token: String,
}

impl FromRequestParts<AppState> for EducatorGuard {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthGuard { user, token } = AuthGuard::from_request_parts(parts, state).await?;
        if !user.is_educator() {
            tracing::debug!("role gate turned away user={}", user.id);
            return Err(AppError::AccessDenied);
        }
        Ok(EducatorGuard { user, token })
    }
}
