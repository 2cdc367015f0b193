use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::error::AppError;

/// Key for storing the user id in the session.
pub const SESSION_USER_ID_KEY: &str = "user_id";

/// The authenticated caller. Rejects with 401 when the session carries no user.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub id: u64,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| AppError::Internal(msg.to_string()))?;

        let id = session
            .get::<u64>(SESSION_USER_ID_KEY)
            .await?
            .ok_or(AppError::Unauthorized)?;

        Ok(CurrentUser { id })
    }
}

/// Binds `user_id` to the session under a fresh session id.
pub async fn start_session(session: &Session, user_id: u64) -> Result<(), AppError> {
    session.cycle_id().await?;
    session.insert(SESSION_USER_ID_KEY, user_id).await?;
    Ok(())
}
