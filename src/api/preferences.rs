use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::server::AppState;
use crate::api::session::CurrentUser;
use crate::db::models::{Preferences, SortField, SortOrder, Theme};
use crate::db::repo::Commit;
use crate::error::AppError;

/// Every field is optional; a missing one resets to its default.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesPayload {
    pub theme: Option<Theme>,
    pub sort_by: Option<SortField>,
    pub sort_order: Option<SortOrder>,
}

impl From<PreferencesPayload> for Preferences {
    fn from(payload: PreferencesPayload) -> Self {
        Preferences {
            theme: payload.theme.unwrap_or_default(),
            sort_by: payload.sort_by.unwrap_or_default(),
            sort_order: payload.sort_order.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PreferencesResponse {
    pub message: &'static str,
    pub preferences: Preferences,
}

pub async fn get_preferences(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<Preferences>, AppError> {
    let user = state
        .store
        .find_user(user.id)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    Ok(Json(user.preferences))
}

pub async fn update_preferences(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    payload: Result<Json<PreferencesPayload>, JsonRejection>,
) -> Result<Json<PreferencesResponse>, AppError> {
    let Json(payload) = payload?;
    let preferences = Preferences::from(payload);

    state
        .store
        .users
        .update(|users| {
            let stored = users
                .iter_mut()
                .find(|u| u.id == user.id)
                .ok_or(AppError::NotFound("User"))?;
            stored.preferences = preferences;
            Ok(Commit::Write(()))
        })
        .await?;

    tracing::debug!(user_id = user.id, ?preferences, "updated preferences");
    Ok(Json(PreferencesResponse {
        message: "Preferences updated successfully",
        preferences,
    }))
}
