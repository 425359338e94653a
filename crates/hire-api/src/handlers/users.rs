//! User registration.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::info;

use hire_models::{NewUser, User};

use crate::error::{ApiResult, ValidJson};
use crate::state::AppState;

#[derive(Serialize)]
pub struct RegisterUserResponse {
    pub user_id: String,
    pub user: User,
}

/// Register a user and hand out its access token.
pub async fn register_user(
    State(state): State<AppState>,
    ValidJson(new_user): ValidJson<NewUser>,
) -> ApiResult<Json<RegisterUserResponse>> {
    let user = User::register(new_user);
    let user_id = state.users.create_user(&user).await?;
    info!(user_id = %user_id.as_str(), "User registered");

    Ok(Json(RegisterUserResponse {
        user_id: user_id.as_str().to_string(),
        user,
    }))
}
