//! This module defines the HTTP handlers for authentication-related routes.

use crate::api_state::ApiContext;
use crate::routes::extractors::ApiJson;
use crate::routes::response::ApiResponse;
use axum::{Extension, extract::State, http::StatusCode};
use common_services::api::auth::error::AuthError;
use common_services::api::auth::interfaces::{
    AuthSession, LoginUser, RegisterUser, UpdateProfile,
};
use common_services::api::auth::service::{
    authenticate_user, issue_session, register_user, update_profile as update_user_profile,
};
use common_services::database::app_user::User;
use tracing::instrument;

/// Handles user login and returns the user with a new access token.
///
/// # Errors
///
/// Returns `AuthError` if the user credentials are invalid or if there's a
/// problem creating the token.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginUser,
    responses(
        (status = 200, description = "Login successful", body = AuthSession),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[instrument(skip(context, payload), err(Debug))]
pub async fn login(
    State(context): State<ApiContext>,
    ApiJson(payload): ApiJson<LoginUser>,
) -> Result<ApiResponse<AuthSession>, AuthError> {
    let user = authenticate_user(context.users.as_ref(), &payload).await?;
    let session = issue_session(&context.token_config(), user)?;
    Ok(ApiResponse::data(session).with_message("Login successful"))
}

/// Handles the registration of a new user.
///
/// # Errors
///
/// Returns `AuthError` if the input is invalid, the username or email is taken, or
/// a database error occurs during user creation.
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Auth",
    request_body = RegisterUser,
    responses(
        (status = 201, description = "User created successfully", body = AuthSession),
        (status = 400, description = "Invalid registration data"),
        (status = 409, description = "Username or email already taken"),
    )
)]
#[instrument(skip(context, payload), err(Debug))]
pub async fn register(
    State(context): State<ApiContext>,
    ApiJson(payload): ApiJson<RegisterUser>,
) -> Result<(StatusCode, ApiResponse<AuthSession>), AuthError> {
    let user = register_user(context.users.as_ref(), payload).await?;
    let session = issue_session(&context.token_config(), user)?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::data(session).with_message("User registered successfully"),
    ))
}

/// Get current user info.
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user data", body = User),
        (status = 401, description = "Authentication required"),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_me(Extension(user): Extension<User>) -> ApiResponse<User> {
    ApiResponse::data(user)
}

/// Update display name and email of the current user.
///
/// # Errors
///
/// Returns `AuthError` if the input is invalid or the email belongs to another account.
#[utoipa::path(
    put,
    path = "/auth/profile",
    tag = "Auth",
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Updated user data", body = User),
        (status = 400, description = "Invalid profile data"),
        (status = 401, description = "Authentication required"),
        (status = 409, description = "Email already taken"),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
#[instrument(skip(context, user, payload), fields(user_id = user.id), err(Debug))]
pub async fn update_profile(
    State(context): State<ApiContext>,
    Extension(user): Extension<User>,
    ApiJson(payload): ApiJson<UpdateProfile>,
) -> Result<ApiResponse<User>, AuthError> {
    let updated = update_user_profile(context.users.as_ref(), user.id, payload).await?;
    Ok(ApiResponse::data(updated).with_message("Profile updated successfully"))
}
