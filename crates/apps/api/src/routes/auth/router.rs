use crate::api_state::ApiContext;
use crate::auth::handlers::{get_me, login, register, update_profile};
use axum::{
    Router,
    routing::{get, post, put},
};

pub fn auth_public_router() -> Router<ApiContext> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn auth_protected_router() -> Router<ApiContext> {
    Router::new()
        .route("/auth/me", get(get_me))
        .route("/auth/profile", put(update_profile))
}
