use crate::api::auth::error::AuthError;
use crate::api::auth::hashing::{hash_password, verify_password};
use crate::api::auth::interfaces::{AuthSession, LoginUser, RegisterUser, UpdateProfile};
use crate::api::auth::token::create_access_token;
use crate::database::UserRepository;
use crate::database::app_user::{NewUser, User, UserRole};
use tracing::info;
use validator::Validate;

/// Secret and lifetime used to sign access tokens.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub jwt_secret: String,
    pub expiry_minutes: i64,
}

/// Issues an access token for `user`.
///
/// # Errors
///
/// * `AuthError::Internal` if token encoding fails.
pub fn issue_session(config: &TokenConfig, user: User) -> Result<AuthSession, AuthError> {
    let token = create_access_token(
        &config.jwt_secret,
        user.id,
        user.role,
        config.expiry_minutes,
    )?;
    Ok(AuthSession { user, token })
}

/// Authenticates a user by username or email and password.
///
/// # Errors
///
/// * `AuthError::InvalidCredentials` if the login or password is incorrect.
/// * `AuthError::Internal` for database or hashing failures.
pub async fn authenticate_user(
    users: &dyn UserRepository,
    payload: &LoginUser,
) -> Result<User, AuthError> {
    let login = payload.username.trim();
    if login.is_empty() || payload.password.is_empty() {
        return Err(AuthError::Validation(
            "Please provide username and password".to_owned(),
        ));
    }

    let user = users
        .find_user_by_login_with_password(login)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let valid = verify_password(payload.password.as_ref(), &user.password)?;
    if !valid {
        return Err(AuthError::InvalidCredentials);
    }

    Ok(user.into())
}

/// Creates a new account with role `user`.
///
/// # Errors
///
/// * `AuthError::Validation` for malformed usernames, emails or short passwords.
/// * `AuthError::UserAlreadyExists` if the username or email is taken.
/// * `AuthError::Internal` for hashing or database errors.
pub async fn register_user(
    users: &dyn UserRepository,
    mut payload: RegisterUser,
) -> Result<User, AuthError> {
    payload.username = payload.username.trim().to_owned();
    payload.email = payload.email.trim().to_lowercase();
    payload.name = payload.name.trim().to_owned();
    payload.validate()?;

    let password_hash = hash_password(payload.password.as_ref())?;
    info!(
        "Creating user username={}, email={}",
        payload.username, payload.email
    );
    let user = users
        .create_user(&NewUser {
            username: payload.username,
            email: payload.email,
            name: payload.name,
            password_hash,
            role: UserRole::User,
        })
        .await?;
    Ok(user)
}

/// Changes display name and/or email. Role and username are not editable.
///
/// # Errors
///
/// * `AuthError::Validation` for empty names or malformed emails.
/// * `AuthError::UserAlreadyExists` if the email belongs to another account.
/// * `AuthError::UserNotFound` if the account disappeared.
pub async fn update_profile(
    users: &dyn UserRepository,
    user_id: i32,
    mut payload: UpdateProfile,
) -> Result<User, AuthError> {
    payload.name = payload.name.map(|n| n.trim().to_owned());
    payload.email = payload.email.map(|e| e.trim().to_lowercase());
    payload.validate()?;

    users
        .update_user_profile(user_id, payload.name.as_deref(), payload.email.as_deref())
        .await?
        .ok_or(AuthError::UserNotFound)
}

/// Creates the demo accounts unless `admin` already exists.
///
/// # Errors
///
/// * `AuthError::Internal` for hashing or database errors.
pub async fn seed_demo_users(users: &dyn UserRepository) -> Result<(), AuthError> {
    if users.find_user_by_login_with_password("admin").await?.is_some() {
        info!("Demo users already present.");
        return Ok(());
    }

    let demo = [
        ("admin", "admin@ecosnap.com", "Admin User", "admin123", UserRole::Admin),
        ("user1", "user1@ecosnap.com", "Regular User", "user123", UserRole::User),
        ("user2", "user2@ecosnap.com", "Test User", "user123", UserRole::User),
    ];
    for (username, email, name, password, role) in demo {
        let password_hash = hash_password(password.as_bytes())?;
        users
            .create_user(&NewUser {
                username: username.to_owned(),
                email: email.to_owned(),
                name: name.to_owned(),
                password_hash,
                role,
            })
            .await?;
        info!("Seeded demo user {} ({})", username, role);
    }
    Ok(())
}
