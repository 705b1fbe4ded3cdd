//! Business logic behind the HTTP handlers

use tracing::info;

use crate::{
    error::{AuthError, AuthResult},
    models::{NewUser, Role, User},
    password,
    repositories::UserStore,
    validation,
};

pub mod auth;
pub mod users;

pub use auth::AuthService;
pub use users::UsersService;

/// Input shared by self-registration and administrative creation
pub(crate) struct Registration {
    pub email: String,
    pub username: Option<String>,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

/// Validate, check for duplicates, hash and insert
///
/// Both duplicate checks run before anything is written.
pub(crate) async fn register_user(
    users: &dyn UserStore,
    registration: Registration,
) -> AuthResult<User> {
    let email = validation::normalize_email(&registration.email);
    validation::validate_email(&email).map_err(AuthError::BadRequest)?;

    let username = registration
        .username
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty());
    if let Some(username) = &username {
        validation::validate_username(username).map_err(AuthError::BadRequest)?;
    }

    validation::validate_password(&registration.password).map_err(AuthError::BadRequest)?;

    let first_name = registration.first_name.trim().to_string();
    let last_name = registration.last_name.trim().to_string();
    validation::validate_name("First name", &first_name).map_err(AuthError::BadRequest)?;
    validation::validate_name("Last name", &last_name).map_err(AuthError::BadRequest)?;

    if users.find_by_email(&email).await?.is_some() {
        return Err(AuthError::bad_request("User already exists"));
    }
    if let Some(username) = &username {
        if users.find_by_username(username).await?.is_some() {
            return Err(AuthError::bad_request("Username already taken"));
        }
    }

    let password_hash = password::spawn_hash(registration.password).await?;

    let new_user = NewUser {
        email,
        username,
        password_hash: Some(password_hash),
        first_name,
        last_name,
        avatar_url: None,
        role: registration.role,
    };

    let user = users
        .create(&new_user)
        .await?
        .ok_or_else(|| AuthError::bad_request("Failed to create user"))?;

    info!(user_id = %user.id, role = %user.role, "user created");
    Ok(user)
}
