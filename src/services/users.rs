use anyhow::anyhow;
use argon2::{
    Argon2, PasswordHash, PasswordVerifier,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;

use crate::{
    common::{
        app_error::AppError,
        app_state::AppState,
        validation::{is_valid_email, is_valid_phone, require_fields},
    },
    models::{CreateUserEntity, UserEntity},
};

const DEFAULT_ROLE: &str = "customer";

#[derive(Debug, Deserialize, ToSchema)]
pub struct UserReq {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginReq {
    pub email: Option<String>,
    pub password: Option<String>,
}

fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Fails with `User not found` unless the user exists.
pub async fn require_user(state: &AppState, id: i32) -> Result<UserEntity, AppError> {
    state
        .store
        .users
        .find(id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

/// Checks the body and turns it into a row with a hashed password.
fn validate(req: UserReq) -> Result<CreateUserEntity, AppError> {
    require_fields(&[
        ("name", &req.name),
        ("email", &req.email),
        ("password", &req.password),
    ])?;

    let email = req.email.unwrap_or_default().trim().to_string();
    if !is_valid_email(&email) {
        return Err(AppError::validation("Invalid email address"));
    }
    if !is_valid_phone(req.phone.as_deref()) {
        return Err(AppError::validation("Invalid phone number"));
    }

    let password = hash_password(&req.password.unwrap_or_default())
        .map_err(|e| anyhow!("Failed to hash password: {e}"))?;

    Ok(CreateUserEntity {
        name: req.name.unwrap_or_default(),
        email,
        phone: req.phone.filter(|p| !p.trim().is_empty()),
        role: req
            .role
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_ROLE.to_string()),
        password,
    })
}

pub async fn create_user(state: &AppState, req: UserReq) -> Result<UserEntity, AppError> {
    let user = validate(req)?;

    if state.store.users.email_taken(&user.email, None).await? {
        return Err(AppError::Conflict("Email already exists".into()));
    }

    let user = state.store.users.create(user).await?;
    info!("User #{} created with role {}", user.id, user.role);
    Ok(user)
}

pub async fn list_users(state: &AppState) -> Result<Vec<UserEntity>, AppError> {
    Ok(state.store.users.list().await?)
}

pub async fn update_user(state: &AppState, id: i32, req: UserReq) -> Result<UserEntity, AppError> {
    let user = validate(req)?;

    require_user(state, id).await?;
    if state.store.users.email_taken(&user.email, Some(id)).await? {
        return Err(AppError::Conflict("Email already exists".into()));
    }

    state
        .store
        .users
        .update(id, user)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

pub async fn delete_user(state: &AppState, id: i32) -> Result<(), AppError> {
    if !state.store.users.delete(id).await? {
        return Err(AppError::not_found("User not found"));
    }
    info!("User #{} deleted", id);
    Ok(())
}

pub async fn login(state: &AppState, req: LoginReq) -> Result<UserEntity, AppError> {
    let (Some(email), Some(password)) = (
        req.email.filter(|e| !e.is_empty()),
        req.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::validation("Email and password are required"));
    };

    let user = state
        .store
        .users
        .find_by_email(email.trim())
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    if !verify_password(&password, &user.password) {
        return Err(AppError::Unauthenticated("Invalid password".into()));
    }

    Ok(user)
}
