//! Credential check and account registration.

use crate::error::CaseError;
use crate::orm::users::{self, Role};
use crate::session::get_argon2;
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use chrono::{NaiveDate, Utc};
use sea_orm::{entity::*, query::*, ConnectionTrait, DatabaseConnection, DbErr};
use serde::Deserialize;
use validator::Validate;

/// The acting user of an operation, as established by the session.
#[derive(Clone, Debug, PartialEq)]
pub struct Actor {
    pub user_id: i32,
    pub name: String,
    pub role: Role,
}

/// Why a sign-in attempt was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SignInError {
    #[error("MISSING_FIELDS")]
    MissingFields,
    #[error("USER_NOT_FOUND")]
    UserNotFound,
    #[error("INVALID_PASSWORD")]
    InvalidPassword,
    #[error("INVALID_ROLE")]
    InvalidRole,
}

/// Emails are compared case-insensitively and stored lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn hash_password(password: &str) -> Result<String, CaseError> {
    get_argon2()
        .hash_password(password.as_bytes(), &SaltString::generate(&mut OsRng))
        .map(|hash| hash.to_string())
        .map_err(|e| CaseError::internal(format!("failed to hash password: {}", e)))
}

fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => get_argon2()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            log::warn!("stored password hash is unreadable: {}", e);
            false
        }
    }
}

/// Checks email, password and claimed role against the identity store.
///
/// The outer `Result` carries store failures; the inner one the specific
/// reason a credential was rejected.
pub async fn sign_in(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
    role: Option<Role>,
) -> Result<Result<users::Model, SignInError>, DbErr> {
    let email = normalize_email(email);
    let role = match role {
        Some(role) if !email.is_empty() && !password.is_empty() => role,
        _ => return Ok(Err(SignInError::MissingFields)),
    };

    let user = match find_by_email(db, &email).await? {
        Some(user) => user,
        None => return Ok(Err(SignInError::UserNotFound)),
    };

    if !verify_password(password, &user.password) {
        return Ok(Err(SignInError::InvalidPassword));
    }

    if user.role != role {
        return Ok(Err(SignInError::InvalidRole));
    }

    Ok(Ok(user))
}

pub async fn find_by_email<C>(db: &C, email: &str) -> Result<Option<users::Model>, DbErr>
where
    C: ConnectionTrait,
{
    users::Entity::find()
        .filter(users::Column::Email.eq(normalize_email(email)))
        .one(db)
        .await
}

#[derive(Debug, Deserialize, Validate)]
pub struct SignUpForm {
    #[validate(length(min = 1, max = 255))]
    pub first_name: String,
    #[validate(length(max = 255))]
    pub last_name: Option<String>,
    pub dob: Option<NaiveDate>,
    #[validate(length(max = 255))]
    pub location: Option<String>,
    #[validate(length(max = 32))]
    pub phone_number: Option<String>,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 1000))]
    pub password: String,
}

/// Fields shared by every way an account comes into existence.
pub(crate) struct NewAccount<'a> {
    pub first_name: &'a str,
    pub last_name: Option<&'a str>,
    pub dob: Option<NaiveDate>,
    pub location: Option<&'a str>,
    pub phone_number: Option<&'a str>,
    pub email: &'a str,
    pub password: &'a str,
    pub role: Role,
}

/// Inserts a user row after rejecting duplicate emails and short passwords.
pub(crate) async fn insert_account<C>(db: &C, account: NewAccount<'_>) -> Result<users::Model, CaseError>
where
    C: ConnectionTrait,
{
    let min_len = crate::app_config::security().min_password_length as usize;
    if account.password.chars().count() < min_len {
        return Err(CaseError::validation(format!(
            "Password must be at least {} characters.",
            min_len
        )));
    }

    let email = normalize_email(account.email);
    if find_by_email(db, &email).await?.is_some() {
        return Err(CaseError::conflict("User with this email already exists."));
    }

    let user = users::ActiveModel {
        first_name: Set(account.first_name.trim().to_owned()),
        last_name: Set(account.last_name.map(|s| s.trim().to_owned())),
        dob: Set(account.dob),
        location: Set(account.location.map(str::to_owned)),
        phone_number: Set(account.phone_number.map(str::to_owned)),
        email: Set(email),
        password: Set(hash_password(account.password)?),
        role: Set(account.role),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };

    Ok(user.insert(db).await?)
}

/// Self-service registration. Always creates a Civilian.
pub async fn register_civilian(
    db: &DatabaseConnection,
    form: &SignUpForm,
) -> Result<users::Model, CaseError> {
    form.validate()?;

    let user = insert_account(
        db,
        NewAccount {
            first_name: &form.first_name,
            last_name: form.last_name.as_deref(),
            dob: form.dob,
            location: form.location.as_deref(),
            phone_number: form.phone_number.as_deref(),
            email: &form.email,
            password: &form.password,
            role: Role::Civilian,
        },
    )
    .await?;

    log::info!("New civilian registered: user_id={}", user.id);
    Ok(user)
}
