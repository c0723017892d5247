//! Account Service - sign-up, login, email verification and password reset

use chrono::{DateTime, Duration, Utc};
use sea_orm::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ServiceError;
use crate::domain::{Faculty, Role, Session};
use crate::infrastructure::auth::{create_jwt, hash_password, verify_password};
use crate::models::user::{self, Entity as User};
use crate::utils::time::{parse_timestamp, timestamp};

const MIN_PASSWORD_LEN: usize = 8;
const RESET_TOKEN_TTL_MINUTES: i64 = 60;
const MAX_PROFILE_IMAGE_LEN: usize = 2048;

#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub faculty: Faculty,
    pub year_of_study: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: i32,
    pub email: String,
    pub display_name: String,
    pub faculty: String,
    pub faculty_name: String,
    pub year_of_study: i32,
    pub role: String,
    pub diamonds: i64,
    pub points: i64,
    pub profile_image: Option<String>,
    pub email_verified: bool,
    pub onboarding_completed: bool,
    pub has_push_token: bool,
    pub created_at: String,
}

impl From<user::Model> for UserProfile {
    fn from(u: user::Model) -> Self {
        let faculty_name = u
            .faculty
            .parse::<Faculty>()
            .map(|f| f.label().to_string())
            .unwrap_or_else(|_| u.faculty.clone());
        Self {
            id: u.id,
            email: u.email,
            display_name: u.display_name,
            faculty: u.faculty,
            faculty_name,
            year_of_study: u.year_of_study,
            role: u.role,
            diamonds: u.diamonds,
            points: u.points,
            profile_image: u.profile_image,
            email_verified: u.email_verified,
            onboarding_completed: u.onboarding_completed,
            has_push_token: u.push_token.is_some(),
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupResponse {
    pub user: UserProfile,
    /// Only exposed in debug builds; production sends it by email
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

fn new_token() -> String {
    Uuid::new_v4().simple().to_string()
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn dev_only(token: String) -> Option<String> {
    cfg!(debug_assertions).then_some(token)
}

fn validate_password(password: &str) -> Result<(), ServiceError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ServiceError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

impl SignupRequest {
    pub fn validate(&self) -> Result<(), ServiceError> {
        let email = normalize_email(&self.email);
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
            _ => return Err(ServiceError::Validation("Invalid email address".to_string())),
        }
        if self.display_name.trim().is_empty() {
            return Err(ServiceError::Validation("Name is required".to_string()));
        }
        if !(1..=7).contains(&self.year_of_study) {
            return Err(ServiceError::Validation(
                "Year of study must be between 1 and 7".to_string(),
            ));
        }
        validate_password(&self.password)
    }
}

async fn find_user(db: &DatabaseConnection, user_id: i32) -> Result<user::Model, ServiceError> {
    User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound("User"))
}

/// Create a student account awaiting email verification
pub async fn signup(
    db: &DatabaseConnection,
    request: SignupRequest,
    now: DateTime<Utc>,
) -> Result<SignupResponse, ServiceError> {
    request.validate()?;
    let email = normalize_email(&request.email);

    let taken = User::find()
        .filter(user::Column::Email.eq(&email))
        .count(db)
        .await?;
    if taken > 0 {
        return Err(ServiceError::Conflict(
            "An account with this email already exists".to_string(),
        ));
    }

    let password_hash = hash_password(&request.password).map_err(ServiceError::InvalidState)?;
    let verification_token = new_token();
    let now_str = timestamp(now);

    let saved = user::ActiveModel {
        email: Set(email),
        password_hash: Set(password_hash),
        display_name: Set(request.display_name.trim().to_string()),
        faculty: Set(request.faculty.code().to_string()),
        year_of_study: Set(request.year_of_study),
        role: Set(Role::Student.code().to_string()),
        diamonds: Set(0),
        points: Set(0),
        push_token: Set(None),
        profile_image: Set(None),
        email_verified: Set(false),
        verification_token: Set(Some(verification_token.clone())),
        reset_token: Set(None),
        reset_token_expires_at: Set(None),
        onboarding_completed: Set(false),
        created_at: Set(now_str.clone()),
        updated_at: Set(now_str),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!("New account {} ({})", saved.id, saved.faculty);

    Ok(SignupResponse {
        user: saved.into(),
        verification_token: dev_only(verification_token),
    })
}

pub async fn login(
    db: &DatabaseConnection,
    request: LoginRequest,
) -> Result<LoginResponse, ServiceError> {
    let email = normalize_email(&request.email);
    let invalid = || ServiceError::Unauthorized("Invalid credentials".to_string());

    let Some(user) = User::find()
        .filter(user::Column::Email.eq(&email))
        .one(db)
        .await?
    else {
        tracing::warn!("Login attempt for unknown email");
        return Err(invalid());
    };

    if !verify_password(&request.password, &user.password_hash).unwrap_or(false) {
        tracing::warn!("Password verification failed for user {}", user.id);
        return Err(invalid());
    }
    if !user.email_verified {
        return Err(ServiceError::Unauthorized(
            "Please verify your email before logging in".to_string(),
        ));
    }

    let session = Session::new(
        user.id,
        user.faculty.parse::<Faculty>()?,
        user.role.parse::<Role>()?,
    );
    let token = create_jwt(&session).map_err(ServiceError::InvalidState)?;

    tracing::info!("User {} logged in", user.id);
    Ok(LoginResponse {
        token,
        user: user.into(),
    })
}

pub async fn verify_email(
    db: &DatabaseConnection,
    token: &str,
    now: DateTime<Utc>,
) -> Result<UserProfile, ServiceError> {
    let user = User::find()
        .filter(user::Column::VerificationToken.eq(token.trim()))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::Validation("Invalid verification link".to_string()))?;

    let mut active: user::ActiveModel = user.into();
    active.email_verified = Set(true);
    active.verification_token = Set(None);
    active.updated_at = Set(timestamp(now));
    Ok(active.update(db).await?.into())
}

/// Start a password reset. Unknown emails succeed silently so the endpoint
/// does not reveal which addresses have accounts.
pub async fn request_password_reset(
    db: &DatabaseConnection,
    email: &str,
    now: DateTime<Utc>,
) -> Result<Option<String>, ServiceError> {
    let Some(user) = User::find()
        .filter(user::Column::Email.eq(normalize_email(email)))
        .one(db)
        .await?
    else {
        return Ok(None);
    };

    let token = new_token();
    let mut active: user::ActiveModel = user.into();
    active.reset_token = Set(Some(token.clone()));
    active.reset_token_expires_at = Set(Some(timestamp(
        now + Duration::minutes(RESET_TOKEN_TTL_MINUTES),
    )));
    active.updated_at = Set(timestamp(now));
    active.update(db).await?;

    Ok(dev_only(token))
}

pub async fn reset_password(
    db: &DatabaseConnection,
    token: &str,
    new_password: &str,
    now: DateTime<Utc>,
) -> Result<(), ServiceError> {
    validate_password(new_password)?;
    let invalid = || ServiceError::Validation("Reset link is invalid or has expired".to_string());

    let user = User::find()
        .filter(user::Column::ResetToken.eq(token.trim()))
        .one(db)
        .await?
        .ok_or_else(invalid)?;
    let expires = user
        .reset_token_expires_at
        .as_deref()
        .and_then(parse_timestamp)
        .ok_or_else(invalid)?;
    if now > expires {
        return Err(invalid());
    }

    let password_hash = hash_password(new_password).map_err(ServiceError::InvalidState)?;
    let user_id = user.id;
    let mut active: user::ActiveModel = user.into();
    active.password_hash = Set(password_hash);
    active.reset_token = Set(None);
    active.reset_token_expires_at = Set(None);
    active.updated_at = Set(timestamp(now));
    active.update(db).await?;

    tracing::info!("Password reset for user {}", user_id);
    Ok(())
}

pub async fn profile(
    db: &DatabaseConnection,
    session: &Session,
) -> Result<UserProfile, ServiceError> {
    Ok(find_user(db, session.user_id).await?.into())
}

pub async fn set_push_token(
    db: &DatabaseConnection,
    session: &Session,
    token: Option<String>,
    now: DateTime<Utc>,
) -> Result<UserProfile, ServiceError> {
    let token = token.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
    let mut active: user::ActiveModel = find_user(db, session.user_id).await?.into();
    active.push_token = Set(token);
    active.updated_at = Set(timestamp(now));
    Ok(active.update(db).await?.into())
}

pub async fn set_profile_image(
    db: &DatabaseConnection,
    session: &Session,
    url: String,
    now: DateTime<Utc>,
) -> Result<UserProfile, ServiceError> {
    let url = url.trim();
    if url.is_empty() || url.len() > MAX_PROFILE_IMAGE_LEN {
        return Err(ServiceError::Validation("Invalid profile image URL".to_string()));
    }
    let mut active: user::ActiveModel = find_user(db, session.user_id).await?.into();
    active.profile_image = Set(Some(url.to_string()));
    active.updated_at = Set(timestamp(now));
    Ok(active.update(db).await?.into())
}

pub async fn complete_onboarding(
    db: &DatabaseConnection,
    session: &Session,
    now: DateTime<Utc>,
) -> Result<UserProfile, ServiceError> {
    let mut active: user::ActiveModel = find_user(db, session.user_id).await?.into();
    active.onboarding_completed = Set(true);
    active.updated_at = Set(timestamp(now));
    Ok(active.update(db).await?.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, password: &str, year: i32) -> SignupRequest {
        SignupRequest {
            email: email.to_string(),
            password: password.to_string(),
            display_name: "Aisyah".to_string(),
            faculty: Faculty::Computing,
            year_of_study: year,
        }
    }

    #[test]
    fn test_signup_validation() {
        assert!(request("a@uni.edu.my", "longenough", 2).validate().is_ok());
        assert!(request("not-an-email", "longenough", 2).validate().is_err());
        assert!(request("a@uni.edu.my", "short", 2).validate().is_err());
        assert!(request("a@uni.edu.my", "longenough", 0).validate().is_err());
    }

    #[test]
    fn test_email_is_normalized() {
        assert_eq!(normalize_email("  Someone@Uni.EDU "), "someone@uni.edu");
    }
}
