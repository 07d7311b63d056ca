use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::repo_types::User;
use crate::error::AppError;

const USERNAME_LEN: std::ops::RangeInclusive<usize> = 1..=50;
const PASSWORD_LEN: std::ops::RangeInclusive<usize> = 8..=100;
const FULL_NAME_MAX: usize = 100;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    email.len() <= 255 && EMAIL_RE.is_match(email)
}

fn check_email(email: &str) -> Result<(), AppError> {
    if !is_valid_email(email) {
        return Err(AppError::Validation("Invalid email".into()));
    }
    Ok(())
}

fn check_username(username: &str) -> Result<(), AppError> {
    if !USERNAME_LEN.contains(&username.chars().count()) {
        return Err(AppError::Validation(
            "Username must be 1 to 50 characters".into(),
        ));
    }
    // Login treats any identifier with '@' as an email.
    if username.contains('@') {
        return Err(AppError::Validation("Username must not contain '@'".into()));
    }
    Ok(())
}

fn check_password(password: &str) -> Result<(), AppError> {
    if !PASSWORD_LEN.contains(&password.chars().count()) {
        return Err(AppError::Validation(
            "Password must be 8 to 100 characters".into(),
        ));
    }
    Ok(())
}

fn check_full_name(full_name: &str) -> Result<(), AppError> {
    if full_name.chars().count() > FULL_NAME_MAX {
        return Err(AppError::Validation("Full name is too long".into()));
    }
    Ok(())
}

/// Request body for user registration.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub full_name: Option<String>,
    pub password: String,
}

impl RegisterRequest {
    /// Normalizes the email and username, then checks every field.
    pub fn validated(mut self) -> Result<Self, AppError> {
        self.email = self.email.trim().to_lowercase();
        self.username = self.username.trim().to_string();
        check_email(&self.email)?;
        check_username(&self.username)?;
        check_password(&self.password)?;
        if let Some(name) = &self.full_name {
            check_full_name(name)?;
        }
        Ok(self)
    }
}

/// Partial update; absent fields stay as they are.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub password: Option<String>,
    pub is_active: Option<bool>,
}

impl UserUpdate {
    pub fn validated(mut self) -> Result<Self, AppError> {
        if let Some(email) = self.email.take() {
            let email = email.trim().to_lowercase();
            check_email(&email)?;
            self.email = Some(email);
        }
        if let Some(username) = self.username.take() {
            let username = username.trim().to_string();
            check_username(&username)?;
            self.username = Some(username);
        }
        if let Some(password) = &self.password {
            check_password(password)?;
        }
        if let Some(name) = &self.full_name {
            check_full_name(name)?;
        }
        Ok(self)
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}
fn default_page() -> i64 {
    1
}
fn default_page_size() -> i64 {
    10
}

impl ListQuery {
    pub fn validated(self) -> Result<Self, AppError> {
        if self.page < 1 {
            return Err(AppError::Validation("page must be at least 1".into()));
        }
        if !(1..=100).contains(&self.page_size) {
            return Err(AppError::Validation(
                "page_size must be between 1 and 100".into(),
            ));
        }
        if (self.page - 1).checked_mul(self.page_size).is_none() {
            return Err(AppError::Validation("page is too large".into()));
        }
        Ok(self)
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub total: i64,
    pub items: Vec<User>,
    pub page: i64,
    pub page_size: i64,
}
