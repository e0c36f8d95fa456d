//! Password change form validation

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PasswordError {
    #[error("All fields are required")]
    MissingField,

    #[error("New passwords do not match")]
    Mismatch,

    #[error("New password must be at least {0} characters")]
    TooShort(usize),
}

/// Password change form as submitted by the user
#[derive(Clone, Deserialize)]
pub struct PasswordChange {
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Body sent to the backend's `/change-password`
#[derive(Serialize)]
pub struct ChangePasswordBody<'a> {
    pub old_password: &'a str,
    pub new_password: &'a str,
}

impl PasswordChange {
    pub fn new(
        old_password: impl Into<String>,
        new_password: impl Into<String>,
        confirm_password: impl Into<String>,
    ) -> Self {
        Self {
            old_password: old_password.into(),
            new_password: new_password.into(),
            confirm_password: confirm_password.into(),
        }
    }

    /// Check the form before anything is sent
    pub fn validate(&self) -> Result<(), PasswordError> {
        if self.old_password.is_empty()
            || self.new_password.is_empty()
            || self.confirm_password.is_empty()
        {
            return Err(PasswordError::MissingField);
        }
        if self.new_password != self.confirm_password {
            return Err(PasswordError::Mismatch);
        }
        if self.new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(PasswordError::TooShort(MIN_PASSWORD_LEN));
        }
        Ok(())
    }

    pub fn body(&self) -> ChangePasswordBody<'_> {
        ChangePasswordBody {
            old_password: &self.old_password,
            new_password: &self.new_password,
        }
    }
}

impl std::fmt::Debug for PasswordChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordChange { .. }")
    }
}
