use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::text::{clean, is_email};
use crate::{Action, Identity};

/// A persisted user account.
///
/// `password_hash` is a PHC-format credential digest and is never serialized.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: Identity,
    pub nickname: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

impl core::fmt::Debug for User {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("nickname", &self.nickname)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// User fields as submitted by a client (signup, update or login).
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UserDraft {
    pub nickname: String,
    pub email: String,
    pub password: String,
}

impl core::fmt::Debug for UserDraft {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UserDraft")
            .field("nickname", &self.nickname)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl UserDraft {
    /// Normalise text fields. The password is left untouched.
    pub fn prepare(self) -> Self {
        Self {
            nickname: clean(&self.nickname),
            email: clean(&self.email),
            password: self.password,
        }
    }

    pub fn validate(&self, action: Action) -> DomainResult<()> {
        match action {
            Action::Create | Action::Update => {
                if self.nickname.is_empty() {
                    return Err(DomainError::validation("Required Nickname"));
                }
                if self.password.is_empty() {
                    return Err(DomainError::validation("Required Password"));
                }
                self.validate_email()
            }
            Action::Login => {
                if self.password.is_empty() {
                    return Err(DomainError::validation("Required Password"));
                }
                self.validate_email()
            }
        }
    }

    fn validate_email(&self) -> DomainResult<()> {
        if self.email.is_empty() {
            return Err(DomainError::validation("Required Email"));
        }
        if !is_email(&self.email) {
            return Err(DomainError::validation("Invalid Email"));
        }
        Ok(())
    }
}
