use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::text::{clean, is_email};
use crate::{Action, Identity};

/// A persisted author. Its id is the identity that may mutate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: Identity,
    pub name: String,
    pub lastname: String,
    pub email: String,
}

/// Author fields as submitted by a client.
///
/// Missing fields deserialize as empty so validation reports them by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AuthorDraft {
    pub name: String,
    pub lastname: String,
    pub email: String,
}

impl AuthorDraft {
    pub fn prepare(self) -> Self {
        Self {
            name: clean(&self.name),
            lastname: clean(&self.lastname),
            email: clean(&self.email),
        }
    }

    pub fn validate(&self, action: Action) -> DomainResult<()> {
        match action {
            Action::Create | Action::Update => {
                if self.name.is_empty() {
                    return Err(DomainError::validation("Required Name"));
                }
                if self.lastname.is_empty() {
                    return Err(DomainError::validation("Required Lastname"));
                }
                self.validate_email()
            }
            Action::Login => Err(DomainError::validation("authors cannot log in")),
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

    pub fn into_author(self, id: Identity) -> Author {
        Author {
            id,
            name: self.name,
            lastname: self.lastname,
            email: self.email,
        }
    }
}
