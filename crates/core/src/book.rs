use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::text::clean;
use crate::{Author, BookId, Identity};

/// A persisted book together with its owning author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub content: String,
    pub author: Author,
    /// Owner link: the only identity allowed to mutate this book.
    pub author_id: Identity,
}

/// Book fields as submitted by a client.
///
/// `author_id` is the owner the client *claims*; handlers must check it
/// against the authenticated identity before persisting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BookDraft {
    pub title: String,
    pub content: String,
    pub author_id: Option<Identity>,
}

impl BookDraft {
    pub fn prepare(self) -> Self {
        Self {
            title: clean(&self.title),
            content: clean(&self.content),
            author_id: self.author_id,
        }
    }

    /// Books validate the same way for every write; only create and update
    /// ever submit a draft.
    pub fn validate(&self) -> DomainResult<Identity> {
        if self.title.is_empty() {
            return Err(DomainError::validation("Required Title"));
        }
        if self.content.is_empty() {
            return Err(DomainError::validation("Required Content"));
        }
        match self.author_id {
            Some(id) if id.get() >= 1 => Ok(id),
            _ => Err(DomainError::validation("Required Author")),
        }
    }
}
