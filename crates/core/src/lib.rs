//! `reading-core` — domain records and identifiers for the reading API.
//!
//! This crate contains **pure domain** primitives (no storage or transport).

pub mod action;
pub mod author;
pub mod book;
pub mod error;
pub mod id;
pub mod text;
pub mod user;

pub use action::Action;
pub use author::{Author, AuthorDraft};
pub use book::{Book, BookDraft};
pub use error::{DomainError, DomainResult};
pub use id::{BookId, Identity};
pub use user::{User, UserDraft};
