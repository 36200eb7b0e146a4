//! Record storage for users, authors and books.
//!
//! The auth core never touches storage itself; handlers read owner ids
//! through [`Store`] and hand them to the ownership guard.

pub mod in_memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use reading_core::{Author, AuthorDraft, Book, BookId, Identity, User};

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

/// Lists never return more than this many records.
pub const LIST_LIMIT: usize = 100;

pub type StoreResult<T> = Result<T, StoreError>;

/// A uniquely-constrained column.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Field {
    Nickname,
    Name,
    Lastname,
    Email,
    Title,
    Record,
}

impl Field {
    /// Guess the column from a unique-constraint name such as
    /// `authors_lastname_key`. Longer names are matched first because
    /// `lastname` and `nickname` both contain `name`.
    pub fn from_constraint(constraint: &str) -> Self {
        if constraint.contains("lastname") {
            Field::Lastname
        } else if constraint.contains("nickname") {
            Field::Nickname
        } else if constraint.contains("name") {
            Field::Name
        } else if constraint.contains("email") {
            Field::Email
        } else if constraint.contains("title") {
            Field::Title
        } else {
            Field::Record
        }
    }
}

impl core::fmt::Display for Field {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Field::Nickname => f.write_str("Nickname"),
            Field::Name => f.write_str("Name"),
            Field::Lastname => f.write_str("Lastname"),
            Field::Email => f.write_str("Email"),
            Field::Title => f.write_str("Title"),
            Field::Record => f.write_str("Record"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    #[error("{0} already taken")]
    Conflict(Field),

    #[error("author does not exist")]
    UnknownAuthor,

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// A user row to insert or overwrite. The password is already hashed.
#[derive(Clone, PartialEq, Eq)]
pub struct NewUser {
    pub nickname: String,
    pub email: String,
    pub password_hash: String,
}

impl core::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NewUser")
            .field("nickname", &self.nickname)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// A book row to insert or overwrite, with its (already authorized) owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub content: String,
    pub author_id: Identity,
}

/// Storage contract used by the HTTP handlers.
///
/// Lookups of a missing id return [`StoreError::NotFound`]; lists are capped
/// at [`LIST_LIMIT`] and ordered by id.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn find_user(&self, id: Identity) -> StoreResult<User>;
    /// `Ok(None)` when no account uses `email`.
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn update_user(&self, id: Identity, user: NewUser) -> StoreResult<User>;
    async fn delete_user(&self, id: Identity) -> StoreResult<()>;

    async fn create_author(&self, author: AuthorDraft) -> StoreResult<Author>;
    async fn list_authors(&self) -> StoreResult<Vec<Author>>;
    async fn find_author(&self, id: Identity) -> StoreResult<Author>;
    async fn update_author(&self, id: Identity, author: AuthorDraft) -> StoreResult<Author>;
    /// Deleting an author also deletes their books.
    async fn delete_author(&self, id: Identity) -> StoreResult<()>;

    async fn create_book(&self, book: NewBook) -> StoreResult<Book>;
    async fn list_books(&self) -> StoreResult<Vec<Book>>;
    async fn find_book(&self, id: BookId) -> StoreResult<Book>;
    /// Persisted owner of a book: the identity allowed to mutate it.
    async fn book_owner(&self, id: BookId) -> StoreResult<Identity>;
    async fn update_book(&self, id: BookId, book: NewBook) -> StoreResult<Book>;
    async fn delete_book(&self, id: BookId) -> StoreResult<()>;
}

#[async_trait]
impl<S> Store for Arc<S>
where
    S: Store + ?Sized,
{
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        (**self).create_user(user).await
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        (**self).list_users().await
    }

    async fn find_user(&self, id: Identity) -> StoreResult<User> {
        (**self).find_user(id).await
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        (**self).find_user_by_email(email).await
    }

    async fn update_user(&self, id: Identity, user: NewUser) -> StoreResult<User> {
        (**self).update_user(id, user).await
    }

    async fn delete_user(&self, id: Identity) -> StoreResult<()> {
        (**self).delete_user(id).await
    }

    async fn create_author(&self, author: AuthorDraft) -> StoreResult<Author> {
        (**self).create_author(author).await
    }

    async fn list_authors(&self) -> StoreResult<Vec<Author>> {
        (**self).list_authors().await
    }

    async fn find_author(&self, id: Identity) -> StoreResult<Author> {
        (**self).find_author(id).await
    }

    async fn update_author(&self, id: Identity, author: AuthorDraft) -> StoreResult<Author> {
        (**self).update_author(id, author).await
    }

    async fn delete_author(&self, id: Identity) -> StoreResult<()> {
        (**self).delete_author(id).await
    }

    async fn create_book(&self, book: NewBook) -> StoreResult<Book> {
        (**self).create_book(book).await
    }

    async fn list_books(&self) -> StoreResult<Vec<Book>> {
        (**self).list_books().await
    }

    async fn find_book(&self, id: BookId) -> StoreResult<Book> {
        (**self).find_book(id).await
    }

    async fn book_owner(&self, id: BookId) -> StoreResult<Identity> {
        (**self).book_owner(id).await
    }

    async fn update_book(&self, id: BookId, book: NewBook) -> StoreResult<Book> {
        (**self).update_book(id, book).await
    }

    async fn delete_book(&self, id: BookId) -> StoreResult<()> {
        (**self).delete_book(id).await
    }
}
