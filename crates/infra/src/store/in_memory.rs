use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use reading_core::{Author, AuthorDraft, Book, BookId, Identity, User};

use super::{Field, LIST_LIMIT, NewBook, NewUser, Store, StoreError, StoreResult};

#[derive(Debug, Clone)]
struct BookRow {
    title: String,
    content: String,
    author_id: Identity,
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<Identity, User>,
    authors: BTreeMap<Identity, Author>,
    books: BTreeMap<BookId, BookRow>,
    last_user: u32,
    last_author: u32,
    last_book: u32,
}

impl Tables {
    fn book(&self, id: BookId, row: &BookRow) -> StoreResult<Book> {
        let author = self
            .authors
            .get(&row.author_id)
            .cloned()
            .ok_or(StoreError::UnknownAuthor)?;
        Ok(Book {
            id,
            title: row.title.clone(),
            content: row.content.clone(),
            author,
            author_id: row.author_id,
        })
    }

    fn check_user_unique(&self, user: &NewUser, except: Option<Identity>) -> StoreResult<()> {
        for (id, existing) in &self.users {
            if Some(*id) == except {
                continue;
            }
            if existing.nickname == user.nickname {
                return Err(StoreError::Conflict(Field::Nickname));
            }
            if existing.email == user.email {
                return Err(StoreError::Conflict(Field::Email));
            }
        }
        Ok(())
    }

    fn check_author_unique(&self, author: &AuthorDraft, except: Option<Identity>) -> StoreResult<()> {
        for (id, existing) in &self.authors {
            if Some(*id) == except {
                continue;
            }
            if existing.name == author.name {
                return Err(StoreError::Conflict(Field::Name));
            }
            if existing.lastname == author.lastname {
                return Err(StoreError::Conflict(Field::Lastname));
            }
            if existing.email == author.email {
                return Err(StoreError::Conflict(Field::Email));
            }
        }
        Ok(())
    }

    fn check_book(&self, book: &NewBook, except: Option<BookId>) -> StoreResult<()> {
        if !self.authors.contains_key(&book.author_id) {
            return Err(StoreError::UnknownAuthor);
        }
        let taken = self
            .books
            .iter()
            .any(|(id, row)| Some(*id) != except && row.title == book.title);
        if taken {
            return Err(StoreError::Conflict(Field::Title));
        }
        Ok(())
    }
}

/// In-memory store for tests/dev.
///
/// Mirrors the relational schema: auto-increment ids starting at 1, unique
/// columns, and books cascading away with their author.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".into()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".into()))
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut t = self.write()?;
        t.check_user_unique(&user, None)?;
        t.last_user += 1;
        let id = Identity::new(t.last_user);
        let record = User {
            id,
            nickname: user.nickname,
            email: user.email,
            password_hash: user.password_hash,
        };
        t.users.insert(id, record.clone());
        Ok(record)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let t = self.read()?;
        Ok(t.users.values().take(LIST_LIMIT).cloned().collect())
    }

    async fn find_user(&self, id: Identity) -> StoreResult<User> {
        let t = self.read()?;
        t.users.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let t = self.read()?;
        Ok(t.users.values().find(|u| u.email == email).cloned())
    }

    async fn update_user(&self, id: Identity, user: NewUser) -> StoreResult<User> {
        let mut t = self.write()?;
        if !t.users.contains_key(&id) {
            return Err(StoreError::NotFound);
        }
        t.check_user_unique(&user, Some(id))?;
        let record = User {
            id,
            nickname: user.nickname,
            email: user.email,
            password_hash: user.password_hash,
        };
        t.users.insert(id, record.clone());
        Ok(record)
    }

    async fn delete_user(&self, id: Identity) -> StoreResult<()> {
        let mut t = self.write()?;
        t.users.remove(&id).map(|_| ()).ok_or(StoreError::NotFound)
    }

    async fn create_author(&self, author: AuthorDraft) -> StoreResult<Author> {
        let mut t = self.write()?;
        t.check_author_unique(&author, None)?;
        t.last_author += 1;
        let record = author.into_author(Identity::new(t.last_author));
        t.authors.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_authors(&self) -> StoreResult<Vec<Author>> {
        let t = self.read()?;
        Ok(t.authors.values().take(LIST_LIMIT).cloned().collect())
    }

    async fn find_author(&self, id: Identity) -> StoreResult<Author> {
        let t = self.read()?;
        t.authors.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn update_author(&self, id: Identity, author: AuthorDraft) -> StoreResult<Author> {
        let mut t = self.write()?;
        if !t.authors.contains_key(&id) {
            return Err(StoreError::NotFound);
        }
        t.check_author_unique(&author, Some(id))?;
        let record = author.into_author(id);
        t.authors.insert(id, record.clone());
        Ok(record)
    }

    async fn delete_author(&self, id: Identity) -> StoreResult<()> {
        let mut t = self.write()?;
        if t.authors.remove(&id).is_none() {
            return Err(StoreError::NotFound);
        }
        t.books.retain(|_, row| row.author_id != id);
        Ok(())
    }

    async fn create_book(&self, book: NewBook) -> StoreResult<Book> {
        let mut t = self.write()?;
        t.check_book(&book, None)?;
        t.last_book += 1;
        let id = BookId::new(t.last_book);
        let row = BookRow {
            title: book.title,
            content: book.content,
            author_id: book.author_id,
        };
        let record = t.book(id, &row)?;
        t.books.insert(id, row);
        Ok(record)
    }

    async fn list_books(&self) -> StoreResult<Vec<Book>> {
        let t = self.read()?;
        t.books
            .iter()
            .take(LIST_LIMIT)
            .map(|(id, row)| t.book(*id, row))
            .collect()
    }

    async fn find_book(&self, id: BookId) -> StoreResult<Book> {
        let t = self.read()?;
        let row = t.books.get(&id).ok_or(StoreError::NotFound)?;
        t.book(id, row)
    }

    async fn book_owner(&self, id: BookId) -> StoreResult<Identity> {
        let t = self.read()?;
        t.books.get(&id).map(|row| row.author_id).ok_or(StoreError::NotFound)
    }

    async fn update_book(&self, id: BookId, book: NewBook) -> StoreResult<Book> {
        let mut t = self.write()?;
        if !t.books.contains_key(&id) {
            return Err(StoreError::NotFound);
        }
        t.check_book(&book, Some(id))?;
        let row = BookRow {
            title: book.title,
            content: book.content,
            author_id: book.author_id,
        };
        let record = t.book(id, &row)?;
        t.books.insert(id, row);
        Ok(record)
    }

    async fn delete_book(&self, id: BookId) -> StoreResult<()> {
        let mut t = self.write()?;
        t.books.remove(&id).map(|_| ()).ok_or(StoreError::NotFound)
    }
}
