//! Postgres-backed store.
//!
//! Uses runtime-checked `sqlx` queries (no compile-time database). Unique and
//! foreign-key violations are mapped onto [`StoreError`] so handlers never see
//! driver errors.

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};

use reading_core::{Author, AuthorDraft, Book, BookId, Identity, User};

use super::{Field, LIST_LIMIT, NewBook, NewUser, Store, StoreError, StoreResult};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        nickname VARCHAR(255) NOT NULL UNIQUE,
        email VARCHAR(100) NOT NULL UNIQUE,
        password VARCHAR(255) NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS authors (
        id BIGSERIAL PRIMARY KEY,
        name VARCHAR(255) NOT NULL UNIQUE,
        lastname VARCHAR(255) NOT NULL UNIQUE,
        email VARCHAR(100) NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS books (
        id BIGSERIAL PRIMARY KEY,
        title VARCHAR(255) NOT NULL UNIQUE,
        content VARCHAR(255) NOT NULL,
        author_id BIGINT NOT NULL REFERENCES authors(id) ON UPDATE CASCADE ON DELETE CASCADE
    )
    "#,
];

const BOOK_COLUMNS: &str =
    "b.id, b.title, b.content, b.author_id, a.name AS author_name, a.lastname AS author_lastname, a.email AS author_email";

/// Postgres-backed [`Store`].
///
/// ## Thread Safety
///
/// Wraps an `sqlx` connection pool, which is cheap to clone and safe to share.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(map_sqlx)?;
        Ok(Self::new(pool))
    }

    /// Create the tables if they do not exist yet.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx)?;
        }
        tracing::info!("postgres schema ready");
        Ok(())
    }
}

fn map_sqlx(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::RowNotFound = err {
        return StoreError::NotFound;
    }
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreError::Conflict(Field::from_constraint(db.constraint().unwrap_or_default()));
        }
        if db.is_foreign_key_violation() {
            return StoreError::UnknownAuthor;
        }
    }
    // Logged once, where the API renders the 500.
    StoreError::Backend(err.to_string())
}

fn key(id: u32) -> i64 {
    i64::from(id)
}

fn id_from(row: &PgRow, column: &str) -> StoreResult<u32> {
    let raw: i64 = row.try_get(column).map_err(map_sqlx)?;
    u32::try_from(raw).map_err(|_| StoreError::Backend(format!("{column} {raw} out of range")))
}

fn text(row: &PgRow, column: &str) -> StoreResult<String> {
    row.try_get(column).map_err(map_sqlx)
}

fn user_from_row(row: &PgRow) -> StoreResult<User> {
    Ok(User {
        id: Identity::new(id_from(row, "id")?),
        nickname: text(row, "nickname")?,
        email: text(row, "email")?,
        password_hash: text(row, "password")?,
    })
}

fn author_from_row(row: &PgRow) -> StoreResult<Author> {
    Ok(Author {
        id: Identity::new(id_from(row, "id")?),
        name: text(row, "name")?,
        lastname: text(row, "lastname")?,
        email: text(row, "email")?,
    })
}

fn book_from_row(row: &PgRow) -> StoreResult<Book> {
    let author_id = Identity::new(id_from(row, "author_id")?);
    Ok(Book {
        id: BookId::new(id_from(row, "id")?),
        title: text(row, "title")?,
        content: text(row, "content")?,
        author: Author {
            id: author_id,
            name: text(row, "author_name")?,
            lastname: text(row, "author_lastname")?,
            email: text(row, "author_email")?,
        },
        author_id,
    })
}

#[async_trait]
impl Store for PostgresStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let row = sqlx::query(
            "INSERT INTO users (nickname, email, password) VALUES ($1, $2, $3) \
             RETURNING id, nickname, email, password",
        )
        .bind(&user.nickname)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?;
        user_from_row(&row)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let rows = sqlx::query("SELECT id, nickname, email, password FROM users ORDER BY id LIMIT $1")
            .bind(LIST_LIMIT as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        rows.iter().map(user_from_row).collect()
    }

    async fn find_user(&self, id: Identity) -> StoreResult<User> {
        let row = sqlx::query("SELECT id, nickname, email, password FROM users WHERE id = $1")
            .bind(key(id.get()))
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)?;
        user_from_row(&row)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query("SELECT id, nickname, email, password FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn update_user(&self, id: Identity, user: NewUser) -> StoreResult<User> {
        let row = sqlx::query(
            "UPDATE users SET nickname = $2, email = $3, password = $4 WHERE id = $1 \
             RETURNING id, nickname, email, password",
        )
        .bind(key(id.get()))
        .bind(&user.nickname)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?;
        user_from_row(&row)
    }

    async fn delete_user(&self, id: Identity) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(key(id.get()))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn create_author(&self, author: AuthorDraft) -> StoreResult<Author> {
        let row = sqlx::query(
            "INSERT INTO authors (name, lastname, email) VALUES ($1, $2, $3) \
             RETURNING id, name, lastname, email",
        )
        .bind(&author.name)
        .bind(&author.lastname)
        .bind(&author.email)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?;
        author_from_row(&row)
    }

    async fn list_authors(&self) -> StoreResult<Vec<Author>> {
        let rows = sqlx::query("SELECT id, name, lastname, email FROM authors ORDER BY id LIMIT $1")
            .bind(LIST_LIMIT as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        rows.iter().map(author_from_row).collect()
    }

    async fn find_author(&self, id: Identity) -> StoreResult<Author> {
        let row = sqlx::query("SELECT id, name, lastname, email FROM authors WHERE id = $1")
            .bind(key(id.get()))
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)?;
        author_from_row(&row)
    }

    async fn update_author(&self, id: Identity, author: AuthorDraft) -> StoreResult<Author> {
        let row = sqlx::query(
            "UPDATE authors SET name = $2, lastname = $3, email = $4 WHERE id = $1 \
             RETURNING id, name, lastname, email",
        )
        .bind(key(id.get()))
        .bind(&author.name)
        .bind(&author.lastname)
        .bind(&author.email)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?;
        author_from_row(&row)
    }

    async fn delete_author(&self, id: Identity) -> StoreResult<()> {
        // Books go with their author via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(key(id.get()))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn create_book(&self, book: NewBook) -> StoreResult<Book> {
        let sql = format!(
            "WITH b AS (INSERT INTO books (title, content, author_id) VALUES ($1, $2, $3) RETURNING *) \
             SELECT {BOOK_COLUMNS} FROM b JOIN authors a ON a.id = b.author_id"
        );
        let row = sqlx::query(&sql)
            .bind(&book.title)
            .bind(&book.content)
            .bind(key(book.author_id.get()))
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)?;
        book_from_row(&row)
    }

    async fn list_books(&self) -> StoreResult<Vec<Book>> {
        let sql = format!(
            "SELECT {BOOK_COLUMNS} FROM books b JOIN authors a ON a.id = b.author_id ORDER BY b.id LIMIT $1"
        );
        let rows = sqlx::query(&sql)
            .bind(LIST_LIMIT as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        rows.iter().map(book_from_row).collect()
    }

    async fn find_book(&self, id: BookId) -> StoreResult<Book> {
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books b JOIN authors a ON a.id = b.author_id WHERE b.id = $1");
        let row = sqlx::query(&sql)
            .bind(key(id.get()))
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)?;
        book_from_row(&row)
    }

    async fn book_owner(&self, id: BookId) -> StoreResult<Identity> {
        let row = sqlx::query("SELECT author_id FROM books WHERE id = $1")
            .bind(key(id.get()))
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(Identity::new(id_from(&row, "author_id")?))
    }

    async fn update_book(&self, id: BookId, book: NewBook) -> StoreResult<Book> {
        let sql = format!(
            "WITH b AS (UPDATE books SET title = $2, content = $3, author_id = $4 WHERE id = $1 RETURNING *) \
             SELECT {BOOK_COLUMNS} FROM b JOIN authors a ON a.id = b.author_id"
        );
        let row = sqlx::query(&sql)
            .bind(key(id.get()))
            .bind(&book.title)
            .bind(&book.content)
            .bind(key(book.author_id.get()))
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)?;
        book_from_row(&row)
    }

    async fn delete_book(&self, id: BookId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(key(id.get()))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
