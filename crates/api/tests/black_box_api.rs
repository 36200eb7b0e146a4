use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

use reading_api::app::{build_app, services::AppServices};
use reading_auth::{CredentialConfig, CredentialVerifier, SigningKey, TokenCodec, TokenConfig};
use reading_core::{Author, AuthorDraft, Book, BookId, Identity, User};
use reading_infra::{InMemoryStore, NewBook, NewUser, Store, StoreResult};

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(Arc::new(InMemoryStore::new())).await
    }

    async fn spawn_with(store: Arc<dyn Store>) -> Self {
        // Same router as prod, cheap hashing, ephemeral port.
        let key = SigningKey::new(JWT_SECRET).unwrap();
        let tokens = TokenCodec::new(TokenConfig::new(key, ChronoDuration::hours(1)).unwrap());
        let credentials = CredentialVerifier::new(CredentialConfig::insecure_fast()).unwrap();
        let services = AppServices::new(store, Arc::new(tokens), Arc::new(credentials));
        let app = build_app(Arc::new(services));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt_at(secret: &str, identity: u32, issued_at: chrono::DateTime<Utc>) -> String {
    let claims = json!({
        "sub": identity,
        "iat": issued_at.timestamp(),
        "exp": (issued_at + ChronoDuration::minutes(10)).timestamp(),
    });

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn mint_jwt(identity: u32) -> String {
    mint_jwt_at(JWT_SECRET, identity, Utc::now())
}

fn author_draft(n: u32) -> AuthorDraft {
    AuthorDraft {
        name: format!("Name{n}"),
        lastname: format!("Lastname{n}"),
        email: format!("author{n}@mail.ru"),
    }
}

/// In-memory store seeded with authors 1..=count.
async fn store_with_authors(count: u32) -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    for n in 1..=count {
        store.create_author(author_draft(n)).await.unwrap();
    }
    store
}

/// Counts every call reaching storage.
struct CountingStore {
    inner: InMemoryStore,
    calls: Arc<AtomicUsize>,
}

impl CountingStore {
    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Store for CountingStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        self.tick();
        self.inner.create_user(user).await
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        self.tick();
        self.inner.list_users().await
    }

    async fn find_user(&self, id: Identity) -> StoreResult<User> {
        self.tick();
        self.inner.find_user(id).await
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.tick();
        self.inner.find_user_by_email(email).await
    }

    async fn update_user(&self, id: Identity, user: NewUser) -> StoreResult<User> {
        self.tick();
        self.inner.update_user(id, user).await
    }

    async fn delete_user(&self, id: Identity) -> StoreResult<()> {
        self.tick();
        self.inner.delete_user(id).await
    }

    async fn create_author(&self, author: AuthorDraft) -> StoreResult<Author> {
        self.tick();
        self.inner.create_author(author).await
    }

    async fn list_authors(&self) -> StoreResult<Vec<Author>> {
        self.tick();
        self.inner.list_authors().await
    }

    async fn find_author(&self, id: Identity) -> StoreResult<Author> {
        self.tick();
        self.inner.find_author(id).await
    }

    async fn update_author(&self, id: Identity, author: AuthorDraft) -> StoreResult<Author> {
        self.tick();
        self.inner.update_author(id, author).await
    }

    async fn delete_author(&self, id: Identity) -> StoreResult<()> {
        self.tick();
        self.inner.delete_author(id).await
    }

    async fn create_book(&self, book: NewBook) -> StoreResult<Book> {
        self.tick();
        self.inner.create_book(book).await
    }

    async fn list_books(&self) -> StoreResult<Vec<Book>> {
        self.tick();
        self.inner.list_books().await
    }

    async fn find_book(&self, id: BookId) -> StoreResult<Book> {
        self.tick();
        self.inner.find_book(id).await
    }

    async fn book_owner(&self, id: BookId) -> StoreResult<Identity> {
        self.tick();
        self.inner.book_owner(id).await
    }

    async fn update_book(&self, id: BookId, book: NewBook) -> StoreResult<Book> {
        self.tick();
        self.inner.update_book(id, book).await
    }

    async fn delete_book(&self, id: BookId) -> StoreResult<()> {
        self.tick();
        self.inner.delete_book(id).await
    }
}

#[tokio::test]
async fn missing_token_is_rejected_before_storage() {
    let calls = Arc::new(AtomicUsize::new(0));
    let store = CountingStore {
        inner: InMemoryStore::new(),
        calls: Arc::clone(&calls),
    };
    let srv = TestServer::spawn_with(Arc::new(store)).await;
    let client = reqwest::Client::new();

    let res = client.delete(srv.url("/books/1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .put(srv.url("/users/1"))
        .json(&json!({ "nickname": "x", "email": "x@mail.ru", "password": "p" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(srv.url("/books"))
        .json(&json!({ "title": "T", "content": "C", "author_id": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    assert_eq!(calls.load(Ordering::SeqCst), 0);

    // A public read does reach storage.
    let res = client.get(srv.url("/books")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn signup_login_and_whoami() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/users"))
        .json(&json!({ "nickname": "user1", "email": "user1@gmail.com", "password": "password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.headers()["location"], "/users/1");
    let created: serde_json::Value = res.json().await.unwrap();
    assert_eq!(created["id"], 1);
    assert_eq!(created["nickname"], "user1");
    assert!(created.get("password").is_none());
    assert!(created.get("password_hash").is_none());

    let res = client
        .post(srv.url("/login"))
        .json(&json!({ "email": "user1@gmail.com", "password": "password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 3600);
    let token = body["token"].as_str().unwrap().to_string();

    let res = client.get(srv.url("/whoami")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let me: serde_json::Value = res.json().await.unwrap();
    assert_eq!(me["identity"], 1);
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    client
        .post(srv.url("/users"))
        .json(&json!({ "nickname": "user1", "email": "user1@gmail.com", "password": "password" }))
        .send()
        .await
        .unwrap();

    let wrong_password = client
        .post(srv.url("/login"))
        .json(&json!({ "email": "user1@gmail.com", "password": "Password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    let wrong_password: serde_json::Value = wrong_password.json().await.unwrap();

    let unknown_email = client
        .post(srv.url("/login"))
        .json(&json!({ "email": "nobody@gmail.com", "password": "password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);
    let unknown_email: serde_json::Value = unknown_email.json().await.unwrap();

    assert_eq!(wrong_password, unknown_email);

    let res = client
        .post(srv.url("/login"))
        .json(&json!({ "email": "user1@gmail.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn bad_tokens_are_all_unauthorized() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let foreign = mint_jwt_at("other-secret", 1, Utc::now());
    let expired = mint_jwt_at(JWT_SECRET, 1, Utc::now() - ChronoDuration::hours(2));
    let valid = mint_jwt(1);

    let headers = [
        format!("Bearer {foreign}"),
        format!("Bearer {expired}"),
        "Bearer garbage".to_string(),
        "Bearer a.b.c".to_string(),
        format!("Basic {valid}"),
        valid.clone(),
    ];

    for header in headers {
        let res = client
            .get(srv.url("/whoami"))
            .header("authorization", &header)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "header {header}");
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["error"], "unauthenticated");
    }

    let res = client.get(srv.url("/whoami")).bearer_auth(&valid).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn authors_can_only_change_themselves() {
    let srv = TestServer::spawn_with(store_with_authors(2).await).await;
    let client = reqwest::Client::new();
    let token1 = mint_jwt(1);

    let res = client
        .put(srv.url("/authors/2"))
        .bearer_auth(&token1)
        .json(&json!({ "name": "Evil", "lastname": "Evilov", "email": "evil@mail.ru" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .put(srv.url("/authors/1"))
        .bearer_auth(&token1)
        .json(&json!({ "name": "Peter", "lastname": "Petrov", "email": "peter@mail.ru" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: serde_json::Value = res.json().await.unwrap();
    assert_eq!(updated["name"], "Peter");

    let res = client.delete(srv.url("/authors/2")).bearer_auth(&token1).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client.delete(srv.url("/authors/1")).bearer_auth(&token1).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(res.headers()["entity"], "1");

    let res = client.get(srv.url("/authors/2")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let res = client.get(srv.url("/authors/1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn identity_zero_cannot_delete_anything() {
    let srv = TestServer::spawn_with(store_with_authors(1).await).await;
    let client = reqwest::Client::new();
    let zero = mint_jwt(0);

    let res = client.delete(srv.url("/authors/1")).bearer_auth(&zero).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client.delete(srv.url("/users/1")).bearer_auth(&zero).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client.get(srv.url("/authors/1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn books_are_guarded_by_owner() {
    let srv = TestServer::spawn_with(store_with_authors(42).await).await;
    let client = reqwest::Client::new();
    let owner = mint_jwt(42);
    let other = mint_jwt(7);

    // Creating on someone else's behalf.
    let res = client
        .post(srv.url("/books"))
        .bearer_auth(&other)
        .json(&json!({ "title": "Book 1", "content": "Plot", "author_id": 42 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(srv.url("/books"))
        .bearer_auth(&owner)
        .json(&json!({ "title": "Book 1", "content": "Plot", "author_id": 42 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.headers()["location"], "/books/1");
    let book: serde_json::Value = res.json().await.unwrap();
    assert_eq!(book["author_id"], 42);
    assert_eq!(book["author"]["email"], "author42@mail.ru");

    let res = client
        .put(srv.url("/books/1"))
        .bearer_auth(&other)
        .json(&json!({ "title": "Stolen", "content": "Plot", "author_id": 7 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Ownership is decided before the payload is validated.
    let res = client
        .put(srv.url("/books/1"))
        .bearer_auth(&other)
        .json(&json!({ "title": "Stolen", "content": "Plot" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .put(srv.url("/books/1"))
        .bearer_auth(&owner)
        .json(&json!({ "title": "Book 1", "content": "Plot" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // The owner may not give the book away.
    let res = client
        .put(srv.url("/books/1"))
        .bearer_auth(&owner)
        .json(&json!({ "title": "Book 1", "content": "Plot", "author_id": 7 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .put(srv.url("/books/1"))
        .bearer_auth(&owner)
        .json(&json!({ "title": "Book 1, revised", "content": "Plot", "author_id": 42 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let book: serde_json::Value = res.json().await.unwrap();
    assert_eq!(book["title"], "Book 1, revised");

    let res = client.delete(srv.url("/books/1")).bearer_auth(&other).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client.delete(srv.url("/books/1")).bearer_auth(&owner).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(res.headers()["entity"], "1");

    let res = client.get(srv.url("/books/1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn request_errors_map_to_status_codes() {
    let srv = TestServer::spawn_with(store_with_authors(1).await).await;
    let client = reqwest::Client::new();
    let token = mint_jwt(1);

    let res = client.get(srv.url("/users/abc")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client.get(srv.url("/users/99")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client.delete(srv.url("/books/99")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .post(srv.url("/users"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let res = client
        .post(srv.url("/users"))
        .json(&json!({ "email": "user1@gmail.com", "password": "password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Required Nickname");

    let res = client
        .post(srv.url("/books"))
        .bearer_auth(&token)
        .json(&json!({ "title": "Book", "content": "Plot" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Required Author");

    let res = client
        .post(srv.url("/authors"))
        .json(&json!({ "name": "Name1", "lastname": "Other", "email": "other@mail.ru" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Name already taken");
}

#[tokio::test]
async fn every_response_carries_a_request_id() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(!res.headers()["x-request-id"].is_empty());

    let supplied = "0190b6a4-8f5e-7c3a-9d2e-1a2b3c4d5e6f";
    let res = client
        .get(srv.url("/whoami"))
        .header("x-request-id", supplied)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.headers()["x-request-id"], supplied);
}

#[tokio::test]
async fn cross_origin_requests_are_allowed() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    // Preflight for a protected route answers without a token.
    let res = client
        .request(reqwest::Method::OPTIONS, srv.url("/books"))
        .header("origin", "http://localhost:3000")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "authorization, content-type")
        .send()
        .await
        .unwrap();
    assert!(res.status().is_success());
    assert_eq!(res.headers()["access-control-allow-origin"], "*");

    let res = client
        .get(srv.url("/health"))
        .header("origin", "http://localhost:3000")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
}
