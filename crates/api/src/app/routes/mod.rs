use axum::{
    Router,
    routing::{get, post, put},
};

pub mod authors;
pub mod books;
pub mod login;
pub mod system;
pub mod users;

/// Routes anyone may call.
pub fn public_router() -> Router {
    Router::new()
        .route("/", get(system::home))
        .route("/health", get(system::health))
        .route("/login", post(login::login))
        .route("/users", post(users::create_user).get(users::list_users))
        .route("/users/:id", get(users::get_user))
        .route("/authors", post(authors::create_author).get(authors::list_authors))
        .route("/authors/:id", get(authors::get_author))
        .route("/books", get(books::list_books))
        .route("/books/:id", get(books::get_book))
}

/// Routes behind the auth gate. Merged per path with [`public_router`].
pub fn protected_router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/users/:id", put(users::update_user).delete(users::delete_user))
        .route("/authors/:id", put(authors::update_author).delete(authors::delete_author))
        .route("/books", post(books::create_book))
        .route("/books/:id", put(books::update_book).delete(books::delete_book))
}
