//! Infrastructure layer: record storage backends.

pub mod store;

pub use store::{
    Field, InMemoryStore, LIST_LIMIT, NewBook, NewUser, PostgresStore, Store, StoreError, StoreResult,
};
