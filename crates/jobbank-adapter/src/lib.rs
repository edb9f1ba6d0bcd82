//! # Job Bank Adapter Layer
//!
//! External system integrations (Hexagonal Architecture adapters).
//!
//! ## Structure
//!
//! - `controller/` - Inbound adapter: the axum HTTP surface
//! - `repository/` - Persistence implementations (SQLite, in-memory)

pub mod controller;
pub mod repository;

pub use controller::{router, CookieSettings};
pub use repository::in_memory::InMemoryEntityStore;
pub use repository::sqlite::{Database, DatabaseError, SqliteEntityStore};
