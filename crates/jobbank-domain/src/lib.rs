//! # Job Bank Domain Layer
//!
//! Reference data for the job bank: Skills and Retraining Programs.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Domain Layer (This Crate)                     │
//! │  ┌─────────────────────────────────────────────────────────────┐│
//! │  │  model/      - Entities, input DTOs & Value Objects         ││
//! │  │  pagination  - Page requests, page windows, paged results   ││
//! │  │  repository/ - Trait definitions (not implementations)      ││
//! │  └─────────────────────────────────────────────────────────────┘│
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The Golden Rule
//!
//! **This crate has ZERO external dependencies.**
//!
//! Swapping SQLite for PostgreSQL, or axum for anything else, never
//! touches this crate.

pub mod model;
pub mod pagination;
pub mod repository;

// Re-export commonly used types
pub use model::{
    entity::{
        CatalogEntity, EntityDraft, EntityForm, EntityId, EntityKind, FieldError, RowVersion,
    },
    retraining_program::RetrainingProgram,
    role::Role,
    skill::Skill,
};

pub use pagination::{
    paginate, PageRequest, PageSize, PageSource, PageWindow, PagedResult, DEFAULT_PAGE_SIZE,
    PAGE_SIZE_OPTIONS,
};

pub use repository::entity_store::{ByName, EntityStore, RepositoryError, SortOrder};
