//! # Job Bank Use Case Layer
//!
//! Application-specific business rules.
//! This layer orchestrates the flow of data between the domain and adapters:
//! every request-level workflow (list, details, create, edit, delete) lives
//! in [`controller::EntityController`].

pub use jobbank_domain;

pub mod authorization;
pub mod controller;
pub mod error;
pub mod preferences;
pub mod view;

pub use authorization::{AccessPolicy, Action, Caller};
pub use controller::{DeleteOutcome, EntityController, FormOutcome, ListQuery};
pub use error::ActionError;
pub use preferences::{resolve_page_size, PreferenceStore, PAGE_SIZE_KEY, PREFERENCE_LIFETIME_DAYS};
pub use view::{DeleteView, EntityView, FieldErrorView, FormView, ListView};
