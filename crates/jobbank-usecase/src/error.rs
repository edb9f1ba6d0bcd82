//! Error types for controller actions
//!
//! Validation failures and blocked deletes are not errors: they come back
//! as `FormOutcome::Invalid` / `DeleteOutcome::Blocked` so the form can be
//! redisplayed.

use jobbank_domain::{EntityId, EntityKind, RepositoryError};
use thiserror::Error;

use crate::authorization::Action;

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("You are not allowed to {action} {kind} records")]
    Forbidden { kind: EntityKind, action: Action },

    #[error("{kind} not found")]
    NotFound { kind: EntityKind, id: Option<EntityId> },

    /// A conflicting edit on a row that still exists; never resolved silently
    #[error("{kind} {id} was modified by another user")]
    ConcurrencyConflict { kind: EntityKind, id: EntityId },

    #[error("Unable to read {kind} records: {source}")]
    Store {
        kind: EntityKind,
        #[source]
        source: RepositoryError,
    },
}

impl ActionError {
    pub fn not_found(kind: EntityKind, id: Option<EntityId>) -> Self {
        ActionError::NotFound { kind, id }
    }

    /// Map a read-path repository failure
    pub fn from_read(kind: EntityKind, source: RepositoryError) -> Self {
        match source {
            RepositoryError::NotFound { kind, id } => ActionError::NotFound { kind, id: Some(id) },
            source => ActionError::Store { kind, source },
        }
    }
}

pub type Result<T> = std::result::Result<T, ActionError>;
