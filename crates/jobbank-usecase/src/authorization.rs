//! Authorization guard
//!
//! Every controller action calls [`AccessPolicy::authorize`] before it
//! touches the store.

use std::collections::BTreeSet;

use jobbank_domain::{EntityKind, Role};

use crate::error::ActionError;

/// The user making a request, as asserted by the identity layer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller {
    name: Option<String>,
    roles: BTreeSet<Role>,
}

impl Caller {
    pub fn new(name: impl Into<String>, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            name: Some(name.into()),
            roles: roles.into_iter().collect(),
        }
    }

    /// No identity, no roles
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.roles.iter().copied()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// Controller actions, named for logs and error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Details,
    Create,
    Edit,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::List => "list",
            Action::Details => "details",
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The set of roles allowed to use the reference data screens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPolicy {
    allowed: BTreeSet<Role>,
}

impl AccessPolicy {
    pub fn new(allowed: impl IntoIterator<Item = Role>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }

    pub fn allowed(&self) -> impl Iterator<Item = Role> + '_ {
        self.allowed.iter().copied()
    }

    pub fn authorize(&self, caller: &Caller, kind: EntityKind, action: Action) -> Result<(), ActionError> {
        if caller.roles().any(|role| self.allowed.contains(&role)) {
            return Ok(());
        }

        tracing::warn!(
            user = caller.name().unwrap_or("anonymous"),
            kind = %kind,
            action = %action,
            "access denied"
        );
        Err(ActionError::Forbidden { kind, action })
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::new(Role::privileged().iter().copied())
    }
}
