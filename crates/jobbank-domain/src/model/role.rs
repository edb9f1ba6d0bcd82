//! Role - What a signed-in user is allowed to do
//!
//! Role is a Value Object - two roles with the same variant are equal.

/// The roles known to the job bank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    /// Full administrative access
    Admin,

    /// Manages applicants and the reference data they use
    Supervisor,

    /// Day-to-day staff; read access to applicants only
    Staff,
}

impl Role {
    /// Get the display name of this role
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Supervisor => "Supervisor",
            Role::Staff => "Staff",
        }
    }

    /// Parse a role name, ignoring case and surrounding whitespace
    pub fn parse(name: &str) -> Option<Role> {
        let name = name.trim();
        Role::all()
            .iter()
            .copied()
            .find(|role| role.display_name().eq_ignore_ascii_case(name))
    }

    /// Roles allowed to maintain reference data
    pub fn privileged() -> &'static [Role] {
        &[Role::Admin, Role::Supervisor]
    }

    /// Get all roles (useful for iteration)
    pub fn all() -> &'static [Role] {
        &[Role::Admin, Role::Supervisor, Role::Staff]
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
