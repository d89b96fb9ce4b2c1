use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Marketplace role of a user account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Buyer,
    Vendor,
}

impl UserRole {
    /// Role given to freshly created accounts.
    pub const DEFAULT: UserRole = UserRole::Buyer;

    /// Value stored in `user.user_type`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buyer => "buyer",
            Self::Vendor => "vendor",
        }
    }

    /// The role a user leaves when taking this one.
    pub fn counterpart(&self) -> UserRole {
        match self {
            Self::Buyer => Self::Vendor,
            Self::Vendor => Self::Buyer,
        }
    }

    /// Name of the permission group members of this role belong to.
    pub fn group_name(&self) -> &'static str {
        match self {
            Self::Buyer => "Buyers",
            Self::Vendor => "Vendors",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoleTransitionError {
    #[error("user already has the {0} role")]
    AlreadyInRole(UserRole),
    #[error("unknown user type '{0}'")]
    UnknownRole(String),
}

impl FromStr for UserRole {
    type Err = RoleTransitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buyer" => Ok(Self::Buyer),
            "vendor" => Ok(Self::Vendor),
            other => Err(RoleTransitionError::UnknownRole(other.to_string())),
        }
    }
}

/// Changes to apply when a user moves from one role to another.
///
/// Applying a transition means: set `user_type` to `to`, add the user to
/// `join_group` and remove them from `leave_group`. After it is applied the
/// user belongs to exactly the group of `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleTransition {
    pub from: UserRole,
    pub to: UserRole,
    pub join_group: &'static str,
    pub leave_group: &'static str,
}

/// Plan the move of a user currently in `current` to `new_role`.
///
/// Fails when the user already has `new_role`; registering a second store or
/// deleting a store twice must not silently reshuffle group membership.
pub fn switch_role(
    current: UserRole,
    new_role: UserRole,
) -> Result<RoleTransition, RoleTransitionError> {
    if current == new_role {
        return Err(RoleTransitionError::AlreadyInRole(new_role));
    }
    Ok(RoleTransition {
        from: current,
        to: new_role,
        join_group: new_role.group_name(),
        leave_group: current.group_name(),
    })
}

/// Plan a move to `new_role` that also succeeds when the user already has it.
///
/// A user whose stored type already says `new_role` gets a transition that
/// only repairs group membership: join the group of `new_role`, leave the
/// group of its counterpart.
pub fn ensure_role(current: UserRole, new_role: UserRole) -> RoleTransition {
    switch_role(current, new_role).unwrap_or(RoleTransition {
        from: current,
        to: new_role,
        join_group: new_role.group_name(),
        leave_group: new_role.counterpart().group_name(),
    })
}
