//! Estate role hierarchy.
//!
//! Roles are stored on estate records as uppercase strings and ranked for
//! permission comparison: OWNER > EDITOR > VIEWER.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role a user holds on an estate.
///
/// `Owner` is reserved for the estate's actual owner and must never be
/// assigned through the collaborator list; the managers enforce this.
///
/// # Example
///
/// ```rust
/// use executry::access::EstateRole;
///
/// let role = EstateRole::Editor;
/// assert!(role.can_edit());
/// assert!(!role.can_view_sensitive());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EstateRole {
    /// Estate owner with full permissions.
    Owner,
    /// Collaborator who can modify estate data.
    Editor,
    /// Read-only collaborator.
    #[default]
    Viewer,
}

impl EstateRole {
    /// Get the string representation of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "OWNER",
            Self::Editor => "EDITOR",
            Self::Viewer => "VIEWER",
        }
    }

    /// Get the role rank (higher = more permissions).
    #[must_use]
    pub fn rank(&self) -> u8 {
        match self {
            Self::Owner => 3,
            Self::Editor => 2,
            Self::Viewer => 1,
        }
    }

    /// Check if this role has at least the permissions of another role.
    #[must_use]
    pub fn has_at_least(&self, other: &Self) -> bool {
        self.rank() >= other.rank()
    }

    /// Check if this role permits modifying estate data.
    #[must_use]
    pub fn can_edit(&self) -> bool {
        self.has_at_least(&Self::Editor)
    }

    /// Check if this role permits viewing sensitive records.
    ///
    /// Only the owner may view sensitive records; this is a conservative
    /// default rather than a rank comparison.
    #[must_use]
    pub fn can_view_sensitive(&self) -> bool {
        matches!(self, Self::Owner)
    }

    /// Normalize a stored role string into a role.
    ///
    /// Estate documents written by earlier versions of the system may carry
    /// role values outside the known set. Those are treated as `Viewer`, the
    /// least-privileged role.
    #[must_use]
    pub fn from_stored(value: &str) -> Self {
        value.parse().unwrap_or_else(|_| {
            tracing::warn!(stored_role = %value, "unknown stored role, treating as viewer");
            Self::Viewer
        })
    }
}

/// Error returned when parsing a role string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRoleError {
    invalid_value: String,
}

impl fmt::Display for ParseRoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid role: '{}' (expected: OWNER, EDITOR, or VIEWER)", self.invalid_value)
    }
}

impl std::error::Error for ParseRoleError {}

impl FromStr for EstateRole {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "OWNER" => Ok(Self::Owner),
            "EDITOR" => Ok(Self::Editor),
            "VIEWER" => Ok(Self::Viewer),
            _ => Err(ParseRoleError {
                invalid_value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for EstateRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
