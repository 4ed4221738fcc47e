//! Estate domain types.
//!
//! An estate is a single probate case and the top-level tenant-scoping unit.
//! Collaborators are embedded in the estate record and share its lifecycle.

use crate::access::EstateRole;
use crate::utils::current_timestamp;
use serde::{Deserialize, Deserializer, Serialize};

/// A probate case under administration.
///
/// Invariant: exactly one owner per estate. The owner is identified by
/// `owner_id` and never appears in the collaborator list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Estate {
    /// Unique estate identifier.
    pub id: String,
    /// User ID of the estate owner.
    pub owner_id: String,
    /// Display name (typically the deceased's name).
    pub name: String,
    /// Court case number, if assigned.
    pub case_number: Option<String>,
    /// Administration status.
    #[serde(default)]
    pub status: EstateStatus,
    /// Users with access to this estate besides the owner.
    #[serde(default)]
    pub collaborators: Vec<Collaborator>,
    /// When the estate was created (Unix seconds).
    pub created_at: u64,
    /// When the estate was last modified (Unix seconds).
    pub updated_at: u64,
}

impl Estate {
    /// Create a new active estate with no collaborators.
    #[must_use]
    pub fn new(id: impl Into<String>, owner_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = current_timestamp();
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            name: name.into(),
            case_number: None,
            status: EstateStatus::Active,
            collaborators: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the court case number.
    #[must_use]
    pub fn with_case_number(mut self, case_number: impl Into<String>) -> Self {
        self.case_number = Some(case_number.into());
        self
    }

    /// Check whether the given user is the estate owner.
    #[must_use]
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }

    /// Find the collaborator entry for a user, if any.
    #[must_use]
    pub fn collaborator(&self, user_id: &str) -> Option<&Collaborator> {
        self.collaborators.iter().find(|c| c.user_id == user_id)
    }

    /// Number of collaborators (excluding the owner).
    #[must_use]
    pub fn collaborator_count(&self) -> u32 {
        self.collaborators.len() as u32
    }
}

/// A user granted access to an estate.
///
/// Not independently addressable; embedded in the parent [`Estate`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Collaborator {
    /// The collaborating user's ID.
    pub user_id: String,
    /// Granted role. Stored values outside the known set hydrate as `Viewer`.
    #[serde(deserialize_with = "role_or_viewer")]
    pub role: EstateRole,
    /// When the collaborator was added (Unix seconds).
    pub added_at: u64,
}

impl Collaborator {
    /// Create a collaborator entry added now.
    #[must_use]
    pub fn new(user_id: impl Into<String>, role: EstateRole) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            added_at: current_timestamp(),
        }
    }
}

/// Lenient role deserialization for estate documents.
///
/// Documents written by earlier versions of the system may carry role strings
/// outside the known set; those hydrate as the least-privileged role instead
/// of failing the whole estate read.
fn role_or_viewer<'de, D>(deserializer: D) -> Result<EstateRole, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(EstateRole::from_stored(&raw))
}

/// Administration status of an estate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstateStatus {
    /// Under active administration.
    #[default]
    Active,
    /// Administration complete.
    Closed,
    /// Retained for records only.
    Archived,
}

impl EstateStatus {
    /// Get the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Closed => "closed",
            Self::Archived => "archived",
        }
    }
}

impl std::fmt::Display for EstateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
