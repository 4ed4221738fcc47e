//! Estate error types.

use crate::access::EstateRole;
use thiserror::Error;

/// Errors that can occur during estate operations.
///
/// Missing estates and no-access callers both surface as [`NotFound`]:
/// callers without access must not learn whether an estate exists.
///
/// [`NotFound`]: EstateError::NotFound
#[derive(Debug, Error)]
pub enum EstateError {
    /// Estate not found (or the caller has no access to it).
    #[error("Estate not found: {estate_id}")]
    NotFound {
        /// The ID that was not found.
        estate_id: String,
    },

    /// Caller's role is below what the operation requires.
    #[error("Insufficient role: requires {required} or higher")]
    InsufficientRole {
        /// The minimum role the operation requires.
        required: EstateRole,
    },

    /// The OWNER role cannot be granted through the collaborator list.
    #[error("The OWNER role cannot be assigned to a collaborator")]
    OwnerRoleReserved,

    /// The estate owner cannot be added or removed as a collaborator.
    #[error("The estate owner cannot appear in the collaborator list")]
    OwnerIsNotCollaborator,

    /// User is already a collaborator on the estate.
    #[error("User is already a collaborator: {user_id}")]
    AlreadyCollaborator {
        /// The duplicate user ID.
        user_id: String,
    },

    /// User is not a collaborator on the estate.
    #[error("User is not a collaborator: {user_id}")]
    CollaboratorNotFound {
        /// The missing user ID.
        user_id: String,
    },

    /// Collaborator limit for the estate has been reached.
    #[error("Estate has reached its collaborator limit ({current}/{limit})")]
    CollaboratorLimitReached {
        /// Current collaborator count.
        current: u32,
        /// Maximum allowed collaborators.
        limit: u32,
    },

    /// The owner has reached their estate limit.
    #[error("Estate limit reached ({current}/{limit})")]
    EstateLimitReached {
        /// Current estate count.
        current: u32,
        /// Maximum allowed estates.
        limit: u32,
    },

    /// Malformed input.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(#[from] crate::error::ExecutryError),
}

impl EstateError {
    /// Create a not found error.
    pub fn not_found(estate_id: impl Into<String>) -> Self {
        Self::NotFound {
            estate_id: estate_id.into(),
        }
    }

    /// Create an insufficient role error.
    pub fn insufficient_role(required: EstateRole) -> Self {
        Self::InsufficientRole { required }
    }

    /// Create an already-collaborator error.
    pub fn already_collaborator(user_id: impl Into<String>) -> Self {
        Self::AlreadyCollaborator {
            user_id: user_id.into(),
        }
    }

    /// Create a collaborator-not-found error.
    pub fn collaborator_not_found(user_id: impl Into<String>) -> Self {
        Self::CollaboratorNotFound {
            user_id: user_id.into(),
        }
    }

    /// Create a collaborator limit error.
    pub fn collaborator_limit_reached(current: u32, limit: u32) -> Self {
        Self::CollaboratorLimitReached { current, limit }
    }

    /// Create an estate limit error.
    pub fn estate_limit_reached(current: u32, limit: u32) -> Self {
        Self::EstateLimitReached { current, limit }
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<EstateError> for crate::error::ExecutryError {
    fn from(err: EstateError) -> Self {
        use crate::error::ExecutryError;
        match err {
            EstateError::NotFound { .. } => ExecutryError::NotFound(err.to_string()),
            EstateError::InsufficientRole { .. }
            | EstateError::OwnerRoleReserved
            | EstateError::OwnerIsNotCollaborator => ExecutryError::Forbidden(err.to_string()),
            EstateError::AlreadyCollaborator { .. }
            | EstateError::CollaboratorNotFound { .. }
            | EstateError::Validation(_) => ExecutryError::BadRequest(err.to_string()),
            EstateError::CollaboratorLimitReached { .. } | EstateError::EstateLimitReached { .. } => {
                ExecutryError::PaymentRequired(err.to_string())
            }
            EstateError::Storage(inner) => inner,
        }
    }
}

/// Result type for estate operations.
pub type Result<T> = std::result::Result<T, EstateError>;
