//! Role-based estate access control.
//!
//! Every estate has one owner and any number of collaborators, each holding
//! a single [`EstateRole`]. [`resolve_access`] computes what a caller may do
//! with an estate; [`AccessResolver`] wraps that over an estate store and
//! enforces the not-found masking policy for callers without access.
//!
//! # Example
//!
//! ```rust
//! use executry::access::{resolve_access, EstateRole};
//! use executry::estates::{Collaborator, Estate};
//!
//! let mut estate = Estate::new("est_1", "owner_1", "Estate of A. Smith");
//! estate.collaborators.push(Collaborator::new("clerk_1", EstateRole::Editor));
//!
//! let decision = resolve_access(&estate, "clerk_1");
//! assert!(decision.can_edit);
//! assert!(!decision.can_view_sensitive);
//! ```

mod resolver;
mod role;

pub use resolver::{resolve_access, resolve_access_with_required, AccessDecision, AccessResolver};
pub use role::{EstateRole, ParseRoleError};
