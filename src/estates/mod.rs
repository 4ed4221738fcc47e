//! Estates module for multi-tenant probate administration.
//!
//! An estate is the tenant-scoping unit: one owner, a collaborator list with
//! per-user roles, and everything else keyed by the estate ID. This module
//! provides:
//! - **Typed domain records** - Estates and collaborators with typed roles
//! - **Trait-based storage** - Implement [`EstateStore`] for your database layer
//! - **Optional billing integration** - Connect an [`EstateQuota`] for plan limits
//! - **Activity trail** - Fire-and-forget recording of estate operations
//!
//! # Example
//!
//! ```rust,ignore
//! use executry::estates::{EstateManager, EstateStore, UnlimitedQuota};
//! use executry::access::EstateRole;
//!
//! // Implement EstateStore for your database, then:
//! let manager = EstateManager::new(store, UnlimitedQuota);
//!
//! let estate = manager.create_estate("user_1", "Estate of J. Doe", None).await?;
//! manager
//!     .add_collaborator(&estate.id, "user_1", "clerk_2", EstateRole::Editor)
//!     .await?;
//! ```

pub mod error;
mod manager;
mod quota;
pub mod storage;
mod types;

// Error exports
pub use error::EstateError;

// Manager exports
pub use manager::EstateManager;

// Quota checker exports
pub use quota::{EstateQuota, UnlimitedQuota};

// Storage trait exports
pub use storage::EstateStore;

// Type exports
pub use types::{Collaborator, Estate, EstateStatus};

// Test exports
#[cfg(any(test, feature = "test-estates"))]
pub use storage::test::InMemoryEstateStore;
