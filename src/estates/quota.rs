//! Estate and collaborator quota checking.
//!
//! This module provides abstractions for checking plan quotas,
//! decoupling estate management from billing details.

use crate::error::Result;
use async_trait::async_trait;

/// Abstraction for estate quota checking.
///
/// Quotas are keyed on the estate owner: the owner's plan governs how many
/// estates they may hold and how many collaborators each estate may carry.
/// Implement this to connect with your billing system's plan limits.
///
/// # Example
///
/// ```rust,ignore
/// use executry::estates::EstateQuota;
/// use async_trait::async_trait;
///
/// struct MyQuota {
///     billing: BillingService,
/// }
///
/// #[async_trait]
/// impl EstateQuota for MyQuota {
///     async fn can_create_estate(&self, owner_id: &str, current_count: u32) -> Result<bool> {
///         let limit = self.billing.estate_limit(owner_id).await?;
///         Ok(limit.is_none_or(|l| current_count < l))
///     }
///
///     async fn estate_limit(&self, owner_id: &str) -> Result<Option<u32>> {
///         self.billing.estate_limit(owner_id).await
///     }
///
///     // ...
/// }
/// ```
#[async_trait]
pub trait EstateQuota: Send + Sync {
    /// Check if the owner has room for another estate.
    ///
    /// Returns `true` if another estate can be created, `false` if the
    /// plan limit is reached.
    async fn can_create_estate(&self, owner_id: &str, current_count: u32) -> Result<bool>;

    /// Get the owner's estate limit.
    ///
    /// Returns `None` if there is no limit.
    async fn estate_limit(&self, owner_id: &str) -> Result<Option<u32>>;

    /// Check if an estate owned by `owner_id` has room for another collaborator.
    async fn can_add_collaborator(&self, owner_id: &str, current_count: u32) -> Result<bool>;

    /// Get the owner's per-estate collaborator limit.
    ///
    /// Returns `None` if there is no limit.
    async fn collaborator_limit(&self, owner_id: &str) -> Result<Option<u32>>;
}

/// No-op implementation for applications without billing.
///
/// All quota checks pass.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnlimitedQuota;

impl UnlimitedQuota {
    /// Create a new unlimited quota checker.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EstateQuota for UnlimitedQuota {
    async fn can_create_estate(&self, _owner_id: &str, _current_count: u32) -> Result<bool> {
        Ok(true)
    }

    async fn estate_limit(&self, _owner_id: &str) -> Result<Option<u32>> {
        Ok(None)
    }

    async fn can_add_collaborator(&self, _owner_id: &str, _current_count: u32) -> Result<bool> {
        Ok(true)
    }

    async fn collaborator_limit(&self, _owner_id: &str) -> Result<Option<u32>> {
        Ok(None)
    }
}
