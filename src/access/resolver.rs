//! Estate access resolution.
//!
//! Computes a caller's effective role and permission flags for an estate.
//! Resolution is pure: owner check first, then the collaborator list, then
//! no access. The store-backed [`AccessResolver`] adds the lookup and the
//! not-found masking policy for callers without access.

use crate::estates::error::{EstateError, Result};
use crate::estates::storage::EstateStore;
use crate::estates::Estate;
use super::role::EstateRole;
use serde::Serialize;
use tracing::{debug, instrument};

/// Outcome of resolving a caller's access to an estate.
///
/// `meets_role_requirement` is true when the caller has access and satisfies
/// the required minimum role; resolutions performed without a requirement
/// satisfy it trivially. Callers must still check `has_access`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[must_use = "access decision must be checked to enforce permissions"]
pub struct AccessDecision {
    /// The caller's effective role, if any.
    pub role: Option<EstateRole>,
    /// Whether the caller is the estate owner.
    pub is_owner: bool,
    /// Whether the caller may modify estate data.
    pub can_edit: bool,
    /// Whether the caller may view sensitive records (owner only).
    pub can_view_sensitive: bool,
    /// Whether the caller has any access at all.
    pub has_access: bool,
    /// Whether the caller satisfies the required minimum role.
    pub meets_role_requirement: bool,
}

impl AccessDecision {
    /// Decision for a caller with no access to the estate.
    pub fn no_access() -> Self {
        Self {
            role: None,
            is_owner: false,
            can_edit: false,
            can_view_sensitive: false,
            has_access: false,
            meets_role_requirement: false,
        }
    }

    /// Decision for a caller holding the given role.
    fn granted(role: EstateRole) -> Self {
        Self {
            role: Some(role),
            is_owner: matches!(role, EstateRole::Owner),
            can_edit: role.can_edit(),
            can_view_sensitive: role.can_view_sensitive(),
            has_access: true,
            meets_role_requirement: true,
        }
    }

    /// Apply a required minimum role to this decision.
    ///
    /// When the caller's role is below the requirement, `can_edit` is forced
    /// false regardless of the base role and the requirement flag is cleared.
    fn with_required_role(self, required: EstateRole) -> Self {
        match self.role {
            Some(role) if role.has_at_least(&required) => self,
            _ => Self {
                can_edit: false,
                meets_role_requirement: false,
                ..self
            },
        }
    }
}

/// Resolve a caller's access to an estate.
///
/// Resolution order: owner match, then collaborator list, then no access.
///
/// # Example
///
/// ```rust
/// use executry::access::{resolve_access, EstateRole};
/// use executry::estates::{Collaborator, Estate};
///
/// let mut estate = Estate::new("est_1", "u1", "Estate of J. Doe");
/// estate.collaborators.push(Collaborator::new("u2", EstateRole::Viewer));
///
/// let decision = resolve_access(&estate, "u1");
/// assert_eq!(decision.role, Some(EstateRole::Owner));
/// assert!(decision.can_edit);
///
/// let decision = resolve_access(&estate, "u2");
/// assert_eq!(decision.role, Some(EstateRole::Viewer));
/// assert!(!decision.can_edit);
/// ```
pub fn resolve_access(estate: &Estate, user_id: &str) -> AccessDecision {
    if estate.is_owned_by(user_id) {
        return AccessDecision::granted(EstateRole::Owner);
    }

    match estate.collaborator(user_id) {
        Some(collaborator) => AccessDecision::granted(collaborator.role),
        None => AccessDecision::no_access(),
    }
}

/// Resolve a caller's access with a required minimum role.
pub fn resolve_access_with_required(
    estate: &Estate,
    user_id: &str,
    required: EstateRole,
) -> AccessDecision {
    resolve_access(estate, user_id).with_required_role(required)
}

/// Store-backed access resolver.
///
/// Looks up the estate and resolves the caller's access. Missing estates and
/// no-access callers are both reported as not found by the `require_*`
/// methods, so callers cannot probe for estate existence.
pub struct AccessResolver<S: EstateStore> {
    store: S,
}

impl<S: EstateStore> AccessResolver<S> {
    /// Create a new resolver backed by the given store.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Get a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolve the caller's access to an estate.
    ///
    /// Returns the decision even when the caller has no access; use the
    /// `require_*` methods to enforce policy.
    #[instrument(skip(self))]
    pub async fn resolve(&self, estate_id: &str, user_id: &str) -> Result<AccessDecision> {
        let estate = self
            .store
            .get_estate(estate_id)
            .await?
            .ok_or_else(|| EstateError::not_found(estate_id))?;

        Ok(resolve_access(&estate, user_id))
    }

    /// Resolve with a required minimum role.
    #[instrument(skip(self))]
    pub async fn resolve_with_required(
        &self,
        estate_id: &str,
        user_id: &str,
        required: EstateRole,
    ) -> Result<AccessDecision> {
        let estate = self
            .store
            .get_estate(estate_id)
            .await?
            .ok_or_else(|| EstateError::not_found(estate_id))?;

        Ok(resolve_access_with_required(&estate, user_id, required))
    }

    /// Resolve and require any access at all.
    ///
    /// No-access callers receive the same not-found error as a missing estate.
    pub async fn require_access(&self, estate_id: &str, user_id: &str) -> Result<AccessDecision> {
        let decision = self.resolve(estate_id, user_id).await?;
        if !decision.has_access {
            debug!(estate_id, user_id, "Access denied, reporting not found");
            return Err(EstateError::not_found(estate_id));
        }
        Ok(decision)
    }

    /// Resolve and require a minimum role.
    ///
    /// Callers with access but an insufficient role get an insufficient-role
    /// error; callers with no access get not found.
    pub async fn require_role(
        &self,
        estate_id: &str,
        user_id: &str,
        required: EstateRole,
    ) -> Result<AccessDecision> {
        let decision = self.resolve_with_required(estate_id, user_id, required).await?;
        if !decision.has_access {
            debug!(estate_id, user_id, "Access denied, reporting not found");
            return Err(EstateError::not_found(estate_id));
        }
        if !decision.meets_role_requirement {
            return Err(EstateError::insufficient_role(required));
        }
        Ok(decision)
    }

    /// Resolve and require permission to view sensitive records.
    ///
    /// Sensitive resources are hidden rather than forbidden: collaborators
    /// without the permission get the same not-found error as outsiders.
    pub async fn require_sensitive(&self, estate_id: &str, user_id: &str) -> Result<AccessDecision> {
        let decision = self.resolve(estate_id, user_id).await?;
        if !decision.has_access || !decision.can_view_sensitive {
            debug!(estate_id, user_id, "Sensitive access denied, reporting not found");
            return Err(EstateError::not_found(estate_id));
        }
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estates::storage::test::InMemoryEstateStore;
    use crate::estates::Collaborator;

    fn estate_with_collaborators() -> Estate {
        let mut estate = Estate::new("est_1", "u1", "Estate of J. Doe");
        estate.collaborators.push(Collaborator::new("u2", EstateRole::Viewer));
        estate.collaborators.push(Collaborator::new("u3", EstateRole::Editor));
        estate
    }

    #[test]
    fn test_owner_resolves_to_owner() {
        let estate = estate_with_collaborators();
        let decision = resolve_access(&estate, "u1");

        assert_eq!(decision.role, Some(EstateRole::Owner));
        assert!(decision.is_owner);
        assert!(decision.can_edit);
        assert!(decision.can_view_sensitive);
        assert!(decision.has_access);
        assert!(decision.meets_role_requirement);
    }

    #[test]
    fn test_viewer_collaborator() {
        let estate = estate_with_collaborators();
        let decision = resolve_access(&estate, "u2");

        assert_eq!(decision.role, Some(EstateRole::Viewer));
        assert!(!decision.is_owner);
        assert!(!decision.can_edit);
        assert!(!decision.can_view_sensitive);
        assert!(decision.has_access);
    }

    #[test]
    fn test_editor_collaborator() {
        let estate = estate_with_collaborators();
        let decision = resolve_access(&estate, "u3");

        assert_eq!(decision.role, Some(EstateRole::Editor));
        assert!(decision.can_edit);
        assert!(!decision.can_view_sensitive);
    }

    #[test]
    fn test_outsider_has_no_access() {
        let estate = estate_with_collaborators();
        let decision = resolve_access(&estate, "u99");

        assert_eq!(decision, AccessDecision::no_access());
        assert!(!decision.has_access);
        assert!(decision.role.is_none());
    }

    #[test]
    fn test_owner_match_wins_over_collaborator_scan() {
        // An owner accidentally present in the collaborator list still
        // resolves as owner
        let mut estate = estate_with_collaborators();
        estate.collaborators.push(Collaborator::new("u1", EstateRole::Viewer));

        let decision = resolve_access(&estate, "u1");
        assert_eq!(decision.role, Some(EstateRole::Owner));
    }

    #[test]
    fn test_required_role_met() {
        let estate = estate_with_collaborators();
        let decision = resolve_access_with_required(&estate, "u3", EstateRole::Editor);

        assert!(decision.meets_role_requirement);
        assert!(decision.can_edit);
    }

    #[test]
    fn test_required_role_not_met_forces_can_edit_false() {
        let estate = estate_with_collaborators();
        // Editor asked for Owner: base role allows editing, requirement does not
        let decision = resolve_access_with_required(&estate, "u3", EstateRole::Owner);

        assert!(decision.has_access);
        assert_eq!(decision.role, Some(EstateRole::Editor));
        assert!(!decision.meets_role_requirement);
        assert!(!decision.can_edit);
    }

    #[test]
    fn test_required_role_for_outsider() {
        let estate = estate_with_collaborators();
        let decision = resolve_access_with_required(&estate, "u99", EstateRole::Viewer);

        assert!(!decision.has_access);
        assert!(!decision.meets_role_requirement);
    }

    #[tokio::test]
    async fn test_resolver_loads_estate() {
        let store = InMemoryEstateStore::new();
        store.insert_estate(&estate_with_collaborators()).await.unwrap();

        let resolver = AccessResolver::new(store);
        let decision = resolver.resolve("est_1", "u2").await.unwrap();
        assert_eq!(decision.role, Some(EstateRole::Viewer));
    }

    #[tokio::test]
    async fn test_resolver_missing_estate_is_not_found() {
        let resolver = AccessResolver::new(InMemoryEstateStore::new());
        let err = resolver.resolve("est_404", "u1").await.unwrap_err();
        assert!(matches!(err, EstateError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_require_access_masks_no_access_as_not_found() {
        let store = InMemoryEstateStore::new();
        store.insert_estate(&estate_with_collaborators()).await.unwrap();

        let resolver = AccessResolver::new(store);
        let err = resolver.require_access("est_1", "u99").await.unwrap_err();
        assert!(matches!(err, EstateError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_require_role_distinguishes_insufficient_from_missing() {
        let store = InMemoryEstateStore::new();
        store.insert_estate(&estate_with_collaborators()).await.unwrap();

        let resolver = AccessResolver::new(store);

        // Viewer asking for editor: forbidden, not hidden
        let err = resolver
            .require_role("est_1", "u2", EstateRole::Editor)
            .await
            .unwrap_err();
        assert!(matches!(err, EstateError::InsufficientRole { required: EstateRole::Editor }));

        // Outsider: hidden
        let err = resolver
            .require_role("est_1", "u99", EstateRole::Editor)
            .await
            .unwrap_err();
        assert!(matches!(err, EstateError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_require_sensitive_hides_from_collaborators() {
        let store = InMemoryEstateStore::new();
        store.insert_estate(&estate_with_collaborators()).await.unwrap();

        let resolver = AccessResolver::new(store);

        assert!(resolver.require_sensitive("est_1", "u1").await.is_ok());

        // Editor has access but not sensitive permission: masked as not found
        let err = resolver.require_sensitive("est_1", "u3").await.unwrap_err();
        assert!(matches!(err, EstateError::NotFound { .. }));
    }
}
