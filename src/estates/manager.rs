//! Estate manager.
//!
//! Handles estate lifecycle and collaborator operations with permission
//! checks and quota validation.

use super::error::{EstateError, Result};
use super::quota::{EstateQuota, UnlimitedQuota};
use super::storage::EstateStore;
use super::types::{Collaborator, Estate, EstateStatus};
use crate::access::{resolve_access, resolve_access_with_required, EstateRole};
use crate::activity::{ActivityEntry, ActivityEvent, ActivityStore, OptionalActivityLog, WithActivityLog};
use crate::utils::current_timestamp;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Maximum accepted length for an estate name.
const MAX_NAME_LEN: usize = 200;

/// Estate manager - handles estate operations with permission checks.
///
/// # Example
///
/// ```rust,ignore
/// use executry::estates::{EstateManager, UnlimitedQuota};
///
/// let manager = EstateManager::new(estate_store, UnlimitedQuota);
///
/// let estate = manager.create_estate("user_123", "Estate of J. Doe", None).await?;
/// manager
///     .add_collaborator(&estate.id, "user_123", "clerk_456", EstateRole::Editor)
///     .await?;
/// ```
///
/// # Activity Logging
///
/// Enable the activity trail with `with_activity_log`:
///
/// ```rust,ignore
/// let manager = EstateManager::new(...)
///     .with_activity_log(my_activity_store);
/// ```
pub struct EstateManager<E, Q = UnlimitedQuota, A = ()>
where
    E: EstateStore,
    Q: EstateQuota,
    A: OptionalActivityLog,
{
    store: E,
    quota: Q,
    activity_log: A,
}

impl<E> EstateManager<E, UnlimitedQuota, ()>
where
    E: EstateStore,
{
    /// Create a manager without quota checking.
    #[must_use]
    pub fn new_without_quota(store: E) -> Self {
        Self {
            store,
            quota: UnlimitedQuota,
            activity_log: (),
        }
    }
}

impl<E, Q> EstateManager<E, Q, ()>
where
    E: EstateStore,
    Q: EstateQuota,
{
    /// Create a new estate manager.
    #[must_use]
    pub fn new(store: E, quota: Q) -> Self {
        Self {
            store,
            quota,
            activity_log: (),
        }
    }

    /// Enable activity logging with the given store.
    pub fn with_activity_log<Log: ActivityStore + Clone + 'static>(
        self,
        activity_store: Log,
    ) -> EstateManager<E, Q, WithActivityLog<Log>> {
        EstateManager {
            store: self.store,
            quota: self.quota,
            activity_log: WithActivityLog(activity_store),
        }
    }
}

impl<E, Q, A> EstateManager<E, Q, A>
where
    E: EstateStore,
    Q: EstateQuota,
    A: OptionalActivityLog,
{
    /// Get a reference to the estate store.
    pub fn store(&self) -> &E {
        &self.store
    }

    /// Get a reference to the quota checker.
    pub fn quota(&self) -> &Q {
        &self.quota
    }

    /// Create a new estate owned by the caller (checks the estate quota).
    #[instrument(skip(self), fields(estate.name = %name))]
    pub async fn create_estate(
        &self,
        owner_id: &str,
        name: &str,
        case_number: Option<&str>,
    ) -> Result<Estate> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EstateError::validation("estate name cannot be empty"));
        }
        if name.len() > MAX_NAME_LEN {
            return Err(EstateError::validation(format!(
                "estate name cannot exceed {MAX_NAME_LEN} characters"
            )));
        }

        // Check estate quota
        let current = self.store.count_estates_for_owner(owner_id).await?;
        if !self.quota.can_create_estate(owner_id, current).await? {
            let limit = self.quota.estate_limit(owner_id).await?.unwrap_or(current);
            debug!(owner_id, current, limit, "Estate quota reached");
            return Err(EstateError::estate_limit_reached(current, limit));
        }

        let mut estate = Estate::new(Uuid::new_v4().to_string(), owner_id, name);
        if let Some(case_number) = case_number {
            estate = estate.with_case_number(case_number);
        }

        self.store.insert_estate(&estate).await?;

        info!(estate_id = %estate.id, owner_id, "Estate created");

        self.activity_log
            .record(
                ActivityEntry::new(ActivityEvent::EstateCreated, &estate.id, owner_id)
                    .with_details(format!("name={name}")),
            )
            .await;

        Ok(estate)
    }

    /// Get an estate by ID.
    #[instrument(skip(self))]
    pub async fn get(&self, estate_id: &str) -> Result<Option<Estate>> {
        self.store.get_estate(estate_id).await.map_err(Into::into)
    }

    /// List estates the user owns or collaborates on.
    #[instrument(skip(self))]
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Estate>> {
        self.store.list_estates_for_user(user_id).await.map_err(Into::into)
    }

    /// Update estate details (requires the EDITOR role).
    ///
    /// The updater receives the current estate and returns the modified one.
    /// Identity and membership fields may not change through this path.
    #[instrument(skip(self, updater))]
    pub async fn update_estate<F>(&self, estate_id: &str, actor_id: &str, updater: F) -> Result<Estate>
    where
        F: FnOnce(Estate) -> Estate,
    {
        let current = self.load_for_role(estate_id, actor_id, EstateRole::Editor).await?;

        let mut updated = updater(current.clone());
        if updated.id != current.id || updated.owner_id != current.owner_id {
            return Err(EstateError::validation(
                "estate identity fields cannot be changed",
            ));
        }
        if updated.collaborators != current.collaborators {
            return Err(EstateError::validation(
                "collaborators must be managed through collaborator operations",
            ));
        }
        let name = updated.name.trim().to_string();
        if name.is_empty() {
            return Err(EstateError::validation("estate name cannot be empty"));
        }
        updated.name = name;
        updated.updated_at = current_timestamp();

        self.store.update_estate(&updated).await?;

        info!(estate_id, actor_id, "Estate updated");

        self.activity_log
            .record(ActivityEntry::new(ActivityEvent::EstateUpdated, estate_id, actor_id))
            .await;

        Ok(updated)
    }

    /// Close an estate (owner only).
    #[instrument(skip(self))]
    pub async fn close_estate(&self, estate_id: &str, actor_id: &str) -> Result<Estate> {
        let mut estate = self.load_for_role(estate_id, actor_id, EstateRole::Owner).await?;

        estate.status = EstateStatus::Closed;
        estate.updated_at = current_timestamp();
        self.store.update_estate(&estate).await?;

        info!(estate_id, actor_id, "Estate closed");

        self.activity_log
            .record(ActivityEntry::new(ActivityEvent::EstateClosed, estate_id, actor_id))
            .await;

        Ok(estate)
    }

    /// Delete an estate and its collaborator list (owner only).
    #[instrument(skip(self))]
    pub async fn delete_estate(&self, estate_id: &str, actor_id: &str) -> Result<()> {
        self.load_for_role(estate_id, actor_id, EstateRole::Owner).await?;

        if !self.store.delete_estate(estate_id).await? {
            return Err(EstateError::not_found(estate_id));
        }

        info!(estate_id, actor_id, "Estate deleted");

        self.activity_log
            .record(ActivityEntry::new(ActivityEvent::EstateDeleted, estate_id, actor_id))
            .await;

        Ok(())
    }

    /// Add a collaborator to an estate (owner only, checks the collaborator quota).
    ///
    /// The OWNER role cannot be granted here and the estate owner cannot be
    /// added to their own collaborator list.
    #[instrument(skip(self))]
    pub async fn add_collaborator(
        &self,
        estate_id: &str,
        actor_id: &str,
        user_id: &str,
        role: EstateRole,
    ) -> Result<Collaborator> {
        let estate = self.load_for_role(estate_id, actor_id, EstateRole::Owner).await?;

        if role == EstateRole::Owner {
            return Err(EstateError::OwnerRoleReserved);
        }
        if estate.is_owned_by(user_id) {
            return Err(EstateError::OwnerIsNotCollaborator);
        }
        if estate.collaborator(user_id).is_some() {
            return Err(EstateError::already_collaborator(user_id));
        }

        // Check collaborator quota against the owner's plan
        let current = estate.collaborator_count();
        if !self.quota.can_add_collaborator(&estate.owner_id, current).await? {
            let limit = self
                .quota
                .collaborator_limit(&estate.owner_id)
                .await?
                .unwrap_or(current);
            debug!(estate_id, current, limit, "Collaborator quota reached");
            return Err(EstateError::collaborator_limit_reached(current, limit));
        }

        let collaborator = Collaborator::new(user_id, role);

        // The store add is atomic; false means a concurrent writer got there first
        if !self.store.add_collaborator(estate_id, &collaborator).await? {
            return Err(EstateError::already_collaborator(user_id));
        }

        info!(estate_id, user_id, actor_id, role = %role, "Collaborator added");

        self.activity_log
            .record(
                ActivityEntry::new(ActivityEvent::CollaboratorAdded, estate_id, actor_id)
                    .with_target(user_id)
                    .with_details(format!("role={role}")),
            )
            .await;

        Ok(collaborator)
    }

    /// Remove a collaborator from an estate (owner only).
    #[instrument(skip(self))]
    pub async fn remove_collaborator(
        &self,
        estate_id: &str,
        actor_id: &str,
        user_id: &str,
    ) -> Result<()> {
        let estate = self.load_for_role(estate_id, actor_id, EstateRole::Owner).await?;

        if estate.is_owned_by(user_id) {
            return Err(EstateError::OwnerIsNotCollaborator);
        }

        if !self.store.remove_collaborator(estate_id, user_id).await? {
            return Err(EstateError::collaborator_not_found(user_id));
        }

        info!(estate_id, user_id, actor_id, "Collaborator removed");

        self.activity_log
            .record(
                ActivityEntry::new(ActivityEvent::CollaboratorRemoved, estate_id, actor_id)
                    .with_target(user_id),
            )
            .await;

        Ok(())
    }

    /// Change a collaborator's role (owner only).
    ///
    /// The OWNER role cannot be granted this way.
    #[instrument(skip(self))]
    pub async fn change_collaborator_role(
        &self,
        estate_id: &str,
        actor_id: &str,
        user_id: &str,
        role: EstateRole,
    ) -> Result<()> {
        self.load_for_role(estate_id, actor_id, EstateRole::Owner).await?;

        if role == EstateRole::Owner {
            return Err(EstateError::OwnerRoleReserved);
        }

        if !self.store.set_collaborator_role(estate_id, user_id, role).await? {
            return Err(EstateError::collaborator_not_found(user_id));
        }

        info!(estate_id, user_id, actor_id, role = %role, "Collaborator role changed");

        self.activity_log
            .record(
                ActivityEntry::new(ActivityEvent::CollaboratorRoleChanged, estate_id, actor_id)
                    .with_target(user_id)
                    .with_details(format!("role={role}")),
            )
            .await;

        Ok(())
    }

    /// Load an estate and require the actor to hold at least the given role.
    ///
    /// Missing estates and no-access actors get the same not-found error.
    async fn load_for_role(
        &self,
        estate_id: &str,
        actor_id: &str,
        required: EstateRole,
    ) -> Result<Estate> {
        let estate = self
            .store
            .get_estate(estate_id)
            .await?
            .ok_or_else(|| EstateError::not_found(estate_id))?;

        let decision = resolve_access_with_required(&estate, actor_id, required);
        if !decision.has_access {
            debug!(estate_id, actor_id, "Access denied, reporting not found");
            return Err(EstateError::not_found(estate_id));
        }
        if !decision.meets_role_requirement {
            return Err(EstateError::insufficient_role(required));
        }

        Ok(estate)
    }

    /// Resolve the actor's access to an estate without enforcing a role.
    #[instrument(skip(self))]
    pub async fn resolve_access(
        &self,
        estate_id: &str,
        user_id: &str,
    ) -> Result<crate::access::AccessDecision> {
        let estate = self
            .store
            .get_estate(estate_id)
            .await?
            .ok_or_else(|| EstateError::not_found(estate_id))?;
        Ok(resolve_access(&estate, user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::InMemoryActivityStore;
    use crate::estates::storage::test::InMemoryEstateStore;
    use async_trait::async_trait;

    struct FixedQuota {
        estates: u32,
        collaborators: u32,
    }

    #[async_trait]
    impl EstateQuota for FixedQuota {
        async fn can_create_estate(&self, _owner_id: &str, current: u32) -> crate::error::Result<bool> {
            Ok(current < self.estates)
        }

        async fn estate_limit(&self, _owner_id: &str) -> crate::error::Result<Option<u32>> {
            Ok(Some(self.estates))
        }

        async fn can_add_collaborator(
            &self,
            _owner_id: &str,
            current: u32,
        ) -> crate::error::Result<bool> {
            Ok(current < self.collaborators)
        }

        async fn collaborator_limit(&self, _owner_id: &str) -> crate::error::Result<Option<u32>> {
            Ok(Some(self.collaborators))
        }
    }

    fn manager() -> EstateManager<InMemoryEstateStore> {
        EstateManager::new_without_quota(InMemoryEstateStore::new())
    }

    #[tokio::test]
    async fn test_create_estate() {
        let manager = manager();
        let estate = manager
            .create_estate("u1", "Estate of J. Doe", Some("PR-2024-001"))
            .await
            .unwrap();

        assert_eq!(estate.owner_id, "u1");
        assert_eq!(estate.case_number.as_deref(), Some("PR-2024-001"));
        assert_eq!(estate.status, EstateStatus::Active);
        assert!(estate.collaborators.is_empty());

        let loaded = manager.get(&estate.id).await.unwrap().unwrap();
        assert_eq!(loaded, estate);
    }

    #[tokio::test]
    async fn test_create_estate_rejects_blank_name() {
        let manager = manager();
        let err = manager.create_estate("u1", "   ", None).await.unwrap_err();
        assert!(matches!(err, EstateError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_estate_enforces_quota() {
        let manager = EstateManager::new(
            InMemoryEstateStore::new(),
            FixedQuota { estates: 1, collaborators: 10 },
        );

        manager.create_estate("u1", "Estate of J. Doe", None).await.unwrap();
        let err = manager
            .create_estate("u1", "Estate of A. Smith", None)
            .await
            .unwrap_err();
        assert!(matches!(err, EstateError::EstateLimitReached { current: 1, limit: 1 }));

        // Another owner is unaffected
        manager.create_estate("u2", "Estate of B. Jones", None).await.unwrap();
    }

    #[tokio::test]
    async fn test_add_collaborator() {
        let manager = manager();
        let estate = manager.create_estate("u1", "Estate of J. Doe", None).await.unwrap();

        let collaborator = manager
            .add_collaborator(&estate.id, "u1", "u2", EstateRole::Editor)
            .await
            .unwrap();
        assert_eq!(collaborator.user_id, "u2");
        assert_eq!(collaborator.role, EstateRole::Editor);

        let loaded = manager.get(&estate.id).await.unwrap().unwrap();
        assert_eq!(loaded.collaborator_count(), 1);
    }

    #[tokio::test]
    async fn test_add_collaborator_requires_owner() {
        let manager = manager();
        let estate = manager.create_estate("u1", "Estate of J. Doe", None).await.unwrap();
        manager
            .add_collaborator(&estate.id, "u1", "u2", EstateRole::Editor)
            .await
            .unwrap();

        // An editor cannot manage collaborators
        let err = manager
            .add_collaborator(&estate.id, "u2", "u3", EstateRole::Viewer)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EstateError::InsufficientRole { required: EstateRole::Owner }
        ));

        // An outsider learns nothing
        let err = manager
            .add_collaborator(&estate.id, "u99", "u3", EstateRole::Viewer)
            .await
            .unwrap_err();
        assert!(matches!(err, EstateError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_add_collaborator_rejects_owner_role() {
        let manager = manager();
        let estate = manager.create_estate("u1", "Estate of J. Doe", None).await.unwrap();

        let err = manager
            .add_collaborator(&estate.id, "u1", "u2", EstateRole::Owner)
            .await
            .unwrap_err();
        assert!(matches!(err, EstateError::OwnerRoleReserved));
    }

    #[tokio::test]
    async fn test_add_collaborator_rejects_the_owner() {
        let manager = manager();
        let estate = manager.create_estate("u1", "Estate of J. Doe", None).await.unwrap();

        let err = manager
            .add_collaborator(&estate.id, "u1", "u1", EstateRole::Viewer)
            .await
            .unwrap_err();
        assert!(matches!(err, EstateError::OwnerIsNotCollaborator));
    }

    #[tokio::test]
    async fn test_add_collaborator_rejects_duplicates() {
        let manager = manager();
        let estate = manager.create_estate("u1", "Estate of J. Doe", None).await.unwrap();
        manager
            .add_collaborator(&estate.id, "u1", "u2", EstateRole::Viewer)
            .await
            .unwrap();

        let err = manager
            .add_collaborator(&estate.id, "u1", "u2", EstateRole::Editor)
            .await
            .unwrap_err();
        assert!(matches!(err, EstateError::AlreadyCollaborator { .. }));
    }

    #[tokio::test]
    async fn test_add_collaborator_enforces_quota() {
        let manager = EstateManager::new(
            InMemoryEstateStore::new(),
            FixedQuota { estates: 10, collaborators: 1 },
        );
        let estate = manager.create_estate("u1", "Estate of J. Doe", None).await.unwrap();

        manager
            .add_collaborator(&estate.id, "u1", "u2", EstateRole::Viewer)
            .await
            .unwrap();
        let err = manager
            .add_collaborator(&estate.id, "u1", "u3", EstateRole::Viewer)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EstateError::CollaboratorLimitReached { current: 1, limit: 1 }
        ));
    }

    #[tokio::test]
    async fn test_remove_collaborator() {
        let manager = manager();
        let estate = manager.create_estate("u1", "Estate of J. Doe", None).await.unwrap();
        manager
            .add_collaborator(&estate.id, "u1", "u2", EstateRole::Viewer)
            .await
            .unwrap();

        manager.remove_collaborator(&estate.id, "u1", "u2").await.unwrap();

        let err = manager
            .remove_collaborator(&estate.id, "u1", "u2")
            .await
            .unwrap_err();
        assert!(matches!(err, EstateError::CollaboratorNotFound { .. }));
    }

    #[tokio::test]
    async fn test_change_collaborator_role() {
        let manager = manager();
        let estate = manager.create_estate("u1", "Estate of J. Doe", None).await.unwrap();
        manager
            .add_collaborator(&estate.id, "u1", "u2", EstateRole::Viewer)
            .await
            .unwrap();

        manager
            .change_collaborator_role(&estate.id, "u1", "u2", EstateRole::Editor)
            .await
            .unwrap();

        let loaded = manager.get(&estate.id).await.unwrap().unwrap();
        assert_eq!(loaded.collaborator("u2").unwrap().role, EstateRole::Editor);

        let err = manager
            .change_collaborator_role(&estate.id, "u1", "u2", EstateRole::Owner)
            .await
            .unwrap_err();
        assert!(matches!(err, EstateError::OwnerRoleReserved));
    }

    #[tokio::test]
    async fn test_update_estate_requires_editor() {
        let manager = manager();
        let estate = manager.create_estate("u1", "Estate of J. Doe", None).await.unwrap();
        manager
            .add_collaborator(&estate.id, "u1", "u2", EstateRole::Viewer)
            .await
            .unwrap();

        let err = manager
            .update_estate(&estate.id, "u2", |e| e)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EstateError::InsufficientRole { required: EstateRole::Editor }
        ));
    }

    #[tokio::test]
    async fn test_update_estate_rejects_identity_changes() {
        let manager = manager();
        let estate = manager.create_estate("u1", "Estate of J. Doe", None).await.unwrap();

        let err = manager
            .update_estate(&estate.id, "u1", |mut e| {
                e.owner_id = "u99".to_string();
                e
            })
            .await
            .unwrap_err();
        assert!(matches!(err, EstateError::Validation(_)));
    }

    #[tokio::test]
    async fn test_close_and_delete_are_owner_only() {
        let manager = manager();
        let estate = manager.create_estate("u1", "Estate of J. Doe", None).await.unwrap();
        manager
            .add_collaborator(&estate.id, "u1", "u2", EstateRole::Editor)
            .await
            .unwrap();

        let err = manager.close_estate(&estate.id, "u2").await.unwrap_err();
        assert!(matches!(
            err,
            EstateError::InsufficientRole { required: EstateRole::Owner }
        ));

        let closed = manager.close_estate(&estate.id, "u1").await.unwrap();
        assert_eq!(closed.status, EstateStatus::Closed);

        manager.delete_estate(&estate.id, "u1").await.unwrap();
        assert!(manager.get(&estate.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_activity_trail_records_operations() {
        let activity = InMemoryActivityStore::new();
        let manager = EstateManager::new(InMemoryEstateStore::new(), UnlimitedQuota)
            .with_activity_log(activity.clone());

        let estate = manager.create_estate("u1", "Estate of J. Doe", None).await.unwrap();
        manager
            .add_collaborator(&estate.id, "u1", "u2", EstateRole::Editor)
            .await
            .unwrap();
        manager.remove_collaborator(&estate.id, "u1", "u2").await.unwrap();

        let events: Vec<ActivityEvent> = activity
            .get_all_entries()
            .into_iter()
            .map(|e| e.event)
            .collect();
        assert_eq!(
            events,
            vec![
                ActivityEvent::EstateCreated,
                ActivityEvent::CollaboratorAdded,
                ActivityEvent::CollaboratorRemoved,
            ]
        );
    }
}
