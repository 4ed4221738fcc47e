//! Storage trait for estate data.
//!
//! Implement this trait to persist estates to your database.
//! An in-memory implementation is provided for testing.

use super::types::{Collaborator, Estate};
use crate::access::EstateRole;
use crate::error::Result;
use async_trait::async_trait;

/// Trait for storing estates and their collaborator lists.
///
/// Collaborator mutations return `bool` so callers can distinguish a
/// successful write from a no-op (estate missing, or the membership
/// precondition not met). Duplicate adds must not create a second entry
/// for the same user.
#[async_trait]
pub trait EstateStore: Send + Sync {
    // Estate records

    /// Get an estate by ID.
    async fn get_estate(&self, estate_id: &str) -> Result<Option<Estate>>;

    /// Insert a new estate.
    async fn insert_estate(&self, estate: &Estate) -> Result<()>;

    /// Replace an existing estate record.
    async fn update_estate(&self, estate: &Estate) -> Result<()>;

    /// Delete an estate. Returns false if it did not exist.
    async fn delete_estate(&self, estate_id: &str) -> Result<bool>;

    /// Count estates owned by a user.
    async fn count_estates_for_owner(&self, owner_id: &str) -> Result<u32>;

    /// List estates the user owns or collaborates on.
    async fn list_estates_for_user(&self, user_id: &str) -> Result<Vec<Estate>>;

    // Collaborator list

    /// Add a collaborator to an estate.
    ///
    /// Returns false if the estate does not exist or the user is already
    /// a collaborator. Implementations must make the existence check and
    /// the insert a single atomic operation.
    async fn add_collaborator(&self, estate_id: &str, collaborator: &Collaborator) -> Result<bool>;

    /// Remove a collaborator. Returns false if the estate or entry is missing.
    async fn remove_collaborator(&self, estate_id: &str, user_id: &str) -> Result<bool>;

    /// Change a collaborator's role. Returns false if the estate or entry is missing.
    async fn set_collaborator_role(
        &self,
        estate_id: &str,
        user_id: &str,
        role: EstateRole,
    ) -> Result<bool>;
}

/// In-memory estate store for testing.
#[cfg(any(test, feature = "test-estates"))]
pub mod test {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, RwLock};

    /// In-memory estate store for testing.
    ///
    /// Wraps data in Arc for cheap cloning.
    #[derive(Default, Clone)]
    pub struct InMemoryEstateStore {
        inner: Arc<InMemoryEstateStoreInner>,
    }

    #[derive(Default)]
    struct InMemoryEstateStoreInner {
        estates: RwLock<HashMap<String, Estate>>,
    }

    impl InMemoryEstateStore {
        /// Create a new in-memory store.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Get all estates (for testing).
        pub fn get_all_estates(&self) -> HashMap<String, Estate> {
            self.inner.estates.read().unwrap().clone()
        }

        /// Seed estates for testing.
        pub fn seed_estates(&self, estates: Vec<Estate>) {
            let mut store = self.inner.estates.write().unwrap();
            for estate in estates {
                store.insert(estate.id.clone(), estate);
            }
        }
    }

    #[async_trait]
    impl EstateStore for InMemoryEstateStore {
        async fn get_estate(&self, estate_id: &str) -> Result<Option<Estate>> {
            Ok(self.inner.estates.read().unwrap().get(estate_id).cloned())
        }

        async fn insert_estate(&self, estate: &Estate) -> Result<()> {
            self.inner
                .estates
                .write()
                .unwrap()
                .insert(estate.id.clone(), estate.clone());
            Ok(())
        }

        async fn update_estate(&self, estate: &Estate) -> Result<()> {
            let mut estates = self.inner.estates.write().unwrap();
            if estates.contains_key(&estate.id) {
                estates.insert(estate.id.clone(), estate.clone());
            }
            Ok(())
        }

        async fn delete_estate(&self, estate_id: &str) -> Result<bool> {
            Ok(self.inner.estates.write().unwrap().remove(estate_id).is_some())
        }

        async fn count_estates_for_owner(&self, owner_id: &str) -> Result<u32> {
            let estates = self.inner.estates.read().unwrap();
            Ok(estates.values().filter(|e| e.owner_id == owner_id).count() as u32)
        }

        async fn list_estates_for_user(&self, user_id: &str) -> Result<Vec<Estate>> {
            let estates = self.inner.estates.read().unwrap();
            let mut found: Vec<Estate> = estates
                .values()
                .filter(|e| e.is_owned_by(user_id) || e.collaborator(user_id).is_some())
                .cloned()
                .collect();
            found.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(found)
        }

        async fn add_collaborator(
            &self,
            estate_id: &str,
            collaborator: &Collaborator,
        ) -> Result<bool> {
            let mut estates = self.inner.estates.write().unwrap();
            match estates.get_mut(estate_id) {
                Some(estate) => {
                    if estate.collaborator(&collaborator.user_id).is_some() {
                        return Ok(false);
                    }
                    estate.collaborators.push(collaborator.clone());
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn remove_collaborator(&self, estate_id: &str, user_id: &str) -> Result<bool> {
            let mut estates = self.inner.estates.write().unwrap();
            match estates.get_mut(estate_id) {
                Some(estate) => {
                    let before = estate.collaborators.len();
                    estate.collaborators.retain(|c| c.user_id != user_id);
                    Ok(estate.collaborators.len() < before)
                }
                None => Ok(false),
            }
        }

        async fn set_collaborator_role(
            &self,
            estate_id: &str,
            user_id: &str,
            role: EstateRole,
        ) -> Result<bool> {
            let mut estates = self.inner.estates.write().unwrap();
            match estates.get_mut(estate_id) {
                Some(estate) => {
                    match estate.collaborators.iter_mut().find(|c| c.user_id == user_id) {
                        Some(entry) => {
                            entry.role = role;
                            Ok(true)
                        }
                        None => Ok(false),
                    }
                }
                None => Ok(false),
            }
        }
    }

}
