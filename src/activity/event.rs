//! Estate activity events.
//!
//! Provides an activity trail for estate operations.

use serde::{Deserialize, Serialize};

/// Activity entry for estate operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// Unique identifier for this entry.
    pub id: String,
    /// The type of event.
    pub event: ActivityEvent,
    /// Estate ID this event relates to.
    pub estate_id: String,
    /// User ID who performed the action.
    pub actor_id: String,
    /// Target user ID (for collaborator events).
    pub target_id: Option<String>,
    /// Additional details about the event.
    pub details: Option<String>,
    /// Timestamp (Unix seconds).
    pub timestamp: u64,
}

/// Estate activity event types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityEvent {
    // Estate events
    /// Estate was created.
    EstateCreated,
    /// Estate details were updated.
    EstateUpdated,
    /// Estate was closed.
    EstateClosed,
    /// Estate was deleted.
    EstateDeleted,

    // Collaborator events
    /// A collaborator was added to the estate.
    CollaboratorAdded,
    /// A collaborator was removed from the estate.
    CollaboratorRemoved,
    /// A collaborator's role was changed.
    CollaboratorRoleChanged,

    // Invoice events
    /// An invoice was issued.
    InvoiceSent,
    /// A payment was recorded against an invoice.
    InvoicePaymentRecorded,
    /// An invoice was voided.
    InvoiceVoided,
}

impl std::fmt::Display for ActivityEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EstateCreated => write!(f, "estate_created"),
            Self::EstateUpdated => write!(f, "estate_updated"),
            Self::EstateClosed => write!(f, "estate_closed"),
            Self::EstateDeleted => write!(f, "estate_deleted"),
            Self::CollaboratorAdded => write!(f, "collaborator_added"),
            Self::CollaboratorRemoved => write!(f, "collaborator_removed"),
            Self::CollaboratorRoleChanged => write!(f, "collaborator_role_changed"),
            Self::InvoiceSent => write!(f, "invoice_sent"),
            Self::InvoicePaymentRecorded => write!(f, "invoice_payment_recorded"),
            Self::InvoiceVoided => write!(f, "invoice_voided"),
        }
    }
}

impl ActivityEntry {
    /// Create a new activity entry for the given event and estate.
    #[must_use]
    pub fn new(event: ActivityEvent, estate_id: impl Into<String>, actor_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event,
            estate_id: estate_id.into(),
            actor_id: actor_id.into(),
            target_id: None,
            details: None,
            timestamp: crate::utils::current_timestamp(),
        }
    }

    /// Set the target user ID.
    #[must_use]
    pub fn with_target(mut self, target_id: impl Into<String>) -> Self {
        self.target_id = Some(target_id.into());
        self
    }

    /// Set additional details.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}
