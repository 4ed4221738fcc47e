//! Estate invoices and their status lifecycle.
//!
//! Invoices issued during estate administration move through a fixed
//! lifecycle: `Draft -> Sent -> (Partial) -> Paid | Void`. Transitions are
//! validated; an invalid transition is a typed error, never a silent write.

use crate::utils::current_timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invoice status.
///
/// `Partial` is entered when recorded payments cover part of the amount
/// due. `Paid` and `Void` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Invoice is a draft and can be edited.
    Draft,
    /// Invoice has been issued and awaits payment.
    Sent,
    /// Payments cover part of the amount due.
    Partial,
    /// Invoice is fully paid.
    Paid,
    /// Invoice was voided.
    Void,
}

impl InvoiceStatus {
    /// Convert to the string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Partial => "partial",
            Self::Paid => "paid",
            Self::Void => "void",
        }
    }

    /// Check whether a transition to `next` is allowed.
    ///
    /// `Partial -> Partial` is allowed so that successive partial payments
    /// validate cleanly.
    #[must_use]
    pub fn can_transition_to(&self, next: InvoiceStatus) -> bool {
        match self {
            Self::Draft => matches!(next, Self::Sent),
            Self::Sent => matches!(next, Self::Partial | Self::Paid | Self::Void),
            Self::Partial => matches!(next, Self::Partial | Self::Paid | Self::Void),
            Self::Paid | Self::Void => false,
        }
    }

    /// Check whether this status is terminal.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid | Self::Void)
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = InvoiceStatusParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "sent" => Ok(Self::Sent),
            "partial" => Ok(Self::Partial),
            "paid" => Ok(Self::Paid),
            "void" => Ok(Self::Void),
            _ => Err(InvoiceStatusParseError(s.to_string())),
        }
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an invalid invoice status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceStatusParseError(pub String);

impl std::fmt::Display for InvoiceStatusParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid invoice status: '{}'", self.0)
    }
}

impl std::error::Error for InvoiceStatusParseError {}

/// Invoice lifecycle errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvoiceError {
    /// The requested status change is not allowed from the current status.
    #[error("invalid invoice transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status.
        from: InvoiceStatus,
        /// Requested status.
        to: InvoiceStatus,
    },

    /// A payment amount was rejected.
    #[error("invalid payment amount: {0}")]
    InvalidAmount(String),
}

impl From<InvoiceError> for crate::error::ExecutryError {
    fn from(err: InvoiceError) -> Self {
        match err {
            InvoiceError::InvalidTransition { .. } | InvoiceError::InvalidAmount(_) => {
                Self::BadRequest(err.to_string())
            }
        }
    }
}

/// An invoice issued during estate administration.
///
/// Amounts are in the smallest currency unit (e.g. cents).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Invoice {
    /// Unique invoice ID.
    pub id: String,
    /// The estate this invoice belongs to.
    pub estate_id: String,
    /// Human-readable invoice number.
    pub number: Option<String>,
    /// Amount due in the smallest currency unit.
    pub amount_due: i64,
    /// Amount already paid.
    pub amount_paid: i64,
    /// Three-letter ISO currency code (lowercase).
    pub currency: String,
    /// Current lifecycle status.
    pub status: InvoiceStatus,
    /// When the invoice was issued (Unix timestamp).
    pub issued_at: Option<u64>,
    /// When the invoice was fully paid (Unix timestamp).
    pub paid_at: Option<u64>,
}

impl Invoice {
    /// Create a new draft invoice.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        estate_id: impl Into<String>,
        amount_due: i64,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            estate_id: estate_id.into(),
            number: None,
            amount_due,
            amount_paid: 0,
            currency: currency.into(),
            status: InvoiceStatus::Draft,
            issued_at: None,
            paid_at: None,
        }
    }

    /// Set the human-readable invoice number.
    #[must_use]
    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.number = Some(number.into());
        self
    }

    /// Amount still owed.
    #[must_use]
    pub fn amount_remaining(&self) -> i64 {
        self.amount_due - self.amount_paid
    }

    /// Issue the invoice.
    pub fn mark_sent(&mut self) -> std::result::Result<(), InvoiceError> {
        self.transition_to(InvoiceStatus::Sent)?;
        self.issued_at = Some(current_timestamp());
        Ok(())
    }

    /// Record a payment against the invoice.
    ///
    /// Moves the invoice to `Partial` while payments cover part of the
    /// amount due, and to `Paid` once they cover it fully. A payment that
    /// would exceed the amount due is rejected.
    pub fn record_payment(&mut self, amount: i64) -> std::result::Result<(), InvoiceError> {
        if amount <= 0 {
            return Err(InvoiceError::InvalidAmount(format!(
                "payment must be positive, got {amount}"
            )));
        }

        let new_paid = self.amount_paid + amount;
        if new_paid > self.amount_due {
            return Err(InvoiceError::InvalidAmount(format!(
                "payment of {amount} exceeds remaining balance of {}",
                self.amount_remaining()
            )));
        }

        let target = if new_paid == self.amount_due {
            InvoiceStatus::Paid
        } else {
            InvoiceStatus::Partial
        };
        self.transition_to(target)?;

        self.amount_paid = new_paid;
        if self.status == InvoiceStatus::Paid {
            self.paid_at = Some(current_timestamp());
        }

        Ok(())
    }

    /// Void the invoice.
    ///
    /// Only issued invoices can be voided; drafts are deleted instead, and
    /// paid invoices stay paid.
    pub fn void(&mut self) -> std::result::Result<(), InvoiceError> {
        self.transition_to(InvoiceStatus::Void)
    }

    fn transition_to(&mut self, next: InvoiceStatus) -> std::result::Result<(), InvoiceError> {
        if !self.status.can_transition_to(next) {
            return Err(InvoiceError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_status_parse() {
        assert_eq!(InvoiceStatus::from_str("draft").unwrap(), InvoiceStatus::Draft);
        assert_eq!(InvoiceStatus::from_str("partial").unwrap(), InvoiceStatus::Partial);
        assert_eq!(InvoiceStatus::Paid.as_str(), "paid");

        let err = InvoiceStatus::from_str("open").unwrap_err();
        assert_eq!(err, InvoiceStatusParseError("open".to_string()));
        assert_eq!(err.to_string(), "invalid invoice status: 'open'");
    }

    #[test]
    fn test_transition_table() {
        use InvoiceStatus::*;

        assert!(Draft.can_transition_to(Sent));
        assert!(!Draft.can_transition_to(Paid));
        assert!(!Draft.can_transition_to(Void));

        assert!(Sent.can_transition_to(Partial));
        assert!(Sent.can_transition_to(Paid));
        assert!(Sent.can_transition_to(Void));
        assert!(!Sent.can_transition_to(Draft));

        assert!(Partial.can_transition_to(Partial));
        assert!(Partial.can_transition_to(Paid));
        assert!(Partial.can_transition_to(Void));

        assert!(Paid.is_terminal());
        assert!(Void.is_terminal());
        assert!(!Paid.can_transition_to(Void));
        assert!(!Void.can_transition_to(Sent));
    }

    #[test]
    fn test_lifecycle_to_paid() {
        let mut invoice = Invoice::new("inv_1", "e1", 10_000, "usd").with_number("EST-001");
        assert_eq!(invoice.status, InvoiceStatus::Draft);

        invoice.mark_sent().unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Sent);
        assert!(invoice.issued_at.is_some());

        invoice.record_payment(4_000).unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Partial);
        assert_eq!(invoice.amount_remaining(), 6_000);
        assert!(invoice.paid_at.is_none());

        invoice.record_payment(2_000).unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Partial);

        invoice.record_payment(4_000).unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Paid);
        assert_eq!(invoice.amount_remaining(), 0);
        assert!(invoice.paid_at.is_some());
    }

    #[test]
    fn test_full_payment_skips_partial() {
        let mut invoice = Invoice::new("inv_1", "e1", 5_000, "usd");
        invoice.mark_sent().unwrap();

        invoice.record_payment(5_000).unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Paid);
    }

    #[test]
    fn test_payment_on_draft_rejected() {
        let mut invoice = Invoice::new("inv_1", "e1", 5_000, "usd");

        let err = invoice.record_payment(1_000).unwrap_err();
        assert_eq!(
            err,
            InvoiceError::InvalidTransition {
                from: InvoiceStatus::Draft,
                to: InvoiceStatus::Partial,
            }
        );
        assert_eq!(invoice.amount_paid, 0);
    }

    #[test]
    fn test_overpayment_rejected() {
        let mut invoice = Invoice::new("inv_1", "e1", 5_000, "usd");
        invoice.mark_sent().unwrap();
        invoice.record_payment(3_000).unwrap();

        let err = invoice.record_payment(3_000).unwrap_err();
        assert!(matches!(err, InvoiceError::InvalidAmount(_)));

        // State untouched by the rejected payment
        assert_eq!(invoice.amount_paid, 3_000);
        assert_eq!(invoice.status, InvoiceStatus::Partial);
    }

    #[test]
    fn test_nonpositive_payment_rejected() {
        let mut invoice = Invoice::new("inv_1", "e1", 5_000, "usd");
        invoice.mark_sent().unwrap();

        assert!(invoice.record_payment(0).is_err());
        assert!(invoice.record_payment(-100).is_err());
    }

    #[test]
    fn test_void_rules() {
        let mut sent = Invoice::new("inv_1", "e1", 5_000, "usd");
        sent.mark_sent().unwrap();
        sent.void().unwrap();
        assert_eq!(sent.status, InvoiceStatus::Void);

        // Voided invoices reject payments
        assert!(sent.record_payment(1_000).is_err());

        // Drafts cannot be voided
        let mut draft = Invoice::new("inv_2", "e1", 5_000, "usd");
        assert!(draft.void().is_err());

        // Paid invoices stay paid
        let mut paid = Invoice::new("inv_3", "e1", 1_000, "usd");
        paid.mark_sent().unwrap();
        paid.record_payment(1_000).unwrap();
        let err = paid.void().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid invoice transition: paid -> void"
        );
    }

    #[test]
    fn test_resend_rejected() {
        let mut invoice = Invoice::new("inv_1", "e1", 5_000, "usd");
        invoice.mark_sent().unwrap();
        assert!(invoice.mark_sent().is_err());
    }
}
