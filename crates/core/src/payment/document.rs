//! Document state machine and the snapshots the engine reasons over.
//!
//! The database layer loads snapshots (under row locks), the engine turns
//! them into plans, and the database layer writes the plans back. Nothing in
//! this module performs I/O.

use rust_decimal::Decimal;
use uuid::Uuid;

use settla_shared::types::PaymentId;

use super::error::PaymentError;
use super::types::{DocumentKey, DocumentStatus, PaymentKind, PaymentStatus};

/// Something that happened to a referenced document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentEvent {
    /// A payment was recorded against the document.
    PaymentReserved,
    /// A payment against the document was approved.
    PaymentCleared {
        /// Whether cleared payments now equal the document total.
        settled: bool,
    },
    /// The document (a return) was voided.
    Cancel,
}

/// Transition table for referenced documents.
///
/// | from      | `PaymentReserved` | `PaymentCleared`          | `Cancel`  |
/// |-----------|-------------------|---------------------------|-----------|
/// | new       | active            | active / finished         | cancelled |
/// | active    | active            | active / finished         | cancelled |
/// | finished  | -                 | finished                  | -         |
/// | cancelled | -                 | -                         | -         |
impl DocumentStatus {
    /// Returns the status after `event`, or `None` if the event is not allowed.
    #[must_use]
    pub fn apply(self, event: DocumentEvent) -> Option<Self> {
        match (self, event) {
            (Self::New | Self::Active, DocumentEvent::PaymentReserved) => Some(Self::Active),
            (Self::New | Self::Active, DocumentEvent::PaymentCleared { settled }) => {
                Some(if settled { Self::Finished } else { Self::Active })
            }
            (Self::Finished, DocumentEvent::PaymentCleared { .. }) => Some(Self::Finished),
            (Self::New | Self::Active, DocumentEvent::Cancel) => Some(Self::Cancelled),
            (Self::Finished | Self::Cancelled, _) => None,
        }
    }

    /// Like [`apply`](Self::apply), with the refusal turned into an error for `key`.
    pub fn transition(self, key: DocumentKey, event: DocumentEvent) -> Result<Self, PaymentError> {
        self.apply(event).ok_or_else(|| match (self, event) {
            (Self::Finished, DocumentEvent::PaymentReserved) => {
                PaymentError::DocumentAlreadySettled(key)
            }
            (status, _) => PaymentError::AlreadyTerminal { key, status },
        })
    }
}

/// A referenced document as seen by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSnapshot {
    /// Which document.
    pub key: DocumentKey,
    /// Current lifecycle status.
    pub status: DocumentStatus,
    /// The ceiling all linked payments must never exceed.
    pub total: Decimal,
    /// Running total of approved payments.
    pub total_paid: Decimal,
    /// Amount received through the receipt subsystem (sales invoices only).
    pub total_revenued: Decimal,
    /// Soft-delete flag.
    pub is_deleted: bool,
}

impl DocumentSnapshot {
    /// Amount still open for reservation given what is already reserved.
    #[must_use]
    pub fn remaining(&self, reserved: Decimal) -> Decimal {
        self.total - reserved
    }
}

/// The order an invoice belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSnapshot {
    /// Order identifier.
    pub id: Uuid,
    /// Order total.
    pub total_charge: Decimal,
    /// Running total paid across the order's invoices.
    pub total_paid: Decimal,
    /// Payment-side status of the order.
    pub invoice_status: DocumentStatus,
    /// Goods-side status (receiving for purchases, delivery for sales).
    pub fulfillment_status: DocumentStatus,
    /// Overall order status.
    pub document_status: DocumentStatus,
}

/// Which partner aggregate a balance belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartnerKind {
    /// Supplier; balance is `total_credit`.
    Supplier,
    /// Customer; balance is `total_debt`.
    Customer,
}

/// A supplier or customer balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartnerSnapshot {
    /// Supplier or customer.
    pub kind: PartnerKind,
    /// Partner identifier.
    pub id: Uuid,
    /// What we owe the supplier, or what the customer owes us.
    pub balance: Decimal,
}

/// Order and partner above an invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentChain {
    /// The invoice's order.
    pub order: OrderSnapshot,
    /// The order's supplier or customer.
    pub partner: PartnerSnapshot,
}

/// A payment as seen by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSnapshot {
    /// Payment identifier.
    pub id: PaymentId,
    /// Expense or revenue.
    pub kind: PaymentKind,
    /// Referenced document.
    pub key: DocumentKey,
    /// Payment amount.
    pub amount: Decimal,
    /// Uncleared or cleared.
    pub status: PaymentStatus,
    /// Soft-delete flag.
    pub is_deleted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::types::RefType;

    fn key() -> DocumentKey {
        DocumentKey::new(RefType::PurchaseReturn, Uuid::nil())
    }

    #[test]
    fn test_reserve_moves_new_to_active() {
        assert_eq!(
            DocumentStatus::New.apply(DocumentEvent::PaymentReserved),
            Some(DocumentStatus::Active)
        );
        assert_eq!(
            DocumentStatus::Active.apply(DocumentEvent::PaymentReserved),
            Some(DocumentStatus::Active)
        );
    }

    #[test]
    fn test_reserve_on_finished_is_already_settled() {
        let err = DocumentStatus::Finished
            .transition(key(), DocumentEvent::PaymentReserved)
            .unwrap_err();
        assert!(matches!(err, PaymentError::DocumentAlreadySettled(_)));
    }

    #[test]
    fn test_reserve_on_cancelled_is_terminal() {
        let err = DocumentStatus::Cancelled
            .transition(key(), DocumentEvent::PaymentReserved)
            .unwrap_err();
        assert!(matches!(
            err,
            PaymentError::AlreadyTerminal {
                status: DocumentStatus::Cancelled,
                ..
            }
        ));
    }

    #[test]
    fn test_clear_partial_stays_active() {
        assert_eq!(
            DocumentStatus::Active.apply(DocumentEvent::PaymentCleared { settled: false }),
            Some(DocumentStatus::Active)
        );
        // never back to new
        assert_eq!(
            DocumentStatus::New.apply(DocumentEvent::PaymentCleared { settled: false }),
            Some(DocumentStatus::Active)
        );
    }

    #[test]
    fn test_clear_settled_finishes() {
        assert_eq!(
            DocumentStatus::Active.apply(DocumentEvent::PaymentCleared { settled: true }),
            Some(DocumentStatus::Finished)
        );
        assert_eq!(
            DocumentStatus::Finished.apply(DocumentEvent::PaymentCleared { settled: false }),
            Some(DocumentStatus::Finished)
        );
    }

    #[test]
    fn test_cancel() {
        assert_eq!(
            DocumentStatus::Active.apply(DocumentEvent::Cancel),
            Some(DocumentStatus::Cancelled)
        );
        for status in [DocumentStatus::Finished, DocumentStatus::Cancelled] {
            let err = status.transition(key(), DocumentEvent::Cancel).unwrap_err();
            assert!(matches!(err, PaymentError::AlreadyTerminal { .. }));
        }
    }

    #[test]
    fn test_transitions_never_regress() {
        let statuses = [
            DocumentStatus::New,
            DocumentStatus::Active,
            DocumentStatus::Finished,
            DocumentStatus::Cancelled,
        ];
        let events = [
            DocumentEvent::PaymentReserved,
            DocumentEvent::PaymentCleared { settled: false },
            DocumentEvent::PaymentCleared { settled: true },
            DocumentEvent::Cancel,
        ];
        for from in statuses {
            for event in events {
                if let Some(to) = from.apply(event) {
                    assert!(to >= from, "{from} -> {to} on {event:?}");
                }
            }
        }
    }
}
