//! Return cancellation.
//!
//! Cancelling a return voids it and soft-deletes the payments recorded
//! against it so they stop counting toward balance checks. Effects of
//! payments that were already approved (order and partner totals) stay
//! where they are.

use settla_shared::types::PaymentId;

use super::document::{DocumentEvent, DocumentSnapshot, PaymentSnapshot};
use super::error::PaymentError;
use super::types::{DocumentKey, DocumentStatus, PaymentKind};

/// Every write a cancellation performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancellationPlan {
    /// The return being cancelled.
    pub key: DocumentKey,
    /// Always `Cancelled`.
    pub document_status: DocumentStatus,
    /// Kind of the payments being removed.
    pub payment_kind: PaymentKind,
    /// Payments to soft-delete.
    pub deleted_payments: Vec<PaymentId>,
}

/// Plans the cancellation of a return.
///
/// `payments` may contain anything loaded for the document; only live
/// payments of the kind that settles this return are selected.
///
/// # Errors
/// * `InvalidReference` if the document is an invoice
/// * `DocumentNotFound` if the return is missing or soft-deleted
/// * `AlreadyTerminal` if the return is finished or already cancelled
pub fn plan_cancellation(
    key: DocumentKey,
    document: Option<&DocumentSnapshot>,
    payments: &[PaymentSnapshot],
) -> Result<CancellationPlan, PaymentError> {
    if !key.ref_type.is_return() {
        return Err(PaymentError::InvalidReference(format!(
            "{} cannot be cancelled",
            key.ref_type
        )));
    }

    let document = document
        .filter(|d| !d.is_deleted && d.key == key)
        .ok_or(PaymentError::DocumentNotFound(key))?;

    let document_status = document.status.transition(key, DocumentEvent::Cancel)?;

    let payment_kind = key.ref_type.payment_kind();
    let deleted_payments = payments
        .iter()
        .filter(|p| !p.is_deleted && p.key == key && p.kind == payment_kind)
        .map(|p| p.id)
        .collect();

    Ok(CancellationPlan {
        key,
        document_status,
        payment_kind,
        deleted_payments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::types::{PaymentStatus, RefType};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn sales_return(status: DocumentStatus) -> DocumentSnapshot {
        DocumentSnapshot {
            key: DocumentKey::new(RefType::SalesReturn, Uuid::new_v4()),
            status,
            total: dec!(1000),
            total_paid: Decimal::ZERO,
            total_revenued: Decimal::ZERO,
            is_deleted: false,
        }
    }

    fn payment(key: DocumentKey, kind: PaymentKind, is_deleted: bool) -> PaymentSnapshot {
        PaymentSnapshot {
            id: PaymentId::new(),
            kind,
            key,
            amount: dec!(100),
            status: PaymentStatus::Uncleared,
            is_deleted,
        }
    }

    #[test]
    fn test_cancel_sales_return_deletes_its_expenses() {
        let doc = sales_return(DocumentStatus::Active);
        let first = payment(doc.key, PaymentKind::Expense, false);
        let second = payment(doc.key, PaymentKind::Expense, false);
        let already_gone = payment(doc.key, PaymentKind::Expense, true);

        let plan = plan_cancellation(
            doc.key,
            Some(&doc),
            &[first.clone(), second.clone(), already_gone],
        )
        .unwrap();

        assert_eq!(plan.document_status, DocumentStatus::Cancelled);
        assert_eq!(plan.payment_kind, PaymentKind::Expense);
        assert_eq!(plan.deleted_payments, vec![first.id, second.id]);
    }

    #[test]
    fn test_cancel_ignores_other_documents_and_kinds() {
        let doc = sales_return(DocumentStatus::New);
        let other_doc = DocumentKey::new(RefType::SalesReturn, Uuid::new_v4());
        let payments = [
            payment(other_doc, PaymentKind::Expense, false),
            payment(doc.key, PaymentKind::Revenue, false),
        ];

        let plan = plan_cancellation(doc.key, Some(&doc), &payments).unwrap();
        assert!(plan.deleted_payments.is_empty());
    }

    #[test]
    fn test_cancel_terminal_return_rejected() {
        for status in [DocumentStatus::Finished, DocumentStatus::Cancelled] {
            let doc = sales_return(status);
            let err = plan_cancellation(doc.key, Some(&doc), &[]).unwrap_err();
            assert!(matches!(err, PaymentError::AlreadyTerminal { .. }));
        }
    }

    #[test]
    fn test_cancel_invoice_rejected() {
        let key = DocumentKey::new(RefType::PurchaseInvoice, Uuid::new_v4());
        let err = plan_cancellation(key, None, &[]).unwrap_err();
        assert!(matches!(err, PaymentError::InvalidReference(_)));
    }

    #[test]
    fn test_cancel_missing_return() {
        let key = DocumentKey::new(RefType::PurchaseReturn, Uuid::new_v4());
        let err = plan_cancellation(key, None, &[]).unwrap_err();
        assert!(matches!(err, PaymentError::DocumentNotFound(_)));
    }
}
