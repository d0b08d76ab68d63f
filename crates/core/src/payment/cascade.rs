//! Approval cascade.
//!
//! Approving a payment clears it, recomputes the referenced document's
//! status from the cumulative cleared sum, and for invoices carries the
//! amount up to the order and the supplier or customer balance.

use rust_decimal::Decimal;
use uuid::Uuid;

use settla_shared::types::PaymentId;

use super::document::{
    DocumentEvent, DocumentSnapshot, ParentChain, PartnerKind, PaymentSnapshot,
};
use super::error::PaymentError;
use super::service::ReconciliationService;
use super::types::{DocumentKey, DocumentStatus, PaymentStatus, RefType};

/// New values for an invoice's order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderUpdate {
    /// Order identifier.
    pub id: Uuid,
    /// Running total paid after this approval.
    pub total_paid: Decimal,
    /// Payment-side status.
    pub invoice_status: DocumentStatus,
    /// Overall status.
    pub document_status: DocumentStatus,
}

/// New balance for a supplier or customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartnerUpdate {
    /// Supplier or customer.
    pub kind: PartnerKind,
    /// Partner identifier.
    pub id: Uuid,
    /// Balance after this approval.
    pub balance: Decimal,
}

/// Every write an approval performs, computed up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalPlan {
    /// Payment being approved.
    pub payment_id: PaymentId,
    /// Always `Cleared`.
    pub payment_status: PaymentStatus,
    /// Referenced document.
    pub key: DocumentKey,
    /// Document status derived from the cleared sum.
    pub document_status: DocumentStatus,
    /// Document running total after this approval.
    pub document_total_paid: Decimal,
    /// Cleared sum including this payment.
    pub cleared_after: Decimal,
    /// Order update, for invoices.
    pub order: Option<OrderUpdate>,
    /// Partner update, for invoices.
    pub partner: Option<PartnerUpdate>,
}

/// Computes approval plans.
pub struct CascadePropagator;

impl CascadePropagator {
    /// Plans the approval of `payment`.
    ///
    /// `cleared_before` is the sum of cleared, non-deleted payments against
    /// the document before this approval. `parents` is required for
    /// invoices and ignored for returns.
    ///
    /// # Errors
    /// * `PaymentNotFound` / `AlreadyCleared` if the payment cannot be approved
    /// * `DocumentNotFound` if the document is missing or soft-deleted
    /// * `AlreadyTerminal` if the document was cancelled
    /// * `AmountExceedsBalance` if the cleared sum would pass the document total
    /// * `Internal` if an invoice has no order or partner
    pub fn plan_approval(
        payment: &PaymentSnapshot,
        document: Option<&DocumentSnapshot>,
        cleared_before: Decimal,
        parents: Option<&ParentChain>,
    ) -> Result<ApprovalPlan, PaymentError> {
        ReconciliationService::ensure_mutable(payment)?;

        let document = document
            .filter(|d| !d.is_deleted && d.key == payment.key)
            .ok_or(PaymentError::DocumentNotFound(payment.key))?;

        let exceeds = || PaymentError::AmountExceedsBalance {
            total: document.total,
            reserved: cleared_before,
            amount: payment.amount,
        };
        let cleared_after = cleared_before
            .checked_add(payment.amount)
            .filter(|sum| *sum <= document.total)
            .ok_or_else(exceeds)?;
        let document_total_paid = document
            .total_paid
            .checked_add(payment.amount)
            .ok_or_else(exceeds)?;

        let settled = cleared_after == document.total;
        let document_status = document
            .status
            .transition(document.key, DocumentEvent::PaymentCleared { settled })?;

        let (order, partner) = match document.key.ref_type {
            RefType::PurchaseInvoice | RefType::SalesInvoice => {
                let chain = parents.ok_or_else(|| {
                    PaymentError::Internal(format!("{} has no order", document.key))
                })?;
                let (order, partner) = Self::cascade_parents(document.key, chain, payment.amount)?;
                (Some(order), Some(partner))
            }
            RefType::PurchaseReturn | RefType::SalesReturn => (None, None),
        };

        Ok(ApprovalPlan {
            payment_id: payment.id,
            payment_status: PaymentStatus::Cleared,
            key: document.key,
            document_status,
            document_total_paid,
            cleared_after,
            order,
            partner,
        })
    }

    fn cascade_parents(
        key: DocumentKey,
        chain: &ParentChain,
        amount: Decimal,
    ) -> Result<(OrderUpdate, PartnerUpdate), PaymentError> {
        let expected = match key.ref_type {
            RefType::PurchaseInvoice => PartnerKind::Supplier,
            _ => PartnerKind::Customer,
        };
        if chain.partner.kind != expected {
            return Err(PaymentError::Internal(format!(
                "{key} is linked to the wrong partner type"
            )));
        }

        let order = &chain.order;
        let overflow = || PaymentError::Internal(format!("{key} parent totals overflow"));
        let total_paid = order.total_paid.checked_add(amount).ok_or_else(overflow)?;
        let balance = chain
            .partner
            .balance
            .checked_sub(amount)
            .ok_or_else(overflow)?;
        let invoice_status = Self::order_invoice_status(total_paid, order.total_charge);
        let document_status = Self::order_document_status(invoice_status, order.fulfillment_status);

        Ok((
            OrderUpdate {
                id: order.id,
                total_paid,
                invoice_status,
                document_status,
            },
            PartnerUpdate {
                kind: chain.partner.kind,
                id: chain.partner.id,
                balance,
            },
        ))
    }

    /// Finished iff the order is paid in full.
    #[must_use]
    pub fn order_invoice_status(total_paid: Decimal, total_charge: Decimal) -> DocumentStatus {
        if total_paid == total_charge {
            DocumentStatus::Finished
        } else {
            DocumentStatus::Active
        }
    }

    /// Finished iff both the payment side and the goods side are finished.
    #[must_use]
    pub fn order_document_status(
        invoice_status: DocumentStatus,
        fulfillment_status: DocumentStatus,
    ) -> DocumentStatus {
        if invoice_status == DocumentStatus::Finished
            && fulfillment_status == DocumentStatus::Finished
        {
            DocumentStatus::Finished
        } else {
            DocumentStatus::Active
        }
    }
}
