//! Validation rules for creating, updating and deleting payments.
//!
//! `ReconciliationService` is stateless: callers load the document snapshot
//! and the reserved sum while holding the document's lock, and apply the
//! returned [`Reservation`] before releasing it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::document::{DocumentEvent, DocumentSnapshot, PaymentSnapshot};
use super::error::PaymentError;
use super::fields::{BankDetails, BankFieldsInput, normalize_fields};
use super::types::{
    Actor, DocumentKey, DocumentStatus, PaymentKind, PaymentMethod, PaymentStatus, RefType,
    UserRole,
};

/// A payment as submitted for create or update.
#[derive(Debug, Clone)]
pub struct PaymentInput {
    /// Referenced document type.
    pub ref_type: RefType,
    /// Referenced document id (already decoded).
    pub ref_id: Uuid,
    /// When the payment is recognised.
    pub recognition_date: DateTime<Utc>,
    /// How the money moved.
    pub method: PaymentMethod,
    /// Bank and giro fields.
    pub fields: BankFieldsInput,
    /// Payment amount.
    pub amount: Decimal,
    /// Free-form note.
    pub note: Option<String>,
}

/// A payment that passed all document-independent checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPayment {
    /// Expense or revenue.
    pub kind: PaymentKind,
    /// Referenced document.
    pub key: DocumentKey,
    /// When the payment is recognised.
    pub recognition_date: DateTime<Utc>,
    /// How the money moved.
    pub method: PaymentMethod,
    /// Bank details in stored shape.
    pub bank: BankDetails,
    /// Payment amount.
    pub amount: Decimal,
    /// Free-form note.
    pub note: Option<String>,
}

/// Outcome of a successful balance check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    /// Document the amount is reserved against.
    pub key: DocumentKey,
    /// Status the document must be saved with.
    pub document_status: DocumentStatus,
    /// Reserved sum including this payment.
    pub reserved_after: Decimal,
}

impl Reservation {
    /// Returns true if the document row needs writing.
    #[must_use]
    pub fn changes_status(&self, current: DocumentStatus) -> bool {
        self.document_status != current
    }
}

/// Whether a reservation is for a new payment or an edit of an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationMode {
    /// Creating a payment; the cashier rule applies.
    Create,
    /// Updating a payment; the reserved sum excludes the payment itself.
    Update,
}

/// Stateless validation for the payment ledger.
pub struct ReconciliationService;

impl ReconciliationService {
    /// Runs the checks that need no stored state.
    ///
    /// # Errors
    /// * `InvalidReference` if `kind` cannot settle `ref_type`
    /// * `InvalidPaymentFields` listing every method/field or amount violation
    pub fn validate(
        kind: PaymentKind,
        input: &PaymentInput,
    ) -> Result<ValidatedPayment, PaymentError> {
        if !kind.allows(input.ref_type) {
            return Err(PaymentError::InvalidReference(format!(
                "{kind} payments cannot reference {}",
                input.ref_type
            )));
        }

        let bank = normalize_fields(kind, input.method, &input.fields, input.amount)?;

        Ok(ValidatedPayment {
            kind,
            key: DocumentKey::new(input.ref_type, input.ref_id),
            recognition_date: input.recognition_date,
            method: input.method,
            bank,
            amount: input.amount,
            note: input.note.clone(),
        })
    }

    /// Checks a payment against its document and the amount already reserved.
    ///
    /// `reserved` is the sum of all non-deleted payments against the
    /// document, excluding the payment being updated.
    ///
    /// # Errors
    /// * `DocumentNotFound` if the document is missing or soft-deleted
    /// * `DocumentAlreadySettled` / `AlreadyTerminal` for finished or cancelled documents
    /// * `RoleNotPermitted` for a cashier receiving against an invoice that already has receipts
    /// * `AmountExceedsBalance` if `reserved + amount` exceeds the document total
    pub fn reserve(
        payment: &ValidatedPayment,
        document: Option<&DocumentSnapshot>,
        reserved: Decimal,
        actor: &Actor,
        mode: ReservationMode,
    ) -> Result<Reservation, PaymentError> {
        let document = document
            .filter(|d| !d.is_deleted)
            .ok_or(PaymentError::DocumentNotFound(payment.key))?;

        let document_status = document
            .status
            .transition(document.key, DocumentEvent::PaymentReserved)?;

        if mode == ReservationMode::Create {
            Self::check_cashier(payment, document, actor)?;
        }

        let reserved_after = reserved
            .checked_add(payment.amount)
            .filter(|sum| *sum <= document.total)
            .ok_or(PaymentError::AmountExceedsBalance {
                total: document.total,
                reserved,
                amount: payment.amount,
            })?;

        Ok(Reservation {
            key: document.key,
            document_status,
            reserved_after,
        })
    }

    fn check_cashier(
        payment: &ValidatedPayment,
        document: &DocumentSnapshot,
        actor: &Actor,
    ) -> Result<(), PaymentError> {
        let restricted = actor.role == UserRole::Cashier
            && payment.kind == PaymentKind::Revenue
            && payment.key.ref_type == RefType::SalesInvoice
            && document.total_revenued > Decimal::ZERO;

        if restricted {
            return Err(PaymentError::RoleNotPermitted {
                role: actor.role,
                reason: "sales invoice already has receipts".to_string(),
            });
        }
        Ok(())
    }

    /// Checks that an existing payment may still be modified.
    ///
    /// Used before update, delete and approval.
    ///
    /// # Errors
    /// * `PaymentNotFound` if the payment is soft-deleted
    /// * `AlreadyCleared` if the payment has been approved
    pub fn ensure_mutable(existing: &PaymentSnapshot) -> Result<(), PaymentError> {
        if existing.is_deleted {
            return Err(PaymentError::PaymentNotFound(existing.id));
        }
        if existing.status == PaymentStatus::Cleared {
            return Err(PaymentError::AlreadyCleared(existing.id));
        }
        Ok(())
    }
}
