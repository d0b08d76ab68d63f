//! Payment error types.
//!
//! Every rule violation is detected before the first write and carries the
//! field(s) it concerns, so the boundary can tell the client exactly what
//! was rejected.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use settla_shared::types::PaymentId;

use super::types::{DocumentKey, DocumentStatus, UserRole};

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    /// Request field name (snake_case, as sent by the client).
    pub field: String,
    /// Human-readable reason.
    pub message: String,
}

impl FieldViolation {
    /// Creates a new violation.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors that can occur while recording, approving or cancelling payments.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Payment does not exist or has been soft-deleted.
    #[error("Payment {0} not found")]
    PaymentNotFound(PaymentId),

    /// Referenced document does not exist or has been soft-deleted.
    #[error("Document {0} not found")]
    DocumentNotFound(DocumentKey),

    /// Reference could not be decoded or is not allowed for this payment kind.
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Document is already fully settled.
    #[error("Document {0} is already settled")]
    DocumentAlreadySettled(DocumentKey),

    /// Document is in a terminal status for the requested operation.
    #[error("Document {key} is already {status}")]
    AlreadyTerminal {
        /// The document.
        key: DocumentKey,
        /// Its current status.
        status: DocumentStatus,
    },

    /// Recording the amount would push reserved payments past the document total.
    #[error("Amount {amount} exceeds remaining balance: total {total}, already reserved {reserved}")]
    AmountExceedsBalance {
        /// Document total.
        total: Decimal,
        /// Sum of other non-deleted payments against the document.
        reserved: Decimal,
        /// Requested amount.
        amount: Decimal,
    },

    /// Payment method and bank fields do not agree.
    #[error("Invalid payment fields: {}", describe(.0))]
    InvalidPaymentFields(Vec<FieldViolation>),

    /// Payment has already been approved and is immutable.
    #[error("Payment {0} is already cleared")]
    AlreadyCleared(PaymentId),

    /// The acting user's role forbids the operation.
    #[error("Role {role} is not permitted: {reason}")]
    RoleNotPermitted {
        /// The acting role.
        role: UserRole,
        /// Why the operation was refused.
        reason: String,
    },

    /// Stored data is inconsistent (e.g. an invoice without its order).
    #[error("Internal error: {0}")]
    Internal(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

fn describe(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{} {}", v.field, v.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl PaymentError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::PaymentNotFound(_) | Self::DocumentNotFound(_) => 404,

            Self::InvalidReference(_) => 400,

            Self::RoleNotPermitted { .. } => 403,

            Self::DocumentAlreadySettled(_)
            | Self::AlreadyTerminal { .. }
            | Self::AmountExceedsBalance { .. }
            | Self::InvalidPaymentFields(_)
            | Self::AlreadyCleared(_) => 422,

            Self::Internal(_) | Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::PaymentNotFound(_) => "PAYMENT_NOT_FOUND",
            Self::DocumentNotFound(_) => "DOCUMENT_NOT_FOUND",
            Self::InvalidReference(_) => "INVALID_REFERENCE",
            Self::DocumentAlreadySettled(_) => "DOCUMENT_ALREADY_SETTLED",
            Self::AlreadyTerminal { .. } => "ALREADY_TERMINAL",
            Self::AmountExceedsBalance { .. } => "AMOUNT_EXCEEDS_BALANCE",
            Self::InvalidPaymentFields(_) => "INVALID_PAYMENT_FIELDS",
            Self::AlreadyCleared(_) => "ALREADY_CLEARED",
            Self::RoleNotPermitted { .. } => "ROLE_NOT_PERMITTED",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the field-tagged reasons for this error.
    ///
    /// Infrastructure failures carry no field and return an empty list.
    #[must_use]
    pub fn violations(&self) -> Vec<FieldViolation> {
        match self {
            Self::PaymentNotFound(_) => vec![FieldViolation::new("id", "payment not found")],
            Self::DocumentNotFound(_) => vec![FieldViolation::new("ref_id", "document not found")],
            Self::InvalidReference(reason) => vec![FieldViolation::new("ref_type", reason.clone())],
            Self::DocumentAlreadySettled(_) => {
                vec![FieldViolation::new("ref_id", "document is already settled")]
            }
            Self::AlreadyTerminal { status, .. } => {
                vec![FieldViolation::new("ref_id", format!("document is {status}"))]
            }
            Self::AmountExceedsBalance {
                total, reserved, ..
            } => vec![FieldViolation::new(
                "amount",
                format!("exceeds remaining balance {}", total - reserved),
            )],
            Self::InvalidPaymentFields(violations) => violations.clone(),
            Self::AlreadyCleared(_) => vec![FieldViolation::new(
                "document_status",
                "payment is already cleared",
            )],
            Self::RoleNotPermitted { reason, .. } => {
                vec![FieldViolation::new("ref_id", reason.clone())]
            }
            Self::Internal(_) | Self::Database(_) => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::types::RefType;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn key() -> DocumentKey {
        DocumentKey::new(RefType::PurchaseInvoice, Uuid::nil())
    }

    #[test]
    fn test_not_found_errors() {
        let err = PaymentError::PaymentNotFound(PaymentId::from_uuid(Uuid::nil()));
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.error_code(), "PAYMENT_NOT_FOUND");

        let err = PaymentError::DocumentNotFound(key());
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.error_code(), "DOCUMENT_NOT_FOUND");
        assert!(err.to_string().contains("purchase_invoice"));
    }

    #[test]
    fn test_invalid_reference_is_client_error() {
        let err = PaymentError::InvalidReference("bad token".to_string());
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.violations()[0].field, "ref_type");
    }

    #[test]
    fn test_business_rule_errors_are_unprocessable() {
        let errors = [
            PaymentError::DocumentAlreadySettled(key()),
            PaymentError::AlreadyTerminal {
                key: key(),
                status: DocumentStatus::Cancelled,
            },
            PaymentError::AmountExceedsBalance {
                total: dec!(100),
                reserved: dec!(80),
                amount: dec!(30),
            },
            PaymentError::InvalidPaymentFields(vec![]),
            PaymentError::AlreadyCleared(PaymentId::from_uuid(Uuid::nil())),
        ];
        for err in errors {
            assert_eq!(err.status_code(), 422, "{err}");
        }
    }

    #[test]
    fn test_amount_exceeds_balance_names_amount_field() {
        let err = PaymentError::AmountExceedsBalance {
            total: dec!(50000),
            reserved: dec!(40000),
            amount: dec!(15000),
        };
        let violations = err.violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "amount");
        assert!(violations[0].message.contains("10000"));
    }

    #[test]
    fn test_invalid_fields_lists_every_violation() {
        let err = PaymentError::InvalidPaymentFields(vec![
            FieldViolation::new("bank_name", "must be empty for giro payments"),
            FieldViolation::new("giro_number", "is required for giro payments"),
        ]);
        assert_eq!(err.violations().len(), 2);
        let text = err.to_string();
        assert!(text.contains("bank_name"));
        assert!(text.contains("giro_number"));
    }

    #[test]
    fn test_role_not_permitted() {
        let err = PaymentError::RoleNotPermitted {
            role: UserRole::Cashier,
            reason: "invoice already has receipts".to_string(),
        };
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.error_code(), "ROLE_NOT_PERMITTED");
    }

    #[test]
    fn test_database_error_has_no_fields() {
        let err = PaymentError::Database("connection reset".to_string());
        assert_eq!(err.status_code(), 500);
        assert!(err.violations().is_empty());
    }
}
