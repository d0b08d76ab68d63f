//! Payment reconciliation for Settla.
//!
//! This module holds the rules for recording payments against purchase and
//! sales documents, approving them, and cascading approved amounts up to
//! orders and partner balances.
//!
//! # Modules
//!
//! - `types` - Domain enums (`PaymentKind`, `RefType`, statuses, roles)
//! - `error` - Payment error taxonomy with field-tagged violations
//! - `fields` - Payment-method field rules
//! - `document` - Document state machine and snapshots
//! - `service` - Create/update validation and balance reservation
//! - `cascade` - Approval planning
//! - `cancellation` - Return cancellation planning
//! - `locks` - In-process per-document lock table

pub mod cancellation;
pub mod cascade;
pub mod document;
pub mod error;
pub mod fields;
pub mod locks;
pub mod service;
pub mod types;

#[cfg(test)]
mod reconciliation_props;

pub use cancellation::{CancellationPlan, plan_cancellation};
pub use cascade::{ApprovalPlan, CascadePropagator, OrderUpdate, PartnerUpdate};
pub use document::{
    DocumentEvent, DocumentSnapshot, OrderSnapshot, ParentChain, PartnerKind, PartnerSnapshot,
    PaymentSnapshot,
};
pub use error::{FieldViolation, PaymentError};
pub use fields::{BankDetails, BankField, BankFieldsInput};
pub use locks::{DocumentGuard, DocumentLocks};
pub use service::{
    PaymentInput, ReconciliationService, Reservation, ReservationMode, ValidatedPayment,
};
pub use types::{
    Actor, DocumentKey, DocumentStatus, PaymentKind, PaymentMethod, PaymentStatus, RefType,
    UserRole,
};
