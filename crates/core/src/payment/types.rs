//! Domain types for payments and the documents they settle.
//!
//! Every string-keyed branch of the reconciliation rules is expressed here
//! as an enum so the engine matches on variants instead of comparing text.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use settla_shared::types::UserId;

/// Direction of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentKind {
    /// Outgoing money (paying a supplier, refunding a customer).
    Expense,
    /// Incoming money (collecting from a customer, refund from a supplier).
    Revenue,
}

impl PaymentKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Revenue => "revenue",
        }
    }

    /// Parses a kind from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "expense" => Some(Self::Expense),
            "revenue" => Some(Self::Revenue),
            _ => None,
        }
    }

    /// Document types a payment of this kind may reference.
    #[must_use]
    pub fn allowed_ref_types(&self) -> &'static [RefType] {
        match self {
            Self::Expense => &[RefType::PurchaseInvoice, RefType::SalesReturn],
            Self::Revenue => &[RefType::SalesInvoice, RefType::PurchaseReturn],
        }
    }

    /// Returns true if this kind may reference the given document type.
    #[must_use]
    pub fn allows(&self, ref_type: RefType) -> bool {
        self.allowed_ref_types().contains(&ref_type)
    }
}

impl fmt::Display for PaymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The four document types a payment can settle against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefType {
    /// Invoice received from a supplier.
    PurchaseInvoice,
    /// Invoice issued to a customer.
    SalesInvoice,
    /// Goods returned to a supplier; the supplier refunds us.
    PurchaseReturn,
    /// Goods returned by a customer; we refund the customer.
    SalesReturn,
}

impl RefType {
    /// Returns the string representation of the type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PurchaseInvoice => "purchase_invoice",
            Self::SalesInvoice => "sales_invoice",
            Self::PurchaseReturn => "purchase_return",
            Self::SalesReturn => "sales_return",
        }
    }

    /// Parses a type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "purchase_invoice" => Some(Self::PurchaseInvoice),
            "sales_invoice" => Some(Self::SalesInvoice),
            "purchase_return" => Some(Self::PurchaseReturn),
            "sales_return" => Some(Self::SalesReturn),
            _ => None,
        }
    }

    /// The payment kind that settles this document type.
    #[must_use]
    pub fn payment_kind(&self) -> PaymentKind {
        match self {
            Self::PurchaseInvoice | Self::SalesReturn => PaymentKind::Expense,
            Self::SalesInvoice | Self::PurchaseReturn => PaymentKind::Revenue,
        }
    }

    /// Returns true for purchase and sales returns.
    #[must_use]
    pub fn is_return(&self) -> bool {
        matches!(self, Self::PurchaseReturn | Self::SalesReturn)
    }
}

impl fmt::Display for RefType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A (`ref_type`, `ref_id`) pair; the unit of serialization for balance checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentKey {
    /// Document type.
    pub ref_type: RefType,
    /// Document identifier.
    pub ref_id: Uuid,
}

impl DocumentKey {
    /// Creates a new document key.
    #[must_use]
    pub const fn new(ref_type: RefType, ref_id: Uuid) -> Self {
        Self { ref_type, ref_id }
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ref_type, self.ref_id)
    }
}

/// How the money moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash; no bank details.
    Cash,
    /// Debit card transfer.
    DebitCard,
    /// Credit card transfer.
    CreditCard,
    /// Giro (bank draft).
    Giro,
}

impl PaymentMethod {
    /// Returns the string representation of the method.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::DebitCard => "debit_card",
            Self::CreditCard => "credit_card",
            Self::Giro => "giro",
        }
    }

    /// Parses a method from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cash" => Some(Self::Cash),
            "debit_card" => Some(Self::DebitCard),
            "credit_card" => Some(Self::CreditCard),
            "giro" => Some(Self::Giro),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Settlement state of a payment.
///
/// The only transition is Uncleared → Cleared (approval).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Recorded and reserved against the document total, not yet approved.
    Uncleared,
    /// Approved; its amount has been cascaded to the document chain.
    Cleared,
}

impl PaymentStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uncleared => "uncleared",
            Self::Cleared => "cleared",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "uncleared" => Some(Self::Uncleared),
            "cleared" => Some(Self::Cleared),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle status of invoices, returns and orders.
///
/// Ordered by progress: New < Active < Finished. Cancelled applies to
/// returns only and is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// No payment recorded yet.
    New,
    /// At least one payment recorded, total not yet settled.
    Active,
    /// Cleared payments equal the document total.
    Finished,
    /// Voided return.
    Cancelled,
}

impl DocumentStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Active => "active",
            Self::Finished => "finished",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "new" => Some(Self::New),
            "active" => Some(Self::Active),
            "finished" => Some(Self::Finished),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true if no further payment activity is allowed.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Cancelled)
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Role of the acting user.
///
/// Only the cashier restriction is enforced by the payment engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Organization owner.
    Owner,
    /// Administrator.
    Admin,
    /// Finance staff.
    Finance,
    /// Front-desk cashier.
    Cashier,
    /// Read-only access.
    Viewer,
}

impl UserRole {
    /// Parse a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "owner" => Some(Self::Owner),
            "admin" => Some(Self::Admin),
            "finance" => Some(Self::Finance),
            "cashier" => Some(Self::Cashier),
            "viewer" => Some(Self::Viewer),
            _ => None,
        }
    }

    /// Returns the string representation of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Finance => "finance",
            Self::Cashier => "cashier",
            Self::Viewer => "viewer",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The user on whose behalf an operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// User identity, recorded in audit columns.
    pub user_id: UserId,
    /// User role from the session.
    pub role: UserRole,
}

impl Actor {
    /// Creates a new actor.
    #[must_use]
    pub const fn new(user_id: UserId, role: UserRole) -> Self {
        Self { user_id, role }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_allowed_ref_types() {
        assert!(PaymentKind::Expense.allows(RefType::PurchaseInvoice));
        assert!(PaymentKind::Expense.allows(RefType::SalesReturn));
        assert!(!PaymentKind::Expense.allows(RefType::SalesInvoice));
        assert!(!PaymentKind::Expense.allows(RefType::PurchaseReturn));

        assert!(PaymentKind::Revenue.allows(RefType::SalesInvoice));
        assert!(PaymentKind::Revenue.allows(RefType::PurchaseReturn));
        assert!(!PaymentKind::Revenue.allows(RefType::PurchaseInvoice));
        assert!(!PaymentKind::Revenue.allows(RefType::SalesReturn));
    }

    #[test]
    fn test_ref_type_payment_kind_agrees_with_allowed() {
        for ref_type in [
            RefType::PurchaseInvoice,
            RefType::SalesInvoice,
            RefType::PurchaseReturn,
            RefType::SalesReturn,
        ] {
            assert!(ref_type.payment_kind().allows(ref_type));
        }
    }

    #[test]
    fn test_ref_type_parse() {
        assert_eq!(
            RefType::parse("purchase_invoice"),
            Some(RefType::PurchaseInvoice)
        );
        assert_eq!(RefType::parse("SALES_RETURN"), Some(RefType::SalesReturn));
        assert_eq!(RefType::parse("order"), None);
    }

    #[test]
    fn test_method_parse() {
        assert_eq!(PaymentMethod::parse("giro"), Some(PaymentMethod::Giro));
        assert_eq!(
            PaymentMethod::parse("Debit_Card"),
            Some(PaymentMethod::DebitCard)
        );
        assert_eq!(PaymentMethod::parse("cheque"), None);
    }

    #[test]
    fn test_document_status_ordering() {
        assert!(DocumentStatus::New < DocumentStatus::Active);
        assert!(DocumentStatus::Active < DocumentStatus::Finished);
        assert!(DocumentStatus::Finished.is_terminal());
        assert!(DocumentStatus::Cancelled.is_terminal());
        assert!(!DocumentStatus::Active.is_terminal());
    }

    #[test]
    fn test_document_key_display() {
        let id = Uuid::nil();
        let key = DocumentKey::new(RefType::SalesReturn, id);
        assert_eq!(key.to_string(), format!("sales_return:{id}"));
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(UserRole::parse("Cashier"), Some(UserRole::Cashier));
        assert_eq!(UserRole::parse("finance"), Some(UserRole::Finance));
        assert_eq!(UserRole::parse("janitor"), None);
    }
}
