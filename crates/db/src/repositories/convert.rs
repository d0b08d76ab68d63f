//! Conversions between database enums and core domain enums.

use settla_core::payment::types as core;

use crate::entities::sea_orm_active_enums::{
    DocumentStatus, PaymentKind, PaymentMethod, PaymentStatus, RefType,
};

impl From<PaymentKind> for core::PaymentKind {
    fn from(kind: PaymentKind) -> Self {
        match kind {
            PaymentKind::Expense => Self::Expense,
            PaymentKind::Revenue => Self::Revenue,
        }
    }
}

impl From<core::PaymentKind> for PaymentKind {
    fn from(kind: core::PaymentKind) -> Self {
        match kind {
            core::PaymentKind::Expense => Self::Expense,
            core::PaymentKind::Revenue => Self::Revenue,
        }
    }
}

impl From<RefType> for core::RefType {
    fn from(ref_type: RefType) -> Self {
        match ref_type {
            RefType::PurchaseInvoice => Self::PurchaseInvoice,
            RefType::SalesInvoice => Self::SalesInvoice,
            RefType::PurchaseReturn => Self::PurchaseReturn,
            RefType::SalesReturn => Self::SalesReturn,
        }
    }
}

impl From<core::RefType> for RefType {
    fn from(ref_type: core::RefType) -> Self {
        match ref_type {
            core::RefType::PurchaseInvoice => Self::PurchaseInvoice,
            core::RefType::SalesInvoice => Self::SalesInvoice,
            core::RefType::PurchaseReturn => Self::PurchaseReturn,
            core::RefType::SalesReturn => Self::SalesReturn,
        }
    }
}

impl From<PaymentMethod> for core::PaymentMethod {
    fn from(method: PaymentMethod) -> Self {
        match method {
            PaymentMethod::Cash => Self::Cash,
            PaymentMethod::DebitCard => Self::DebitCard,
            PaymentMethod::CreditCard => Self::CreditCard,
            PaymentMethod::Giro => Self::Giro,
        }
    }
}

impl From<core::PaymentMethod> for PaymentMethod {
    fn from(method: core::PaymentMethod) -> Self {
        match method {
            core::PaymentMethod::Cash => Self::Cash,
            core::PaymentMethod::DebitCard => Self::DebitCard,
            core::PaymentMethod::CreditCard => Self::CreditCard,
            core::PaymentMethod::Giro => Self::Giro,
        }
    }
}

impl From<PaymentStatus> for core::PaymentStatus {
    fn from(status: PaymentStatus) -> Self {
        match status {
            PaymentStatus::Uncleared => Self::Uncleared,
            PaymentStatus::Cleared => Self::Cleared,
        }
    }
}

impl From<core::PaymentStatus> for PaymentStatus {
    fn from(status: core::PaymentStatus) -> Self {
        match status {
            core::PaymentStatus::Uncleared => Self::Uncleared,
            core::PaymentStatus::Cleared => Self::Cleared,
        }
    }
}

impl From<DocumentStatus> for core::DocumentStatus {
    fn from(status: DocumentStatus) -> Self {
        match status {
            DocumentStatus::New => Self::New,
            DocumentStatus::Active => Self::Active,
            DocumentStatus::Finished => Self::Finished,
            DocumentStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<core::DocumentStatus> for DocumentStatus {
    fn from(status: core::DocumentStatus) -> Self {
        match status {
            core::DocumentStatus::New => Self::New,
            core::DocumentStatus::Active => Self::Active,
            core::DocumentStatus::Finished => Self::Finished,
            core::DocumentStatus::Cancelled => Self::Cancelled,
        }
    }
}
