//! Document registry.
//!
//! Resolves a (`ref_type`, `ref_id`) pair to one of the four document
//! tables, answers the two payment sum queries, and writes back the
//! status and running totals an approval plan asks for. Every function is
//! generic over the connection so it can run inside the caller's
//! transaction.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait,
    ActiveValue::{NotSet, Unchanged},
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect, Select, Set,
};
use uuid::Uuid;

use settla_core::payment::{
    DocumentKey, DocumentSnapshot, DocumentStatus, OrderSnapshot, OrderUpdate, ParentChain,
    PartnerKind, PartnerSnapshot, PartnerUpdate, PaymentError, RefType,
};
use settla_shared::types::PaymentId;

use crate::entities::{
    customers, payments, purchase_invoices, purchase_orders, purchase_returns, sales_invoices,
    sales_orders, sales_returns, sea_orm_active_enums, suppliers,
};

/// Adds `FOR UPDATE` when `lock` is set.
fn with_lock<E: EntityTrait>(query: Select<E>, lock: bool) -> Select<E> {
    if lock { query.lock_exclusive() } else { query }
}

/// A document together with what is reserved and cleared against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentBalance {
    /// The document.
    pub document: DocumentSnapshot,
    /// Sum of every live payment against the document.
    pub reserved: Decimal,
    /// Sum of cleared live payments.
    pub cleared: Decimal,
    /// Amount still open for new payments.
    pub remaining: Decimal,
}

/// Document registry over the four referenceable document tables.
pub struct DocumentRegistry;

impl DocumentRegistry {
    /// Reads a document, including soft-deleted ones.
    ///
    /// With `lock` set the row stays locked until the surrounding
    /// transaction ends.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn read<C: ConnectionTrait>(
        conn: &C,
        key: DocumentKey,
        lock: bool,
    ) -> Result<Option<DocumentSnapshot>, DbErr> {
        match key.ref_type {
            RefType::PurchaseInvoice => read_purchase_invoice(conn, key.ref_id, lock).await,
            RefType::SalesInvoice => read_sales_invoice(conn, key.ref_id, lock).await,
            RefType::PurchaseReturn => read_purchase_return(conn, key.ref_id, lock).await,
            RefType::SalesReturn => read_sales_return(conn, key.ref_id, lock).await,
        }
    }

    /// Resolves a live document.
    ///
    /// # Errors
    ///
    /// Returns `DocumentNotFound` if the document is missing or soft-deleted.
    pub async fn lookup<C: ConnectionTrait>(
        conn: &C,
        key: DocumentKey,
    ) -> Result<DocumentSnapshot, PaymentError> {
        Self::read(conn, key, false)
            .await
            .map_err(|e| PaymentError::Database(e.to_string()))?
            .filter(|d| !d.is_deleted)
            .ok_or(PaymentError::DocumentNotFound(key))
    }

    /// Looks up a live document and its payment sums.
    ///
    /// # Errors
    ///
    /// Returns `DocumentNotFound` if the document is missing or soft-deleted.
    pub async fn balance<C: ConnectionTrait>(
        conn: &C,
        key: DocumentKey,
    ) -> Result<DocumentBalance, PaymentError> {
        let document = Self::lookup(conn, key).await?;
        let reserved = Self::sum_payments(conn, key, None)
            .await
            .map_err(|e| PaymentError::Database(e.to_string()))?;
        let cleared = Self::sum_cleared_payments(conn, key)
            .await
            .map_err(|e| PaymentError::Database(e.to_string()))?;

        Ok(DocumentBalance {
            remaining: document.remaining(reserved),
            document,
            reserved,
            cleared,
        })
    }

    /// Reads the order and partner above an invoice, locking them in that
    /// order when `lock` is set. Returns `None` for returns.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn parents<C: ConnectionTrait>(
        conn: &C,
        key: DocumentKey,
        lock: bool,
    ) -> Result<Option<ParentChain>, DbErr> {
        match key.ref_type {
            RefType::PurchaseInvoice => purchase_parents(conn, key.ref_id, lock).await,
            RefType::SalesInvoice => sales_parents(conn, key.ref_id, lock).await,
            RefType::PurchaseReturn | RefType::SalesReturn => Ok(None),
        }
    }

    /// Sum of all non-deleted payments against a document, optionally
    /// leaving one payment out.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn sum_payments<C: ConnectionTrait>(
        conn: &C,
        key: DocumentKey,
        exclude: Option<PaymentId>,
    ) -> Result<Decimal, DbErr> {
        let mut query = Self::payments_of(key);
        if let Some(id) = exclude {
            query = query.filter(payments::Column::Id.ne(id.into_inner()));
        }
        Self::sum_amount(conn, query).await
    }

    /// Sum of cleared, non-deleted payments against a document.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn sum_cleared_payments<C: ConnectionTrait>(
        conn: &C,
        key: DocumentKey,
    ) -> Result<Decimal, DbErr> {
        let query = Self::payments_of(key).filter(
            payments::Column::DocumentStatus.eq(sea_orm_active_enums::PaymentStatus::Cleared),
        );
        Self::sum_amount(conn, query).await
    }

    fn payments_of(key: DocumentKey) -> Select<payments::Entity> {
        payments::Entity::find()
            .filter(payments::Column::RefType.eq(sea_orm_active_enums::RefType::from(key.ref_type)))
            .filter(payments::Column::RefId.eq(key.ref_id))
            .filter(payments::Column::IsDeleted.eq(false))
    }

    async fn sum_amount<C: ConnectionTrait>(
        conn: &C,
        query: Select<payments::Entity>,
    ) -> Result<Decimal, DbErr> {
        let total: Option<Option<Decimal>> = query
            .select_only()
            .column_as(payments::Column::Amount.sum(), "total")
            .into_tuple()
            .one(conn)
            .await?;
        Ok(total.flatten().unwrap_or(Decimal::ZERO))
    }

    /// Writes a document's status and, if given, its running paid total.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn save_document<C: ConnectionTrait>(
        conn: &C,
        key: DocumentKey,
        status: DocumentStatus,
        total_paid: Option<Decimal>,
    ) -> Result<(), DbErr> {
        let now = Utc::now().fixed_offset();
        let status = sea_orm_active_enums::DocumentStatus::from(status);
        let paid = match total_paid {
            Some(total) => Set(total),
            None => NotSet,
        };

        match key.ref_type {
            RefType::PurchaseInvoice => {
                purchase_invoices::ActiveModel {
                    id: Unchanged(key.ref_id),
                    document_status: Set(status),
                    total_paid: paid,
                    updated_at: Set(now),
                    ..Default::default()
                }
                .update(conn)
                .await?;
            }
            RefType::SalesInvoice => {
                sales_invoices::ActiveModel {
                    id: Unchanged(key.ref_id),
                    document_status: Set(status),
                    total_paid: paid,
                    updated_at: Set(now),
                    ..Default::default()
                }
                .update(conn)
                .await?;
            }
            RefType::PurchaseReturn => {
                purchase_returns::ActiveModel {
                    id: Unchanged(key.ref_id),
                    document_status: Set(status),
                    total_paid: paid,
                    updated_at: Set(now),
                    ..Default::default()
                }
                .update(conn)
                .await?;
            }
            RefType::SalesReturn => {
                sales_returns::ActiveModel {
                    id: Unchanged(key.ref_id),
                    document_status: Set(status),
                    total_paid: paid,
                    updated_at: Set(now),
                    ..Default::default()
                }
                .update(conn)
                .await?;
            }
        }
        Ok(())
    }

    /// Writes an order's running total and statuses.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn save_order<C: ConnectionTrait>(
        conn: &C,
        partner: PartnerKind,
        update: &OrderUpdate,
    ) -> Result<(), DbErr> {
        let now = Utc::now().fixed_offset();
        match partner {
            PartnerKind::Supplier => {
                purchase_orders::ActiveModel {
                    id: Unchanged(update.id),
                    total_paid: Set(update.total_paid),
                    invoice_status: Set(update.invoice_status.into()),
                    document_status: Set(update.document_status.into()),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .update(conn)
                .await?;
            }
            PartnerKind::Customer => {
                sales_orders::ActiveModel {
                    id: Unchanged(update.id),
                    total_paid: Set(update.total_paid),
                    invoice_status: Set(update.invoice_status.into()),
                    document_status: Set(update.document_status.into()),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .update(conn)
                .await?;
            }
        }
        Ok(())
    }

    /// Writes a supplier's credit or a customer's debt.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn save_partner<C: ConnectionTrait>(
        conn: &C,
        update: &PartnerUpdate,
    ) -> Result<(), DbErr> {
        let now = Utc::now().fixed_offset();
        match update.kind {
            PartnerKind::Supplier => {
                suppliers::ActiveModel {
                    id: Unchanged(update.id),
                    total_credit: Set(update.balance),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .update(conn)
                .await?;
            }
            PartnerKind::Customer => {
                customers::ActiveModel {
                    id: Unchanged(update.id),
                    total_debt: Set(update.balance),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .update(conn)
                .await?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Per-table resolvers
// ============================================================================

fn snapshot(
    ref_type: RefType,
    id: Uuid,
    status: sea_orm_active_enums::DocumentStatus,
    total: Decimal,
    total_paid: Decimal,
    total_revenued: Decimal,
    is_deleted: bool,
) -> DocumentSnapshot {
    DocumentSnapshot {
        key: DocumentKey::new(ref_type, id),
        status: status.into(),
        total,
        total_paid,
        total_revenued,
        is_deleted,
    }
}

async fn read_purchase_invoice<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
    lock: bool,
) -> Result<Option<DocumentSnapshot>, DbErr> {
    let row = with_lock(purchase_invoices::Entity::find_by_id(id), lock)
        .one(conn)
        .await?;
    Ok(row.map(|m| {
        snapshot(
            RefType::PurchaseInvoice,
            m.id,
            m.document_status,
            m.total_amount,
            m.total_paid,
            Decimal::ZERO,
            m.is_deleted,
        )
    }))
}

async fn read_sales_invoice<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
    lock: bool,
) -> Result<Option<DocumentSnapshot>, DbErr> {
    let row = with_lock(sales_invoices::Entity::find_by_id(id), lock)
        .one(conn)
        .await?;
    Ok(row.map(|m| {
        snapshot(
            RefType::SalesInvoice,
            m.id,
            m.document_status,
            m.total_amount,
            m.total_paid,
            m.total_revenued,
            m.is_deleted,
        )
    }))
}

async fn read_purchase_return<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
    lock: bool,
) -> Result<Option<DocumentSnapshot>, DbErr> {
    let row = with_lock(purchase_returns::Entity::find_by_id(id), lock)
        .one(conn)
        .await?;
    Ok(row.map(|m| {
        snapshot(
            RefType::PurchaseReturn,
            m.id,
            m.document_status,
            m.total_amount,
            m.total_paid,
            Decimal::ZERO,
            m.is_deleted,
        )
    }))
}

async fn read_sales_return<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
    lock: bool,
) -> Result<Option<DocumentSnapshot>, DbErr> {
    let row = with_lock(sales_returns::Entity::find_by_id(id), lock)
        .one(conn)
        .await?;
    Ok(row.map(|m| {
        snapshot(
            RefType::SalesReturn,
            m.id,
            m.document_status,
            m.total_amount,
            m.total_paid,
            Decimal::ZERO,
            m.is_deleted,
        )
    }))
}

async fn purchase_parents<C: ConnectionTrait>(
    conn: &C,
    invoice_id: Uuid,
    lock: bool,
) -> Result<Option<ParentChain>, DbErr> {
    let Some(invoice) = purchase_invoices::Entity::find_by_id(invoice_id)
        .one(conn)
        .await?
    else {
        return Ok(None);
    };
    let Some(order) = with_lock(purchase_orders::Entity::find_by_id(invoice.purchase_order_id), lock)
        .one(conn)
        .await?
    else {
        return Ok(None);
    };
    let Some(supplier) = with_lock(suppliers::Entity::find_by_id(order.supplier_id), lock)
        .one(conn)
        .await?
    else {
        return Ok(None);
    };

    Ok(Some(ParentChain {
        order: OrderSnapshot {
            id: order.id,
            total_charge: order.total_charge,
            total_paid: order.total_paid,
            invoice_status: order.invoice_status.into(),
            fulfillment_status: order.receiving_status.into(),
            document_status: order.document_status.into(),
        },
        partner: PartnerSnapshot {
            kind: PartnerKind::Supplier,
            id: supplier.id,
            balance: supplier.total_credit,
        },
    }))
}

async fn sales_parents<C: ConnectionTrait>(
    conn: &C,
    invoice_id: Uuid,
    lock: bool,
) -> Result<Option<ParentChain>, DbErr> {
    let Some(invoice) = sales_invoices::Entity::find_by_id(invoice_id)
        .one(conn)
        .await?
    else {
        return Ok(None);
    };
    let Some(order) = with_lock(sales_orders::Entity::find_by_id(invoice.sales_order_id), lock)
        .one(conn)
        .await?
    else {
        return Ok(None);
    };
    let Some(customer) = with_lock(customers::Entity::find_by_id(order.customer_id), lock)
        .one(conn)
        .await?
    else {
        return Ok(None);
    };

    Ok(Some(ParentChain {
        order: OrderSnapshot {
            id: order.id,
            total_charge: order.total_charge,
            total_paid: order.total_paid,
            invoice_status: order.invoice_status.into(),
            fulfillment_status: order.delivery_status.into(),
            document_status: order.document_status.into(),
        },
        partner: PartnerSnapshot {
            kind: PartnerKind::Customer,
            id: customer.id,
            balance: customer.total_debt,
        },
    }))
}
