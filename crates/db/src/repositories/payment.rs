//! Payment ledger repository.
//!
//! Create, update, approve and delete run as one database transaction per
//! call. Row locks (`SELECT ... FOR UPDATE`) are always taken document
//! first, then payment, then order, then partner, and the document is
//! locked before any sum is read. An in-process [`DocumentLocks`] table queues
//! same-process callers before they take a connection.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::debug;
use uuid::Uuid;

use settla_core::payment::{
    Actor, ApprovalPlan, CascadePropagator, DocumentKey, DocumentLocks, PaymentError,
    PaymentInput, PaymentKind, PaymentSnapshot, PaymentStatus, RefType, ReconciliationService,
    ReservationMode, ValidatedPayment,
};
use settla_shared::types::{PageRequest, PageResponse, PaymentId};

use crate::entities::{payments, sea_orm_active_enums};

use super::registry::DocumentRegistry;

/// Filter options for listing payments.
#[derive(Debug, Clone, Default)]
pub struct PaymentFilter {
    /// Referenced document type.
    pub ref_type: Option<RefType>,
    /// Referenced document id.
    pub ref_id: Option<Uuid>,
    /// Uncleared or cleared.
    pub status: Option<PaymentStatus>,
}

pub(crate) fn db_err(e: DbErr) -> PaymentError {
    PaymentError::Database(e.to_string())
}

/// Converts a stored payment to the engine's view of it.
#[must_use]
pub fn payment_snapshot(model: &payments::Model) -> PaymentSnapshot {
    PaymentSnapshot {
        id: PaymentId::from_uuid(model.id),
        kind: model.kind.into(),
        key: DocumentKey::new(model.ref_type.into(), model.ref_id),
        amount: model.amount,
        status: model.document_status.into(),
        is_deleted: model.is_deleted,
    }
}

/// Payment ledger repository.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    db: DatabaseConnection,
    locks: DocumentLocks,
}

impl PaymentRepository {
    /// Creates a new payment repository sharing `locks` with other repositories.
    #[must_use]
    pub const fn new(db: DatabaseConnection, locks: DocumentLocks) -> Self {
        Self { db, locks }
    }

    /// Records a new uncleared payment and reserves its amount against the document.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The reference type is not allowed for `kind`, or bank fields do not fit the method
    /// - The document is missing, settled or cancelled
    /// - The amount would push reserved payments past the document total
    /// - A cashier receives against a sales invoice that already has receipts
    /// - Database operation fails
    pub async fn create(
        &self,
        kind: PaymentKind,
        input: PaymentInput,
        actor: Actor,
    ) -> Result<payments::Model, PaymentError> {
        let payment = ReconciliationService::validate(kind, &input)?;
        let _guard = self.locks.lock(payment.key).await;

        let txn = self.db.begin().await.map_err(db_err)?;

        let document = DocumentRegistry::read(&txn, payment.key, true)
            .await
            .map_err(db_err)?;
        let reserved = DocumentRegistry::sum_payments(&txn, payment.key, None)
            .await
            .map_err(db_err)?;

        let reservation = ReconciliationService::reserve(
            &payment,
            document.as_ref(),
            reserved,
            &actor,
            ReservationMode::Create,
        )?;

        if document
            .as_ref()
            .is_some_and(|d| reservation.changes_status(d.status))
        {
            DocumentRegistry::save_document(&txn, payment.key, reservation.document_status, None)
                .await
                .map_err(db_err)?;
        }

        let now = Utc::now().fixed_offset();
        let user = actor.user_id.into_inner();
        let model = payments::ActiveModel {
            id: Set(PaymentId::new().into_inner()),
            kind: Set(kind.into()),
            document_status: Set(sea_orm_active_enums::PaymentStatus::Uncleared),
            is_deleted: Set(false),
            created_by: Set(user),
            created_at: Set(now),
            ..Self::details(&payment, user)
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;

        debug!(
            payment_id = %model.id,
            document = %payment.key,
            reserved = %reservation.reserved_after,
            "Payment recorded"
        );
        Ok(model)
    }

    /// Updates an uncleared payment.
    ///
    /// The balance check counts every other payment against the document
    /// but not this payment's current amount.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The payment is missing, deleted, of another kind, or already cleared
    /// - Any create-time rule other than the cashier rule fails
    /// - Database operation fails
    pub async fn update(
        &self,
        kind: PaymentKind,
        id: PaymentId,
        input: PaymentInput,
        actor: Actor,
    ) -> Result<payments::Model, PaymentError> {
        let payment = ReconciliationService::validate(kind, &input)?;
        let current = self.get(kind, id).await?;
        let previous_key = payment_snapshot(&current).key;
        let _guards = self.locks.lock_many([previous_key, payment.key]).await;

        let txn = self.db.begin().await.map_err(db_err)?;
        let document = DocumentRegistry::read(&txn, payment.key, true)
            .await
            .map_err(db_err)?;
        let existing = Self::lock_payment(&txn, kind, id).await?;
        ReconciliationService::ensure_mutable(&payment_snapshot(&existing))?;

        let reserved = DocumentRegistry::sum_payments(&txn, payment.key, Some(id))
            .await
            .map_err(db_err)?;

        let reservation = ReconciliationService::reserve(
            &payment,
            document.as_ref(),
            reserved,
            &actor,
            ReservationMode::Update,
        )?;

        if document
            .as_ref()
            .is_some_and(|d| reservation.changes_status(d.status))
        {
            DocumentRegistry::save_document(&txn, payment.key, reservation.document_status, None)
                .await
                .map_err(db_err)?;
        }

        let mut active: payments::ActiveModel = existing.into();
        let details = Self::details(&payment, actor.user_id.into_inner());
        active.ref_type = details.ref_type;
        active.ref_id = details.ref_id;
        active.recognition_date = details.recognition_date;
        active.payment_method = details.payment_method;
        active.bank_number = details.bank_number;
        active.bank_name = details.bank_name;
        active.bank_holder = details.bank_holder;
        active.bank_account_id = details.bank_account_id;
        active.amount = details.amount;
        active.note = details.note;
        active.updated_by = details.updated_by;
        active.updated_at = details.updated_at;

        let updated = active.update(&txn).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        debug!(payment_id = %id, document = %payment.key, "Payment updated");
        Ok(updated)
    }

    /// Approves a payment and cascades its amount up the document chain.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The payment is missing, deleted or of another kind
    /// - The payment is already cleared
    /// - The document is missing or cancelled, or an invoice has no order or partner
    /// - Database operation fails
    pub async fn approve(
        &self,
        kind: PaymentKind,
        id: PaymentId,
        actor: Actor,
    ) -> Result<ApprovalPlan, PaymentError> {
        let key = payment_snapshot(&self.get(kind, id).await?).key;
        let _guard = self.locks.lock(key).await;

        let txn = self.db.begin().await.map_err(db_err)?;
        let document = DocumentRegistry::read(&txn, key, true)
            .await
            .map_err(db_err)?;
        let existing = Self::lock_payment(&txn, kind, id).await?;
        let payment = payment_snapshot(&existing);
        if payment.key != key {
            return Err(PaymentError::Internal(format!(
                "payment {id} moved to another document, retry"
            )));
        }

        let parents = DocumentRegistry::parents(&txn, payment.key, true)
            .await
            .map_err(db_err)?;
        let cleared_before = DocumentRegistry::sum_cleared_payments(&txn, payment.key)
            .await
            .map_err(db_err)?;

        let plan = CascadePropagator::plan_approval(
            &payment,
            document.as_ref(),
            cleared_before,
            parents.as_ref(),
        )?;

        Self::apply_approval(&txn, existing, &plan, actor).await?;
        txn.commit().await.map_err(db_err)?;

        debug!(
            payment_id = %id,
            document = %plan.key,
            document_status = %plan.document_status,
            cleared = %plan.cleared_after,
            "Payment approved"
        );
        Ok(plan)
    }

    async fn apply_approval(
        txn: &DatabaseTransaction,
        existing: payments::Model,
        plan: &ApprovalPlan,
        actor: Actor,
    ) -> Result<(), PaymentError> {
        let mut active: payments::ActiveModel = existing.into();
        active.document_status = Set(plan.payment_status.into());
        active.updated_by = Set(actor.user_id.into_inner());
        active.updated_at = Set(Utc::now().fixed_offset());
        active.update(txn).await.map_err(db_err)?;

        DocumentRegistry::save_document(
            txn,
            plan.key,
            plan.document_status,
            Some(plan.document_total_paid),
        )
        .await
        .map_err(db_err)?;

        if let (Some(order), Some(partner)) = (&plan.order, &plan.partner) {
            DocumentRegistry::save_order(txn, partner.kind, order)
                .await
                .map_err(db_err)?;
            DocumentRegistry::save_partner(txn, partner)
                .await
                .map_err(db_err)?;
        }
        Ok(())
    }

    /// Soft-deletes an uncleared payment.
    ///
    /// The document keeps its status; only future sums change.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The payment is missing, already deleted or of another kind
    /// - The payment is already cleared
    /// - Database operation fails
    pub async fn delete(
        &self,
        kind: PaymentKind,
        id: PaymentId,
        actor: Actor,
    ) -> Result<(), PaymentError> {
        let key = payment_snapshot(&self.get(kind, id).await?).key;
        let _guard = self.locks.lock(key).await;

        let txn = self.db.begin().await.map_err(db_err)?;
        let existing = Self::lock_payment(&txn, kind, id).await?;
        ReconciliationService::ensure_mutable(&payment_snapshot(&existing))?;

        let mut active: payments::ActiveModel = existing.into();
        active.is_deleted = Set(true);
        active.updated_by = Set(actor.user_id.into_inner());
        active.updated_at = Set(Utc::now().fixed_offset());
        active.update(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;

        debug!(payment_id = %id, document = %key, "Payment deleted");
        Ok(())
    }

    /// Gets a non-deleted payment of the given kind.
    ///
    /// # Errors
    ///
    /// Returns `PaymentNotFound` if the payment is missing, deleted or of another kind.
    pub async fn get(
        &self,
        kind: PaymentKind,
        id: PaymentId,
    ) -> Result<payments::Model, PaymentError> {
        payments::Entity::find_by_id(id.into_inner())
            .filter(payments::Column::Kind.eq(sea_orm_active_enums::PaymentKind::from(kind)))
            .filter(payments::Column::IsDeleted.eq(false))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(PaymentError::PaymentNotFound(id))
    }

    /// Lists non-deleted payments of a kind, newest recognition date first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        kind: PaymentKind,
        filter: PaymentFilter,
        page: PageRequest,
    ) -> Result<PageResponse<payments::Model>, PaymentError> {
        let page = page.normalized();

        let mut query = payments::Entity::find()
            .filter(payments::Column::Kind.eq(sea_orm_active_enums::PaymentKind::from(kind)))
            .filter(payments::Column::IsDeleted.eq(false));

        if let Some(ref_type) = filter.ref_type {
            query = query.filter(
                payments::Column::RefType.eq(sea_orm_active_enums::RefType::from(ref_type)),
            );
        }
        if let Some(ref_id) = filter.ref_id {
            query = query.filter(payments::Column::RefId.eq(ref_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(
                payments::Column::DocumentStatus
                    .eq(sea_orm_active_enums::PaymentStatus::from(status)),
            );
        }

        let total = query.clone().count(&self.db).await.map_err(db_err)?;

        let items = query
            .order_by_desc(payments::Column::RecognitionDate)
            .order_by_desc(payments::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(PageResponse::new(items, page.page, page.per_page, total))
    }

    /// Re-reads a payment under a row lock inside `txn`.
    async fn lock_payment(
        txn: &DatabaseTransaction,
        kind: PaymentKind,
        id: PaymentId,
    ) -> Result<payments::Model, PaymentError> {
        let model = payments::Entity::find_by_id(id.into_inner())
            .filter(payments::Column::Kind.eq(sea_orm_active_enums::PaymentKind::from(kind)))
            .lock_exclusive()
            .one(txn)
            .await
            .map_err(db_err)?
            .ok_or(PaymentError::PaymentNotFound(id))?;

        if model.is_deleted {
            return Err(PaymentError::PaymentNotFound(id));
        }
        Ok(model)
    }

    /// The columns shared by create and update.
    fn details(payment: &ValidatedPayment, user: Uuid) -> payments::ActiveModel {
        payments::ActiveModel {
            ref_type: Set(payment.key.ref_type.into()),
            ref_id: Set(payment.key.ref_id),
            recognition_date: Set(payment.recognition_date.fixed_offset()),
            payment_method: Set(payment.method.into()),
            bank_number: Set(payment.bank.bank_number.clone()),
            bank_name: Set(payment.bank.bank_name.clone()),
            bank_holder: Set(payment.bank.bank_holder.clone()),
            bank_account_id: Set(payment.bank.bank_account_id),
            amount: Set(payment.amount),
            note: Set(payment.note.clone()),
            updated_by: Set(user),
            updated_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        }
    }
}
