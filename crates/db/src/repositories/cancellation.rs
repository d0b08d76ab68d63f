//! Return cancellation repository.

use chrono::Utc;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect, TransactionTrait,
    sea_query::Expr,
};
use tracing::debug;

use settla_core::payment::{
    Actor, CancellationPlan, DocumentKey, DocumentLocks, PaymentError, plan_cancellation,
};

use crate::entities::{payments, sea_orm_active_enums};

use super::payment::{db_err, payment_snapshot};
use super::registry::DocumentRegistry;

/// Cancels purchase and sales returns.
#[derive(Debug, Clone)]
pub struct ReturnRepository {
    db: DatabaseConnection,
    locks: DocumentLocks,
}

impl ReturnRepository {
    /// Creates a new return repository sharing `locks` with the payment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, locks: DocumentLocks) -> Self {
        Self { db, locks }
    }

    /// Cancels a return and soft-deletes the payments recorded against it.
    ///
    /// Runs under the same document lock as payment creation, so no payment
    /// can be recorded against a return that is being cancelled.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `key` does not name a return
    /// - The return is missing, finished or already cancelled
    /// - Database operation fails
    pub async fn cancel(
        &self,
        key: DocumentKey,
        actor: Actor,
    ) -> Result<CancellationPlan, PaymentError> {
        let _guard = self.locks.lock(key).await;
        let txn = self.db.begin().await.map_err(db_err)?;

        let document = if key.ref_type.is_return() {
            DocumentRegistry::read(&txn, key, true)
                .await
                .map_err(db_err)?
        } else {
            None
        };

        let kind = sea_orm_active_enums::PaymentKind::from(key.ref_type.payment_kind());
        let linked: Vec<_> = payments::Entity::find()
            .filter(payments::Column::Kind.eq(kind))
            .filter(payments::Column::RefType.eq(sea_orm_active_enums::RefType::from(key.ref_type)))
            .filter(payments::Column::RefId.eq(key.ref_id))
            .filter(payments::Column::IsDeleted.eq(false))
            .lock_exclusive()
            .all(&txn)
            .await
            .map_err(db_err)?
            .iter()
            .map(payment_snapshot)
            .collect();

        let plan = plan_cancellation(key, document.as_ref(), &linked)?;

        DocumentRegistry::save_document(&txn, key, plan.document_status, None)
            .await
            .map_err(db_err)?;

        if !plan.deleted_payments.is_empty() {
            payments::Entity::update_many()
                .col_expr(payments::Column::IsDeleted, Expr::value(true))
                .col_expr(
                    payments::Column::UpdatedBy,
                    Expr::value(actor.user_id.into_inner()),
                )
                .col_expr(
                    payments::Column::UpdatedAt,
                    Expr::value(Utc::now().fixed_offset()),
                )
                .filter(
                    payments::Column::Id
                        .is_in(plan.deleted_payments.iter().map(|id| id.into_inner())),
                )
                .exec(&txn)
                .await
                .map_err(db_err)?;
        }

        txn.commit().await.map_err(db_err)?;

        debug!(
            document = %key,
            deleted_payments = plan.deleted_payments.len(),
            "Return cancelled"
        );
        Ok(plan)
    }
}
