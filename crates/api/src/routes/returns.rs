//! Return cancellation routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::json;
use tracing::info;

use crate::{
    AppState,
    error::{invalid_id, payment_error_response},
    middleware::AuthUser,
};
use settla_core::payment::{DocumentKey, RefType};
use settla_db::ReturnRepository;

/// Creates the return cancellation routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/purchase-returns/{id}/cancel", post(cancel_purchase_return))
        .route("/sales-returns/{id}/cancel", post(cancel_sales_return))
}

/// POST `/purchase-returns/{id}/cancel`
async fn cancel_purchase_return(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Response {
    cancel_return(&state, &auth, RefType::PurchaseReturn, &id).await
}

/// POST `/sales-returns/{id}/cancel`
async fn cancel_sales_return(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Response {
    cancel_return(&state, &auth, RefType::SalesReturn, &id).await
}

async fn cancel_return(
    state: &AppState,
    auth: &AuthUser,
    ref_type: RefType,
    token: &str,
) -> Response {
    let ref_id = match state.codec.decode(token) {
        Ok(id) => id,
        Err(e) => return invalid_id("id", &e),
    };
    let key = DocumentKey::new(ref_type, ref_id);

    let repo = ReturnRepository::new((*state.db).clone(), state.locks.clone());
    match repo.cancel(key, auth.actor()).await {
        Ok(plan) => {
            info!(
                document = %key,
                deleted_payments = plan.deleted_payments.len(),
                user_id = %auth.user_id(),
                "Return cancelled"
            );
            let deleted: Vec<String> = plan
                .deleted_payments
                .iter()
                .map(|id| state.codec.encode(id.into_inner()))
                .collect();
            (
                StatusCode::OK,
                Json(json!({
                    "ref_type": key.ref_type.as_str(),
                    "id": token,
                    "document_status": plan.document_status.as_str(),
                    "payment_kind": plan.payment_kind.as_str(),
                    "deleted_payments": deleted
                })),
            )
                .into_response()
        }
        Err(e) => payment_error_response(&e),
    }
}
