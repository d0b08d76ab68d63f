//! Expense and revenue routes.
//!
//! Both payment kinds share one set of handlers; [`PaymentRoute`] supplies
//! the kind and the path prefix.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;
use tracing::info;

use crate::{
    AppState,
    error::{invalid_field, invalid_id, invalid_reference, payment_error_response},
    middleware::AuthUser,
};
use settla_core::payment::{
    ApprovalPlan, BankFieldsInput, PaymentInput, PaymentKind, PaymentMethod, PaymentStatus,
    RefType,
};
use settla_db::{PaymentFilter, PaymentRepository, entities::payments};
use settla_shared::types::{IdCodec, PageRequest, PaymentId};

/// A payment kind mounted under its own path.
pub trait PaymentRoute: Send + Sync + 'static {
    /// Kind handled by these routes.
    const KIND: PaymentKind;
    /// Collection path, e.g. `/expenses`.
    const PATH: &'static str;
}

/// Outgoing payments.
pub struct Expenses;

impl PaymentRoute for Expenses {
    const KIND: PaymentKind = PaymentKind::Expense;
    const PATH: &'static str = "/expenses";
}

/// Incoming payments.
pub struct Revenues;

impl PaymentRoute for Revenues {
    const KIND: PaymentKind = PaymentKind::Revenue;
    const PATH: &'static str = "/revenues";
}

/// Creates the routes for one payment kind.
pub fn routes<K: PaymentRoute>() -> Router<AppState> {
    let item = format!("{}/{{id}}", K::PATH);
    let approve = format!("{}/{{id}}/approve", K::PATH);

    Router::new()
        .route(K::PATH, get(list_payments::<K>).post(create_payment::<K>))
        .route(
            &item,
            get(get_payment::<K>)
                .put(update_payment::<K>)
                .delete(delete_payment::<K>),
        )
        .route(&approve, post(approve_payment::<K>))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing payments.
#[derive(Debug, Deserialize)]
pub struct ListPaymentsQuery {
    /// Filter by referenced document type.
    pub ref_type: Option<String>,
    /// Filter by referenced document id (encoded).
    pub ref_id: Option<String>,
    /// Filter by `uncleared` or `cleared`.
    pub status: Option<String>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size (default: 20, max: 100).
    pub per_page: Option<u32>,
}

/// Request body for creating or updating a payment.
#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    /// Referenced document type.
    pub ref_type: String,
    /// Referenced document id (encoded).
    pub ref_id: String,
    /// Date the payment is recognised.
    pub recognition_date: DateTime<Utc>,
    /// `cash`, `debit_card`, `credit_card` or `giro`.
    pub payment_method: String,
    /// Bank account number.
    pub bank_number: Option<String>,
    /// Bank name.
    pub bank_name: Option<String>,
    /// Account holder name.
    pub bank_holder: Option<String>,
    /// Giro number.
    pub giro_number: Option<String>,
    /// Company bank account (encoded).
    pub bank_account_id: Option<String>,
    /// Decimal amount as a string.
    pub amount: String,
    /// Free-text note.
    pub note: Option<String>,
}

impl PaymentRequest {
    /// Parses and decodes the request into engine input.
    fn into_input(self, codec: &dyn IdCodec) -> Result<PaymentInput, Response> {
        let ref_type = RefType::parse(&self.ref_type)
            .ok_or_else(|| invalid_reference("ref_type", "is not a known document type"))?;
        let ref_id = codec
            .decode(&self.ref_id)
            .map_err(|e| invalid_id("ref_id", &e))?;
        let method = PaymentMethod::parse(&self.payment_method)
            .ok_or_else(|| invalid_field("payment_method", "is not a known payment method"))?;
        let bank_account_id = self
            .bank_account_id
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|token| codec.decode(token))
            .transpose()
            .map_err(|e| invalid_id("bank_account_id", &e))?;
        let amount = Decimal::from_str(self.amount.trim())
            .map_err(|_| invalid_field("amount", "is not a valid decimal"))?;

        Ok(PaymentInput {
            ref_type,
            ref_id,
            recognition_date: self.recognition_date,
            method,
            fields: BankFieldsInput {
                bank_number: self.bank_number,
                bank_name: self.bank_name,
                bank_holder: self.bank_holder,
                giro_number: self.giro_number,
                bank_account_id,
            },
            amount,
            note: self.note,
        })
    }
}

/// Response for a payment.
#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    /// Payment ID (encoded).
    pub id: String,
    /// `expense` or `revenue`.
    pub kind: String,
    /// Referenced document type.
    pub ref_type: String,
    /// Referenced document id (encoded).
    pub ref_id: String,
    /// Recognition date.
    pub recognition_date: String,
    /// Payment method.
    pub payment_method: String,
    /// Bank account number.
    pub bank_number: Option<String>,
    /// Bank name.
    pub bank_name: Option<String>,
    /// Account holder name.
    pub bank_holder: Option<String>,
    /// Company bank account (encoded).
    pub bank_account_id: Option<String>,
    /// Amount.
    pub amount: String,
    /// Note.
    pub note: Option<String>,
    /// `uncleared` or `cleared`.
    pub document_status: String,
    /// Created by user ID.
    pub created_by: String,
    /// Created at timestamp.
    pub created_at: String,
    /// Last updated by user ID.
    pub updated_by: String,
    /// Updated at timestamp.
    pub updated_at: String,
}

impl PaymentResponse {
    fn from_model(model: &payments::Model, codec: &dyn IdCodec) -> Self {
        Self {
            id: codec.encode(model.id),
            kind: PaymentKind::from(model.kind).to_string(),
            ref_type: RefType::from(model.ref_type).to_string(),
            ref_id: codec.encode(model.ref_id),
            recognition_date: model.recognition_date.to_rfc3339(),
            payment_method: PaymentMethod::from(model.payment_method).to_string(),
            bank_number: model.bank_number.clone(),
            bank_name: model.bank_name.clone(),
            bank_holder: model.bank_holder.clone(),
            bank_account_id: model.bank_account_id.map(|id| codec.encode(id)),
            amount: model.amount.to_string(),
            note: model.note.clone(),
            document_status: PaymentStatus::from(model.document_status).to_string(),
            created_by: codec.encode(model.created_by),
            created_at: model.created_at.to_rfc3339(),
            updated_by: codec.encode(model.updated_by),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}

fn approval_json(plan: &ApprovalPlan, codec: &dyn IdCodec) -> serde_json::Value {
    json!({
        "id": codec.encode(plan.payment_id.into_inner()),
        "document_status": plan.payment_status.as_str(),
        "document": {
            "ref_type": plan.key.ref_type.as_str(),
            "ref_id": codec.encode(plan.key.ref_id),
            "document_status": plan.document_status.as_str(),
            "total_paid": plan.document_total_paid.to_string(),
            "cleared": plan.cleared_after.to_string(),
        },
        "order": plan.order.as_ref().map(|o| json!({
            "id": codec.encode(o.id),
            "total_paid": o.total_paid.to_string(),
            "invoice_status": o.invoice_status.as_str(),
            "document_status": o.document_status.as_str(),
        })),
        "partner": plan.partner.as_ref().map(|p| json!({
            "id": codec.encode(p.id),
            "balance": p.balance.to_string(),
        })),
    })
}

// ============================================================================
// Route Handlers
// ============================================================================

fn repository(state: &AppState) -> PaymentRepository {
    PaymentRepository::new((*state.db).clone(), state.locks.clone())
}

fn decode_payment_id(state: &AppState, token: &str) -> Result<PaymentId, Response> {
    state
        .codec
        .decode(token)
        .map(PaymentId::from_uuid)
        .map_err(|e| invalid_id("id", &e))
}

/// GET `{path}` - List payments with filters.
async fn list_payments<K: PaymentRoute>(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<ListPaymentsQuery>,
) -> Response {
    let ref_type = match query.ref_type.as_deref().map(RefType::parse) {
        None => None,
        Some(Some(t)) => Some(t),
        Some(None) => return invalid_reference("ref_type", "is not a known document type"),
    };
    let ref_id = match query.ref_id.as_deref().map(|t| state.codec.decode(t)) {
        None => None,
        Some(Ok(id)) => Some(id),
        Some(Err(e)) => return invalid_id("ref_id", &e),
    };
    let status = match query.status.as_deref().map(PaymentStatus::parse) {
        None => None,
        Some(Some(s)) => Some(s),
        Some(None) => return invalid_field("status", "must be uncleared or cleared"),
    };

    let defaults = PageRequest::default();
    let page = PageRequest {
        page: query.page.unwrap_or(defaults.page),
        per_page: query.per_page.unwrap_or(defaults.per_page),
    };

    let filter = PaymentFilter {
        ref_type,
        ref_id,
        status,
    };

    match repository(&state).list(K::KIND, filter, page).await {
        Ok(result) => {
            let codec = state.codec.as_ref();
            let result = result.map(|m| PaymentResponse::from_model(&m, codec));
            (StatusCode::OK, Json(result)).into_response()
        }
        Err(e) => payment_error_response(&e),
    }
}

/// POST `{path}` - Record a payment.
async fn create_payment<K: PaymentRoute>(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<PaymentRequest>,
) -> Response {
    let input = match payload.into_input(state.codec.as_ref()) {
        Ok(input) => input,
        Err(response) => return response,
    };

    match repository(&state).create(K::KIND, input, auth.actor()).await {
        Ok(model) => {
            info!(
                payment_id = %model.id,
                kind = K::KIND.as_str(),
                user_id = %auth.user_id(),
                "Payment created"
            );
            (
                StatusCode::CREATED,
                Json(PaymentResponse::from_model(&model, state.codec.as_ref())),
            )
                .into_response()
        }
        Err(e) => payment_error_response(&e),
    }
}

/// GET `{path}/{id}` - Get one payment.
async fn get_payment<K: PaymentRoute>(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Response {
    let id = match decode_payment_id(&state, &id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match repository(&state).get(K::KIND, id).await {
        Ok(model) => (
            StatusCode::OK,
            Json(PaymentResponse::from_model(&model, state.codec.as_ref())),
        )
            .into_response(),
        Err(e) => payment_error_response(&e),
    }
}

/// PUT `{path}/{id}` - Update an uncleared payment.
async fn update_payment<K: PaymentRoute>(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<PaymentRequest>,
) -> Response {
    let id = match decode_payment_id(&state, &id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let input = match payload.into_input(state.codec.as_ref()) {
        Ok(input) => input,
        Err(response) => return response,
    };

    match repository(&state)
        .update(K::KIND, id, input, auth.actor())
        .await
    {
        Ok(model) => {
            info!(payment_id = %id, kind = K::KIND.as_str(), "Payment updated");
            (
                StatusCode::OK,
                Json(PaymentResponse::from_model(&model, state.codec.as_ref())),
            )
                .into_response()
        }
        Err(e) => payment_error_response(&e),
    }
}

/// DELETE `{path}/{id}` - Soft-delete an uncleared payment.
async fn delete_payment<K: PaymentRoute>(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Response {
    let id = match decode_payment_id(&state, &id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match repository(&state).delete(K::KIND, id, auth.actor()).await {
        Ok(()) => {
            info!(payment_id = %id, kind = K::KIND.as_str(), "Payment deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => payment_error_response(&e),
    }
}

/// POST `{path}/{id}/approve` - Clear a payment and cascade it.
async fn approve_payment<K: PaymentRoute>(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Response {
    let id = match decode_payment_id(&state, &id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match repository(&state).approve(K::KIND, id, auth.actor()).await {
        Ok(plan) => {
            info!(
                payment_id = %id,
                kind = K::KIND.as_str(),
                document = %plan.key,
                document_status = %plan.document_status,
                "Payment approved"
            );
            (
                StatusCode::OK,
                Json(approval_json(&plan, state.codec.as_ref())),
            )
                .into_response()
        }
        Err(e) => payment_error_response(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use settla_shared::types::{Base64IdCodec, PlainIdCodec};
    use uuid::Uuid;

    fn request(codec: &dyn IdCodec, ref_id: Uuid) -> PaymentRequest {
        PaymentRequest {
            ref_type: "purchase_invoice".to_string(),
            ref_id: codec.encode(ref_id),
            recognition_date: Utc::now(),
            payment_method: "debit_card".to_string(),
            bank_number: Some("1234567890".to_string()),
            bank_name: Some("BCA".to_string()),
            bank_holder: Some("PT Sumber Makmur".to_string()),
            giro_number: None,
            bank_account_id: Some(String::new()),
            amount: "250.50".to_string(),
            note: None,
        }
    }

    #[test]
    fn test_into_input_decodes_reference() {
        let ref_id = Uuid::new_v4();
        let input = request(&Base64IdCodec, ref_id)
            .into_input(&Base64IdCodec)
            .unwrap();

        assert_eq!(input.ref_type, RefType::PurchaseInvoice);
        assert_eq!(input.ref_id, ref_id);
        assert_eq!(input.method, PaymentMethod::DebitCard);
        assert_eq!(input.amount, dec!(250.50));
        assert_eq!(input.fields.bank_account_id, None);
    }

    #[test]
    fn test_into_input_rejects_bad_fields() {
        let mut bad_type = request(&PlainIdCodec, Uuid::new_v4());
        bad_type.ref_type = "delivery_note".to_string();
        let response = bad_type.into_input(&PlainIdCodec).unwrap_err();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bad_id = request(&PlainIdCodec, Uuid::new_v4());
        let response = bad_id.into_input(&Base64IdCodec).unwrap_err();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let mut bad_amount = request(&PlainIdCodec, Uuid::new_v4());
        bad_amount.amount = "12,50".to_string();
        let response = bad_amount.into_input(&PlainIdCodec).unwrap_err();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
