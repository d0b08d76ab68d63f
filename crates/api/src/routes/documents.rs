//! Document balance routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;

use crate::{
    AppState,
    error::{invalid_id, invalid_reference, payment_error_response},
    middleware::AuthUser,
};
use settla_core::payment::{DocumentKey, RefType};
use settla_db::DocumentRegistry;

/// Creates the document routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/documents/{ref_type}/{id}", get(get_balance))
}

/// GET `/documents/{ref_type}/{id}` - Totals reserved and cleared against a document.
async fn get_balance(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path((ref_type, token)): Path<(String, String)>,
) -> Response {
    let Some(ref_type) = RefType::parse(&ref_type) else {
        return invalid_reference("ref_type", "is not a known document type");
    };
    let ref_id = match state.codec.decode(&token) {
        Ok(id) => id,
        Err(e) => return invalid_id("id", &e),
    };

    let key = DocumentKey::new(ref_type, ref_id);
    match DocumentRegistry::balance(state.db.as_ref(), key).await {
        Ok(balance) => (
            StatusCode::OK,
            Json(json!({
                "ref_type": ref_type.as_str(),
                "id": token,
                "document_status": balance.document.status.as_str(),
                "total": balance.document.total.to_string(),
                "total_paid": balance.document.total_paid.to_string(),
                "reserved": balance.reserved.to_string(),
                "cleared": balance.cleared.to_string(),
                "remaining": balance.remaining.to_string(),
            })),
        )
            .into_response(),
        Err(e) => payment_error_response(&e),
    }
}
