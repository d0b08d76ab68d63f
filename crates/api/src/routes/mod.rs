//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth_middleware};

pub mod documents;
pub mod health;
pub mod payments;
pub mod returns;

use payments::{Expenses, Revenues};

/// Routes that require an authenticated user.
fn protected_routes() -> [Router<AppState>; 4] {
    [
        documents::routes(),
        payments::routes::<Expenses>(),
        payments::routes::<Revenues>(),
        returns::routes(),
    ]
}

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected = protected_routes()
        .into_iter()
        .fold(Router::new(), |router, routes| router.merge(routes))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new().merge(health::routes()).merge(protected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode, header::AUTHORIZATION},
    };
    use http_body_util::BodyExt;
    use sea_orm::DatabaseConnection;
    use settla_core::payment::DocumentLocks;
    use settla_shared::{JwtConfig, JwtService, types::Base64IdCodec};
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn state() -> AppState {
        AppState {
            db: Arc::new(DatabaseConnection::default()),
            jwt_service: Arc::new(JwtService::new(JwtConfig::default())),
            codec: Arc::new(Base64IdCodec),
            locks: DocumentLocks::new(),
        }
    }

    fn token(state: &AppState, role: &str) -> String {
        state
            .jwt_service
            .generate_access_token(Uuid::new_v4(), role)
            .unwrap()
    }

    async fn send(state: AppState, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = crate::create_router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health_reports_database_down() {
        let request = Request::get("/api/v1/health").body(Body::empty()).unwrap();
        let (status, json) = send(state(), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["database"], "down");
    }

    #[tokio::test]
    async fn test_payments_require_token() {
        for path in ["/api/v1/expenses", "/api/v1/revenues"] {
            let request = Request::get(path).body(Body::empty()).unwrap();
            let (status, json) = send(state(), request).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(json["error"], "missing_token");
        }
    }

    #[tokio::test]
    async fn test_unknown_role_is_rejected() {
        let state = state();
        let request = Request::get("/api/v1/expenses/abc")
            .header(AUTHORIZATION, format!("Bearer {}", token(&state, "auditor")))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(state, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_document_type_is_bad_request() {
        let state = state();
        let request = Request::get("/api/v1/documents/delivery_note/AAAAAAAAAAAAAAAAAAAAAA")
            .header(AUTHORIZATION, format!("Bearer {}", token(&state, "viewer")))
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(state, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "INVALID_REFERENCE");
        assert_eq!(json["fields"][0]["field"], "ref_type");
    }

    #[tokio::test]
    async fn test_malformed_id_is_bad_request() {
        let state = state();
        let request = Request::post("/api/v1/sales-returns/not-a-token!/cancel")
            .header(AUTHORIZATION, format!("Bearer {}", token(&state, "finance")))
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(state, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "INVALID_REFERENCE");
    }
}
