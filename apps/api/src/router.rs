use axum::{
    Router,
    routing::get,
};

use appointment_cell::{appointment_routes, SharedStore};

pub fn create_router(store: SharedStore) -> Router {
    Router::new()
        .route("/", get(|| async { "Appointment API is running!" }))
        .nest("/appointments", appointment_routes(store))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use appointment_cell::InMemoryAppointmentStore;

    use super::*;

    #[tokio::test]
    async fn root_reports_liveness() {
        let app = create_router(Arc::new(InMemoryAppointmentStore::new()));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn appointments_are_mounted_under_their_prefix() {
        let app = create_router(Arc::new(InMemoryAppointmentStore::new()));

        let response = app
            .oneshot(Request::builder().uri("/appointments").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, json!([]));
    }
}
