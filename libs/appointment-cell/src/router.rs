// libs/appointment-cell/src/router.rs
use axum::{
    Router,
    routing::get,
};

use crate::handlers;
use crate::services::SharedStore;

pub fn appointment_routes(store: SharedStore) -> Router {
    Router::new()
        .route("/", get(handlers::list_appointments).post(handlers::create_appointment))
        .route("/conflicts", get(handlers::check_conflicts))
        .route(
            "/{appointment_id}",
            get(handlers::get_appointment)
                .put(handlers::update_appointment)
                .delete(handlers::delete_appointment),
        )
        .with_state(store)
}
