use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use serde_json::json;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::{
    handler::properties::{
        create_property, edit_property, get_moderation_queue, get_status_history,
        list_property_images, moderate_property, reorder_property_images,
        search_public_properties, upload_property_images,
    },
    middleware::auth,
    AppState,
};

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running"
    }))
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/properties/public", get(search_public_properties))
        .route("/properties/:property_id/images", get(list_property_images));

    let protected_routes = Router::new()
        .route("/properties", post(create_property))
        .route("/properties/:property_id", patch(edit_property))
        .route("/properties/moderation/pending", get(get_moderation_queue))
        .route("/properties/:property_id/moderation", patch(moderate_property))
        .route("/properties/:property_id/status-history", get(get_status_history))
        .route("/properties/:property_id/images", post(upload_property_images))
        // Large enough for a full batch of images; per-file limits are
        // enforced in the handler so oversized files get a field error.
        .layer(DefaultBodyLimit::max(100 * 1024 * 1024))
        .route("/properties/:property_id/images/order", patch(reorder_property_images))
        .layer(middleware::from_fn(auth));

    let uploads_dir = Path::new(&app_state.env.content_root).join("uploads");

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state))
}
