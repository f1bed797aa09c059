use std::path::Path;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{
    api_types::{HealthResponse, RootResponse},
    state::AppState,
};

pub mod images;
pub mod imports;

/// Liveness probe used by clients before they try anything else.
async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Image Import API is running".to_owned(),
    })
}

async fn health(State(app_state): State<AppState>) -> Json<HealthResponse> {
    let database = if app_state.db.ping().await {
        "connected"
    } else {
        "disconnected"
    };

    Json(HealthResponse {
        status: "healthy".to_owned(),
        database: database.to_owned(),
    })
}

/// Main router for the application, with all API and health endpoints attached
pub fn app_router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        //
        // Catalog
        //
        .route("/images", get(images::get_images))
        .route("/add-test-images", post(images::add_test_images))
        //
        // Import flow
        //
        .route("/import/google-drive", post(imports::import_google_drive))
        .route("/imports", get(imports::import_job_status_all))
        .route("/imports/:job_id", get(imports::import_job_status))
}

/// The complete service: API routes, staged files (when a storage directory is configured),
/// permissive CORS and request tracing.
pub fn app(state: AppState, storage_dir: Option<&Path>) -> Router {
    let mut router = app_router();
    if let Some(dir) = storage_dir {
        router = router.nest_service("/files", ServeDir::new(dir));
    }

    router
        //
        // Enable all of the CORS flags
        //
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
