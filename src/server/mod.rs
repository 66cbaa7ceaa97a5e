//! HTTP surface of the checklist backend.
//!
//! # Endpoints
//!
//! Public:
//! - `GET /`, `GET /health`
//! - `POST /auth/signup`, `POST /auth/login`
//!
//! Bearer token required:
//! - `GET /auth/me`
//! - `GET|POST /checklists`
//! - `GET|PUT|DELETE /checklists/{id}`
//! - `PUT /checklists/{id}/items`: replace the checklist's items

pub mod error;
mod handlers;
mod middleware;

pub use error::ApiError;
pub use middleware::AuthUser;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::AuthService;
use crate::checklists::ChecklistLocks;
use crate::store::SharedStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub auth: AuthService,
    /// Present when item reconciliation is serialized per checklist.
    pub locks: Option<Arc<ChecklistLocks>>,
}

impl AppState {
    pub fn new(store: SharedStore, auth: AuthService, serialize_reconciliation: bool) -> Self {
        Self {
            store,
            auth,
            locks: serialize_reconciliation.then(|| Arc::new(ChecklistLocks::new())),
        }
    }
}

/// Builds the full application router.
pub fn router(state: AppState, allowed_origins: &[String]) -> Router {
    // Public routes (no auth)
    let public_routes = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/auth/signup", post(handlers::signup))
        .route("/auth/login", post(handlers::login));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/auth/me", get(handlers::me))
        .route(
            "/checklists",
            get(handlers::list_checklists).post(handlers::create_checklist),
        )
        .route(
            "/checklists/{id}",
            get(handlers::get_checklist)
                .put(handlers::update_checklist)
                .delete(handlers::delete_checklist),
        )
        .route("/checklists/{id}/items", put(handlers::reconcile_items))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
}

/// CORS for the web client. A `"*"` entry allows any origin without
/// credentials; explicit origins get credentials.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let is_wildcard = origins.iter().any(|o| o == "*");

    let layer = CorsLayer::new().max_age(Duration::from_secs(3600));

    if is_wildcard {
        if origins.len() > 1 {
            tracing::warn!("CORS origin list contains \"*\"; allowing any origin");
        }
        return layer
            .allow_origin(AllowOrigin::any())
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    layer
        .allow_origin(AllowOrigin::list(allowed))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
}
