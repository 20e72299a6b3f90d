//! snehband-server library
//!
//! HTTP service for the Snehband Pandharpur 2025 gathering: registration,
//! profile administration, CSV import, PDF export, confirmation e-mails and
//! venue check-in.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch, post};
use axum::{middleware, Router};
use snehband_common::config::AppConfig;
use snehband_common::export::FontSources;
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod pagination;
pub mod services;

pub use error::{ApiError, ApiResult};

use services::{ImageStore, Mailer};

/// Largest accepted photo
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
/// Largest accepted CSV upload
pub const MAX_IMPORT_BYTES: usize = 10 * 1024 * 1024;
/// Room for multipart boundaries and headers around the file
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub mailer: Arc<dyn Mailer>,
    pub images: Arc<dyn ImageStore>,
    pub fonts: Arc<FontSources>,
    /// Held for the duration of a CSV import
    pub import_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        config: AppConfig,
        mailer: Arc<dyn Mailer>,
        images: Arc<dyn ImageStore>,
        fonts: FontSources,
    ) -> Self {
        Self {
            db,
            config: Arc::new(config),
            mailer,
            images,
            fonts: Arc::new(fonts),
            import_lock: Arc::new(Mutex::new(())),
        }
    }
}

/// Build application router
///
/// Routes under the auth middleware require an identity asserted by the
/// sign-in proxy; handlers check roles themselves.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/me", get(api::users::me))
        .route("/api/stats", get(api::stats::get_stats))
        .route(
            "/api/profiles",
            get(api::profiles::list_profiles).delete(api::profiles::clear_profiles),
        )
        .route(
            "/api/profiles/import",
            post(api::import::import_profiles)
                .layer(DefaultBodyLimit::max(MAX_IMPORT_BYTES + MULTIPART_OVERHEAD)),
        )
        .route("/api/profiles/export.pdf", get(api::export::export_pdf))
        .route(
            "/api/profiles/:id",
            get(api::profiles::get_profile)
                .put(api::profiles::update_profile)
                .delete(api::profiles::delete_profile),
        )
        .route("/api/profiles/:id/status", patch(api::profiles::update_status))
        .route("/api/email/bulk", post(api::email::send_bulk))
        .route("/api/email/:id", post(api::email::send_one))
        .route("/api/checkin", post(api::checkin::check_in))
        .route("/api/users", get(api::users::list_users))
        .route("/api/users/:id/role", patch(api::users::update_role))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    let public = Router::new()
        .route("/api/buildinfo", get(api::get_build_info))
        .route("/api/register", post(api::register::register))
        .route(
            "/api/upload/image",
            post(api::upload::upload_image)
                .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + MULTIPART_OVERHEAD)),
        )
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
