//! Defines routes for image ingestion, listing and media download.
//!
//! ## Structure
//! - **API endpoints**
//!   - `POST /api/images`: multipart upload (`title`, `description`, `image`)
//!   - `GET  /api/images`: list every image, newest first
//!
//! - **Media endpoints**
//!   - `GET /media/{*object_id}`: download a stored binary
//!
//! - **Probes**
//!   - `GET /healthz`, `GET /readyz`
//!
//! The wildcard `*object_id` covers folder-qualified ids like `page-img/4f1c….png`.

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        media_handlers::{get_media, list_images, upload_image},
    },
    state::AppState,
};
use axum::{Router, extract::DefaultBodyLimit, routing::get};

/// Build and return the router for all routes.
///
/// The router carries shared state (`AppState`) to all handlers. Request
/// bodies above `max_upload_bytes` are refused with 413.
pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/api/images", get(list_images).post(upload_image))
        .route("/media/{*object_id}", get(get_media))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}
