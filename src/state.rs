//! Shared application state handed to every handler.

use crate::services::{
    listing_service::ListingService,
    local_object_store::LocalObjectStore,
    metadata_store::SqliteMetadataStore,
    object_store::PlacementHint,
    upload_coordinator::UploadCoordinator,
};
use std::sync::Arc;

/// Immutable handles built once at startup and cloned into each request.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: UploadCoordinator,
    pub listing: ListingService,

    /// Concrete store, also used to serve `/media` and the readiness probe.
    pub objects: Arc<LocalObjectStore>,
    pub metadata: Arc<SqliteMetadataStore>,
}

impl AppState {
    /// Wire the coordinator and listing service to the concrete stores.
    pub fn new(
        objects: Arc<LocalObjectStore>,
        metadata: Arc<SqliteMetadataStore>,
        placement: PlacementHint,
    ) -> Self {
        Self {
            coordinator: UploadCoordinator::new(objects.clone(), metadata.clone(), placement),
            listing: ListingService::new(metadata.clone()),
            objects,
            metadata,
        }
    }
}
