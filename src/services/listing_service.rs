//! ListingService: read-only view over committed media, newest first.

use crate::{
    models::media_asset::MediaAsset,
    services::metadata_store::{MetadataError, MetadataStore},
};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ListingError {
    #[error("metadata store unavailable: {0}")]
    StoreUnavailable(#[source] MetadataError),
}

#[derive(Clone)]
pub struct ListingService {
    metadata: Arc<dyn MetadataStore>,
}

impl ListingService {
    pub fn new(metadata: Arc<dyn MetadataStore>) -> Self {
        Self { metadata }
    }

    /// Every record, ordered by `created_at` descending.
    ///
    /// All or nothing: a store failure yields no partial list. Order among
    /// records sharing a timestamp is whatever the store returns.
    pub async fn list_recent(&self) -> Result<Vec<MediaAsset>, ListingError> {
        let assets = self
            .metadata
            .scan_all_ordered_by_created_desc()
            .await
            .map_err(ListingError::StoreUnavailable)?;
        debug!(count = assets.len(), "listed media assets");
        Ok(assets)
    }
}
