//! UploadCoordinator: runs one ingestion: object-store upload first, then
//! the metadata insert, never the other way round.
//!
//! There is no shared transaction between the two stores. If the insert
//! fails after the upload succeeded the binary stays behind unreferenced
//! (an orphan); it is logged with its object id and not deleted.

use crate::{
    models::media_asset::{ImagePayload, MediaAsset, NewMediaAsset},
    services::{
        metadata_store::{MetadataError, MetadataStore},
        object_store::{ObjectStoreClient, ObjectStoreError, PlacementHint},
    },
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum IngestError {
    /// Caller fault. Nothing was written anywhere.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The object store refused or failed the upload. No metadata was written.
    #[error("object store upload failed: {0}")]
    StoreUploadFailed(#[source] ObjectStoreError),

    /// The binary was stored but its metadata record was not.
    #[error("metadata commit failed, object `{storage_object_id}` left orphaned: {source}")]
    MetadataCommitFailed {
        storage_object_id: String,
        #[source]
        source: MetadataError,
    },
}

pub type IngestResult<T> = Result<T, IngestError>;

/// One logical upload request.
#[derive(Clone, Debug, Default)]
pub struct IngestRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<ImagePayload>,
}

/// Orchestrates ingestion against injected store clients.
///
/// Holds only immutable, shared handles; clone it into each request.
#[derive(Clone)]
pub struct UploadCoordinator {
    objects: Arc<dyn ObjectStoreClient>,
    metadata: Arc<dyn MetadataStore>,
    placement: PlacementHint,
}

impl UploadCoordinator {
    pub fn new(
        objects: Arc<dyn ObjectStoreClient>,
        metadata: Arc<dyn MetadataStore>,
        placement: PlacementHint,
    ) -> Self {
        Self {
            objects,
            metadata,
            placement,
        }
    }

    /// Upload the image, then record it.
    ///
    /// A missing image, or a file part carrying zero bytes, is rejected
    /// before either store is touched. Not idempotent: identical retries
    /// produce a second object and a second record.
    pub async fn ingest(&self, request: IngestRequest) -> IngestResult<MediaAsset> {
        let IngestRequest {
            title,
            description,
            image,
        } = request;

        let image = match image {
            Some(image) if !image.is_empty() => image,
            Some(_) => {
                return Err(IngestError::InvalidRequest(
                    "image file is empty".to_string(),
                ));
            }
            None => {
                return Err(IngestError::InvalidRequest(
                    "no image file provided".to_string(),
                ));
            }
        };

        let ImagePayload {
            filename,
            content_type: declared_type,
            bytes,
        } = image;
        let stored = self
            .objects
            .upload(bytes, &self.placement)
            .await
            .map_err(IngestError::StoreUploadFailed)?;

        info!(
            backend = self.objects.backend_name(),
            object_id = %stored.object_id,
            content_type = %stored.content_type,
            declared_type = ?declared_type,
            filename = ?filename,
            size = stored.size_bytes,
            "image stored"
        );

        let record = NewMediaAsset {
            title,
            description,
            storage_url: stored.url,
            storage_object_id: stored.object_id,
        };
        let storage_object_id = record.storage_object_id.clone();

        match self.metadata.insert(record).await {
            Ok(asset) => {
                info!(id = %asset.id, object_id = %asset.storage_object_id, "media asset committed");
                Ok(asset)
            }
            Err(source) => {
                warn!(
                    object_id = %storage_object_id,
                    error = %source,
                    "metadata insert failed after upload; object is orphaned"
                );
                Err(IngestError::MetadataCommitFailed {
                    storage_object_id,
                    source,
                })
            }
        }
    }
}
