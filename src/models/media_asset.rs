//! Represents an uploaded image: a metadata record pointing at a binary held
//! by the object store.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A committed media record.
///
/// Only a `MetadataStore` hands these out: the record exists once the binary
/// has been accepted by the object store and the metadata insert succeeded.
/// Records are never mutated after insert.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MediaAsset {
    /// Identity assigned by the metadata store on insert.
    pub id: Uuid,

    /// Optional display title, stored verbatim.
    pub title: Option<String>,

    /// Optional display description, stored verbatim.
    pub description: Option<String>,

    /// Canonical retrieval address of the binary in the object store.
    pub storage_url: String,

    /// Opaque object-store handle, kept for future management of the binary.
    pub storage_object_id: String,

    /// Insert time, assigned by the metadata store.
    pub created_at: DateTime<Utc>,
}

/// The fields of a record before the metadata store assigns identity and
/// creation time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewMediaAsset {
    pub title: Option<String>,
    pub description: Option<String>,
    pub storage_url: String,
    pub storage_object_id: String,
}

/// A file field staged fully in memory.
#[derive(Clone, Debug)]
pub struct ImagePayload {
    /// Filename the client sent with the part, if any.
    pub filename: Option<String>,

    /// Content type the client declared for the part, if any.
    pub content_type: Option<String>,

    pub bytes: Bytes,
}

impl ImagePayload {
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
