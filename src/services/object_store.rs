//! Object-store collaborator contract.
//!
//! The ingestion pipeline only needs one operation from the blob store:
//! accept a payload under a placement hint and hand back a stable reference.
//! Implementations must be safe to call from concurrent requests and hold no
//! mutable state across calls beyond their immutable configuration.

use async_trait::async_trait;
use bytes::Bytes;
use std::io;
use thiserror::Error;

/// Default logical namespace for uploaded images.
pub const DEFAULT_FOLDER: &str = "page-img";

/// Where and how the store should place an upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacementHint {
    /// Logical namespace (folder / key prefix) grouping related uploads.
    pub folder: String,

    /// Ask the store to sniff the content type instead of trusting the client.
    pub detect_content_type: bool,
}

impl PlacementHint {
    pub fn new(folder: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            detect_content_type: true,
        }
    }
}

impl Default for PlacementHint {
    fn default() -> Self {
        Self::new(DEFAULT_FOLDER)
    }
}

/// Reference to a binary accepted by the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    /// Canonical retrieval address.
    pub url: String,

    /// Opaque handle for later management of the object.
    pub object_id: String,

    pub content_type: String,
    pub size_bytes: u64,
}

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("placement folder `{folder}` invalid: {reason}")]
    InvalidPlacement { folder: String, reason: String },
    #[error("object id `{0}` is invalid")]
    InvalidObjectId(String),
    #[error("object `{0}` not found")]
    NotFound(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type ObjectStoreResult<T> = Result<T, ObjectStoreError>;

/// Blob store the upload coordinator writes through.
///
/// `upload` is a single suspend point: SDKs that report completion through a
/// callback are bridged to this future by the implementation.
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    async fn upload(&self, bytes: Bytes, placement: &PlacementHint)
    -> ObjectStoreResult<StoredObject>;

    /// Short name used in logs.
    fn backend_name(&self) -> &'static str;
}

/// Sniff a content type from leading magic bytes.
///
/// Falls back to `application/octet-stream` for anything unrecognised.
pub fn detect_content_type(bytes: &[u8]) -> &'static str {
    const SIGNATURES: &[(&[u8], &str)] = &[
        (b"\x89PNG\r\n\x1a\n", "image/png"),
        (b"\xff\xd8\xff", "image/jpeg"),
        (b"GIF87a", "image/gif"),
        (b"GIF89a", "image/gif"),
        (b"%PDF-", "application/pdf"),
    ];

    for &(magic, content_type) in SIGNATURES {
        if bytes.starts_with(magic) {
            return content_type;
        }
    }

    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return "image/webp";
    }

    if is_bmp(bytes) {
        return "image/bmp";
    }

    let head = &bytes[..bytes.len().min(256)];
    if let Ok(text) = std::str::from_utf8(head) {
        let text = text.trim_start();
        if text.starts_with("<svg") || (text.starts_with("<?xml") && text.contains("<svg")) {
            return "image/svg+xml";
        }
    }

    "application/octet-stream"
}

/// `BM` alone is too weak: also require zeroed reserved bytes and a known
/// DIB header size.
fn is_bmp(bytes: &[u8]) -> bool {
    const DIB_HEADER_SIZES: &[u32] = &[12, 40, 52, 56, 64, 108, 124];

    if bytes.len() < 18 || !bytes.starts_with(b"BM") || bytes[6..10] != [0; 4] {
        return false;
    }
    let dib_size = u32::from_le_bytes([bytes[14], bytes[15], bytes[16], bytes[17]]);
    DIB_HEADER_SIZES.contains(&dib_size)
}

/// File extension used when naming an object of the given content type.
pub fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/bmp" => "bmp",
        "image/svg+xml" => "svg",
        "application/pdf" => "pdf",
        _ => "bin",
    }
}

/// Inverse of [`extension_for`], used when serving objects back.
pub fn content_type_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}
