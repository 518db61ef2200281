//! src/services/local_object_store.rs
//!
//! LocalObjectStore: an `ObjectStoreClient` that keeps binaries on local
//! disk, sharded beneath `root/{folder}/{shard}/{shard}/{file}`, and
//! addresses them through the service's own `/media/{*object_id}` route.

use crate::services::object_store::{
    ObjectStoreClient, ObjectStoreError, ObjectStoreResult, PlacementHint, StoredObject,
    content_type_for_extension, detect_content_type, extension_for,
};
use async_trait::async_trait;
use bytes::Bytes;
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::debug;
use uuid::Uuid;

const MAX_OBJECT_ID_LEN: usize = 1024;
const MAX_FOLDER_LEN: usize = 255;

/// Route prefix under which stored objects are served.
pub const MEDIA_ROUTE_PREFIX: &str = "/media";

/// Filesystem-backed object store.
///
/// Holds only immutable configuration, so clones can be shared freely
/// across concurrent requests.
#[derive(Clone, Debug)]
pub struct LocalObjectStore {
    /// Base directory on disk where object payloads are stored.
    root: PathBuf,

    /// Externally reachable base URL, without trailing slash.
    public_base_url: String,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        let public_base_url = public_base_url.into().trim_end_matches('/').to_string();
        Self {
            root: root.into(),
            public_base_url,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Placement folders become directory names, so keep them to plain
    /// relative segments.
    fn ensure_folder_safe(folder: &str) -> ObjectStoreResult<()> {
        let invalid = |reason: &str| ObjectStoreError::InvalidPlacement {
            folder: folder.to_string(),
            reason: reason.to_string(),
        };

        if folder.is_empty() {
            return Err(invalid("must not be empty"));
        }
        if folder.len() > MAX_FOLDER_LEN {
            return Err(invalid("too long"));
        }
        if folder.starts_with('/') || folder.ends_with('/') {
            return Err(invalid("must not start or end with `/`"));
        }
        if folder.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..") {
            return Err(invalid("contains an empty or relative path segment"));
        }
        if folder
            .bytes()
            .any(|b| b.is_ascii_control() || b == b'\\' || b == b'\0')
        {
            return Err(invalid("contains control characters or backslashes"));
        }
        Ok(())
    }

    /// Basic object id validation to avoid trivial path traversal vectors.
    fn ensure_object_id_safe(object_id: &str) -> ObjectStoreResult<()> {
        let invalid = || ObjectStoreError::InvalidObjectId(object_id.to_string());

        if object_id.is_empty() || object_id.len() > MAX_OBJECT_ID_LEN {
            return Err(invalid());
        }
        let Some((folder, file)) = object_id.rsplit_once('/') else {
            return Err(invalid());
        };
        if file.is_empty() || file.starts_with('.') || file.contains("..") {
            return Err(invalid());
        }
        if file
            .bytes()
            .any(|b| b.is_ascii_control() || b == b'\\' || b == b'\0')
        {
            return Err(invalid());
        }
        Self::ensure_folder_safe(folder).map_err(|_| invalid())
    }

    /// Two-level shard identifiers for an object id.
    ///
    /// First two bytes of MD5(object_id) as lowercase hex (00 to ff). Keeps the
    /// file count per directory bounded.
    fn object_shards(object_id: &str) -> (String, String) {
        let digest = md5::compute(object_id);
        (format!("{:02x}", digest[0]), format!("{:02x}", digest[1]))
    }

    /// Physical path for an already-validated object id.
    fn object_path(&self, object_id: &str) -> PathBuf {
        let (folder, file) = object_id.rsplit_once('/').unwrap_or(("", object_id));
        let (shard_a, shard_b) = Self::object_shards(object_id);
        let mut path = self.root.clone();
        path.push(folder);
        path.push(shard_a);
        path.push(shard_b);
        path.push(file);
        path
    }

    fn object_url(&self, object_id: &str) -> String {
        format!("{}{}/{}", self.public_base_url, MEDIA_ROUTE_PREFIX, object_id)
    }

    /// Write `bytes` durably at `file_path`.
    ///
    /// Writes to a temp file in the target directory, flushes and fsyncs it,
    /// then renames it into place. The temp file is removed on any error.
    async fn write_atomically(file_path: &Path, bytes: &[u8]) -> ObjectStoreResult<()> {
        let parent = file_path.parent().map(Path::to_path_buf).ok_or_else(|| {
            ObjectStoreError::Io(io::Error::new(
                ErrorKind::Other,
                "object path missing parent directory",
            ))
        })?;
        fs::create_dir_all(&parent).await?;
        let tmp_path = parent.join(format!(".tmp-{}", Uuid::new_v4()));

        let result: io::Result<()> = async {
            let mut file = File::create(&tmp_path).await?;
            file.write_all(bytes).await?;
            file.flush().await?;
            file.sync_all().await?;
            fs::rename(&tmp_path, file_path).await
        }
        .await;

        if let Err(err) = result {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(ObjectStoreError::Io(err));
        }
        Ok(())
    }

    /// Open a stored object for reading.
    ///
    /// Returns the file handle, its length and the content type implied by
    /// the object's extension.
    pub async fn open(&self, object_id: &str) -> ObjectStoreResult<(File, u64, &'static str)> {
        Self::ensure_object_id_safe(object_id)?;
        let file_path = self.object_path(object_id);

        let file = File::open(&file_path).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                ObjectStoreError::NotFound(object_id.to_string())
            } else {
                ObjectStoreError::Io(err)
            }
        })?;
        let len = file.metadata().await?.len();

        let content_type = Path::new(object_id)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(content_type_for_extension)
            .unwrap_or("application/octet-stream");

        Ok((file, len, content_type))
    }

    /// Write, read back and delete a probe file under the store root.
    pub async fn probe(&self) -> Result<(), String> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| format!("could not create root: {}", e))?;
        let tmp_path = self.root.join(format!(".readyz-{}", Uuid::new_v4()));

        fs::write(&tmp_path, b"readyz")
            .await
            .map_err(|e| format!("could not write tmp file: {}", e))?;
        let read = fs::read(&tmp_path).await;
        let removed = fs::remove_file(&tmp_path).await;

        match read {
            Ok(bytes) if bytes == b"readyz" => {
                removed.map_err(|e| format!("could not remove tmp file: {}", e))
            }
            Ok(_) => Err("file content mismatch".to_string()),
            Err(e) => Err(format!("could not read tmp file: {}", e)),
        }
    }
}

#[async_trait]
impl ObjectStoreClient for LocalObjectStore {
    async fn upload(
        &self,
        bytes: Bytes,
        placement: &PlacementHint,
    ) -> ObjectStoreResult<StoredObject> {
        Self::ensure_folder_safe(&placement.folder)?;

        let content_type = if placement.detect_content_type {
            detect_content_type(&bytes)
        } else {
            "application/octet-stream"
        };
        let object_id = format!(
            "{}/{}.{}",
            placement.folder,
            Uuid::new_v4().simple(),
            extension_for(content_type)
        );

        let file_path = self.object_path(&object_id);
        Self::write_atomically(&file_path, &bytes).await?;
        debug!("stored {} bytes at {}", bytes.len(), file_path.display());

        Ok(StoredObject {
            url: self.object_url(&object_id),
            object_id,
            content_type: content_type.to_string(),
            size_bytes: bytes.len() as u64,
        })
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}
