//! Recording fakes for the two store contracts.

use crate::{
    models::media_asset::{ImagePayload, MediaAsset, NewMediaAsset},
    services::{
        metadata_store::{MetadataError, MetadataResult, MetadataStore},
        object_store::{
            ObjectStoreClient, ObjectStoreError, ObjectStoreResult, PlacementHint, StoredObject,
        },
    },
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{Duration, TimeZone, Utc};
use std::{
    io,
    sync::{Arc, Mutex},
};
use uuid::Uuid;

/// Image part with no client-supplied filename or type.
pub fn image(bytes: &'static [u8]) -> ImagePayload {
    ImagePayload {
        filename: None,
        content_type: None,
        bytes: Bytes::from_static(bytes),
    }
}

/// Shared, ordered record of which store operations ran.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<&'static str>>>);

impl CallLog {
    fn push(&self, call: &'static str) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.0.lock().unwrap().clone()
    }
}

pub struct FakeObjectStore {
    log: CallLog,
    fail: bool,
    received: Mutex<Vec<(Bytes, PlacementHint)>>,
    returned: Mutex<Vec<StoredObject>>,
}

impl FakeObjectStore {
    pub fn succeeding(log: &CallLog) -> Arc<Self> {
        Self::build(log, false)
    }

    pub fn failing(log: &CallLog) -> Arc<Self> {
        Self::build(log, true)
    }

    fn build(log: &CallLog, fail: bool) -> Arc<Self> {
        Arc::new(Self {
            log: log.clone(),
            fail,
            received: Mutex::new(Vec::new()),
            returned: Mutex::new(Vec::new()),
        })
    }

    pub fn received(&self) -> Vec<(Bytes, PlacementHint)> {
        self.received.lock().unwrap().clone()
    }

    pub fn returned(&self) -> Vec<StoredObject> {
        self.returned.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStoreClient for FakeObjectStore {
    async fn upload(
        &self,
        bytes: Bytes,
        placement: &PlacementHint,
    ) -> ObjectStoreResult<StoredObject> {
        self.log.push("upload");
        self.received
            .lock()
            .unwrap()
            .push((bytes.clone(), placement.clone()));

        if self.fail {
            return Err(ObjectStoreError::Io(io::Error::other("quota exceeded")));
        }

        let object_id = format!("{}/{}", placement.folder, Uuid::new_v4().simple());
        let stored = StoredObject {
            url: format!("https://cdn.test/{object_id}"),
            object_id,
            content_type: "image/png".into(),
            size_bytes: bytes.len() as u64,
        };
        self.returned.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    fn backend_name(&self) -> &'static str {
        "fake"
    }
}

/// In-memory metadata store. Successive inserts are stamped one second
/// apart, starting from a fixed instant.
pub struct FakeMetadataStore {
    log: CallLog,
    fail: bool,
    committed: Mutex<Vec<MediaAsset>>,
}

impl FakeMetadataStore {
    pub fn succeeding(log: &CallLog) -> Arc<Self> {
        Self::build(log, false)
    }

    pub fn failing(log: &CallLog) -> Arc<Self> {
        Self::build(log, true)
    }

    fn build(log: &CallLog, fail: bool) -> Arc<Self> {
        Arc::new(Self {
            log: log.clone(),
            fail,
            committed: Mutex::new(Vec::new()),
        })
    }

    pub fn committed(&self) -> Vec<MediaAsset> {
        self.committed.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetadataStore for FakeMetadataStore {
    async fn insert(&self, asset: NewMediaAsset) -> MetadataResult<MediaAsset> {
        self.log.push("insert");
        if self.fail {
            return Err(MetadataError::Unavailable("connection reset".into()));
        }

        let mut committed = self.committed.lock().unwrap();
        let base = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let record = MediaAsset {
            id: Uuid::new_v4(),
            title: asset.title,
            description: asset.description,
            storage_url: asset.storage_url,
            storage_object_id: asset.storage_object_id,
            created_at: base + Duration::seconds(committed.len() as i64),
        };
        committed.push(record.clone());
        Ok(record)
    }

    async fn scan_all_ordered_by_created_desc(&self) -> MetadataResult<Vec<MediaAsset>> {
        self.log.push("scan");
        if self.fail {
            return Err(MetadataError::Unavailable("connection reset".into()));
        }

        let mut all = self.committed();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }
}
