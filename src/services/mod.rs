//! Ingestion pipeline and its store collaborators.

pub mod listing_service;
pub mod local_object_store;
pub mod metadata_store;
pub mod object_store;
pub mod upload_coordinator;

#[cfg(test)]
pub(crate) mod testing;
