//! Core data models for the media ingestion service.
//!
//! `MediaAsset` maps to the `media_assets` table via `sqlx::FromRow` and
//! serializes as camelCase JSON for the HTTP API.

pub mod media_asset;
