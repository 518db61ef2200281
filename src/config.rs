use anyhow::{Context, Result};
use clap::Parser;
use std::{env, str::FromStr};

use crate::services::object_store::DEFAULT_FOLDER;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments; built once at startup
/// and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage_dir: String,
    pub database_url: String,
    pub public_base_url: String,
    pub folder: String,
    pub max_upload_bytes: usize,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Image ingestion service")]
pub struct Args {
    /// Host to bind to (overrides MEDIA_INGEST_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides MEDIA_INGEST_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory where uploaded binaries are stored (overrides MEDIA_INGEST_STORAGE_DIR)
    #[arg(long)]
    pub storage_dir: Option<String>,

    /// Database URL (overrides MEDIA_INGEST_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Base URL used to build storage URLs (overrides MEDIA_INGEST_PUBLIC_BASE_URL)
    #[arg(long)]
    pub public_base_url: Option<String>,

    /// Placement folder for uploads (overrides MEDIA_INGEST_FOLDER)
    #[arg(long)]
    pub folder: Option<String>,

    /// Request body cap in bytes (overrides MEDIA_INGEST_MAX_UPLOAD_BYTES)
    #[arg(long)]
    pub max_upload_bytes: Option<usize>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        let migrate = args.migrate;
        let cfg = Self::resolve(args, |key| env::var(key))?;
        Ok((cfg, migrate))
    }

    /// Merge parsed args over values looked up through `var`.
    fn resolve<F>(args: Args, var: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        // --- Environment fallback ---
        let env_host = var("MEDIA_INGEST_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = parse_var(&var, "MEDIA_INGEST_PORT", 3000u16)?;
        let env_storage =
            var("MEDIA_INGEST_STORAGE_DIR").unwrap_or_else(|_| "./data/objects".into());
        let env_db = var("MEDIA_INGEST_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/meta/media.db".into());
        let env_base_url = var("MEDIA_INGEST_PUBLIC_BASE_URL").ok();
        let env_folder = var("MEDIA_INGEST_FOLDER").unwrap_or_else(|_| DEFAULT_FOLDER.into());
        let env_max_upload =
            parse_var(&var, "MEDIA_INGEST_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;

        // --- Merge ---
        let host = args.host.unwrap_or(env_host);
        let port = args.port.unwrap_or(env_port);
        let public_base_url = args
            .public_base_url
            .or(env_base_url)
            .unwrap_or_else(|| default_base_url(&host, port));

        Ok(Self {
            host,
            port,
            storage_dir: args.storage_dir.unwrap_or(env_storage),
            database_url: args.database_url.unwrap_or(env_db),
            public_base_url,
            folder: args.folder.unwrap_or(env_folder),
            max_upload_bytes: args.max_upload_bytes.unwrap_or(env_max_upload),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Wildcard bind addresses are not reachable URLs; point at loopback instead.
fn default_base_url(host: &str, port: u16) -> String {
    match host {
        "0.0.0.0" | "::" | "[::]" => format!("http://127.0.0.1:{}", port),
        _ => format!("http://{}:{}", host, port),
    }
}

fn parse_var<F, T>(var: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Result<String, env::VarError>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(key) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", key, value)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("reading {}", key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Result<String, env::VarError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned().ok_or(env::VarError::NotPresent)
    }

    #[test]
    fn defaults_apply_without_env_or_flags() {
        let cfg = AppConfig::resolve(Args::default(), lookup(&[])).unwrap();

        assert_eq!(cfg.addr(), "0.0.0.0:3000");
        assert_eq!(cfg.storage_dir, "./data/objects");
        assert_eq!(cfg.database_url, "sqlite://./data/meta/media.db");
        assert_eq!(cfg.public_base_url, "http://127.0.0.1:3000");
        assert_eq!(cfg.folder, "page-img");
        assert_eq!(cfg.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn flags_override_env() {
        let args = Args {
            port: Some(9000),
            folder: Some("avatars".into()),
            ..Args::default()
        };
        let cfg = AppConfig::resolve(
            args,
            lookup(&[
                ("MEDIA_INGEST_PORT", "8080"),
                ("MEDIA_INGEST_HOST", "127.0.0.1"),
                ("MEDIA_INGEST_FOLDER", "page-img"),
                ("MEDIA_INGEST_PUBLIC_BASE_URL", "https://img.example.com"),
            ]),
        )
        .unwrap();

        assert_eq!(cfg.addr(), "127.0.0.1:9000");
        assert_eq!(cfg.folder, "avatars");
        assert_eq!(cfg.public_base_url, "https://img.example.com");
    }

    #[test]
    fn base_url_follows_a_concrete_host() {
        let cfg = AppConfig::resolve(
            Args::default(),
            lookup(&[("MEDIA_INGEST_HOST", "10.0.0.5"), ("MEDIA_INGEST_PORT", "8080")]),
        )
        .unwrap();
        assert_eq!(cfg.public_base_url, "http://10.0.0.5:8080");

        let args = Args {
            host: Some("::".into()),
            ..Args::default()
        };
        let cfg = AppConfig::resolve(args, lookup(&[])).unwrap();
        assert_eq!(cfg.public_base_url, "http://127.0.0.1:3000");
    }

    #[test]
    fn invalid_numeric_env_is_an_error() {
        let err = AppConfig::resolve(Args::default(), lookup(&[("MEDIA_INGEST_PORT", "http")]))
            .unwrap_err();
        assert!(err.to_string().contains("MEDIA_INGEST_PORT"));

        let err = AppConfig::resolve(
            Args::default(),
            lookup(&[("MEDIA_INGEST_MAX_UPLOAD_BYTES", "-1")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("MEDIA_INGEST_MAX_UPLOAD_BYTES"));
    }
}
