/// `load_config` module: loads a static YAML config file and resolves environment overrides.
///
/// This module is the only place where untrusted YAML is parsed and mapped to the
/// strongly-typed core structures (`BucketConfig`, `ProjectRef`).
///
/// # Responsibilities
/// - Parse the user-supplied YAML file, keeping bucket declaration order
/// - Accept human-readable size limits (`50MiB`, `1.5GB`) as well as raw byte counts
/// - Resolve the project ref from flag, environment (`SUPABASE_PROJECT_ID`) and file, in that order
///
/// Secrets (the platform access token) are never read from the file; see [`crate::platform`].
///
/// # Errors
/// Loading errors use `anyhow::Error`; project ref problems surface as
/// [`ConfigurationError`] so callers can tell them apart.
use anyhow::Result;
use bucket_sync_core::contract::{BucketConfig, DesiredBucket};
use bucket_sync_core::error::ConfigurationError;
use bucket_sync_core::project::ProjectRef;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info};

pub const PROJECT_REF_ENV: &str = "SUPABASE_PROJECT_ID";

pub const DEFAULT_PLATFORM_DOMAIN: &str = "fly.dev";
pub const DEFAULT_API_URL: &str = "https://api.supabase.com";
pub const DEFAULT_PROJECT_HOST: &str = "supabase.co";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub project_ref: Option<String>,
    #[serde(default = "default_platform_domain")]
    pub platform_domain: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_project_host")]
    pub project_host: String,
    /// Storage API base URL; derived from `project_host` when unset.
    #[serde(default)]
    pub storage_url: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub storage: StorageSection,
}

#[derive(Debug, Default, Deserialize)]
pub struct StorageSection {
    #[serde(default)]
    pub buckets: IndexMap<String, BucketSection>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BucketSection {
    #[serde(default)]
    pub public: bool,
    #[serde(default, deserialize_with = "deserialize_size")]
    pub file_size_limit: Option<u64>,
    #[serde(default)]
    pub allowed_mime_types: Vec<String>,
}

fn default_platform_domain() -> String {
    DEFAULT_PLATFORM_DOMAIN.to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_project_host() -> String {
    DEFAULT_PROJECT_HOST.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl CliConfig {
    /// Resolves the project ref: explicit flag, then environment, then config file.
    pub fn resolve_project_ref(
        &self,
        flag: Option<String>,
    ) -> Result<ProjectRef, ConfigurationError> {
        let from_env = std::env::var(PROJECT_REF_ENV).ok();
        ProjectRef::resolve([flag, from_env, self.project_ref.clone()])
    }

    /// Desired buckets in declaration order.
    pub fn bucket_config(&self) -> BucketConfig {
        self.storage
            .buckets
            .iter()
            .map(|(name, bucket)| {
                (
                    name.clone(),
                    DesiredBucket {
                        public: bucket.public,
                        file_size_limit: bucket.file_size_limit,
                        allowed_mime_types: bucket.allowed_mime_types.clone(),
                    },
                )
            })
            .collect()
    }

    pub fn storage_url(&self, project_ref: &ProjectRef) -> String {
        match &self.storage_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}.{}/storage/v1", project_ref, self.project_host),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSize {
    Bytes(u64),
    Text(String),
}

fn deserialize_size<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawSize>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawSize::Bytes(bytes)) => Ok(Some(bytes)),
        Some(RawSize::Text(text)) => parse_size(&text).map(Some).map_err(serde::de::Error::custom),
    }
}

/// Parses sizes such as `1024`, `50MiB`, `50MB` or `1.5g`.
///
/// Units are binary regardless of spelling: `KB` and `KiB` both mean 1024 bytes.
pub fn parse_size(text: &str) -> Result<u64, String> {
    let trimmed = text.trim();
    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);
    let value: f64 = number
        .parse()
        .map_err(|_| format!("invalid size: {text:?}"))?;

    let multiplier: u64 = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "b" => 1,
        "k" | "kb" | "kib" => 1 << 10,
        "m" | "mb" | "mib" => 1 << 20,
        "g" | "gb" | "gib" => 1 << 30,
        "t" | "tb" | "tib" => 1 << 40,
        other => return Err(format!("invalid size unit {other:?} in {text:?}")),
    };
    let bytes = value * multiplier as f64;
    if !bytes.is_finite() || bytes >= u64::MAX as f64 {
        return Err(format!("invalid size: {text:?} does not fit in 64 bits"));
    }
    Ok(bytes as u64)
}

/// Loads a static YAML config file (no secrets).
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let config: CliConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    info!(
        buckets = config.storage.buckets.len(),
        platform_domain = %config.platform_domain,
        "Config loaded successfully"
    );
    Ok(config)
}
