//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `LUMINA_BACKEND_URL` - Base URL of the hosted backend project
//! - `LUMINA_BACKEND_ANON_KEY` - Public (anon) API key for the backend
//!
//! ## Optional
//! - `LUMINA_STORAGE_BUCKET` - Bucket holding product images (default: product-images)

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Bucket used when `LUMINA_STORAGE_BUCKET` is unset.
pub const DEFAULT_STORAGE_BUCKET: &str = "product-images";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Admin console configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct AdminConfig {
    /// Project base URL (e.g., <https://xyz.supabase.co>)
    pub backend_url: Url,
    /// Public API key sent with every request
    pub anon_key: SecretString,
    /// Storage bucket for product images
    pub storage_bucket: String,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("backend_url", &self.backend_url.as_str())
            .field("anon_key", &"[REDACTED]")
            .field("storage_bucket", &self.storage_bucket)
            .finish()
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_url = get_required(lookup, "LUMINA_BACKEND_URL")?;
        let backend_url = Url::parse(&raw_url).map_err(|e| {
            ConfigError::InvalidEnvVar("LUMINA_BACKEND_URL".to_string(), e.to_string())
        })?;
        let anon_key = SecretString::from(get_required(lookup, "LUMINA_BACKEND_ANON_KEY")?);

        let storage_bucket = lookup("LUMINA_STORAGE_BUCKET")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_STORAGE_BUCKET.to_string());
        if storage_bucket.contains('/') {
            return Err(ConfigError::InvalidEnvVar(
                "LUMINA_STORAGE_BUCKET".to_string(),
                "bucket names cannot contain '/'".to_string(),
            ));
        }

        Ok(Self {
            backend_url,
            anon_key,
            storage_bucket,
        })
    }

    /// Endpoint for a backend path such as `auth/v1/token`.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.backend_url.as_str().trim_end_matches('/'),
            path
        )
    }
}

fn get_required(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<String, ConfigError> {
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}
