//! CloudGuard API credentials.
//!
//! Credentials are read from the credentials file (`[default]` section,
//! `api_key` / `api_secret`) and from the `CLOUDGUARD_API_KEY` /
//! `CLOUDGUARD_API_SECRET` environment variables. The environment wins.
//!
//! Secrets are held in [`SecretString`] and never appear in `Debug` or
//! `Display` output.

use std::fmt;
use std::path::Path;

use secrecy::SecretString;
use serde::Deserialize;

use crate::config::parser::{self, Section, DEFAULT_SECTION};
use crate::config::paths::{
    self, ENV_CLOUDGUARD_API_KEY, ENV_CLOUDGUARD_API_SECRET, ENV_CLOUDGUARD_CREDENTIALS,
};
use crate::error::Result;

/// Deserialize an optional secret straight into a `SecretString`.
mod optional_secret {
    use secrecy::SecretString;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secret = Option::<String>::deserialize(deserializer)?;
        Ok(secret.map(|s| SecretString::new(s.into())))
    }
}

/// Key identifier and secret authenticating API requests.
///
/// The secret may be absent even when the key is set.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiCredentials {
    /// Identifier of the CloudGuard API key.
    pub key: String,
    #[serde(default, deserialize_with = "optional_secret::deserialize")]
    secret: Option<SecretString>,
}

impl ApiCredentials {
    /// Create credentials from a key and its secret.
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self::from_parts(key.into(), Some(secret.into()))
    }

    /// Create credentials from a key and an optional secret.
    pub fn from_parts(key: String, secret: Option<String>) -> Self {
        Self {
            key,
            secret: secret.map(|s| SecretString::new(s.into())),
        }
    }

    /// Secret associated with the key.
    pub fn secret(&self) -> Option<&SecretString> {
        self.secret.as_ref()
    }
}

impl fmt::Display for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiCredentials(key={})", self.key)
    }
}

/// Store of the credentials required to interact with CloudGuard.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Credentials {
    /// API key pair, if one was configured.
    #[serde(default)]
    pub api: Option<ApiCredentials>,
}

impl Credentials {
    /// Credentials holding an API key pair.
    pub fn with_api(api: ApiCredentials) -> Self {
        Self { api: Some(api) }
    }

    /// Returns true if no credentials are set.
    pub fn is_empty(&self) -> bool {
        self.api.is_none()
    }

    /// Merge `other` into `self`; only fields set in `other` replace ours.
    pub fn update(&mut self, other: Credentials) {
        if let Some(api) = other.api {
            self.api = Some(api);
        }
    }

    /// Load credentials from the credentials file, then overlay the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`CloudGuardError::ConfigParse`](crate::CloudGuardError::ConfigParse)
    /// if the credentials file exists but is malformed.
    pub fn load() -> Result<Self> {
        let mut credentials = Self::load_from_file(None)?;
        credentials.update(Self::load_from_env());
        Ok(credentials)
    }

    /// Load credentials from `CLOUDGUARD_API_KEY` and `CLOUDGUARD_API_SECRET`.
    ///
    /// The secret is only consulted when the key is present.
    pub fn load_from_env() -> Self {
        let Some(key) = paths::var(ENV_CLOUDGUARD_API_KEY) else {
            return Self::default();
        };
        let secret = paths::var(ENV_CLOUDGUARD_API_SECRET);
        Self::with_api(ApiCredentials::from_parts(key, secret))
    }

    /// Load credentials from a file.
    ///
    /// Without an explicit path, `CLOUDGUARD_CREDENTIALS` is used, then
    /// the default credentials path. A missing file yields empty credentials.
    ///
    /// # Errors
    ///
    /// Returns [`CloudGuardError::ConfigParse`](crate::CloudGuardError::ConfigParse)
    /// if the file exists but is malformed.
    pub fn load_from_file(path: Option<&Path>) -> Result<Self> {
        let path = paths::resolve(
            path,
            ENV_CLOUDGUARD_CREDENTIALS,
            paths::default_credentials_path,
        );
        tracing::debug!(path = ?path, "loading credentials file");

        let raw = parser::read_or_empty(path.as_deref(), "credentials")?;
        Ok(raw
            .get(DEFAULT_SECTION)
            .map(Self::from_section)
            .unwrap_or_default())
    }

    fn from_section(section: &Section) -> Self {
        match section.get("api_key") {
            Some(key) => Self::with_api(ApiCredentials::from_parts(
                key.clone(),
                section.get("api_secret").cloned(),
            )),
            None => Self::default(),
        }
    }
}

impl fmt::Display for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.api {
            Some(api) => write!(f, "Credentials(api={api})"),
            None => f.write_str("Credentials()"),
        }
    }
}
