//! CloudGuard client configuration.
//!
//! A [`Config`] is resolved from several layers. From lowest to highest
//! precedence:
//!
//! 1. the configuration file (`~/.config/cloudguard/config` or
//!    `CLOUDGUARD_CONFIG`) and credentials file
//!    (`~/.config/cloudguard/credentials` or `CLOUDGUARD_CREDENTIALS`),
//! 2. environment variables (`CLOUDGUARD_REGION`, `CLOUDGUARD_API_KEY`,
//!    `CLOUDGUARD_API_SECRET`),
//! 3. explicit assignment through [`Config::set_region`] and
//!    [`Config::credentials`].
//!
//! `~/.config` is replaced by `$XDG_CONFIG_HOME` when that is set, on every
//! platform. Missing files are not an error; malformed files are.

pub mod parser;
pub mod paths;

use std::fmt;
use std::path::Path;

use serde_json::Value;

use crate::credentials::Credentials;
use crate::error::{CloudGuardError, Result};
use crate::region::Region;

use parser::{Section, DEFAULT_SECTION};
use paths::{ENV_CLOUDGUARD_CONFIG, ENV_CLOUDGUARD_REGION};

/// Value accepted when assigning the region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionSetting {
    /// Unset the region.
    Clear,
    /// A region from the registry.
    Region(&'static Region),
    /// A region constant name or code, validated on assignment.
    Name(String),
}

impl From<&'static Region> for RegionSetting {
    fn from(region: &'static Region) -> Self {
        Self::Region(region)
    }
}

impl From<&str> for RegionSetting {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for RegionSetting {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl<T: Into<RegionSetting>> From<Option<T>> for RegionSetting {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Clear, Into::into)
    }
}

/// Something a [`Config`] can be updated from.
///
/// Each accessor returns `None` when the source has no value for the field;
/// such fields are left untouched by [`Config::update`].
pub trait ConfigSource {
    /// Region carried by the source.
    fn region_value(&self) -> Option<RegionSetting> {
        None
    }

    /// Credentials carried by the source.
    fn credentials_value(&self) -> Option<Credentials> {
        None
    }
}

impl ConfigSource for Config {
    fn region_value(&self) -> Option<RegionSetting> {
        self.region.map(RegionSetting::Region)
    }

    fn credentials_value(&self) -> Option<Credentials> {
        (!self.credentials.is_empty()).then(|| self.credentials.clone())
    }
}

/// A parsed file section: the `region` option, if any.
impl ConfigSource for Section {
    fn region_value(&self) -> Option<RegionSetting> {
        self.get("region").cloned().map(RegionSetting::Name)
    }
}

impl ConfigSource for Credentials {
    fn credentials_value(&self) -> Option<Credentials> {
        Some(self.clone())
    }
}

/// Configuration of the CloudGuard client.
#[derive(Debug, Clone, Default)]
pub struct Config {
    region: Option<&'static Region>,
    /// Credentials used to authenticate against the API.
    pub credentials: Credentials,
}

impl Config {
    /// Empty configuration: no region, no credentials.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from dynamically named fields.
    ///
    /// Recognized fields are `region` (a name or code string, or `null`) and
    /// `credentials` (an object such as `{"api": {"key": "...", "secret":
    /// "..."}}`, or `null`).
    ///
    /// # Errors
    ///
    /// - [`CloudGuardError::UnknownField`] for any other field name.
    /// - [`CloudGuardError::TypeMismatch`] for a value of the wrong JSON type.
    /// - [`CloudGuardError::UnknownRegion`] for an unknown region string.
    pub fn from_fields<I, K>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let mut config = Self::new();

        for (name, value) in fields {
            match name.as_ref() {
                "region" => match value {
                    Value::Null => config.set_region(RegionSetting::Clear)?,
                    Value::String(region) => config.set_region(region)?,
                    other => {
                        return Err(CloudGuardError::TypeMismatch {
                            field: "region",
                            expected: "a region name or code",
                            found: json_type_name(&other).to_string(),
                        })
                    }
                },
                "credentials" => match value {
                    Value::Null => config.credentials = Credentials::default(),
                    value @ Value::Object(_) => {
                        config.credentials = serde_json::from_value(value).map_err(|e| {
                            CloudGuardError::TypeMismatch {
                                field: "credentials",
                                expected: "credentials",
                                found: e.to_string(),
                            }
                        })?;
                    }
                    other => {
                        return Err(CloudGuardError::TypeMismatch {
                            field: "credentials",
                            expected: "credentials",
                            found: json_type_name(&other).to_string(),
                        })
                    }
                },
                unknown => return Err(CloudGuardError::UnknownField(unknown.to_string())),
            }
        }

        Ok(config)
    }

    /// Load a configuration from the files and the environment.
    ///
    /// The configuration file is read first, then `CLOUDGUARD_REGION` is
    /// applied, then credentials from the credentials file and the
    /// environment are merged in.
    ///
    /// # Errors
    ///
    /// - [`CloudGuardError::ConfigParse`] if a file exists but is malformed.
    /// - [`CloudGuardError::UnknownRegion`] if a region setting is not a known
    ///   region.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from_file(None)?;
        config.update(&Self::load_from_env()?)?;
        config.credentials.update(Credentials::load()?);
        Ok(config)
    }

    /// Load a configuration from `CLOUDGUARD_REGION`.
    ///
    /// # Errors
    ///
    /// Returns [`CloudGuardError::UnknownRegion`] if the variable is set to
    /// an unknown region.
    pub fn load_from_env() -> Result<Self> {
        let mut config = Self::new();
        if let Some(region) = paths::var(ENV_CLOUDGUARD_REGION) {
            config.set_region(region)?;
        }
        Ok(config)
    }

    /// Load a configuration from a file.
    ///
    /// Without an explicit path, `CLOUDGUARD_CONFIG` is used, then the
    /// default configuration path. Only the `[default]` section is read.
    ///
    /// # Errors
    ///
    /// - [`CloudGuardError::ConfigParse`] if the file exists but is malformed.
    /// - [`CloudGuardError::UnknownRegion`] if the file names an unknown
    ///   region.
    pub fn load_from_file(path: Option<&Path>) -> Result<Self> {
        let path = paths::resolve(path, ENV_CLOUDGUARD_CONFIG, paths::default_config_path);
        tracing::debug!(path = ?path, "loading configuration file");

        let raw = parser::read_or_empty(path.as_deref(), "configuration")?;

        let mut config = Self::new();
        if let Some(section) = raw.get(DEFAULT_SECTION) {
            config.update(section)?;
        }
        Ok(config)
    }

    /// Selected region.
    pub fn region(&self) -> Option<&'static Region> {
        self.region
    }

    /// Set the region used when building a client.
    ///
    /// On error the current region is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`CloudGuardError::UnknownRegion`] if a name is not a known
    /// region.
    pub fn set_region(&mut self, value: impl Into<RegionSetting>) -> Result<()> {
        self.region = match value.into() {
            RegionSetting::Clear => None,
            RegionSetting::Region(region) => Some(region),
            RegionSetting::Name(name) => Some(Region::lookup(&name)?),
        };
        tracing::debug!(region = ?self.region.map(Region::code), "region set");
        Ok(())
    }

    /// Builder form of [`set_region`](Self::set_region).
    ///
    /// # Errors
    ///
    /// Returns [`CloudGuardError::UnknownRegion`] if a name is not a known
    /// region.
    pub fn with_region(mut self, value: impl Into<RegionSetting>) -> Result<Self> {
        self.set_region(value)?;
        Ok(self)
    }

    /// Builder form replacing the credentials.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Update from another source. Fields the source does not carry are kept.
    ///
    /// # Errors
    ///
    /// Returns [`CloudGuardError::UnknownRegion`] if the source names an
    /// unknown region.
    pub fn update<S: ConfigSource + ?Sized>(&mut self, other: &S) -> Result<()> {
        match other.region_value() {
            None | Some(RegionSetting::Clear) => {}
            Some(region) => self.set_region(region)?,
        }
        if let Some(credentials) = other.credentials_value() {
            self.credentials = credentials;
        }
        Ok(())
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.region {
            Some(region) => write!(f, "Config(region={region}, ")?,
            None => f.write_str("Config(region=none, ")?,
        }
        write!(f, "credentials={})", self.credentials)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Alias for [`Config::load`].
pub fn load() -> Result<Config> {
    Config::load()
}

/// Alias for [`Config::load_from_env`].
pub fn load_from_env() -> Result<Config> {
    Config::load_from_env()
}

/// Alias for [`Config::load_from_file`].
pub fn load_from_file(path: Option<&Path>) -> Result<Config> {
    Config::load_from_file(path)
}
