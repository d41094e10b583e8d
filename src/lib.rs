//! CloudGuard API client library.
//!
//! Resolves credentials and the region from configuration files, environment
//! variables and explicit settings, then hands out HTTP clients bound to the
//! region's API endpoint and authenticated with the API key.
//!
//! # Quick Start
//!
//! ```no_run
//! use cloudguard::AsyncSession;
//!
//! #[tokio::main]
//! async fn main() -> cloudguard::Result<()> {
//!     // Files, then environment variables
//!     let session = AsyncSession::new()?;
//!
//!     let client = session.enter().await?;
//!     let response = client.get("v2/CloudAccounts").await?;
//!     println!("{}", response.text().await?);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Configuration
//!
//! Later sources override earlier ones:
//!
//! 1. `~/.config/cloudguard/config` (or `CLOUDGUARD_CONFIG`), section
//!    `[default]`, option `region`
//! 2. `~/.config/cloudguard/credentials` (or `CLOUDGUARD_CREDENTIALS`),
//!    section `[default]`, options `api_key` and `api_secret`
//! 3. `CLOUDGUARD_REGION`, `CLOUDGUARD_API_KEY`, `CLOUDGUARD_API_SECRET`
//! 4. explicit [`Config::set_region`] / [`Config::credentials`]
//!
//! `~/.config` stands for `$XDG_CONFIG_HOME` when it is set.
//!
//! Regions can be given by code (`ap1`, `ap2`, `ap3`, `cace1`, `eu1`, `us`)
//! or by constant name (`IRELAND`, `UNITED_STATES`, ...).
//!
//! The library logs through `tracing` and never installs a subscriber.

mod client;
pub mod config;
mod credentials;
mod error;
pub mod region;
mod session;

// Re-export core types
pub use client::{ApiClient, AsyncApiClient};
pub use config::{Config, ConfigSource, RegionSetting};
pub use credentials::{ApiCredentials, Credentials};
pub use error::{CloudGuardError, IniError, Result};
pub use region::Region;

// Re-export sessions
pub use session::{
    default_session, reset_default_session, set_default_session, AnySession, AsyncSession,
    AsyncSessionGuard, Session, SessionBuilder, SessionGuard,
};

// Re-export the HTTP types callers need to go beyond the helpers
pub use reqwest::Method;
pub use secrecy::{ExposeSecret, SecretString};
