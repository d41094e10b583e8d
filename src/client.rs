//! CloudGuard API clients.
//!
//! Thin wrappers over `reqwest` that attach basic authentication (API key
//! as username, API secret as password) and resolve paths against the
//! selected region's API URL. [`ApiClient`] blocks; [`AsyncApiClient`] is
//! for use inside an async runtime.
//!
//! Region and credentials are fixed at construction. Build a new client to
//! change either.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use url::Url;

use crate::config::Config;
use crate::credentials::ApiCredentials;
use crate::error::{CloudGuardError, Result};

const USER_AGENT: &str = concat!("cloudguard-rs/", env!("CARGO_PKG_VERSION"));

/// Authentication and endpoint shared by both clients.
#[derive(Clone)]
struct Target {
    base_url: Arc<Url>,
    key: String,
    secret: Option<SecretString>,
}

impl Target {
    fn new(key: &str, secret: Option<&str>, base_url: &str) -> Result<Self> {
        // Ensure base URL ends with /
        let base_url_str = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };

        Ok(Self {
            base_url: Arc::new(Url::parse(&base_url_str)?),
            key: key.to_string(),
            secret: secret.map(|s| SecretString::new(s.into())),
        })
    }

    fn from_config(config: &Config) -> Result<Self> {
        let region = config.region().ok_or_else(|| {
            CloudGuardError::ConfigMissing(
                "no region selected; set CLOUDGUARD_REGION or `region` in the config file"
                    .to_string(),
            )
        })?;
        let api: &ApiCredentials = config.credentials.api.as_ref().ok_or_else(|| {
            CloudGuardError::ConfigMissing(
                "no API key; set CLOUDGUARD_API_KEY or `api_key` in the credentials file"
                    .to_string(),
            )
        })?;

        Self::new(
            &api.key,
            api.secret().map(|s| s.expose_secret()),
            region.api(),
        )
    }

    fn password(&self) -> Option<&str> {
        self.secret.as_ref().map(|s| s.expose_secret())
    }
}

/// Pull a human-readable message out of a failed response body.
fn error_message(status: StatusCode, body: Option<String>) -> String {
    let Some(body) = body else {
        return format!("HTTP {status}");
    };

    if let Ok(json) = serde_json::from_str::<serde_json::Value>(&body) {
        if let Some(msg) = json.get("message").and_then(|m| m.as_str()) {
            return msg.to_string();
        }
        if let Some(err) = json.get("error").and_then(|m| m.as_str()) {
            return err.to_string();
        }
    }

    if body.is_empty() {
        format!("HTTP {status}")
    } else {
        body
    }
}

/// Asynchronous CloudGuard API client.
///
/// Cheaply cloneable; clones share the same connection pool.
///
/// # Example
///
/// ```no_run
/// use cloudguard::AsyncApiClient;
///
/// # async fn example() -> cloudguard::Result<()> {
/// let client = AsyncApiClient::new("api-key", Some("api-secret"), "https://api.eu1.dome9.com/")?;
/// let response = client.get("v2/CloudAccounts").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AsyncApiClient {
    http: reqwest::Client,
    target: Target,
}

impl std::fmt::Debug for AsyncApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncApiClient")
            .field("base_url", &self.target.base_url.as_str())
            .field("username", &self.target.key)
            .finish_non_exhaustive()
    }
}

impl AsyncApiClient {
    /// Create a client for an explicit key, secret and base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be built.
    pub fn new(key: &str, secret: Option<&str>, base_url: &str) -> Result<Self> {
        Self::build(Target::new(key, secret, base_url)?)
    }

    /// Create a client from a resolved configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CloudGuardError::ConfigMissing`] if the configuration has
    /// no region or no API key.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::build(Target::from_config(config)?)
    }

    fn build(target: Target) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .brotli(true)
            .gzip(true)
            .deflate(true)
            .build()
            .map_err(CloudGuardError::HttpError)?;

        Ok(Self { http, target })
    }

    /// Replace the underlying HTTP client, e.g. to set timeouts or proxies.
    #[must_use]
    pub fn with_http(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.target.base_url
    }

    /// Basic-auth username (the API key).
    pub fn username(&self) -> &str {
        &self.target.key
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Start an authenticated request to `path`, relative to the base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` does not form a valid URL.
    pub fn request(&self, method: Method, path: &str) -> Result<reqwest::RequestBuilder> {
        let url = self.target.base_url.join(path)?;
        Ok(self
            .http
            .request(method, url)
            .basic_auth(&self.target.key, self.target.password()))
    }

    /// Make a GET request.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        let response = self
            .request(Method::GET, path)?
            .send()
            .await
            .map_err(CloudGuardError::HttpError)?;

        Self::check_response(response).await
    }

    /// Make a POST request with JSON body.
    #[tracing::instrument(skip(self, body))]
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response> {
        let response = self
            .request(Method::POST, path)?
            .json(body)
            .send()
            .await
            .map_err(CloudGuardError::HttpError)?;

        Self::check_response(response).await
    }

    /// Make a PUT request with JSON body.
    #[tracing::instrument(skip(self, body))]
    pub async fn put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response> {
        let response = self
            .request(Method::PUT, path)?
            .json(body)
            .send()
            .await
            .map_err(CloudGuardError::HttpError)?;

        Self::check_response(response).await
    }

    /// Make a DELETE request.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, path: &str) -> Result<reqwest::Response> {
        let response = self
            .request(Method::DELETE, path)?
            .send()
            .await
            .map_err(CloudGuardError::HttpError)?;

        Self::check_response(response).await
    }

    /// Check response status and convert errors.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.ok();
        Err(CloudGuardError::ApiError {
            message: error_message(status, body),
            status_code: Some(status.as_u16()),
        })
    }
}

/// Blocking CloudGuard API client.
///
/// Must not be created or used from within an async runtime; use
/// [`AsyncApiClient`] there.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::blocking::Client,
    target: Target,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.target.base_url.as_str())
            .field("username", &self.target.key)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for an explicit key, secret and base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be built.
    pub fn new(key: &str, secret: Option<&str>, base_url: &str) -> Result<Self> {
        Self::build(Target::new(key, secret, base_url)?)
    }

    /// Create a client from a resolved configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CloudGuardError::ConfigMissing`] if the configuration has
    /// no region or no API key.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::build(Target::from_config(config)?)
    }

    fn build(target: Target) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .brotli(true)
            .gzip(true)
            .deflate(true)
            .build()
            .map_err(CloudGuardError::HttpError)?;

        Ok(Self { http, target })
    }

    /// Replace the underlying HTTP client, e.g. to set timeouts or proxies.
    #[must_use]
    pub fn with_http(mut self, http: reqwest::blocking::Client) -> Self {
        self.http = http;
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.target.base_url
    }

    /// Basic-auth username (the API key).
    pub fn username(&self) -> &str {
        &self.target.key
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::blocking::Client {
        &self.http
    }

    /// Start an authenticated request to `path`, relative to the base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` does not form a valid URL.
    pub fn request(
        &self,
        method: Method,
        path: &str,
    ) -> Result<reqwest::blocking::RequestBuilder> {
        let url = self.target.base_url.join(path)?;
        Ok(self
            .http
            .request(method, url)
            .basic_auth(&self.target.key, self.target.password()))
    }

    /// Make a GET request.
    #[tracing::instrument(skip(self))]
    pub fn get(&self, path: &str) -> Result<reqwest::blocking::Response> {
        let response = self.request(Method::GET, path)?.send()?;
        Self::check_response(response)
    }

    /// Make a POST request with JSON body.
    #[tracing::instrument(skip(self, body))]
    pub fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::blocking::Response> {
        let response = self.request(Method::POST, path)?.json(body).send()?;
        Self::check_response(response)
    }

    /// Make a PUT request with JSON body.
    #[tracing::instrument(skip(self, body))]
    pub fn put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::blocking::Response> {
        let response = self.request(Method::PUT, path)?.json(body).send()?;
        Self::check_response(response)
    }

    /// Make a DELETE request.
    #[tracing::instrument(skip(self))]
    pub fn delete(&self, path: &str) -> Result<reqwest::blocking::Response> {
        let response = self.request(Method::DELETE, path)?.send()?;
        Self::check_response(response)
    }

    fn check_response(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().ok();
        Err(CloudGuardError::ApiError {
            message: error_message(status, body),
            status_code: Some(status.as_u16()),
        })
    }
}
