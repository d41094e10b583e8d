//! Sessions: a resolved [`Config`] plus a client scoped to a block.
//!
//! A session starts unbound. Entering it builds a client from the
//! configuration and binds it; the returned guard unbinds it when dropped,
//! including during unwinding. A bound session cannot be entered again
//! until its guard is gone.
//!
//! Releasing drops the session's own handle on the client. `reqwest`
//! clients are reference counted, so a clone kept past the scope (from
//! [`Session::client`] or the owned client given to [`AsyncSession::scope`])
//! stays usable; it is simply no longer tied to the session.
//!
//! ```no_run
//! use cloudguard::Session;
//!
//! # fn example() -> cloudguard::Result<()> {
//! let session = Session::new()?;
//! let status = session.scope(|client| client.get("v2/CloudAccounts").map(|r| r.status()))??;
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::ops::Deref;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::client::{ApiClient, AsyncApiClient};
use crate::config::Config;
use crate::error::{CloudGuardError, Result};

fn already_bound() -> CloudGuardError {
    CloudGuardError::SessionMisuse(
        "session already has a bound client; drop the active guard first".to_string(),
    )
}

/// Blocking `reqwest` clients panic when built or dropped on a runtime
/// thread.
fn ensure_outside_runtime() -> Result<()> {
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(CloudGuardError::SessionMisuse(
            "a synchronous session cannot be used inside a Tokio runtime; use AsyncSession"
                .to_string(),
        ));
    }
    Ok(())
}

/// Synchronous session, producing blocking [`ApiClient`]s.
#[derive(Debug)]
pub struct Session {
    config: Config,
    client: Mutex<Option<ApiClient>>,
}

impl Session {
    /// Create a session from [`Config::load`].
    ///
    /// # Errors
    ///
    /// Propagates configuration loading errors.
    pub fn new() -> Result<Self> {
        Ok(Self::with_config(Config::load()?))
    }

    /// Create a session around an existing configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            client: Mutex::new(None),
        }
    }

    /// The session's configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// A handle on the bound client, if the session is entered.
    pub fn client(&self) -> Option<ApiClient> {
        self.client.lock().clone()
    }

    /// Returns true while a scoped client is alive.
    pub fn is_bound(&self) -> bool {
        self.client.lock().is_some()
    }

    /// Build a client from the configuration and bind it to the session.
    ///
    /// # Errors
    ///
    /// - [`CloudGuardError::SessionMisuse`] if the session is already bound,
    ///   or if called from within a Tokio runtime (including
    ///   `spawn_blocking` threads).
    /// - [`CloudGuardError::ConfigMissing`] if the configuration has no
    ///   region or no API key.
    pub fn enter(&self) -> Result<SessionGuard<'_>> {
        ensure_outside_runtime()?;

        let mut slot = self.client.lock();
        if slot.is_some() {
            return Err(already_bound());
        }
        let client = ApiClient::from_config(&self.config)?;
        tracing::debug!(base_url = %client.base_url(), "session entered");
        *slot = Some(client.clone());
        drop(slot);

        Ok(SessionGuard {
            session: self,
            client,
        })
    }

    /// Run `f` with a scoped client, releasing it afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be built; `f` is not run then.
    pub fn scope<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&ApiClient) -> T,
    {
        let guard = self.enter()?;
        Ok(f(&guard))
    }

    fn release(&self) {
        if self.client.lock().take().is_some() {
            tracing::debug!("session released");
        }
    }
}

/// Scoped client of a [`Session`]; unbinds the session on drop.
#[derive(Debug)]
pub struct SessionGuard<'a> {
    session: &'a Session,
    client: ApiClient,
}

impl Deref for SessionGuard<'_> {
    type Target = ApiClient;

    fn deref(&self) -> &ApiClient {
        &self.client
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        self.session.release();
    }
}

/// Asynchronous session, producing [`AsyncApiClient`]s.
#[derive(Debug)]
pub struct AsyncSession {
    config: Config,
    client: Mutex<Option<AsyncApiClient>>,
}

impl AsyncSession {
    /// Create a session from [`Config::load`].
    ///
    /// # Errors
    ///
    /// Propagates configuration loading errors.
    pub fn new() -> Result<Self> {
        Ok(Self::with_config(Config::load()?))
    }

    /// Create a session around an existing configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            client: Mutex::new(None),
        }
    }

    /// The session's configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// A handle on the bound client, if the session is entered.
    pub fn client(&self) -> Option<AsyncApiClient> {
        self.client.lock().clone()
    }

    /// Returns true while a scoped client is alive.
    pub fn is_bound(&self) -> bool {
        self.client.lock().is_some()
    }

    /// Build a client from the configuration and bind it to the session.
    ///
    /// # Errors
    ///
    /// - [`CloudGuardError::SessionMisuse`] if the session is already bound.
    /// - [`CloudGuardError::ConfigMissing`] if the configuration has no
    ///   region or no API key.
    pub async fn enter(&self) -> Result<AsyncSessionGuard<'_>> {
        let mut slot = self.client.lock();
        if slot.is_some() {
            return Err(already_bound());
        }
        let client = AsyncApiClient::from_config(&self.config)?;
        tracing::debug!(base_url = %client.base_url(), "async session entered");
        *slot = Some(client.clone());
        drop(slot);

        Ok(AsyncSessionGuard {
            session: self,
            client,
        })
    }

    /// Await `f` with a scoped client, releasing it afterwards.
    ///
    /// The client is released as well if the returned future is dropped
    /// before completion. `f` receives its own handle on the client; see the
    /// module docs for what release means for handles kept past the scope.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be built; `f` is not run then.
    pub async fn scope<T, F, Fut>(&self, f: F) -> Result<T>
    where
        F: FnOnce(AsyncApiClient) -> Fut,
        Fut: Future<Output = T>,
    {
        let guard = self.enter().await?;
        let output = f(guard.client.clone()).await;
        drop(guard);
        Ok(output)
    }

    fn release(&self) {
        if self.client.lock().take().is_some() {
            tracing::debug!("async session released");
        }
    }
}

/// Scoped client of an [`AsyncSession`]; unbinds the session on drop.
#[derive(Debug)]
pub struct AsyncSessionGuard<'a> {
    session: &'a AsyncSession,
    client: AsyncApiClient,
}

impl Deref for AsyncSessionGuard<'_> {
    type Target = AsyncApiClient;

    fn deref(&self) -> &AsyncApiClient {
        &self.client
    }
}

impl Drop for AsyncSessionGuard<'_> {
    fn drop(&mut self) {
        self.session.release();
    }
}

/// Either kind of session, as produced by [`SessionBuilder`].
#[derive(Debug)]
pub enum AnySession {
    Sync(Session),
    Async(AsyncSession),
}

impl AnySession {
    /// The session's configuration.
    pub fn config(&self) -> &Config {
        match self {
            Self::Sync(session) => session.config(),
            Self::Async(session) => session.config(),
        }
    }

    pub fn is_async(&self) -> bool {
        matches!(self, Self::Async(_))
    }

    pub fn as_sync(&self) -> Option<&Session> {
        match self {
            Self::Sync(session) => Some(session),
            Self::Async(_) => None,
        }
    }

    pub fn as_async(&self) -> Option<&AsyncSession> {
        match self {
            Self::Async(session) => Some(session),
            Self::Sync(_) => None,
        }
    }
}

impl From<Session> for AnySession {
    fn from(session: Session) -> Self {
        Self::Sync(session)
    }
}

impl From<AsyncSession> for AnySession {
    fn from(session: AsyncSession) -> Self {
        Self::Async(session)
    }
}

/// Builder choosing between a [`Session`] and an [`AsyncSession`].
///
/// Without a forced mode, an async session is built when called from within
/// a Tokio runtime, a sync one otherwise.
#[derive(Debug, Default)]
pub struct SessionBuilder {
    force_sync: bool,
    force_async: bool,
    config: Option<Config>,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always build a synchronous session.
    #[must_use]
    pub fn force_sync(mut self) -> Self {
        self.force_sync = true;
        self
    }

    /// Always build an asynchronous session.
    #[must_use]
    pub fn force_async(mut self) -> Self {
        self.force_async = true;
        self
    }

    /// Use this configuration instead of [`Config::load`].
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the session.
    ///
    /// # Errors
    ///
    /// - [`CloudGuardError::ConflictingOptions`] if both modes were forced.
    /// - [`CloudGuardError::SessionMisuse`] if a synchronous session was
    ///   forced from within a Tokio runtime.
    /// - Configuration loading errors.
    ///
    /// Nothing is loaded when one of the first two errors is returned.
    pub fn build(self) -> Result<AnySession> {
        if self.force_sync && self.force_async {
            return Err(CloudGuardError::ConflictingOptions(
                "a session cannot be forced both synchronous and asynchronous".to_string(),
            ));
        }
        if self.force_sync {
            ensure_outside_runtime()?;
        }

        let asynchronous = if self.force_async || self.force_sync {
            self.force_async
        } else {
            tokio::runtime::Handle::try_current().is_ok()
        };

        let config = match self.config {
            Some(config) => config,
            None => Config::load()?,
        };

        Ok(if asynchronous {
            AsyncSession::with_config(config).into()
        } else {
            Session::with_config(config).into()
        })
    }
}

static DEFAULT_SESSION: RwLock<Option<Arc<AnySession>>> = parking_lot::const_rwlock(None);

/// Process-wide default session, created with [`SessionBuilder`] on first use.
///
/// # Errors
///
/// Propagates configuration loading errors from the first use; the next call
/// tries again.
pub fn default_session() -> Result<Arc<AnySession>> {
    if let Some(session) = DEFAULT_SESSION.read().as_ref() {
        return Ok(Arc::clone(session));
    }

    let mut slot = DEFAULT_SESSION.write();
    // Another thread may have won the race for the write lock.
    if let Some(session) = slot.as_ref() {
        return Ok(Arc::clone(session));
    }

    let session = Arc::new(SessionBuilder::new().build()?);
    tracing::debug!(asynchronous = session.is_async(), "default session created");
    *slot = Some(Arc::clone(&session));
    Ok(session)
}

/// Replace the default session, returning the previous one.
pub fn set_default_session(session: impl Into<AnySession>) -> Option<Arc<AnySession>> {
    DEFAULT_SESSION.write().replace(Arc::new(session.into()))
}

/// Drop the default session; the next [`default_session`] call creates a new
/// one.
pub fn reset_default_session() -> Option<Arc<AnySession>> {
    DEFAULT_SESSION.write().take()
}
