//! Process-wide handle on the remote API client.
//!
//! The client is built on first use from whatever key the credential resolver
//! returns at that moment, even an empty one. Changing the stored key only
//! takes effect after [`invalidate`] or [`reset`].

use once_cell::sync::Lazy;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::credentials;
use crate::gemini::GeminiClient;
use crate::utils::hide_api_key;

type Resolver = Box<dyn Fn() -> String + Send + Sync>;
type Factory<C> = Box<dyn Fn(String) -> C + Send + Sync>;

/// Builds `C` lazily and keeps at most one live instance.
pub struct LazyClient<C> {
    slot: Mutex<Option<Arc<C>>>,
    resolve: Resolver,
    build: Factory<C>,
}

impl<C> LazyClient<C> {
    pub fn new(
        resolve: impl Fn() -> String + Send + Sync + 'static,
        build: impl Fn(String) -> C + Send + Sync + 'static,
    ) -> Self {
        Self {
            slot: Mutex::new(None),
            resolve: Box::new(resolve),
            build: Box::new(build),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<Arc<C>>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the live client, building it first if needed.
    pub fn get(&self) -> Arc<C> {
        // The lock is held across construction so concurrent callers after an
        // invalidation share one new client.
        let mut slot = self.slot();
        if let Some(client) = slot.as_ref() {
            return Arc::clone(client);
        }

        let api_key = (self.resolve)();
        log::info!("Building AI client with key {}", hide_api_key(&api_key));
        let client = Arc::new((self.build)(api_key));
        *slot = Some(Arc::clone(&client));
        client
    }

    /// Drops the live client; the next [`LazyClient::get`] rebuilds it.
    pub fn invalidate(&self) {
        if self.slot().take().is_some() {
            log::debug!("AI client invalidated");
        }
    }

    /// Drops the live client and builds a fresh one right away.
    pub fn reset(&self) -> Arc<C> {
        self.invalidate();
        self.get()
    }

    pub fn is_initialized(&self) -> bool {
        self.slot().is_some()
    }
}

static AI_CLIENT: Lazy<LazyClient<GeminiClient>> =
    Lazy::new(|| LazyClient::new(credentials::resolve, |key| GeminiClient::new(key)));

/// The shared Gemini client.
pub fn get() -> Arc<GeminiClient> {
    AI_CLIENT.get()
}

/// Forget the shared client, e.g. after the user changed their API key.
pub fn invalidate() {
    AI_CLIENT.invalidate()
}

pub fn reset() -> Arc<GeminiClient> {
    AI_CLIENT.reset()
}
