//! API key lookup: user settings first, then the process environment.

use crate::settings::{self, Settings};

/// Environment variables consulted, in order.
pub const ENV_KEYS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Source of environment-style key/value configuration.
pub trait EnvSource {
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads the real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl<F> EnvSource for F
where
    F: Fn(&str) -> Option<String>,
{
    fn var(&self, key: &str) -> Option<String> {
        self(key)
    }
}

/// Resolves the API key. Never fails: an empty string means no key was found,
/// and the remote API will reject the first call.
pub fn resolve_from(settings: &Settings, env: &impl EnvSource) -> String {
    if let Some(key) = settings.api_key.as_deref().filter(|k| !k.is_empty()) {
        log::debug!("API key found in settings (length {})", key.len());
        return key.to_string();
    }

    for name in ENV_KEYS {
        if let Some(key) = env.var(name).filter(|k| !k.is_empty()) {
            log::debug!("API key found in {name} (length {})", key.len());
            return key;
        }
    }

    log::warn!("No API key found in settings or environment");
    String::new()
}

/// Resolves against the current process-wide settings and environment.
pub fn resolve() -> String {
    resolve_from(&settings::current(), &ProcessEnv)
}
