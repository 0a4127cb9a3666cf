//! Auth token resolution
//!
//! A configured credential id is looked up in a [`CredentialStore`]; an
//! explicitly configured token is the fallback. Failing both, publishing
//! stops before any request is made.

use crate::errors::{NotifyError, NotifyResult};
use std::collections::BTreeMap;
use tracing::debug;

/// Secret lookup owned by the host environment
pub trait CredentialStore {
    /// Token stored under `id` for `server`, if any
    fn lookup(&self, id: &str, server: &str) -> Option<String>;
}

/// Store with no entries
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialStore for NoCredentials {
    fn lookup(&self, _id: &str, _server: &str) -> Option<String> {
        None
    }
}

/// Plain id to token table, as read from the `[credentials]` config section
impl CredentialStore for BTreeMap<String, String> {
    fn lookup(&self, id: &str, _server: &str) -> Option<String> {
        self.get(id).cloned()
    }
}

/// Resolve the token to publish with
pub fn resolve_token(
    store: &dyn CredentialStore,
    credential_id: Option<&str>,
    explicit_token: Option<&str>,
    server: &str,
) -> NotifyResult<String> {
    if let Some(id) = credential_id.map(str::trim).filter(|id| !id.is_empty()) {
        match store.lookup(id, server).filter(|token| !token.trim().is_empty()) {
            Some(token) => return Ok(token),
            None => debug!("Credential '{}' not found for server {}", id, server),
        }
    }

    explicit_token
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .ok_or_else(|| NotifyError::CredentialMissing {
            server: server.to_string(),
        })
}
