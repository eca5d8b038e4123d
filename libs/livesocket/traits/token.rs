use crate::Result;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

/// Key under which the auth token is persisted
pub const TOKEN_KEY: &str = "token";

/// Trait for reading the externally owned auth token
///
/// The manager never writes the token. It is read fresh on every connect
/// attempt and every time a scheduled reconnect fires, so a token removed
/// by a logout stops further reconnects.
pub trait TokenStore: Send + Sync {
    /// Current token, `None` when the user is logged out
    fn token(&self) -> Option<String>;
}

impl<T: TokenStore + ?Sized> TokenStore for Arc<T> {
    fn token(&self) -> Option<String> {
        (**self).token()
    }
}

/// In-memory token store
///
/// Clones share the same slot, so the login flow can hold one handle and
/// the manager another.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    slot: Arc<RwLock<Option<String>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        store.set(Some(token.into()));
        store
    }

    /// Replace the token (`None` logs out)
    pub fn set(&self, token: Option<String>) {
        *self.slot.write() = token;
    }
}

impl TokenStore for MemoryTokenStore {
    fn token(&self) -> Option<String> {
        self.slot
            .read()
            .as_ref()
            .filter(|t| !t.is_empty())
            .cloned()
    }
}

/// Persistent token store backed by a JSON document
///
/// The document is a flat object of string keys; the token lives under
/// [`TOKEN_KEY`]. The file is re-read on every call so writes by other
/// processes are picked up immediately.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the token, distinguishing a missing file from a broken one
    pub fn read(&self) -> Result<Option<String>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let document: serde_json::Value = serde_json::from_str(&content)?;
        Ok(document
            .get(TOKEN_KEY)
            .and_then(|v| v.as_str())
            .filter(|t| !t.is_empty())
            .map(str::to_string))
    }
}

impl TokenStore for FileTokenStore {
    fn token(&self) -> Option<String> {
        match self.read() {
            Ok(token) => token,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read token store");
                None
            }
        }
    }
}
