use std::path::{Path, PathBuf};

use tracing::warn;

/// Source of the API key used to authenticate against the inference service.
///
/// `None` means no credential is stored; the controller routes that to the
/// credential-error hook instead of attempting a connection.
pub trait CredentialStore: Send + Sync {
    fn api_key(&self) -> Option<String>;
}

/// Reads a single-line API key from a file on local disk.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn api_key(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let key = contents.trim();
                if key.is_empty() {
                    None
                } else {
                    Some(key.to_string())
                }
            }
            Err(e) => {
                warn!("Failed to read API key from {}: {}", self.path.display(), e);
                None
            }
        }
    }
}

/// Fixed in-memory credential, for tests and wiring demos.
pub struct StaticCredentials {
    key: Option<String>,
}

impl StaticCredentials {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
        }
    }

    pub fn missing() -> Self {
        Self { key: None }
    }
}

impl CredentialStore for StaticCredentials {
    fn api_key(&self) -> Option<String> {
        self.key.clone()
    }
}
