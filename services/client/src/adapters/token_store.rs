//! services/client/src/adapters/token_store.rs
//!
//! Persists the bearer token in a plain file between CLI runs.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use screening_core::ports::{PortError, PortResult, TokenStore};
use tracing::debug;

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
}

impl TokenStore for FileTokenStore {
    /// A missing, unreadable or blank file means no token.
    fn load(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                (!token.is_empty()).then(|| token.to_string())
            }
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    debug!(path = %self.path.display(), "Could not read token file: {}", e);
                }
                None
            }
        }
    }

    fn save(&self, token: &str) -> PortResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| PortError::Unexpected(e.to_string()))?;
        }
        fs::write(&self.path, token).map_err(|e| PortError::Unexpected(e.to_string()))
    }

    fn clear(&self) -> PortResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PortError::Unexpected(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("screening-token-{}", uuid::Uuid::new_v4()))
            .join(name)
    }

    #[test]
    fn saves_loads_and_clears() {
        let store = FileTokenStore::new(temp_path("auth-token"));
        assert_eq!(store.load(), None);

        store.save("abc123").unwrap();
        assert_eq!(store.load().as_deref(), Some("abc123"));

        store.clear().unwrap();
        assert_eq!(store.load(), None);
        store.clear().unwrap();
    }
}
