//! Bearer token storage (the client's only persisted state).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

const KNOWN_KEYS: [&str; 2] = [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY];

#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("unknown token key '{0}'")]
    UnknownKey(String),
    #[error("no data directory available for the token file")]
    NoDataDir,
    #[error("token file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("token file {path:?} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Key/value storage for `access_token` and `refresh_token`.
///
/// Only those two keys are accepted.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, TokenStoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), TokenStoreError>;
    fn remove(&self, key: &str) -> Result<(), TokenStoreError>;
}

fn check_key(key: &str) -> Result<(), TokenStoreError> {
    if KNOWN_KEYS.contains(&key) {
        Ok(())
    } else {
        Err(TokenStoreError::UnknownKey(key.to_string()))
    }
}

/// In-process store; tokens vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>, TokenStoreError> {
        check_key(key)?;
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), TokenStoreError> {
        check_key(key)?;
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), TokenStoreError> {
        check_key(key)?;
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }
}

/// JSON-object file store, e.g. `~/.local/share/mizan/tokens.json`.
///
/// A missing file reads as empty. Every write rewrites the whole file via a
/// sibling temp file and rename.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn at_default_path() -> Result<Self, TokenStoreError> {
        Ok(Self::new(default_token_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, TokenStoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(TokenStoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|source| TokenStoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), TokenStoreError> {
        let io_err = |source| TokenStoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let body = serde_json::to_string_pretty(entries).map_err(|source| TokenStoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        let tmp = self.path.with_extension("json.tmp");
        write_private(&tmp, body.as_bytes()).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }

    fn update<F>(&self, f: F) -> Result<(), TokenStoreError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.load()?;
        f(&mut entries);
        self.save(&entries)
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>, TokenStoreError> {
        check_key(key)?;
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), TokenStoreError> {
        check_key(key)?;
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), TokenStoreError> {
        check_key(key)?;
        self.update(|entries| {
            entries.remove(key);
        })
    }
}

/// Write `body` to `path`, readable by the owner only on Unix.
#[cfg(unix)]
fn write_private(path: &Path, body: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // `mode` only applies on creation; a leftover temp file keeps its bits.
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    file.write_all(body)?;
    file.sync_all()
}

#[cfg(not(unix))]
fn write_private(path: &Path, body: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, body)
}

/// `<data dir>/mizan/tokens.json`.
pub fn default_token_path() -> Result<PathBuf, TokenStoreError> {
    let base = dirs::data_dir().ok_or(TokenStoreError::NoDataDir)?;
    Ok(base.join("mizan").join("tokens.json"))
}
