use crate::model::{MatchMap, StorageError};
use crate::storage::to_pretty_json;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Durable ledger of matches that were already reported.
pub trait MatchStore {
    /// Returns an empty map when nothing was stored yet.
    fn load(&self) -> Result<MatchMap, StorageError>;
    /// Replaces the stored map as a whole.
    fn save(&self, matches: &MatchMap) -> Result<(), StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
}

pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "matches.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl MatchStore for JsonFileStore {
    fn load(&self) -> Result<MatchMap, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No store at {}, starting empty", self.path.display());
                return Ok(MatchMap::new());
            }
            Err(e) => return Err(self.io_err(e)),
        };

        serde_json::from_str(&content).map_err(|source| StorageError::Malformed {
            path: self.path.display().to_string(),
            source,
        })
    }

    /// Writes next to the target and renames over it, so a failed write
    /// leaves the previous file intact.
    fn save(&self, matches: &MatchMap) -> Result<(), StorageError> {
        let bytes = to_pretty_json(matches)?;
        let tmp = self.tmp_path();

        let write = || -> std::io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
            fs::rename(&tmp, &self.path)
        };

        if let Err(e) = write() {
            let _ = fs::remove_file(&tmp);
            return Err(self.io_err(e));
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.save(&MatchMap::new())?;
        info!("{} has been cleared.", self.path.display());
        Ok(())
    }
}
