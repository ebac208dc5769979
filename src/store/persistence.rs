use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Flat key-value surface the record store persists through.
pub trait Persistence {
    /// Blob stored under `key`, or None if nothing was ever stored.
    fn load(&self, key: &str) -> Result<Option<String>>;

    fn store(&mut self, key: &str, blob: &str) -> Result<()>;
}

/// In-memory persistence, for tests and throwaway sessions.
#[derive(Debug, Default, Clone)]
pub struct MemoryPersistence {
    entries: HashMap<String, String>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl Persistence for MemoryPersistence {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn store(&mut self, key: &str, blob: &str) -> Result<()> {
        self.entries.insert(key.to_string(), blob.to_string());
        Ok(())
    }
}

/// One JSON file per key inside a data directory.
#[derive(Debug, Clone)]
pub struct FilePersistence {
    dir: PathBuf,
}

impl FilePersistence {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path backing `key`. Keys must be plain file stems.
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '@'))
            || key.starts_with('.')
        {
            anyhow::bail!("Invalid storage key '{}'", key);
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl Persistence for FilePersistence {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }

        let blob = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read data file at {}", path.display()))?;
        Ok(Some(blob))
    }

    /// Written atomically: the previous file stays intact if anything fails midway.
    fn store(&mut self, key: &str, blob: &str) -> Result<()> {
        let path = self.path_for(key)?;
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)
                .with_context(|| format!("Failed to create data directory at {}", self.dir.display()))?;
        }

        let mut file = AtomicWriteFile::open(&path)
            .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
        file.write_all(blob.as_bytes())
            .context("Failed to write data file")?;
        file.commit().context("Failed to save data file")?;

        tracing::debug!("wrote {} bytes to {}", blob.len(), path.display());
        Ok(())
    }
}
