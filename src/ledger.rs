//! Deployment ledger
//!
//! A flat JSON object mapping logical names (`admin`, `oracle_adapter`, ...) to
//! deployed addresses or public keys. Every `set` rewrites the whole document
//! through a temp file + rename, so the file on disk is always either the old
//! or the new complete document.

use crate::{Error, Result};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct DeploymentLedger {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl DeploymentLedger {
    /// Open the ledger at `path`
    ///
    /// A missing file is an empty ledger. A file that exists but is not a flat
    /// string map is reported as [`Error::LedgerCorrupt`].
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No ledger on disk, starting empty");
            return Ok(Self {
                path,
                entries: BTreeMap::new(),
            });
        }

        let content = std::fs::read_to_string(&path)?;
        let entries = if content.trim().is_empty() {
            BTreeMap::new()
        } else {
            serde_json::from_str(&content).map_err(|e| Error::LedgerCorrupt {
                path: path.clone(),
                reason: e.to_string(),
            })?
        };

        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Recorded value for `name`; empty values count as absent
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(name)
            .map(|v| v.as_str())
            .filter(|v| !v.trim().is_empty())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Upsert and persist
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        self.entries.insert(name.to_string(), value.to_string());
        self.persist()?;
        tracing::debug!(name, value, "Ledger updated");
        Ok(())
    }

    /// All non-empty entries, sorted by name
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter(|(_, v)| !v.trim().is_empty())
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Truncate to an empty document
    pub fn reset(&mut self) -> Result<()> {
        self.entries.clear();
        self.persist()?;
        tracing::warn!(path = %self.path.display(), "Deployment ledger reset");
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut content = serde_json::to_vec_pretty(&self.entries)?;
        content.push(b'\n');

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(&content)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}
