//! Opening host archives with an explicitly detected strategy.

use std::path::Path;

use anyhow::Result;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::application::ports::ArchiveOpener;
use crate::domain::config::ArchiveStrategyChoice;
use crate::infra::archive::Archive;
use crate::infra::archive::store::{self, ArchiveStrategy, parent_dir};

/// Opens archives on the host filesystem.
pub struct HostArchiveOpener {
    choice: ArchiveStrategyChoice,
}

impl HostArchiveOpener {
    #[must_use]
    pub fn new(choice: ArchiveStrategyChoice) -> Self {
        Self { choice }
    }

    /// Pick a strategy for `path`: in-place when a temporary file can be
    /// created next to it, copy-out otherwise.
    #[must_use]
    pub fn detect(path: &Path) -> ArchiveStrategy {
        let dir = parent_dir(path);
        match NamedTempFile::new_in(dir) {
            Ok(_) => ArchiveStrategy::InPlace,
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "No sibling temporary files, copying out");
                ArchiveStrategy::CopyOut
            }
        }
    }

    #[must_use]
    pub fn strategy_for(&self, path: &Path) -> ArchiveStrategy {
        match self.choice {
            ArchiveStrategyChoice::Auto => Self::detect(path),
            ArchiveStrategyChoice::InPlace => ArchiveStrategy::InPlace,
            ArchiveStrategyChoice::CopyOut => ArchiveStrategy::CopyOut,
        }
    }
}

impl ArchiveOpener for HostArchiveOpener {
    type Archive = Archive;

    fn open(&self, path: &Path, create_if_missing: bool) -> Result<Option<Archive>> {
        if !path.exists() {
            if !create_if_missing {
                return Ok(None);
            }
            store::create_empty(path)?;
            debug!(path = %path.display(), "Created empty archive");
        }
        let strategy = self.strategy_for(path);
        let (store, entries) = strategy.load(path)?;
        debug!(path = %path.display(), ?strategy, entries = entries.len(), "Opened archive");
        Ok(Some(Archive::from_store(store, entries)))
    }
}
