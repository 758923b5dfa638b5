//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` — never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::domain::{AgentDescriptor, ArchiveEntry, EmbedConfig};

// ── Archive Ports ─────────────────────────────────────────────────────────────

/// An open archive seen as an ordered map from entry path to entry.
///
/// Every open archive is consumed by exactly one of [`close`](Self::close),
/// [`discard`](Self::discard) or, for nested archives,
/// [`close_nested`](Self::close_nested) on the parent.
pub trait ArchiveFs: Sized {
    /// Entry paths in archive order. Directories end in `/`.
    fn entry_names(&self) -> Vec<String>;
    fn entry(&self, path: &str) -> Option<&ArchiveEntry>;
    fn contains(&self, path: &str) -> bool {
        self.entry(path).is_some()
    }
    /// Add `entry` at `path`, replacing an existing entry in its position.
    fn put(&mut self, path: &str, entry: ArchiveEntry) -> Result<()>;
    /// Returns `true` if an entry was removed.
    fn remove(&mut self, path: &str) -> bool;
    fn is_modified(&self) -> bool;
    /// Open the archive stored in entry `path`. `Ok(None)` if there is no
    /// such file entry.
    fn open_nested(&self, path: &str) -> Result<Option<Self>>;
    /// Write a nested archive's changes back into the entry it came from.
    fn close_nested(&mut self, nested: Self) -> Result<()>;
    /// Persist changes, if any, durably before returning.
    fn close(self) -> Result<()>;
    /// Drop all changes and release temporary storage.
    fn discard(self);
}

/// Opens archives by host path.
pub trait ArchiveOpener {
    type Archive: ArchiveFs;

    /// `Ok(None)` if nothing exists at `path` and `create_if_missing` is
    /// false; with `create_if_missing` an empty archive is created first.
    fn open(&self, path: &Path, create_if_missing: bool) -> Result<Option<Self::Archive>>;
}

// ── Resolution and Host Ports ─────────────────────────────────────────────────

/// Maps an agent's coordinates to an artifact path provided by the build tool.
pub trait DependencyResolver {
    fn resolve(&self, agent: &AgentDescriptor) -> Option<PathBuf>;
}

/// Host filesystem queries.
pub trait HostFs {
    fn exists(&self, path: &Path) -> bool;
    /// Hex SHA-256 digest of a file.
    fn sha256(&self, path: &Path) -> Result<String>;
}

/// Loads the embed configuration.
pub trait ConfigStore {
    fn load(&self) -> Result<EmbedConfig>;
    fn path(&self) -> &Path;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait — no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}
