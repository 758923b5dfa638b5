//! Domain layer — pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod archive;
pub mod config;
pub mod error;
pub mod manifest;

pub use archive::{ArchiveEntry, EntryTimestamp};
pub use config::{
    AgentDescriptor, ArchiveStrategyChoice, EmbedConfig, EmbedOverrides, ResolvedDependency,
    SourcePrecedence,
};
pub use error::{ConfigError, EmbedError};
pub use manifest::ManifestConflict;
