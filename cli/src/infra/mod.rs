//! Infrastructure layer — concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: archive containers on disk,
//! configuration files and host filesystem queries.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod archive;
pub mod config;
pub mod fs;
pub mod resolver;
