//! Application services — use-case orchestration.
//!
//! Each service module implements a single use-case by composing domain logic
//! with port trait calls. Services import only from `crate::domain` and
//! `crate::application::ports` — never from `crate::infra`, `crate::commands`,
//! or `crate::output`.

pub mod embed;
pub mod inspect;
pub mod manifest;
pub mod merge;

use std::path::Path;

use anyhow::Result;

use crate::application::ports::{ArchiveFs, ArchiveOpener};

/// Open `path`, run `f` on it, then close it on success or discard it on
/// error. `Ok(None)` if there is nothing to open.
///
/// # Errors
///
/// Returns the error of the open, of `f` or of the final close.
pub fn with_archive<O, T>(
    opener: &O,
    path: &Path,
    create_if_missing: bool,
    f: impl FnOnce(&mut O::Archive) -> Result<T>,
) -> Result<Option<T>>
where
    O: ArchiveOpener,
{
    let Some(mut archive) = opener.open(path, create_if_missing)? else {
        return Ok(None);
    };
    match f(&mut archive) {
        Ok(value) => {
            archive.close()?;
            Ok(Some(value))
        }
        Err(e) => {
            archive.discard();
            Err(e)
        }
    }
}
