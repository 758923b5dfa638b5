//! Where the launcher reads its manifest from.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use zip::ZipArchive;
use zip::result::ZipError;

use crate::launcher::LaunchError;
use crate::manifest::{MANIFEST_PATH, Manifest};
use crate::stub::{LAUNCHER_CLASS, StubDescriptor, resource_path};

/// Supplies the manifest of the bundle the launcher runs in.
pub trait ManifestSource {
    fn read_manifest(&self) -> Result<Manifest, LaunchError>;
}

impl ManifestSource for Manifest {
    fn read_manifest(&self) -> Result<Manifest, LaunchError> {
        Ok(self.clone())
    }
}

impl ManifestSource for [u8] {
    fn read_manifest(&self) -> Result<Manifest, LaunchError> {
        Ok(Manifest::parse(self)?)
    }
}

/// Manifest of a bundle archive on disk.
pub struct BundleManifest {
    path: PathBuf,
}

impl BundleManifest {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the launcher stub descriptor, if the bundle carries one.
    pub fn read_stub(&self) -> Result<Option<StubDescriptor>, LaunchError> {
        match self.read_entry(&resource_path(LAUNCHER_CLASS))? {
            Some(bytes) => Ok(Some(StubDescriptor::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    fn read_entry(&self, name: &str) -> Result<Option<Vec<u8>>, LaunchError> {
        let file = File::open(&self.path).map_err(|source| LaunchError::Bundle {
            path: self.path.clone(),
            source,
        })?;
        let mut archive = ZipArchive::new(BufReader::new(file))?;
        let mut entry = match archive.by_name(name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut bytes = Vec::new();
        entry
            .read_to_end(&mut bytes)
            .map_err(|source| LaunchError::Bundle {
                path: self.path.clone(),
                source,
            })?;
        Ok(Some(bytes))
    }
}

impl ManifestSource for BundleManifest {
    fn read_manifest(&self) -> Result<Manifest, LaunchError> {
        let bytes = self
            .read_entry(MANIFEST_PATH)?
            .ok_or_else(|| LaunchError::MissingManifest(self.path.clone()))?;
        Ok(Manifest::parse(&bytes)?)
    }
}
