//! Shared test helpers: archive fixtures and a recording progress reporter.

#![allow(dead_code, clippy::expect_used)]

use std::cell::RefCell;
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use agent_embedder::application::ports::ProgressReporter;
use agent_embedder::application::services::embed::{EmbedPorts, EmbedReport, embed_agents};
use agent_embedder::domain::config::{AgentDescriptor, ArchiveStrategyChoice, EmbedConfig};
use agent_embedder::infra::archive::HostArchiveOpener;
use agent_embedder::infra::fs::LocalFs;
use agent_embedder::infra::resolver::ConfiguredDependencies;
use agent_launcher::{BundleManifest, MANIFEST_PATH, Manifest, ManifestSource};
use anyhow::Result;
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

// ── Archive fixtures ─────────────────────────────────────────────────────────

/// A manifest with the given main attributes.
pub fn manifest(attrs: &[(&str, &str)]) -> Vec<u8> {
    let mut out = String::from("Manifest-Version: 1.0\r\n");
    for (name, value) in attrs {
        out.push_str(&format!("{name}: {value}\r\n"));
    }
    out.push_str("\r\n");
    out.into_bytes()
}

/// Zip bytes with `entries` in order. Names ending in `/` become directories.
pub fn jar_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        if name.ends_with('/') {
            zip.add_directory(*name, FileOptions::default())
                .expect("add directory");
        } else {
            zip.start_file(*name, FileOptions::default()).expect("start file");
            zip.write_all(data).expect("write entry");
        }
    }
    zip.finish().expect("finish zip").into_inner()
}

pub fn write_jar(path: &Path, entries: &[(&str, &[u8])]) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(path, jar_bytes(entries)).expect("write jar");
    path.to_path_buf()
}

/// A runnable application jar with one class.
pub fn write_app(dir: &Path) -> PathBuf {
    let manifest = manifest(&[("Main-Class", "app.Main")]);
    write_jar(
        &dir.join("app.jar"),
        &[
            (MANIFEST_PATH, manifest.as_slice()),
            ("app/", b"".as_slice()),
            ("app/Main.class", b"main".as_slice()),
        ],
    )
}

/// An agent jar whose manifest names `premain_class`, with one class file
/// under `package/`.
pub fn agent_jar_bytes(premain_class: Option<&str>, package: &str) -> Vec<u8> {
    let attrs: Vec<(&str, &str)> = premain_class
        .map(|class| vec![("Premain-Class", class)])
        .unwrap_or_default();
    let manifest = manifest(&attrs);
    let dir = format!("{package}/");
    let class = format!("{package}/Agent.class");
    jar_bytes(&[
        (MANIFEST_PATH, manifest.as_slice()),
        (dir.as_str(), b"".as_slice()),
        (class.as_str(), package.as_bytes()),
    ])
}

pub fn entry_names(path: &Path) -> Vec<String> {
    let archive = ZipArchive::new(fs::File::open(path).expect("open jar")).expect("read jar");
    archive.file_names().map(str::to_string).collect()
}

pub fn read_entry(path: &Path, name: &str) -> Option<Vec<u8>> {
    let mut archive = ZipArchive::new(fs::File::open(path).expect("open jar")).expect("read jar");
    let mut entry = archive.by_name(name).ok()?;
    let mut data = Vec::new();
    entry.read_to_end(&mut data).expect("read entry");
    Some(data)
}

pub fn read_manifest(path: &Path) -> Manifest {
    BundleManifest::new(path)
        .read_manifest()
        .expect("bundle manifest")
}

// ── Configuration and service wiring ─────────────────────────────────────────

pub fn config(artifact: &Path, agents: Vec<AgentDescriptor>) -> EmbedConfig {
    EmbedConfig {
        artifact: Some(artifact.to_path_buf()),
        agents,
        ..EmbedConfig::default()
    }
}

pub fn agent_at(path: &Path) -> AgentDescriptor {
    AgentDescriptor::from_path(path.display().to_string(), None)
}

/// Run the embed use-case with production infrastructure.
pub fn embed(config: &EmbedConfig, reporter: &RecordingReporter) -> Result<EmbedReport> {
    let opener = HostArchiveOpener::new(config.strategy);
    let resolver = ConfiguredDependencies::new(config.dependencies.clone());
    embed_agents(
        &EmbedPorts {
            opener: &opener,
            resolver: &resolver,
            host: &LocalFs,
            reporter,
        },
        config,
    )
}

pub fn copy_out(mut config: EmbedConfig) -> EmbedConfig {
    config.strategy = ArchiveStrategyChoice::CopyOut;
    config
}

// ── Mock: recording progress reporter ────────────────────────────────────────

#[derive(Default)]
pub struct RecordingReporter {
    pub steps: RefCell<Vec<String>>,
    pub warnings: RefCell<Vec<String>>,
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.steps.borrow_mut().push(message.to_string());
    }
    fn success(&self, _: &str) {}
    fn warn(&self, message: &str) {
        self.warnings.borrow_mut().push(message.to_string());
    }
}
