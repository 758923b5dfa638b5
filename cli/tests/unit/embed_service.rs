//! Tests for the `embed` application service against real archives.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::fs;
use std::path::PathBuf;

use agent_embedder::application::services::embed::AgentSource;
use agent_embedder::domain::config::{AgentDescriptor, ResolvedDependency, SourcePrecedence};
use agent_embedder::domain::error::{ConfigError, EmbedError};
use agent_launcher::{
    AgentEntry, LAUNCHER_AGENT_CLASS, LAUNCHER_CLASS, MANIFEST_PATH, MAIN_CLASS, StubDescriptor,
    read_group, resource_path,
};

use crate::helpers::{
    RecordingReporter, agent_at, agent_jar_bytes, config, copy_out, embed, entry_names, manifest,
    read_entry, read_manifest, write_app, write_jar,
};

fn embed_error(err: &anyhow::Error) -> &EmbedError {
    err.downcast_ref::<EmbedError>()
        .unwrap_or_else(|| panic!("expected EmbedError, got: {err:#}"))
}

// ── End-to-end ────────────────────────────────────────────────────────────────

#[test]
fn test_embeds_two_external_agents_in_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = write_app(dir.path());
    let first = dir.path().join("first.jar");
    fs::write(&first, agent_jar_bytes(Some("first.Agent"), "first")).expect("write");
    let second = dir.path().join("second.jar");
    fs::write(&second, agent_jar_bytes(None, "second")).expect("write");

    let mut second_agent = agent_at(&second);
    second_agent.agent_class = Some("second.Agent".to_string());
    second_agent.agent_args = Some("verbose=true".to_string());
    let reporter = RecordingReporter::default();

    let report = embed(&config(&app, vec![agent_at(&first), second_agent]), &reporter)
        .expect("embed");

    let manifest = read_manifest(&app);
    assert_eq!(manifest.main().get(MAIN_CLASS), Some("app.Main"));
    assert_eq!(manifest.main().get(LAUNCHER_AGENT_CLASS), Some(LAUNCHER_CLASS));
    assert_eq!(
        read_group(&manifest).expect("group"),
        [
            AgentEntry::new("first.Agent", None),
            AgentEntry::new("second.Agent", Some("verbose=true".to_string())),
        ]
    );

    let names = entry_names(&app);
    for expected in ["app/Main.class", "first/Agent.class", "second/Agent.class"] {
        assert!(names.iter().any(|n| n == expected), "missing {expected} in {names:?}");
    }
    let stub = read_entry(&app, &resource_path(LAUNCHER_CLASS)).expect("stub resource");
    assert!(StubDescriptor::from_bytes(&stub).expect("stub").is_compatible());
    assert!(names.iter().any(|n| n == "dev/agent_embedder/launcher/"));

    assert!(!report.skipped);
    assert_eq!(report.agents.len(), 2);
    assert_eq!(report.agents[0].source, AgentSource::External(first));
    assert_eq!(report.agents[1].agent_args.as_deref(), Some("verbose=true"));
    assert!(reporter.warnings.borrow().is_empty());
}

#[test]
fn test_agent_manifest_never_replaces_primary_manifest() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = write_app(dir.path());
    let agent = dir.path().join("agent.jar");
    fs::write(&agent, agent_jar_bytes(Some("a.Agent"), "a")).expect("write");

    let report = embed(&config(&app, vec![agent_at(&agent)]), &RecordingReporter::default())
        .expect("embed");

    let manifest = read_manifest(&app);
    assert_eq!(manifest.main().get("Premain-Class"), None);
    assert_eq!(report.agents[0].entries.skipped, 1, "only META-INF/MANIFEST.MF collides");
}

#[test]
fn test_copy_out_strategy_gives_same_result() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = write_app(dir.path());
    let agent = dir.path().join("agent.jar");
    fs::write(&agent, agent_jar_bytes(Some("a.Agent"), "a")).expect("write");

    embed(
        &copy_out(config(&app, vec![agent_at(&agent)])),
        &RecordingReporter::default(),
    )
    .expect("embed");

    assert!(entry_names(&app).iter().any(|n| n == "a/Agent.class"));
    assert_eq!(
        read_group(&read_manifest(&app)).expect("group"),
        [AgentEntry::new("a.Agent", None)]
    );
}

#[test]
fn test_agent_resolved_by_coordinates() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = write_app(dir.path());
    let repo_jar = dir.path().join("repo").join("tracer-1.0.jar");
    fs::create_dir_all(repo_jar.parent().unwrap()).expect("mkdir");
    fs::write(&repo_jar, agent_jar_bytes(Some("org.example.Tracer"), "tracer")).expect("write");

    let mut cfg = config(
        &app,
        vec![AgentDescriptor {
            group_id: Some("org.example".to_string()),
            artifact_id: Some("tracer".to_string()),
            ..AgentDescriptor::default()
        }],
    );
    cfg.dependencies = vec![ResolvedDependency {
        group_id: "org.example".to_string(),
        artifact_id: "tracer".to_string(),
        classifier: None,
        kind: "jar".to_string(),
        path: repo_jar.clone(),
    }];

    let report = embed(&cfg, &RecordingReporter::default()).expect("embed");
    assert_eq!(report.agents[0].source, AgentSource::External(repo_jar));
    assert_eq!(report.agents[0].agent_class, "org.example.Tracer");
}

// ── Embedded agents ───────────────────────────────────────────────────────────

#[test]
fn test_nested_agent_is_unpacked_and_removed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let nested = agent_jar_bytes(Some("n.Agent"), "n");
    let main_manifest = manifest(&[("Main-Class", "app.Main")]);
    let app = write_jar(
        &dir.path().join("app.jar"),
        &[
            (MANIFEST_PATH, main_manifest.as_slice()),
            ("BOOT-INF/lib/nested-agent.jar", nested.as_slice()),
        ],
    );

    let mut cfg = config(
        &app,
        vec![AgentDescriptor::from_path("lib/nested-agent.jar", None)],
    );
    cfg.remove_embedded_agents = true;
    let report = embed(&cfg, &RecordingReporter::default()).expect("embed");

    let names = entry_names(&app);
    assert!(names.iter().any(|n| n == "n/Agent.class"));
    assert!(!names.iter().any(|n| n == "BOOT-INF/lib/nested-agent.jar"));
    assert_eq!(
        report.agents[0].source,
        AgentSource::Embedded("BOOT-INF/lib/nested-agent.jar".to_string())
    );
    assert_eq!(
        report.agents[0].removed_duplicate.as_deref(),
        Some("BOOT-INF/lib/nested-agent.jar")
    );
}

#[test]
fn test_external_copy_wins_and_nested_duplicate_is_removed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let nested = agent_jar_bytes(Some("old.Agent"), "old");
    let main_manifest = manifest(&[("Main-Class", "app.Main")]);
    let app = write_jar(
        &dir.path().join("app.jar"),
        &[
            (MANIFEST_PATH, main_manifest.as_slice()),
            ("BOOT-INF/lib/agent.jar", nested.as_slice()),
        ],
    );
    let external = dir.path().join("agent.jar");
    fs::write(&external, agent_jar_bytes(Some("new.Agent"), "new")).expect("write");

    let mut cfg = config(&app, vec![agent_at(&external)]);
    cfg.remove_embedded_agents = true;
    let report = embed(&cfg, &RecordingReporter::default()).expect("embed");

    let names = entry_names(&app);
    assert!(names.iter().any(|n| n == "new/Agent.class"));
    assert!(!names.iter().any(|n| n == "old/Agent.class"));
    assert!(!names.iter().any(|n| n == "BOOT-INF/lib/agent.jar"));
    assert_eq!(report.agents[0].source, AgentSource::External(external));
    assert_eq!(report.agents[0].agent_class, "new.Agent");
}

#[test]
fn test_embedded_precedence_reads_nested_copy() {
    let dir = tempfile::tempdir().expect("tempdir");
    let nested = agent_jar_bytes(Some("old.Agent"), "old");
    let main_manifest = manifest(&[("Main-Class", "app.Main")]);
    let app = write_jar(
        &dir.path().join("app.jar"),
        &[
            (MANIFEST_PATH, main_manifest.as_slice()),
            ("BOOT-INF/lib/agent.jar", nested.as_slice()),
        ],
    );
    let external = dir.path().join("agent.jar");
    fs::write(&external, agent_jar_bytes(Some("new.Agent"), "new")).expect("write");

    let mut cfg = config(&app, vec![agent_at(&external)]);
    cfg.source_precedence = SourcePrecedence::Embedded;
    let report = embed(&cfg, &RecordingReporter::default()).expect("embed");

    assert_eq!(report.agents[0].agent_class, "old.Agent");
    assert!(report.agents[0].removed_duplicate.is_none());
    assert!(entry_names(&app).iter().any(|n| n == "BOOT-INF/lib/agent.jar"));
}

// ── Idempotence and warnings ──────────────────────────────────────────────────

#[test]
fn test_second_run_copies_nothing_and_keeps_one_group() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = write_app(dir.path());
    let agent = dir.path().join("agent.jar");
    fs::write(&agent, agent_jar_bytes(Some("a.Agent"), "a")).expect("write");
    let cfg = config(&app, vec![agent_at(&agent)]);

    embed(&cfg, &RecordingReporter::default()).expect("first run");
    let names_after_first = entry_names(&app);
    let reporter = RecordingReporter::default();
    let report = embed(&cfg, &reporter).expect("second run");

    assert_eq!(report.agents[0].entries.copied, 0);
    assert_eq!(entry_names(&app), names_after_first);
    assert_eq!(
        read_group(&read_manifest(&app)).expect("group"),
        [AgentEntry::new("a.Agent", None)]
    );
    assert!(report.conflict.is_none(), "same launcher is not a conflict");
    assert!(reporter.warnings.borrow().is_empty());
}

#[test]
fn test_existing_launcher_agent_is_overwritten_with_warning() {
    let dir = tempfile::tempdir().expect("tempdir");
    let main_manifest = manifest(&[
        ("Main-Class", "app.Main"),
        ("Launcher-Agent-Class", "other.Boot"),
    ]);
    let app = write_jar(
        &dir.path().join("app.jar"),
        &[(MANIFEST_PATH, main_manifest.as_slice())],
    );
    let agent = dir.path().join("agent.jar");
    fs::write(&agent, agent_jar_bytes(Some("a.Agent"), "a")).expect("write");
    let reporter = RecordingReporter::default();

    let report = embed(&config(&app, vec![agent_at(&agent)]), &reporter).expect("embed");

    let conflict = report.conflict.expect("conflict");
    assert_eq!(conflict.previous, "other.Boot");
    assert_eq!(
        read_manifest(&app).main().get(LAUNCHER_AGENT_CLASS),
        Some(LAUNCHER_CLASS)
    );
    let warnings = reporter.warnings.borrow();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("Overwriting existing manifest attribute"));
}

#[test]
fn test_empty_agent_list_skips_without_touching_artifact() {
    let reporter = RecordingReporter::default();
    let missing = PathBuf::from("/nonexistent/app.jar");

    let report = embed(&config(&missing, Vec::new()), &reporter).expect("skip");

    assert!(report.skipped);
    assert!(report.agents.is_empty());
    assert_eq!(reporter.warnings.borrow().len(), 1);
}

// ── Failures leave the artifact unchanged ─────────────────────────────────────

#[test]
fn test_not_runnable_archive_is_left_byte_identical() {
    let dir = tempfile::tempdir().expect("tempdir");
    let library_manifest = manifest(&[("Implementation-Title", "lib")]);
    let app = write_jar(
        &dir.path().join("lib.jar"),
        &[
            (MANIFEST_PATH, library_manifest.as_slice()),
            ("lib/Util.class", b"util".as_slice()),
        ],
    );
    let agent = dir.path().join("agent.jar");
    fs::write(&agent, agent_jar_bytes(Some("a.Agent"), "a")).expect("write");
    let before = fs::read(&app).expect("read");

    let err = embed(&config(&app, vec![agent_at(&agent)]), &RecordingReporter::default())
        .unwrap_err();

    assert!(matches!(embed_error(&err), EmbedError::NotRunnable { .. }));
    assert!(err.to_string().contains("Main-Class"));
    assert_eq!(fs::read(&app).expect("read"), before);
}

#[test]
fn test_missing_manifest_is_not_runnable() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = write_jar(&dir.path().join("plain.zip"), &[("a.txt", b"a".as_slice())]);
    let agent = dir.path().join("agent.jar");
    fs::write(&agent, agent_jar_bytes(Some("a.Agent"), "a")).expect("write");

    let err = embed(&config(&app, vec![agent_at(&agent)]), &RecordingReporter::default())
        .unwrap_err();
    assert!(matches!(embed_error(&err), EmbedError::NotRunnable { .. }));
}

#[test]
fn test_unresolvable_class_fails_and_leaves_archive_unchanged() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = write_app(dir.path());
    let good = dir.path().join("good.jar");
    fs::write(&good, agent_jar_bytes(Some("g.Agent"), "g")).expect("write");
    let bad = dir.path().join("bad.jar");
    fs::write(&bad, agent_jar_bytes(None, "b")).expect("write");
    let before = fs::read(&app).expect("read");

    let err = embed(
        &config(&app, vec![agent_at(&good), agent_at(&bad)]),
        &RecordingReporter::default(),
    )
    .unwrap_err();

    assert!(matches!(
        embed_error(&err),
        EmbedError::AgentClassUnresolved { .. }
    ));
    assert_eq!(fs::read(&app).expect("read"), before);
}

#[test]
fn test_missing_agent_is_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = write_app(dir.path());
    let before = fs::read(&app).expect("read");

    let err = embed(
        &config(&app, vec![agent_at(&dir.path().join("missing.jar"))]),
        &RecordingReporter::default(),
    )
    .unwrap_err();

    assert!(matches!(embed_error(&err), EmbedError::AgentNotFound { .. }));
    assert_eq!(fs::read(&app).expect("read"), before);
}

#[test]
fn test_unresolved_coordinates_without_path_are_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = write_app(dir.path());
    let agent = AgentDescriptor {
        group_id: Some("org.example".to_string()),
        artifact_id: Some("absent".to_string()),
        ..AgentDescriptor::default()
    };

    let err = embed(&config(&app, vec![agent]), &RecordingReporter::default()).unwrap_err();
    let EmbedError::AgentNotFound { agent } = embed_error(&err) else {
        panic!("expected AgentNotFound, got: {err:#}");
    };
    assert_eq!(agent, "org.example:absent");
}

#[test]
fn test_missing_artifact() {
    let dir = tempfile::tempdir().expect("tempdir");
    let agent = dir.path().join("agent.jar");
    fs::write(&agent, agent_jar_bytes(Some("a.Agent"), "a")).expect("write");

    let err = embed(
        &config(&dir.path().join("absent.jar"), vec![agent_at(&agent)]),
        &RecordingReporter::default(),
    )
    .unwrap_err();
    assert!(matches!(embed_error(&err), EmbedError::ArtifactMissing { .. }));
}

#[test]
fn test_agents_without_artifact_is_a_config_error() {
    let mut cfg = config(&PathBuf::from("app.jar"), vec![AgentDescriptor::from_path("a.jar", None)]);
    cfg.artifact = None;

    let err = embed(&cfg, &RecordingReporter::default()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::MissingArtifact)
    ));
}

#[test]
fn test_line_break_in_arguments_is_rejected_before_writing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = write_app(dir.path());
    let agent = dir.path().join("agent.jar");
    fs::write(&agent, agent_jar_bytes(Some("a.Agent"), "a")).expect("write");
    let mut descriptor = agent_at(&agent);
    descriptor.agent_args = Some("a=1\nb=2".to_string());
    let before = fs::read(&app).expect("read");

    let err = embed(&config(&app, vec![descriptor]), &RecordingReporter::default()).unwrap_err();

    assert!(matches!(
        embed_error(&err),
        EmbedError::InvalidAttributeValue { .. }
    ));
    assert_eq!(fs::read(&app).expect("read"), before);
}
