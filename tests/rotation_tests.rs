use std::fs;
use std::path::{Path, PathBuf};

use awesome_log::config::{with_console, with_file_rotation, with_level};
use awesome_log::{build_file_sink, derive_path, select_encoder, Error, FileConfig, Format, Registry, Severity, Sink};
use proptest::prelude::*;
use tempfile::tempdir;

const MB: u64 = 1024 * 1024;

fn backups_of(dir: &Path, stem: &str) -> Vec<PathBuf> {
    let prefix = format!("{stem}.log.");
    let mut backups: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.file_name().unwrap().to_string_lossy().starts_with(&prefix))
        .collect();
    backups.sort();
    backups
}

#[test]
fn test_derive_path() {
    assert_eq!(
        derive_path(Path::new("logs/app.log"), "user-service"),
        PathBuf::from("logs/app.user-service.log")
    );
    assert_eq!(derive_path(Path::new("logs/app.log"), ""), PathBuf::from("logs/app.log"));
    assert_eq!(
        derive_path(Path::new("/var/log/app.tar.gz"), "x"),
        PathBuf::from("/var/log/app.tar.x.gz")
    );
    assert_eq!(derive_path(Path::new("app.log"), "api"), PathBuf::from("app.api.log"));
}

#[test]
fn test_directory_is_created_up_front() {
    let dir = tempdir().unwrap();
    let file = FileConfig {
        path: dir.path().join("nested/deeper/app.log"),
        ..FileConfig::default()
    };
    let sink = build_file_sink(&file, "jobs", Severity::Info, select_encoder(Format::Json, false, "")).unwrap();
    assert_eq!(sink.path(), dir.path().join("nested/deeper/app.jobs.log"));
    assert!(sink.path().is_file());
}

#[test]
fn test_unwritable_directory_fails_fast() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, b"not a directory").unwrap();
    let file = FileConfig {
        path: blocker.join("sub/app.log"),
        ..FileConfig::default()
    };
    let err = build_file_sink(&file, "", Severity::Info, select_encoder(Format::Json, false, "")).unwrap_err();
    assert!(matches!(err, Error::CreateDir { .. }), "got {err:?}");
}

#[test]
fn test_unopenable_file_fails_fast() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.log");
    fs::create_dir(&path).unwrap();
    let file = FileConfig {
        path,
        ..FileConfig::default()
    };
    let err = build_file_sink(&file, "", Severity::Info, select_encoder(Format::Json, false, "")).unwrap_err();
    assert!(matches!(err, Error::OpenFile { .. }), "got {err:?}");
}

#[test]
fn test_file_sink_respects_threshold() {
    let dir = tempdir().unwrap();
    let file = FileConfig {
        path: dir.path().join("app.log"),
        ..FileConfig::default()
    };
    let sink = build_file_sink(&file, "", Severity::Warn, select_encoder(Format::Json, false, "")).unwrap();
    assert!(!sink.enabled(Severity::Info));
    assert!(sink.enabled(Severity::Warn));
}

#[test]
fn test_rotation_end_to_end() {
    let dir = tempdir().unwrap();
    let base = dir.path().join("logs/t.log");
    let max_backups = 3;
    let registry = Registry::new();
    let logger = registry
        .get_or_create(
            "",
            [
                with_level("debug"),
                with_console(false),
                with_file_rotation(&base, 1, 0, max_backups, false),
            ],
        )
        .unwrap();
    assert_eq!(logger.file_path(), Some(base.as_path()));

    let padding = "x".repeat(80);
    for i in 0..10_000 {
        logger.log(Severity::Info, format!("record {i:05} {padding}"), [("seq", i)]);
    }
    logger.sync().unwrap();

    let logs = dir.path().join("logs");
    let backups = backups_of(&logs, "t");
    assert!(!backups.is_empty(), "expected at least one rotated file");
    assert!(backups.len() <= max_backups as usize, "too many backups: {backups:?}");

    // One record of overshoot is allowed.
    let one_record = 1024;
    for backup in &backups {
        let size = fs::metadata(backup).unwrap().len();
        assert!(size <= MB + one_record, "{backup:?} is {size} bytes");
    }
    assert!(fs::metadata(&base).unwrap().len() <= MB + one_record);
}

#[test]
fn test_backup_count_is_capped() {
    let dir = tempdir().unwrap();
    let base = dir.path().join("capped.log");
    let registry = Registry::new();
    let logger = registry
        .get_or_create(
            "",
            [with_console(false), with_file_rotation(&base, 1, 0, 2, false)],
        )
        .unwrap();

    let padding = "y".repeat(500);
    for i in 0..12_000 {
        logger.log(Severity::Info, format!("{i} {padding}"), [("n", i)]);
    }
    logger.sync().unwrap();

    let backups = backups_of(dir.path(), "capped");
    assert_eq!(backups.len(), 2, "got {backups:?}");
}

#[test]
fn test_compressed_backups() {
    let dir = tempdir().unwrap();
    let base = dir.path().join("zipped.log");
    let registry = Registry::new();
    let logger = registry
        .get_or_create(
            "",
            [with_console(false), with_file_rotation(&base, 1, 7, 4, true)],
        )
        .unwrap();

    let padding = "z".repeat(300);
    for i in 0..5_000 {
        logger.log(Severity::Info, format!("{i} {padding}"), [("n", i)]);
    }
    logger.sync().unwrap();

    let backups = backups_of(dir.path(), "zipped");
    assert!(!backups.is_empty());
    for backup in backups {
        let name = backup.file_name().unwrap().to_string_lossy().into_owned();
        let index = name
            .strip_prefix("zipped.log.")
            .and_then(|rest| rest.strip_suffix(".gz"))
            .unwrap_or_else(|| panic!("unexpected backup name {name}"));
        assert!(index.parse::<u32>().is_ok(), "{name}");
    }
}

#[test]
fn test_named_loggers_write_to_their_own_files() {
    let dir = tempdir().unwrap();
    let registry = Registry::new();
    registry.set_default_config(awesome_log::Config::from_options([
        with_console(false),
        with_file_rotation(dir.path().join("app.log"), 10, 7, 3, false),
    ]));

    let a = registry.get("a").unwrap();
    let b = registry.get("b").unwrap();
    assert_eq!(a.file_path(), Some(dir.path().join("app.a.log").as_path()));
    assert_eq!(b.file_path(), Some(dir.path().join("app.b.log").as_path()));

    for i in 0..50 {
        a.info(format!("from-a {i}"));
        b.info(format!("from-b {i}"));
    }
    a.sync().unwrap();
    b.sync().unwrap();

    let a_text = fs::read_to_string(dir.path().join("app.a.log")).unwrap();
    let b_text = fs::read_to_string(dir.path().join("app.b.log")).unwrap();
    assert_eq!(a_text.lines().count(), 50);
    assert_eq!(b_text.lines().count(), 50);
    assert!(!b_text.contains("from-a"));
    assert!(!a_text.contains("from-b"));
    for line in a_text.lines() {
        let parsed: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(parsed["logger"], "a");
    }
}

#[test]
fn test_numeric_logger_name_survives_rotation_of_default() {
    let dir = tempdir().unwrap();
    let registry = Registry::new();
    registry.set_default_config(awesome_log::Config::from_options([
        with_console(false),
        with_file_rotation(dir.path().join("app.log"), 1, 0, 3, false),
    ]));

    let anonymous = registry.get("").unwrap();
    let zero = registry.get("0").unwrap();
    assert_eq!(zero.file_path(), Some(dir.path().join("app.0.log").as_path()));

    for i in 0..10 {
        zero.info(format!("zero {i}"));
    }
    let padding = "p".repeat(300);
    for i in 0..6_000 {
        anonymous.info(format!("anon {i} {padding}"));
    }
    anonymous.sync().unwrap();
    zero.sync().unwrap();

    assert!(!backups_of(dir.path(), "app").is_empty(), "the default logger should have rolled");
    let zero_text = fs::read_to_string(dir.path().join("app.0.log")).unwrap();
    assert_eq!(zero_text.lines().count(), 10);
    assert!(zero_text.lines().all(|line| line.contains("\"logger\":\"0\"")));
    assert!(dir.path().join("app.log.0").is_file());
}

#[test]
fn test_backup_shaped_logger_path_is_rejected() {
    let dir = tempdir().unwrap();
    let file = FileConfig {
        path: dir.path().join("app"),
        ..FileConfig::default()
    };
    let err = build_file_sink(&file, "3", Severity::Info, select_encoder(Format::Json, false, "")).unwrap_err();
    assert!(matches!(err, Error::BackupCollision { .. }), "got {err:?}");

    let sink = build_file_sink(&file, "api", Severity::Info, select_encoder(Format::Json, false, "")).unwrap();
    assert_eq!(sink.path(), dir.path().join("app.api"));
}

#[test]
fn test_huge_max_size_does_not_overflow() {
    let dir = tempdir().unwrap();
    let file = FileConfig {
        path: dir.path().join("big.log"),
        max_size_mb: u64::MAX,
        ..FileConfig::default()
    };
    let sink = build_file_sink(&file, "", Severity::Info, select_encoder(Format::Json, false, "")).unwrap();
    assert!(sink.path().is_file());
}

proptest! {
    #[test]
    fn derived_path_keeps_directory_and_extension(
        stem in "[a-z]{1,8}",
        ext in "[a-z]{1,4}",
        name in "[a-z][a-z-]{0,10}",
    ) {
        let base = PathBuf::from("logs").join(format!("{stem}.{ext}"));
        let derived = derive_path(&base, &name);
        prop_assert_eq!(derived.parent(), base.parent());
        let expected_ext = Some(std::ffi::OsStr::new(ext.as_str()));
        prop_assert_eq!(derived.extension(), expected_ext);
        prop_assert_eq!(
            derived.file_name().unwrap().to_string_lossy().into_owned(),
            format!("{stem}.{name}.{ext}")
        );
    }
}
