//! Integration tests for safe archive extraction
//!
//! Tests cover:
//! - Extracted tree matches the archive exactly
//! - Entries escaping the install root abort before anything is written
//! - Link entries pointing outside the root are rejected
//! - Corrupt, truncated and empty archives

mod common;

use common::*;
use optup_update::extract::SafeExtractor;
use optup_update::UpdateError;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_archive(temp: &TempDir, builder: &ArchiveBuilder) -> PathBuf {
    let path = temp.path().join("download.tar.gz");
    builder.write_to(&path);
    path
}

#[test]
fn test_extract_returns_top_level_and_matches_contents() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("opt");
    let archive = write_archive(
        &temp,
        &ArchiveBuilder::installation("tool-2024.1", "tool", "TL-2024.1"),
    );

    let top = SafeExtractor::new().extract(&archive, &root).unwrap();
    assert_eq!(top, "tool-2024.1");

    let files = files_under(&root);
    let names: Vec<_> = files.keys().cloned().collect();
    assert_eq!(
        names,
        vec![
            PathBuf::from("tool-2024.1/bin/tool.sh"),
            PathBuf::from("tool-2024.1/build.txt"),
            PathBuf::from("tool-2024.1/lib/app.jar"),
        ]
    );
    assert_eq!(
        files[&PathBuf::from("tool-2024.1/build.txt")],
        b"TL-2024.1".to_vec()
    );
}

#[cfg(unix)]
#[test]
fn test_extract_preserves_executable_bit() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let root = temp.path().join("opt");
    let archive = write_archive(
        &temp,
        &ArchiveBuilder::installation("tool-2024.1", "tool", "TL-2024.1"),
    );

    SafeExtractor::new().extract(&archive, &root).unwrap();

    let mode = fs::metadata(root.join("tool-2024.1/bin/tool.sh"))
        .unwrap()
        .permissions()
        .mode();
    assert_ne!(mode & 0o111, 0);
}

#[test]
fn test_extract_leaves_existing_installations_alone() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("opt");
    fs::create_dir_all(root.join("tool-2023.3")).unwrap();
    fs::write(root.join("tool-2023.3/build.txt"), "TL-2023.3").unwrap();

    let archive = write_archive(
        &temp,
        &ArchiveBuilder::installation("tool-2024.1", "tool", "TL-2024.1"),
    );
    SafeExtractor::new().extract(&archive, &root).unwrap();

    assert_eq!(
        fs::read_to_string(root.join("tool-2023.3/build.txt")).unwrap(),
        "TL-2023.3"
    );
    assert!(root.join("tool-2024.1/build.txt").is_file());
}

#[test]
fn test_parent_traversal_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("home").join("opt");
    let archive = write_archive(
        &temp,
        &ArchiveBuilder::new()
            .dir("tool")
            .file("tool/ok.txt", b"fine")
            .raw_file("../../etc/evil", b"pwned"),
    );

    let err = SafeExtractor::new().extract(&archive, &root).unwrap_err();
    match err {
        UpdateError::PathTraversal { entry, .. } => assert!(entry.contains("evil")),
        other => panic!("expected PathTraversal, got {:?}", other),
    }

    assert!(!root.exists(), "install root must not be created");
    assert!(!temp.path().join("etc").exists());
    assert!(!temp.path().join("home").join("etc").exists());
}

#[test]
fn test_parent_component_inside_root_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("opt");
    let archive = write_archive(
        &temp,
        &ArchiveBuilder::new()
            .dir("tool-1")
            .file("tool-1/ok.txt", b"fine")
            .raw_file("tool-1/../other.txt", b"sneaky"),
    );

    let extractor = SafeExtractor::new();
    assert!(matches!(
        extractor.validate(&archive, &root),
        Err(UpdateError::PathTraversal { .. })
    ));

    let err = extractor.extract(&archive, &root).unwrap_err();
    assert!(matches!(err, UpdateError::PathTraversal { .. }));
    assert!(!root.exists());
}

#[test]
fn test_entry_through_archive_symlink_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("opt");
    let archive = write_archive(
        &temp,
        &ArchiveBuilder::new()
            .dir("tool-1")
            .file("tool-1/ok.txt", b"fine")
            .symlink("tool-1/a", "..")
            .symlink("tool-1/a/c", "..")
            .file("tool-1/a/c/evil", b"pwned"),
    );

    let err = SafeExtractor::new().extract(&archive, &root).unwrap_err();
    match err {
        UpdateError::PathTraversal { entry, .. } => assert!(entry.starts_with("tool-1/a/c")),
        other => panic!("expected PathTraversal, got {:?}", other),
    }
    assert!(!root.exists());
    assert!(!temp.path().join("evil").exists());
}

#[test]
fn test_link_target_through_archive_symlink_is_rejected() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("opt");
    let archive = write_archive(
        &temp,
        &ArchiveBuilder::new()
            .dir("tool-1")
            .symlink("tool-1/up", "..")
            .symlink("tool-1/escape", "up/up/etc"),
    );

    let err = SafeExtractor::new().extract(&archive, &root).unwrap_err();
    assert!(matches!(err, UpdateError::PathTraversal { .. }));
    assert!(!root.exists());
}

#[test]
fn test_absolute_entry_is_rejected() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("opt");
    let archive = write_archive(
        &temp,
        &ArchiveBuilder::new()
            .dir("tool")
            .raw_file("/tmp/optup-absolute-entry", b"pwned"),
    );

    let err = SafeExtractor::new().extract(&archive, &root).unwrap_err();
    assert!(matches!(err, UpdateError::PathTraversal { .. }));
    assert!(!root.exists());
}

#[test]
fn test_traversal_hidden_inside_path_is_rejected() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("opt");
    let archive = write_archive(
        &temp,
        &ArchiveBuilder::new()
            .dir("tool")
            .raw_file("tool/../../escaped", b"pwned"),
    );

    let err = SafeExtractor::new().extract(&archive, &root).unwrap_err();
    assert!(matches!(err, UpdateError::PathTraversal { .. }));
    assert!(!temp.path().join("escaped").exists());
}

#[test]
fn test_symlink_escaping_root_is_rejected() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("opt");
    let archive = write_archive(
        &temp,
        &ArchiveBuilder::new()
            .dir("tool")
            .dir("tool/lib")
            .symlink("tool/lib/outside", "../../../outside"),
    );

    let err = SafeExtractor::new().extract(&archive, &root).unwrap_err();
    assert!(matches!(err, UpdateError::PathTraversal { .. }));
    assert!(!root.exists());
}

#[test]
fn test_absolute_symlink_is_rejected() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("opt");
    let archive = write_archive(
        &temp,
        &ArchiveBuilder::new()
            .dir("tool")
            .symlink("tool/passwd", "/etc/passwd"),
    );

    let err = SafeExtractor::new().extract(&archive, &root).unwrap_err();
    assert!(matches!(err, UpdateError::PathTraversal { .. }));
}

#[cfg(unix)]
#[test]
fn test_symlink_within_root_is_extracted() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("opt");
    let archive = write_archive(
        &temp,
        &ArchiveBuilder::installation("tool-1.0", "tool", "TL-1.0")
            .symlink("tool-1.0/bin/app.jar", "../lib/app.jar"),
    );

    SafeExtractor::new().extract(&archive, &root).unwrap();

    let link = root.join("tool-1.0/bin/app.jar");
    assert_eq!(fs::read_link(&link).unwrap(), PathBuf::from("../lib/app.jar"));
    assert!(link.is_file());
}

#[test]
fn test_garbage_is_archive_format_error() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("download.tar.gz");
    fs::write(&archive, b"this is not a gzip stream").unwrap();

    let err = SafeExtractor::new()
        .extract(&archive, &temp.path().join("opt"))
        .unwrap_err();
    assert!(matches!(err, UpdateError::ArchiveFormat { .. }));
}

#[test]
fn test_truncated_archive_is_archive_format_error() {
    let temp = TempDir::new().unwrap();
    let bytes = ArchiveBuilder::new()
        .dir("tool")
        .file("tool/blob.bin", &noise(256 * 1024))
        .build();
    let archive = temp.path().join("download.tar.gz");
    fs::write(&archive, &bytes[..bytes.len() / 2]).unwrap();

    let root = temp.path().join("opt");
    let err = SafeExtractor::new().extract(&archive, &root).unwrap_err();
    assert!(matches!(err, UpdateError::ArchiveFormat { .. }));
    assert!(!root.exists());
}

#[test]
fn test_empty_archive_is_archive_format_error() {
    let temp = TempDir::new().unwrap();
    let archive = write_archive(&temp, &ArchiveBuilder::new());

    let err = SafeExtractor::new()
        .extract(&archive, &temp.path().join("opt"))
        .unwrap_err();
    assert!(matches!(err, UpdateError::ArchiveFormat { .. }));
}

#[test]
fn test_missing_archive_is_io_error() {
    let temp = TempDir::new().unwrap();
    let err = SafeExtractor::new()
        .extract(&temp.path().join("nope.tar.gz"), &temp.path().join("opt"))
        .unwrap_err();
    assert!(matches!(err, UpdateError::Io { .. }));
}
