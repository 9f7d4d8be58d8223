mod common;

use common::*;
use dataset2tsv::{ArchiveWalker, ConvertError};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

fn walk(path: &Path, pattern: &str) -> Vec<PathBuf> {
    ArchiveWalker::new(path, pattern)
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

fn walk_filtered(path: &Path, pattern: &str, needle: &str) -> Vec<PathBuf> {
    let filter = |elem: &str| elem.contains(needle);
    ArchiveWalker::new(path, pattern)
        .unwrap()
        .with_filter(&filter)
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn names(paths: &[PathBuf]) -> BTreeSet<String> {
    paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn test_lists_matching_files_and_skips_hidden() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    write_file(&root.join("a/one.xml"), b"");
    write_file(&root.join("a/b/TWO.XML"), b"");
    write_file(&root.join("a/three.json"), b"");
    write_file(&root.join(".cache/hidden.xml"), b"");
    write_file(&root.join("$RECYCLE/deleted.xml"), b"");

    let found = walk(root, r"\.xml");
    assert_eq!(
        names(&found),
        set(&["TWO.XML", "one.xml"])
    );
}

#[test]
fn test_filter_anchors_then_releases() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    write_file(&root.join("n00000001/x/deep.xml"), b"");
    write_file(&root.join("n00000001/other.xml"), b"");
    write_file(&root.join("n00000002/skip.xml"), b"");
    write_file(&root.join("misc/skip.xml"), b"");

    let found = walk_filtered(root, r"\.xml", "n00000001");
    assert_eq!(
        names(&found),
        set(&["deep.xml", "other.xml"])
    );
}

#[test]
fn test_filter_prunes_ambiguous_directory() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    write_file(&root.join("a/one.xml"), b"");
    write_file(&root.join("b/two.xml"), b"");

    assert!(walk_filtered(root, r"\.xml", "n00000001").is_empty());
}

#[test]
fn test_filter_descends_single_child_directory() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    write_file(&root.join("wrapper/n00000001_1.xml"), b"");
    write_file(&root.join("wrapper/n00000002_1.xml"), b"");

    let found = walk_filtered(root, r"\.xml", "n00000001");
    assert_eq!(found, vec![root.join("wrapper/n00000001_1.xml")]);
}

#[test]
fn test_nested_archive_is_extracted_and_removed() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = temp_dir.path().join("ann");
    let nested = source.join("n00000001.tar.gz");
    write_file(
        &nested,
        &tar_gz_bytes(&[("n00000001/n00000001_1.xml", b"<annotation/>")]),
    );

    let found = walk(&source, r"\.xml");
    assert_eq!(
        found,
        vec![source.join("extracted_n00000001.tar/n00000001/n00000001_1.xml")]
    );
    assert!(!nested.exists());
    assert!(source.join("extracted_n00000001.tar").is_dir());
}

#[test]
fn test_root_archive_extraction_is_idempotent() {
    let temp_dir = tempfile::tempdir().unwrap();
    let archive = temp_dir.path().join("Annotation.tar");
    write_file(
        &archive,
        &tar_bytes(&[("a/x.xml", b"<annotation/>"), ("a/y.xml", b"<annotation/>")]),
    );

    let first = walk(&archive, r"\.xml");
    assert!(archive.exists());
    let second = walk(&archive, r"\.xml");
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);

    // A corrupt source is never reopened once its extraction exists
    write_file(&archive, b"not a tar file");
    assert_eq!(walk(&archive, r"\.xml"), first);
}

#[test]
fn test_zip_archive_is_walked() {
    let temp_dir = tempfile::tempdir().unwrap();
    let archive = temp_dir.path().join("annotations_trainval2014.zip");
    write_zip(
        &archive,
        &[
            ("annotations/instances_val2014.json", b"{}"),
            ("annotations/captions_val2014.json", b"{}"),
            ("README.txt", b"readme"),
        ],
    );

    let found = walk(&archive, r"\.json");
    assert_eq!(
        names(&found),
        set(&["captions_val2014.json", "instances_val2014.json"])
    );
    assert!(temp_dir
        .path()
        .join("extracted_annotations_trainval2014/annotations")
        .is_dir());
}

#[test]
fn test_path_traversal_aborts_before_writing() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = temp_dir.path().join("a/b");
    let archive = source.join("evil.tar");
    write_file(&archive, &raw_name_tar_bytes("../../evil", b"evil"));

    let mut walker = ArchiveWalker::new(&archive, r"\.\w+").unwrap();
    match walker.next() {
        Some(Err(ConvertError::PathTraversal { entry, .. })) => assert_eq!(entry, "../../evil"),
        other => panic!("expected path traversal error, got {:?}", other),
    }
    assert!(walker.next().is_none());
    assert!(!source.join("extracted_evil").exists());
    assert!(!temp_dir.path().join("evil").exists());
}

#[test]
fn test_path_traversal_after_valid_members_removes_extraction() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = temp_dir.path().join("a/b");
    let archive = source.join("mixed.tar");
    write_file(
        &archive,
        &raw_tar_bytes(&[
            ("ok/one.xml", b"<annotation/>"),
            ("../../evil", b"evil"),
            ("ok/two.xml", b"<annotation/>"),
        ]),
    );

    let results: Vec<_> = ArchiveWalker::new(&archive, r"\.xml").unwrap().collect();
    assert_eq!(results.len(), 1);
    assert!(matches!(results[0], Err(ConvertError::PathTraversal { .. })));
    assert!(!source.join("extracted_mixed").exists());
    assert!(!temp_dir.path().join("evil").exists());
}

#[test]
fn test_escaping_symlink_is_path_traversal() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = temp_dir.path().join("a/b");
    let archive = source.join("links.tar");
    write_file(&archive, &symlink_tar_bytes("data/escape", "../../../outside"));

    let mut walker = ArchiveWalker::new(&archive, r"\.\w+").unwrap();
    match walker.next() {
        Some(Err(ConvertError::PathTraversal { entry, .. })) => assert_eq!(entry, "data/escape"),
        other => panic!("expected path traversal error, got {:?}", other),
    }
    assert!(!source.join("extracted_links").exists());
}

#[test]
fn test_zip_path_traversal_aborts_before_writing() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = temp_dir.path().join("a/b");
    let archive = source.join("evil.zip");
    write_zip(
        &archive,
        &[("ok.json", b"{}"), ("../../evil.json", b"{}")],
    );

    let mut walker = ArchiveWalker::new(&archive, r"\.json").unwrap();
    match walker.next() {
        Some(Err(ConvertError::PathTraversal { entry, .. })) => {
            assert_eq!(entry, "../../evil.json")
        }
        other => panic!("expected path traversal error, got {:?}", other),
    }
    assert!(walker.next().is_none());
    assert!(!source.join("extracted_evil").exists());
    assert!(!temp_dir.path().join("evil.json").exists());
}

#[test]
fn test_corrupt_archive_ends_walk() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    write_file(&root.join("bad.tar.gz"), b"definitely not gzip");
    write_file(&root.join("good.xml"), b"");

    let results: Vec<_> = ArchiveWalker::new(root, r"\.xml").unwrap().collect();
    assert_eq!(results.len(), 1);
    assert!(matches!(results[0], Err(ConvertError::Archive { .. })));
    assert!(!root.join("extracted_bad.tar").exists());
}
