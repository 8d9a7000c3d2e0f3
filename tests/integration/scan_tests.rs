use deduplicate_files::duplicates::{build_index, resolve, IndexConfig, KeepPolicy};
use deduplicate_files::scanner::{Fingerprinter, TraverseConfig};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    File::create(path).unwrap().write_all(content).unwrap();
}

fn membership(root: &Path, config: IndexConfig) -> BTreeSet<Vec<PathBuf>> {
    let (index, _) = build_index(root, config).unwrap();
    index.iter().map(|(_, g)| g.members.clone()).collect()
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();

    let (index, report) = build_index(dir.path(), IndexConfig::default()).unwrap();

    assert!(index.is_empty());
    assert_eq!(report.files_indexed, 0);
    assert!(report.is_complete());
    assert!(resolve(&index, KeepPolicy::default()).is_empty());
}

#[test]
fn test_scan_unique_files() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.txt"), b"content a");
    write(&dir.path().join("b.txt"), b"content b");
    write(&dir.path().join("c.txt"), b"content c");

    let (index, report) = build_index(dir.path(), IndexConfig::default()).unwrap();

    assert_eq!(index.len(), 3);
    assert_eq!(report.files_indexed, 3);
    assert_eq!(index.duplicate_groups().count(), 0);
}

#[test]
fn test_hello_world_scenario() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(&root.join("a.txt"), b"hello");
    write(&root.join("sub/b.txt"), b"hello");
    write(&root.join("c.txt"), b"world");

    let (index, report) = build_index(root, IndexConfig::default()).unwrap();
    let plan = resolve(&index, KeepPolicy::LongestPath);

    assert_eq!(report.files_indexed, 3);
    assert_eq!(report.bytes_indexed, 15);
    assert_eq!(plan.duplicate_groups, 1);
    assert_eq!(plan.reclaimable_bytes, 5);
    assert_eq!(plan.quarantine, vec![root.join("a.txt")]);
    assert_eq!(plan.sets[0].keep, root.join("sub/b.txt"));
    assert!(!plan.quarantine.contains(&root.join("c.txt")));
    assert!(!plan.kept_paths().contains(&root.join("c.txt").as_path()));
}

#[test]
fn test_nested_duplicates_and_sizes() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    for i in 0..4 {
        write(&root.join(format!("d{i}/deep/copy.bin")), &[7u8; 1000]);
    }
    write(&root.join("other.bin"), &[8u8; 1000]);

    let (index, _) = build_index(root, IndexConfig::default()).unwrap();
    let plan = resolve(&index, KeepPolicy::default());

    assert_eq!(plan.duplicate_groups, 1);
    assert_eq!(plan.reclaimable_bytes, 3 * 1000);
    assert_eq!(plan.quarantine.len(), 3);
}

#[test]
fn test_empty_files_group_together() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("empty1"), b"");
    write(&dir.path().join("empty2"), b"");
    write(&dir.path().join("full"), b"x");

    let (index, _) = build_index(dir.path(), IndexConfig::default()).unwrap();
    let plan = resolve(&index, KeepPolicy::default());

    assert_eq!(plan.duplicate_groups, 1);
    assert_eq!(plan.reclaimable_bytes, 0);
    assert_eq!(plan.quarantine.len(), 1);
}

#[test]
fn test_rescan_is_stable() {
    let dir = tempdir().unwrap();
    for i in 0..30 {
        write(
            &dir.path().join(format!("dir{}/f{}.dat", i % 5, i)),
            format!("payload {}", i % 7).as_bytes(),
        );
    }

    let first = membership(dir.path(), IndexConfig::default());
    let second = membership(dir.path(), IndexConfig::default());
    assert_eq!(first, second);

    let (index_a, _) = build_index(dir.path(), IndexConfig::default()).unwrap();
    let (index_b, _) = build_index(dir.path(), IndexConfig::default()).unwrap();
    assert_eq!(
        resolve(&index_a, KeepPolicy::default()),
        resolve(&index_b, KeepPolicy::default())
    );
}

#[test]
fn test_thread_count_does_not_change_result() {
    let dir = tempdir().unwrap();
    for i in 0..40 {
        write(
            &dir.path().join(format!("a{}/b{}/f{}", i % 3, i % 4, i)),
            format!("{}", i % 6).as_bytes(),
        );
    }

    let single = membership(dir.path(), IndexConfig::default().with_io_threads(1));
    let many = membership(dir.path(), IndexConfig::default().with_io_threads(8));
    assert_eq!(single, many);
}

#[test]
fn test_filters_apply() {
    let dir = tempdir().unwrap();
    write(&dir.path().join(".hidden/a"), b"same");
    write(&dir.path().join("visible/a"), b"same");
    write(&dir.path().join("small1"), b"s");
    write(&dir.path().join("small2"), b"s");

    let config = IndexConfig::default()
        .with_traverse_config(TraverseConfig::new(true, Some(2), None));
    let (index, report) = build_index(dir.path(), config).unwrap();

    assert_eq!(index.total_files(), 1);
    assert_eq!(report.skipped, 2);
}

#[test]
fn test_large_file_hash_matches_streamed_hash() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("large.bin");
    let content: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
    write(&path, &content);

    let streamed = Fingerprinter::new()
        .with_mmap_threshold(u64::MAX)
        .fingerprint(&path)
        .unwrap();
    let mapped = Fingerprinter::new()
        .with_mmap_threshold(1)
        .fingerprint(&path)
        .unwrap();

    assert_eq!(streamed, mapped);
    assert_eq!(streamed.size, content.len() as u64);
    assert_eq!(streamed.digest, *blake3::hash(&content).as_bytes());
}
