use deduplicate_files::actions::{
    NoProgress, QuarantineError, QuarantineExecutor, QuarantineManifest,
    QuarantineProgressCallback, QuarantineReport,
};
use deduplicate_files::duplicates::{build_index, resolve, IndexConfig, KeepPolicy};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::tempdir;

fn write(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

#[test]
fn test_quarantined_bytes_are_identical() {
    let root = tempdir().unwrap();
    let q = tempdir().unwrap();
    let mut originals: HashMap<PathBuf, Vec<u8>> = HashMap::new();
    for i in 0..6 {
        let content: Vec<u8> = (0..(i % 3 + 1) * 4096).map(|b| (b % 97) as u8).collect();
        let path = root.path().join(format!("set{}/copy{}.bin", i % 2, i));
        write(&path, &content);
        originals.insert(path, content);
    }

    let (index, _) = build_index(root.path(), IndexConfig::default()).unwrap();
    let plan = resolve(&index, KeepPolicy::default());
    let report = QuarantineExecutor::new(q.path().join("dedup"))
        .execute_plan::<NoProgress>(&plan, None)
        .unwrap();

    assert!(report.all_succeeded());
    assert_eq!(report.success_count(), plan.quarantine.len());
    assert_eq!(report.bytes_moved, plan.reclaimable_bytes);
    for moved in &report.successes {
        assert!(!moved.original.exists());
        assert_eq!(&fs::read(&moved.quarantined).unwrap(), &originals[&moved.original]);
    }
    for kept in plan.kept_paths() {
        assert_eq!(&fs::read(kept).unwrap(), &originals[kept]);
    }
}

#[test]
fn test_same_basename_gets_distinct_ordinals() {
    let root = tempdir().unwrap();
    let q = tempdir().unwrap();
    write(&root.path().join("x/readme.md"), b"same");
    write(&root.path().join("y/readme.md"), b"same");
    write(&root.path().join("zz/readme.md"), b"same");

    let (index, _) = build_index(root.path(), IndexConfig::default()).unwrap();
    let plan = resolve(&index, KeepPolicy::default());
    let qdir = q.path().join("dedup");
    let report = QuarantineExecutor::new(qdir.clone())
        .execute_plan::<NoProgress>(&plan, None)
        .unwrap();

    assert_eq!(report.success_count(), 2);
    assert!(qdir.join("0_readme.md").exists());
    assert!(qdir.join("1_readme.md").exists());
    // Longest path is kept
    assert!(root.path().join("zz/readme.md").exists());
}

#[test]
fn test_manifest_restores_every_move() {
    let root = tempdir().unwrap();
    let q = tempdir().unwrap();
    write(&root.path().join("a"), b"one");
    write(&root.path().join("bb"), b"one");
    write(&root.path().join("ccc"), b"one");

    let (index, _) = build_index(root.path(), IndexConfig::default()).unwrap();
    let plan = resolve(&index, KeepPolicy::default());
    let report = QuarantineExecutor::new(q.path().to_path_buf())
        .execute_plan::<NoProgress>(&plan, None)
        .unwrap();

    let manifest_path = report.manifest.unwrap();
    let manifest: QuarantineManifest =
        serde_json::from_str(&fs::read_to_string(manifest_path).unwrap()).unwrap();
    assert_eq!(manifest.entries.len(), 2);

    // Restoring by hand puts the tree back
    for entry in &manifest.entries {
        fs::rename(&entry.quarantined, &entry.original).unwrap();
    }
    for name in ["a", "bb", "ccc"] {
        assert_eq!(fs::read(root.path().join(name)).unwrap(), b"one");
    }
}

#[test]
fn test_rerun_into_same_directory_never_overwrites() {
    let q = tempdir().unwrap();
    let qdir = q.path().join("dedup");
    let executor = QuarantineExecutor::new(qdir.clone());

    let first = tempdir().unwrap();
    write(&first.path().join("f.txt"), b"first");
    executor
        .execute::<NoProgress>(&[first.path().join("f.txt")], None)
        .unwrap();

    let second = tempdir().unwrap();
    write(&second.path().join("f.txt"), b"second");
    let report = executor
        .execute::<NoProgress>(&[second.path().join("f.txt")], None)
        .unwrap();

    assert_eq!(report.failure_count(), 1);
    assert_eq!(fs::read(qdir.join("0_f.txt")).unwrap(), b"first");
    assert_eq!(fs::read(second.path().join("f.txt")).unwrap(), b"second");
}

#[test]
fn test_vanished_file_does_not_block_others() {
    let root = tempdir().unwrap();
    let q = tempdir().unwrap();
    write(&root.path().join("a1"), b"dup");
    write(&root.path().join("a22"), b"dup");
    write(&root.path().join("a333"), b"dup");

    let (index, _) = build_index(root.path(), IndexConfig::default()).unwrap();
    let plan = resolve(&index, KeepPolicy::default());
    fs::remove_file(&plan.quarantine[0]).unwrap();

    let report = QuarantineExecutor::new(q.path().join("dedup"))
        .execute_plan::<NoProgress>(&plan, None)
        .unwrap();

    assert_eq!(report.failure_count(), 1);
    assert_eq!(report.success_count(), 1);
    assert!(report.failures[0].1.contains("not found"));
}

#[cfg(unix)]
#[test]
fn test_unwritable_parent_fails_directory_creation() {
    use std::os::unix::fs::PermissionsExt;

    let q = tempdir().unwrap();
    let locked = q.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o500)).unwrap();

    // Privileged users bypass permission bits
    if fs::write(locked.join("write_check"), b"").is_ok() {
        return;
    }

    let result = QuarantineExecutor::new(locked.join("dedup"))
        .execute::<NoProgress>(&[PathBuf::from("/nonexistent")], None);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o700)).unwrap();

    assert!(matches!(result, Err(QuarantineError::PermissionDenied(_))));
}

#[cfg(unix)]
#[test]
fn test_unremovable_source_stays_put() {
    use std::os::unix::fs::PermissionsExt;

    let root = tempdir().unwrap();
    let q = tempdir().unwrap();
    let sealed = root.path().join("sealed");
    let file = sealed.join("dup.txt");
    write(&file, b"content");
    fs::set_permissions(&sealed, fs::Permissions::from_mode(0o500)).unwrap();

    if fs::write(sealed.join("write_check"), b"").is_ok() {
        fs::set_permissions(&sealed, fs::Permissions::from_mode(0o700)).unwrap();
        return;
    }

    let report = QuarantineExecutor::new(q.path().to_path_buf())
        .execute::<NoProgress>(&[file.clone()], None)
        .unwrap();
    fs::set_permissions(&sealed, fs::Permissions::from_mode(0o700)).unwrap();

    assert_eq!(report.failure_count(), 1);
    assert_eq!(fs::read(&file).unwrap(), b"content");
    assert!(!q.path().join("0_dup.txt").exists());
}

#[test]
fn test_destination_created_by_someone_else_is_kept() {
    let root = tempdir().unwrap();
    let q = tempdir().unwrap();
    let file = root.path().join("a.txt");
    write(&file, b"ours");
    write(&q.path().join("0_a.txt"), b"theirs");

    let report = QuarantineExecutor::new(q.path().to_path_buf())
        .execute::<NoProgress>(&[file.clone()], None)
        .unwrap();

    assert_eq!(report.failure_count(), 1);
    assert!(report.failures[0].1.contains("already exists"));
    assert_eq!(fs::read(q.path().join("0_a.txt")).unwrap(), b"theirs");
    assert_eq!(fs::read(&file).unwrap(), b"ours");
}

/// Raises the shutdown flag once the first file has been moved.
struct CtrlCAfterFirstMove(Arc<AtomicBool>);

impl QuarantineProgressCallback for CtrlCAfterFirstMove {
    fn on_before_move(&self, _: &Path, _: usize, _: usize) {}
    fn on_move_success(&self, _: &Path, _: u64) {
        self.0.store(true, Ordering::SeqCst);
    }
    fn on_move_failure(&self, _: &Path, _: &str) {}
    fn on_complete(&self, _: &QuarantineReport) {}
}

#[test]
fn test_ctrl_c_during_batch_stops_and_records_moves() {
    let root = tempdir().unwrap();
    let q = tempdir().unwrap();
    for name in ["a", "bb", "ccc"] {
        write(&root.path().join(format!("{name}/copy.txt")), b"same bytes");
    }

    let (index, _) = build_index(root.path(), IndexConfig::default()).unwrap();
    let plan = resolve(&index, KeepPolicy::default());
    assert_eq!(plan.quarantine.len(), 2);

    let flag = Arc::new(AtomicBool::new(false));
    let report = QuarantineExecutor::new(q.path().to_path_buf())
        .with_shutdown_flag(flag.clone())
        .execute_plan(&plan, Some(&CtrlCAfterFirstMove(flag)))
        .unwrap();

    assert!(report.interrupted);
    assert_eq!(report.success_count(), 1);
    assert!(!plan.quarantine[0].exists());
    assert!(plan.quarantine[1].exists());

    let manifest: QuarantineManifest =
        serde_json::from_str(&fs::read_to_string(report.manifest.unwrap()).unwrap()).unwrap();
    assert_eq!(manifest.entries.len(), 1);
    assert_eq!(manifest.entries[0].original, plan.quarantine[0]);
}
