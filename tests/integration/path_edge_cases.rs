use deduplicate_files::actions::{NoProgress, QuarantineExecutor};
use deduplicate_files::duplicates::{build_index, resolve, IndexConfig, KeepPolicy};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_unicode_and_spaces_in_names() {
    let root = tempdir().unwrap();
    let q = tempdir().unwrap();
    fs::write(root.path().join("résumé final.pdf"), b"cv").unwrap();
    fs::write(root.path().join("日本語 コピー.pdf"), b"cv").unwrap();

    let (index, _) = build_index(root.path(), IndexConfig::default()).unwrap();
    let plan = resolve(&index, KeepPolicy::default());
    assert_eq!(plan.duplicate_groups, 1);

    let report = QuarantineExecutor::new(q.path().to_path_buf())
        .execute_plan::<NoProgress>(&plan, None)
        .unwrap();
    assert!(report.all_succeeded());
    let moved = &report.successes[0].quarantined;
    assert!(moved
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("0_"));
}

#[cfg(not(windows))]
#[test]
fn test_quotes_and_newlines_in_names() {
    let root = tempdir().unwrap();
    fs::write(root.path().join("with \"quote\".txt"), b"same").unwrap();
    fs::write(root.path().join("with\nnewline.txt"), b"same").unwrap();

    let (index, report) = build_index(root.path(), IndexConfig::default()).unwrap();
    assert!(report.is_complete());
    assert_eq!(resolve(&index, KeepPolicy::default()).duplicate_groups, 1);
}

#[cfg(unix)]
#[test]
fn test_symlink_to_duplicate_is_not_counted() {
    let root = tempdir().unwrap();
    let target = root.path().join("real.txt");
    fs::write(&target, b"data").unwrap();
    std::os::unix::fs::symlink(&target, root.path().join("link.txt")).unwrap();

    let (index, report) = build_index(root.path(), IndexConfig::default()).unwrap();
    assert_eq!(index.total_files(), 1);
    assert_eq!(report.skipped, 1);
    assert!(resolve(&index, KeepPolicy::default()).is_empty());
}

#[test]
fn test_deep_nesting() {
    let root = tempdir().unwrap();
    let mut deep = root.path().to_path_buf();
    for i in 0..40 {
        deep.push(format!("level{i}"));
    }
    fs::create_dir_all(&deep).unwrap();
    fs::write(deep.join("bottom.txt"), b"deep").unwrap();
    fs::write(root.path().join("top.txt"), b"deep").unwrap();

    let (index, _) = build_index(root.path(), IndexConfig::default()).unwrap();
    let plan = resolve(&index, KeepPolicy::default());
    assert_eq!(plan.sets[0].keep, deep.join("bottom.txt"));
    assert_eq!(plan.quarantine, vec![root.path().join("top.txt")]);
}
