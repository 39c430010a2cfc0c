// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

#[test]
fn quarantine_preserves_source_tree_under_root() {
    let src_dir = tempdir().unwrap();
    let q_dir = tempdir().unwrap();
    let quarantine = Quarantine::new(q_dir.path()).unwrap();

    std::fs::create_dir_all(src_dir.path().join("projects/demo")).unwrap();
    let src = src_dir.path().join("projects/demo/x.py");
    std::fs::write(&src, "print('x')").unwrap();

    let dest = quarantine.quarantine_file(&src).unwrap();

    assert!(!src.exists(), "source must be moved, not copied");
    assert!(dest.exists());
    assert!(dest.starts_with(q_dir.path()));
    assert!(dest.ends_with(src.strip_prefix("/").unwrap_or(src.as_path())));
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "print('x')");
}

#[test]
fn files_with_same_name_from_different_dirs_do_not_collide() {
    let src_dir = tempdir().unwrap();
    let q_dir = tempdir().unwrap();
    let quarantine = Quarantine::new(q_dir.path()).unwrap();

    std::fs::create_dir_all(src_dir.path().join("a")).unwrap();
    std::fs::create_dir_all(src_dir.path().join("b")).unwrap();
    let first = src_dir.path().join("a/x.py");
    let second = src_dir.path().join("b/x.py");
    std::fs::write(&first, "one").unwrap();
    std::fs::write(&second, "two").unwrap();

    let dest_a = quarantine.quarantine_file(&first).unwrap();
    let dest_b = quarantine.quarantine_file(&second).unwrap();

    assert_ne!(dest_a, dest_b);
    assert_eq!(std::fs::read_to_string(&dest_a).unwrap(), "one");
    assert_eq!(std::fs::read_to_string(&dest_b).unwrap(), "two");
}

#[test]
fn delete_quarantined_removes_file() {
    let src_dir = tempdir().unwrap();
    let q_dir = tempdir().unwrap();
    let quarantine = Quarantine::new(q_dir.path()).unwrap();

    let src = src_dir.path().join("x.py");
    std::fs::write(&src, "x").unwrap();
    let dest = quarantine.quarantine_file(&src).unwrap();

    quarantine.delete_quarantined(&dest).unwrap();
    assert!(!dest.exists());

    // Second delete reports the absence
    assert!(quarantine.delete_quarantined(&dest).is_err());
}

#[test]
fn restore_moves_file_back() {
    let src_dir = tempdir().unwrap();
    let q_dir = tempdir().unwrap();
    let quarantine = Quarantine::new(q_dir.path()).unwrap();

    let src = src_dir.path().join("nested/x.py");
    std::fs::create_dir_all(src.parent().unwrap()).unwrap();
    std::fs::write(&src, "data").unwrap();

    let dest = quarantine.quarantine_file(&src).unwrap();
    quarantine.restore_file(&dest, &src).unwrap();

    assert!(src.exists());
    assert!(!dest.exists());
    assert_eq!(std::fs::read_to_string(&src).unwrap(), "data");
}
