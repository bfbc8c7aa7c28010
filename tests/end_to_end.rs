use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use vfolder::{
    DiffOptions, ExtRename, Mismatch, TransformPlan, VirtualFolder, VirtualItem, WriteAction,
    WriteOptions, diff_folders, export_hierarchy, read_folder_hierarchy, render_side_by_side,
    start_write, wait_for_completion, write_folder_hierarchy,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn write_files(dir: &Path, names: &[&str]) {
    fs::create_dir_all(dir).unwrap();
    for name in names {
        fs::write(dir.join(name), format!("content of {name}")).unwrap();
    }
}

const MIXED: [&str; 5] = ["a.ps1", "b.py", "c.json", "d.tmp", "e.txt"];

/// project/{top.ps1, top.tmp, excluded1, level1/{sub1/{deep1}, sub2/{deep2}, excluded2}}
fn create_project(parent: &Path) -> PathBuf {
    let root = parent.join("project");
    write_files(&root, &["top.ps1", "top.tmp"]);
    for dir in [
        "excluded1",
        "level1",
        "level1/sub1",
        "level1/sub1/deep1",
        "level1/sub2",
        "level1/sub2/deep2",
        "level1/excluded2",
    ] {
        write_files(&root.join(dir), &MIXED);
    }
    root
}

fn export_plan() -> TransformPlan {
    TransformPlan::builder()
        .exclude_folders(vec!["excluded*".to_string()])
        .exclude_items(vec!["*.tmp".to_string()])
        .ext_renames(vec![ExtRename::new("ps1", "txt")])
        .build()
        .unwrap()
}

fn expected_item(name: &str, original: &str) -> VirtualItem {
    VirtualItem::from_file_name(name, Some(format!("content of {original}").into_bytes())).unwrap()
}

/// The export of `create_project`, built by hand.
fn expected_export() -> VirtualFolder {
    let exported = |name: &str| {
        let mut folder = VirtualFolder::new(name).unwrap();
        folder.add_item(expected_item("a.txt", "a.ps1")).unwrap();
        folder.add_item(expected_item("b.py", "b.py")).unwrap();
        folder.add_item(expected_item("c.json", "c.json")).unwrap();
        folder.add_item(expected_item("e.txt", "e.txt")).unwrap();
        folder
    };

    let mut root = VirtualFolder::new("project").unwrap();
    root.add_item(expected_item("top.txt", "top.ps1")).unwrap();
    let mut sub1 = exported("sub1");
    sub1.add_sub_folder(exported("deep1")).unwrap();
    let mut sub2 = exported("sub2");
    sub2.add_sub_folder(exported("deep2")).unwrap();
    let mut level1 = exported("level1");
    level1.add_sub_folder(sub1).unwrap();
    level1.add_sub_folder(sub2).unwrap();
    root.add_sub_folder(level1).unwrap();
    root
}

#[test]
fn test_export_scenario() {
    init_tracing();
    let temp = TempDir::new().unwrap();
    let source = create_project(&temp.path().join("in"));
    let dest = temp.path().join("out").join("project");

    let options = WriteOptions::new(WriteAction::Write).execute(true);
    let report = export_hierarchy(&source, &dest, &export_plan(), options).unwrap();

    assert!(report.write.is_success(), "{:?}", report.write.failures);
    assert_eq!(report.transform.removed.folders_removed.len(), 2);
    // top.tmp, plus d.tmp in level1, sub1, deep1, sub2 and deep2
    assert_eq!(report.transform.removed.items_removed.len(), 6);
    assert_eq!(report.transform.extensions_changed, 6);
    // top.txt, plus four items in each of the five kept folders
    assert_eq!(report.write.succeeded, 21);

    let written = read_folder_hierarchy(&dest, true).unwrap();
    let expected = expected_export();
    assert!(
        written.equals(&expected),
        "\n{}",
        render_side_by_side(&expected, &written, false)
    );
    assert!(written.equals(&report.tree));

    // The source is untouched by a Write export.
    assert!(source.join("excluded1/a.ps1").exists());
    assert!(source.join("top.ps1").exists());
}

#[test]
fn test_round_trip_read_write() {
    init_tracing();
    let temp = TempDir::new().unwrap();
    let source = create_project(&temp.path().join("in"));
    let dest = temp.path().join("out").join("project");

    let original = read_folder_hierarchy(&source, true).unwrap();
    let result = write_folder_hierarchy(&dest, &original, WriteAction::Write, true);
    assert!(result.is_success());

    let reread = read_folder_hierarchy(&dest, false).unwrap();
    assert!(reread.equals(&original));
    assert!(diff_folders(&original, &reread, DiffOptions::default()).is_match());
}

#[test]
fn test_copy_export_from_lazy_tree() {
    init_tracing();
    let temp = TempDir::new().unwrap();
    let source = create_project(&temp.path().join("in"));
    let dest = temp.path().join("out").join("project");

    let options = WriteOptions::new(WriteAction::Copy).execute(true);
    let report = export_hierarchy(&source, &dest, &export_plan(), options).unwrap();
    assert!(report.write.is_success());

    let written = read_folder_hierarchy(&dest, false).unwrap();
    assert!(written.equals(&expected_export()));
}

#[test]
fn test_dry_run_is_a_no_op() {
    init_tracing();
    let temp = TempDir::new().unwrap();
    let source = create_project(&temp.path().join("in"));
    let dest = temp.path().join("out").join("project");
    let before = read_folder_hierarchy(&source, true).unwrap();

    for action in [WriteAction::Write, WriteAction::Move, WriteAction::Touch] {
        let report =
            export_hierarchy(&source, &dest, &export_plan(), WriteOptions::new(action)).unwrap();
        assert!(!report.write.executed);
        assert_eq!(report.write.succeeded, 21, "{action}");
    }

    assert!(!dest.exists());
    assert!(read_folder_hierarchy(&source, true).unwrap().equals(&before));
}

#[test]
fn test_diff_pinpoints_tampered_output() {
    init_tracing();
    let temp = TempDir::new().unwrap();
    let source = create_project(&temp.path().join("in"));
    let dest = temp.path().join("out").join("project");

    let options = WriteOptions::new(WriteAction::Write).execute(true);
    export_hierarchy(&source, &dest, &export_plan(), options).unwrap();
    fs::write(dest.join("level1/sub1/b.py"), "tampered").unwrap();
    fs::write(dest.join("stray.log"), "").unwrap();

    let written = read_folder_hierarchy(&dest, false).unwrap();
    let diff = diff_folders(&expected_export(), &written, DiffOptions::default());
    assert_eq!(diff.len(), 2, "{}", diff.summary());
    assert!(diff.mismatches.iter().any(|m| matches!(
        m,
        Mismatch::ContentDiffers { path, .. } if path == &PathBuf::from("level1/sub1/b.py")
    )));
    assert!(diff.mismatches.contains(&Mismatch::UnexpectedItem {
        path: PathBuf::from("stray.log")
    }));
}

#[tokio::test]
async fn test_async_write_matches_sync_write() {
    init_tracing();
    let temp = TempDir::new().unwrap();
    let source = create_project(&temp.path().join("in"));
    let dest = temp.path().join("out").join("project");

    let mut tree = read_folder_hierarchy(&source, false).unwrap();
    export_plan().apply(&mut tree).unwrap();

    let rx = start_write(
        dest.clone(),
        tree.clone(),
        WriteOptions::new(WriteAction::Write).execute(true),
    );
    let result = wait_for_completion(rx).await.unwrap();
    assert_eq!(result.succeeded, 21);

    let written = read_folder_hierarchy(&dest, false).unwrap();
    assert!(written.equals(&tree));
}
