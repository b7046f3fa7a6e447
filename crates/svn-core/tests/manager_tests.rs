//! Tests for the repository registry

use std::path::PathBuf;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use svn_cli::CliOutput;
use svn_core::SourceControlManager;
use svn_test_utils::ScriptedInvoker;
use svn_test_utils::fixtures::{fake_working_copy, info_output};

const REPO_ROOT: &str = "https://svn.example.com/repo";

fn manager_with_info() -> (Arc<ScriptedInvoker>, SourceControlManager) {
    let invoker = Arc::new(ScriptedInvoker::new().with_default(
        "info",
        CliOutput::ok(info_output(REPO_ROOT, "trunk", 44)),
    ));
    let manager = SourceControlManager::new(invoker.clone());
    (invoker, manager)
}

/// Canonical working-copy fixture; canonicalized up front so path assertions
/// are stable across platforms with symlinked temp directories.
fn working_copy() -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let root = temp.path().canonicalize().unwrap();
    fake_working_copy(&root);
    (temp, root)
}

#[tokio::test]
async fn plain_directory_is_a_normal_negative() {
    let (_invoker, manager) = manager_with_info();
    let temp = TempDir::new().unwrap();

    let result = manager
        .try_open_repository(temp.path())
        .await
        .expect("probe should not error");
    assert!(result.is_none());
    assert!(manager.repositories().is_empty());
}

#[tokio::test]
async fn open_is_idempotent_per_root() {
    let (_invoker, manager) = manager_with_info();
    let (_temp, root) = working_copy();

    let first = manager
        .try_open_repository(&root)
        .await
        .expect("open")
        .expect("repository");
    let second = manager
        .try_open_repository(&root)
        .await
        .expect("open")
        .expect("repository");

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(manager.repositories().len(), 1);
}

#[tokio::test]
async fn open_walks_up_to_the_working_copy_root() {
    let (_invoker, manager) = manager_with_info();
    let (_temp, root) = working_copy();
    std::fs::create_dir_all(root.join("src/deep")).unwrap();

    let repository = manager
        .try_open_repository(&root.join("src/deep"))
        .await
        .expect("open")
        .expect("repository");

    assert_eq!(repository.root(), root.as_path());
}

#[tokio::test]
async fn resolves_nested_paths_to_their_owning_repository() {
    let (_invoker, manager) = manager_with_info();
    let (_temp, root) = working_copy();

    let opened = manager
        .try_open_repository(&root)
        .await
        .expect("open")
        .expect("repository");

    let resolved = manager
        .repository_for_path(&root.join("src/does-not-exist.c"))
        .expect("owning repository");
    assert!(Arc::ptr_eq(&opened, &resolved));

    assert!(manager
        .repository_for_path(&PathBuf::from("/nowhere/else"))
        .is_none());
}

#[tokio::test]
async fn close_disposes_the_repository() {
    let (_invoker, manager) = manager_with_info();
    let (_temp, root) = working_copy();

    let repository = manager
        .try_open_repository(&root)
        .await
        .expect("open")
        .expect("repository");

    assert!(manager.close_repository(&root));
    assert!(repository.is_disposed());
    assert!(manager.repositories().is_empty());
    assert!(!manager.close_repository(&root));
}

#[tokio::test]
async fn dispose_cascades_to_every_open_repository() {
    let (_invoker, manager) = manager_with_info();
    let (_temp_a, root_a) = working_copy();
    let (_temp_b, root_b) = working_copy();

    let a = manager
        .try_open_repository(&root_a)
        .await
        .expect("open")
        .expect("repository");
    let b = manager
        .try_open_repository(&root_b)
        .await
        .expect("open")
        .expect("repository");

    manager.dispose();

    assert!(a.is_disposed());
    assert!(b.is_disposed());
    assert!(manager.repositories().is_empty());
}
