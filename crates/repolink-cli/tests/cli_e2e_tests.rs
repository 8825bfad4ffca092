//! CLI end-to-end tests that invoke the compiled `repolink` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use repolink_test_utils::TestTree;

/// A `repolink` command pointed at the tree's roots.
fn repolink(tree: &TestTree) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_repolink"));
    cmd.env_remove("REPOLINK_WORKSPACE")
        .env_remove("REPOLINK_PROJECT_ROOT")
        .env_remove("REPOLINK_POLICY")
        .env_remove("RUST_LOG")
        .arg("--project-root")
        .arg(tree.project().path())
        .arg("--workspace-root")
        .arg(tree.workspace().path())
        .args(["--gate-timeout-ms", "2000"]);
    cmd
}

fn alpha_beta() -> TestTree {
    let tree = TestTree::new();
    tree.repo("alpha")
        .write("alpha/docs/guide.md", "# Guide")
        .write("alpha/README.md", "# Alpha")
        .repo("beta")
        .write("beta/notes.md", "# Beta");
    tree
}

// ============================================================================
// Basics
// ============================================================================

#[test]
fn test_help_exits_zero() {
    Command::new(env!("CARGO_BIN_EXE_repolink"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("reconcile"))
        .stdout(predicate::str::contains("policy"));
}

#[test]
fn test_no_command_prints_hint() {
    let tree = TestTree::new();
    repolink(&tree)
        .assert()
        .success()
        .stdout(predicate::str::contains("repolink --help"));
}

#[test]
fn test_completions_bash() {
    Command::new(env!("CARGO_BIN_EXE_repolink"))
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("repolink"));
}

// ============================================================================
// Index
// ============================================================================

#[test]
fn test_index_lists_repositories() {
    let tree = alpha_beta();
    repolink(&tree)
        .arg("index")
        .assert()
        .success()
        .stdout(predicate::str::contains("alpha"))
        .stdout(predicate::str::contains("beta"))
        .stdout(predicate::str::contains("2 indexed, 0 selected"));
}

#[test]
fn test_index_json_marks_selection() {
    let tree = alpha_beta();
    repolink(&tree)
        .args(["policy", "add", "repository-include", "beta"])
        .assert()
        .success();

    let output = repolink(&tree).args(["index", "--json"]).output().unwrap();
    assert!(output.status.success());
    let entries: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("Should print valid JSON");
    assert_eq!(
        entries,
        serde_json::json!([
            { "path": "alpha", "selected": false },
            { "path": "beta", "selected": true },
        ])
    );
}

// ============================================================================
// Policy
// ============================================================================

#[test]
fn test_policy_show_json_has_defaults() {
    let tree = TestTree::new();
    let output = repolink(&tree)
        .args(["policy", "show", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let policy: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(policy["isWhitelist"], true);
    assert_eq!(policy["shouldSymlinkOnStart"], false);
    assert_eq!(policy["repositoryDirLink"], serde_json::json!(["docs"]));
}

#[test]
fn test_policy_changes_are_persisted() {
    let tree = TestTree::new();
    repolink(&tree)
        .args(["policy", "set", "whitelist", "false"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved"));
    repolink(&tree)
        .args(["policy", "set", "whitelist", "false"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Policy unchanged"));

    assert!(
        tree.workspace_path(".repolink/policy.json").is_file(),
        "Policy should be saved inside the workspace"
    );
}

#[test]
fn test_empty_item_is_rejected() {
    let tree = TestTree::new();
    repolink(&tree)
        .args(["policy", "add", "dir-link", "/"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"))
        .stderr(predicate::str::contains("empty"));
}

// ============================================================================
// Reconcile and status
// ============================================================================

#[cfg(unix)]
#[test]
fn test_add_then_reconcile_links_documents() {
    let tree = alpha_beta();
    repolink(&tree)
        .args(["policy", "add", "repository-include", "alpha", "--reconcile"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Reconciled"));

    tree.assert_dir_link("alpha/docs");
    tree.assert_file_link("alpha/README.md");
    tree.assert_absent("beta");
}

#[cfg(unix)]
#[test]
fn test_reconcile_json_report() {
    let tree = alpha_beta();
    repolink(&tree)
        .args(["policy", "set", "whitelist", "false"])
        .assert()
        .success();

    let output = repolink(&tree)
        .args(["reconcile", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["linked"], serde_json::json!(["alpha", "beta"]));
    assert_eq!(report["dir_links"], 1);
    assert_eq!(report["file_links"], 2);
    assert_eq!(report["gate"], "confirmed");
}

#[cfg(unix)]
#[test]
fn test_status_after_reconcile() {
    let tree = alpha_beta();
    repolink(&tree)
        .args(["policy", "add", "repository-include", "alpha", "--reconcile"])
        .assert()
        .success();

    repolink(&tree)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("folder-symlink"))
        .stdout(predicate::str::contains("file-symlink"))
        .stdout(predicate::str::contains(".repolink").not());
}

#[test]
fn test_start_skips_without_flag() {
    let tree = alpha_beta();
    repolink(&tree)
        .arg("start")
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to do"));
    assert!(tree.workspace_listing().is_empty());
}

#[test]
fn test_project_inside_workspace_is_refused() {
    let tree = TestTree::new();
    tree.write_workspace("inner/alpha/.git/HEAD", "ref: refs/heads/main");

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_repolink"));
    cmd.env_remove("REPOLINK_POLICY")
        .arg("--workspace-root")
        .arg(tree.workspace().path())
        .arg("--project-root")
        .arg(tree.workspace_path("inner"))
        .arg("reconcile")
        .assert()
        .failure()
        .stderr(predicate::str::contains("must not be inside"));

    assert!(tree.workspace_path("inner/alpha/.git/HEAD").is_file());
}
