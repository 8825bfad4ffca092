//! End-to-end lifecycle of a vault kept in step with a project root
//!
//! These tests use the real file-backed policy store and the polling host, so
//! every pass goes through the same path a long-running integration would.

use std::sync::Arc;
use std::time::Duration;

use repolink_core::{
    EngineOptions, FilePolicyStore, GateConfig, GateOutcome, LinkEngine, ListSetting,
    PolicyStore, PolicyUpdate, PollingHost, ReconciliationPolicy, RepositoryPath, ToggleSetting,
};
use repolink_test_utils::TestTree;
use rstest::rstest;

fn engine(tree: &TestTree) -> LinkEngine {
    let workspace = tree.workspace().clone();
    LinkEngine::new(
        tree.project().clone(),
        workspace.clone(),
        Box::new(FilePolicyStore::in_workspace(workspace.path())),
        Arc::new(PollingHost::with_interval(
            workspace.path(),
            Duration::from_millis(10),
        )),
        EngineOptions::default()
            .with_gate(GateConfig::default().with_max_elapsed(Duration::from_secs(5))),
    )
}

fn paths(names: &[&str]) -> Vec<RepositoryPath> {
    names.iter().map(|n| RepositoryPath::new(n).unwrap()).collect()
}

fn alpha_beta() -> TestTree {
    let tree = TestTree::new();
    tree.repo("alpha")
        .write("alpha/docs/guide.md", "# Guide")
        .write("alpha/README.md", "# Alpha")
        .repo("beta")
        .write("beta/notes.md", "# Beta")
        .write("beta/node_modules/pkg/README.md", "vendored");
    tree
}

// =============================================================================
// Startup
// =============================================================================

mod startup {
    use super::*;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_start_reconciles_from_a_hand_written_policy() {
        let tree = alpha_beta();
        tree.write_workspace(
            ".repolink/policy.json",
            r#"{
                "repositoryInclude": ["./alpha/", "alpha", ""],
                "shouldSymlinkOnStart": true,
                "someFutureKey": 42
            }"#,
        );

        let engine = engine(&tree);
        let report = engine
            .start()
            .await
            .expect("Should start")
            .expect("Should reconcile on start");

        assert_eq!(
            engine.policy().list(ListSetting::RepositoryInclude),
            ["alpha".to_string()]
        );
        assert_eq!(report.linked, paths(&["alpha"]));
        assert_eq!(report.gate, GateOutcome::Confirmed);
        tree.assert_dir_link("alpha/docs");
        tree.assert_file_link("alpha/README.md");
        tree.assert_absent("beta");
    }

    #[tokio::test]
    async fn test_start_without_flag_only_refreshes() {
        let tree = alpha_beta();
        let engine = engine(&tree);

        assert!(engine.start().await.unwrap().is_none());
        assert_eq!(engine.repositories().indexed, paths(&["alpha", "beta"]));
        assert!(engine.repositories().filtered.is_empty());
        assert!(tree.workspace_listing().is_empty());
    }
}

// =============================================================================
// Policy changes between passes
// =============================================================================

mod policy_changes {
    use super::*;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_switching_repositories_replaces_links() {
        let tree = alpha_beta();
        let engine = engine(&tree);
        engine.start().await.unwrap();

        engine
            .update_policy([PolicyUpdate::AddListItem(
                ListSetting::RepositoryInclude,
                "alpha".into(),
            )])
            .unwrap();
        engine.reconcile().await.unwrap();
        tree.assert_dir_link("alpha/docs");

        engine
            .update_policy([
                PolicyUpdate::RemoveListItem(ListSetting::RepositoryInclude, "alpha".into()),
                PolicyUpdate::AddListItem(ListSetting::RepositoryInclude, "beta".into()),
            ])
            .unwrap();
        let report = engine.reconcile().await.unwrap();

        assert!(report.deleted > 0);
        assert_eq!(report.gate, GateOutcome::Confirmed);
        tree.assert_absent("alpha");
        tree.assert_file_link("beta/notes.md");
        tree.assert_absent("beta/node_modules");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_blacklist_links_everything_but_ignored() {
        let tree = alpha_beta();
        let engine = engine(&tree);
        engine
            .update_policy([
                PolicyUpdate::SetToggle(ToggleSetting::IsWhitelist, false),
                PolicyUpdate::AddListItem(ListSetting::RepositoryIgnore, "beta".into()),
            ])
            .unwrap();

        let report = engine.reconcile().await.unwrap();

        assert_eq!(report.linked, paths(&["alpha"]));
        tree.assert_dir_link("alpha/docs");
        tree.assert_absent("beta");
    }

    #[tokio::test]
    async fn test_policy_survives_a_new_engine() {
        let tree = TestTree::new();
        engine(&tree)
            .update_policy([
                PolicyUpdate::SetList(ListSetting::DirLink, vec!["docs".into(), "guides".into()]),
                PolicyUpdate::SetToggle(ToggleSetting::SymlinkOnStart, true),
            ])
            .unwrap();

        let reopened = engine(&tree);
        let policy = reopened.load_policy().unwrap();
        assert_eq!(policy.dir_link(), ["docs".to_string(), "guides".to_string()]);
        assert!(policy.symlink_on_start());
    }
}

// =============================================================================
// Policy file formats
// =============================================================================

mod formats {
    use super::*;

    #[rstest]
    #[case::json("policy.json")]
    #[case::toml("policy.toml")]
    #[case::yaml("policy.yaml")]
    fn test_policy_round_trips_through_file(#[case] name: &str) {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePolicyStore::new(dir.path().join(name));
        let policy = ReconciliationPolicy::default()
            .with_toggle(ToggleSetting::IsWhitelist, false)
            .with_list(ListSetting::RepositoryIgnore, ["group/legacy"])
            .unwrap();

        store.save(&policy).expect("Should save policy");

        assert_eq!(store.load().expect("Should load policy"), policy);
    }

    #[test]
    fn test_json_uses_persisted_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.json");
        FilePolicyStore::new(&path)
            .save(&ReconciliationPolicy::default())
            .unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        for key in [
            "repositoryDirIgnore",
            "repositoryDirLink",
            "repositoryIgnore",
            "repositoryInclude",
            "isWhitelist",
            "shouldSymlinkOnStart",
        ] {
            assert!(raw.get(key).is_some(), "missing {key}");
        }
    }
}

// =============================================================================
// Layouts
// =============================================================================

mod layouts {
    use super::*;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_vault_nested_in_project_root() {
        let tree = TestTree::nested();
        tree.repo("alpha").write("alpha/docs/guide.md", "# Guide");
        tree.repo("vault/stray");

        let engine = engine(&tree);
        engine
            .update_policy([PolicyUpdate::SetToggle(ToggleSetting::IsWhitelist, false)])
            .unwrap();
        let report = engine.reconcile().await.unwrap();

        assert_eq!(report.indexed, paths(&["alpha"]));
        tree.assert_dir_link("alpha/docs");
        assert!(tree.workspace_path("stray/.git").exists());
    }

    #[tokio::test]
    async fn test_missing_project_root_is_reported() {
        let tree = TestTree::new();
        std::fs::remove_dir(tree.project().path()).unwrap();

        let engine = engine(&tree);
        assert!(engine.reconcile().await.is_err());
        assert!(!engine.is_reconciling());
    }
}
