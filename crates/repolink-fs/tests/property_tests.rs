use proptest::prelude::*;
use repolink_fs::{NormalizedPath, SandboxedRoot, parent_of, sanitize_relative};
use std::path::Path;

fn segment() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_.-]{1,8}".prop_filter("plain segment", |s| s != "." && s != "..")
}

proptest! {
    #[test]
    fn parent_walk_takes_one_step_per_segment(segments in prop::collection::vec(segment(), 1..8)) {
        let path = segments.join("/");
        let mut current = path.as_str();
        let mut steps = 0;

        while !current.is_empty() {
            current = parent_of(current);
            steps += 1;
            prop_assert!(!current.split('/').any(|s| s == ".."));
            prop_assert!(steps <= segments.len());
        }

        prop_assert_eq!(steps, segments.len());
    }

    #[test]
    fn resolve_never_leaves_root(input in "[a-z./\\\\]{0,24}") {
        let root = SandboxedRoot::new("/vault");
        let resolved = root.resolve(&input);

        prop_assert!(resolved.starts_with(Path::new("/vault")));
        prop_assert!(!sanitize_relative(&input).split('/').any(|s| s == ".." || s == "."));
    }

    #[test]
    fn normalization_is_idempotent(s in "\\PC*") {
        let path = NormalizedPath::new(&s);
        prop_assert!(!path.as_str().contains('\\'));

        let again = NormalizedPath::new(path.to_native());
        prop_assert_eq!(path, again);
    }

    #[test]
    fn join_with_empty_is_identity(a in "[a-z/]{0,16}") {
        let base = NormalizedPath::new(&a);
        prop_assert_eq!(base.join(""), base.clone());
        prop_assert_eq!(base.join("."), base);
    }
}
