//! Built-in criteria presets.
//!
//! Signature groups for the state-management libraries commonly found in
//! inspected pages, plus the default search-path pair. These are plain
//! data; sites with different shapes supply their own groups.

use crate::criteria::{CriteriaGroup, Criterion};

/// The node properties inspected by default.
pub fn default_search_paths() -> Vec<String> {
    vec!["memoizedProps".to_string(), "memoizedState".to_string()]
}

/// Signature criteria for well-known client state libraries.
pub fn state_library_signatures() -> Vec<CriteriaGroup> {
    vec![
        CriteriaGroup::new(
            "React Query",
            vec![Criterion::new()
                .nested("client", Criterion::new().present("queryCache"))
                .nested(
                    "useQuery",
                    Criterion::new().present("queryKey").present("queryFn"),
                )
                .nested("useMutation", Criterion::new().present("mutationFn"))],
        ),
        CriteriaGroup::new(
            "Redux",
            vec![Criterion::new()
                .nested("store", Criterion::new().present("createStore"))
                .nested("actions", Criterion::new().present("type"))
                .nested(
                    "reducers",
                    Criterion::new().present("state").present("action"),
                )],
        ),
        CriteriaGroup::new(
            "MobX",
            vec![Criterion::new()
                .nested("observable", Criterion::new().present("makeObservable"))
                .nested("action", Criterion::new().present("runInAction"))
                .nested("computed", Criterion::new().present("makeAutoObservable"))],
        ),
        CriteriaGroup::new(
            "Recoil",
            vec![Criterion::new()
                .nested("atom", Criterion::new().present("key").present("default"))
                .nested("selector", Criterion::new().present("get").present("set"))
                .present("useRecoilState")],
        ),
        CriteriaGroup::new(
            "Zustand",
            vec![Criterion::new()
                .nested(
                    "create",
                    Criterion::new().present("setState").present("getState"),
                )
                .present("useStore")],
        ),
        CriteriaGroup::new(
            "Jotai",
            vec![Criterion::new()
                .nested("atom", Criterion::new().present("init"))
                .present("useAtom")
                .present("atomFamily")],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::flatten_groups;

    #[test]
    fn signature_groups_flatten_in_order() {
        let groups = state_library_signatures();
        let labels: Vec<_> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["React Query", "Redux", "MobX", "Recoil", "Zustand", "Jotai"]
        );

        let flat = flatten_groups(&groups);
        assert_eq!(flat.len(), 6);
        assert!(flat.iter().all(|criterion| !criterion.is_empty()));
    }

    #[test]
    fn default_paths_are_the_memoized_pair() {
        assert_eq!(
            default_search_paths(),
            vec!["memoizedProps", "memoizedState"]
        );
    }
}
