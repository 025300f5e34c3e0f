//! End-to-end traversal behavior over realistic page graphs.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use fiberprobe_core::{Criterion, Object, ObjectRef, SearchConfig, Value};
use fiberprobe_engine::{PageHost, PatchRegistry, SearchEngine};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("fiberprobe_engine=debug")
        .try_init();
}

/// Page element whose entry property leads to `node`.
fn page_root(node: &ObjectRef) -> ObjectRef {
    let element = Object::new();
    element.insert("id", "app");
    element.insert("__reactFiber$k3y", node.clone());
    element
}

fn engine_for(node: &ObjectRef) -> SearchEngine {
    let host = PageHost::new();
    host.register("#app", page_root(node));
    SearchEngine::new(Arc::new(host), Arc::new(PatchRegistry::new()))
}

fn user_info_criteria() -> Vec<Criterion> {
    vec![Criterion::new().present("userInfo")]
}

fn base_config() -> SearchConfig {
    SearchConfig {
        criteria: user_info_criteria(),
        max_depth: 5,
        stop_after_first: true,
        search_paths: vec!["memoizedState".to_string()],
        deep_paths: Vec::new(),
        root_selector: "#app".to_string(),
        ..SearchConfig::default()
    }
}

/// Node with a `memoizedState` built from a JSON fixture.
fn node_with_state(state: serde_json::Value) -> ObjectRef {
    let node = Object::new();
    node.insert("memoizedState", Value::from_json(&state));
    node
}

#[test]
fn end_to_end_single_match() {
    init_tracing();

    let child = node_with_state(serde_json::json!({ "userInfo": { "id": 1 } }));
    let root = Object::new();
    root.insert("child", child.clone());

    let engine = engine_for(&root);
    let results = engine.search(&base_config());

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].criterion_index, 0);
    assert!(Arc::ptr_eq(&results[0].source, &child));

    let user = results[0]
        .matched
        .probe("userInfo")
        .and_then(|v| v.as_object().cloned())
        .expect("matched object holds userInfo");
    assert_eq!(user.probe("id"), Some(Value::Number(1.0)));
}

#[test]
fn cyclic_child_edges_terminate_and_report_each_node_once() {
    let a = node_with_state(serde_json::json!({ "userInfo": { "id": 1 } }));
    let b = Object::new();
    a.insert("child", b.clone());
    b.insert("child", a.clone()); // back edge to an ancestor

    let engine = engine_for(&a);
    let mut config = base_config();
    config.stop_after_first = false;

    let results = engine.search(&config);
    assert_eq!(results.len(), 1);
}

#[test]
fn depth_bound_excludes_deeper_matches_but_inspects_the_boundary() {
    let deep = node_with_state(serde_json::json!({ "userInfo": true }));
    let middle = Object::new();
    middle.insert("child", deep);
    let root = Object::new();
    root.insert("child", middle);

    let engine = engine_for(&root);

    let mut config = base_config();
    config.max_depth = 1; // match sits at depth 2
    assert!(engine.search(&config).is_empty());

    config.max_depth = 2; // boundary node is still inspected
    assert_eq!(engine.search(&config).len(), 1);
}

#[test]
fn first_matching_criterion_index_is_reported() {
    let node = node_with_state(serde_json::json!({
        "userInfo": { "id": 7 },
        "getState": {},
    }));

    let engine = engine_for(&node);
    let mut config = base_config();
    config.criteria = vec![
        Criterion::new().present("userInfo"),
        Criterion::new().present("getState"),
    ];

    let results = engine.search(&config);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].criterion_index, 0);
}

#[test]
fn stop_after_first_limits_the_whole_traversal() {
    let first = node_with_state(serde_json::json!({ "userInfo": { "id": 1 } }));
    let second = node_with_state(serde_json::json!({ "userInfo": { "id": 2 } }));
    first.insert("child", second);

    let engine = engine_for(&first);

    let mut config = base_config();
    assert_eq!(engine.search(&config).len(), 1);

    config.stop_after_first = false;
    assert_eq!(engine.search(&config).len(), 2);
}

#[test]
fn deep_paths_search_the_value_graph_below_the_search_path() {
    // The match is buried two levels under memoizedState; the primary
    // match on the path value itself fails.
    let node = node_with_state(serde_json::json!({
        "queries": { "session": { "userInfo": { "id": 9 } } }
    }));

    let engine = engine_for(&node);

    let mut config = base_config();
    assert!(engine.search(&config).is_empty());

    config.deep_paths = vec!["memoizedState".to_string()];
    let results = engine.search(&config);
    assert_eq!(results.len(), 1);
    assert!(Arc::ptr_eq(&results[0].source, &node));
    assert!(results[0].matched.probe("userInfo").is_some());
}

#[test]
fn deep_search_stops_per_branch_not_globally() {
    // Two nodes, each with a deeply buried match. stop_after_first caps
    // every deep sub-search at one hit but the node traversal goes on.
    let first = node_with_state(serde_json::json!({
        "a": { "userInfo": { "id": 1 } }
    }));
    let second = node_with_state(serde_json::json!({
        "b": { "userInfo": { "id": 2 } }
    }));
    first.insert("child", second);

    let engine = engine_for(&first);
    let mut config = base_config();
    config.deep_paths = vec!["memoizedState".to_string()];

    let results = engine.search(&config);
    assert_eq!(results.len(), 2);
}

#[test]
fn deep_search_also_reports_the_path_value_itself() {
    // When the path value matches directly and is a deep path, it is
    // reported by both tiers.
    let node = node_with_state(serde_json::json!({ "userInfo": { "id": 1 } }));

    let engine = engine_for(&node);
    let mut config = base_config();
    config.stop_after_first = false;
    config.deep_paths = vec!["memoizedState".to_string()];

    let results = engine.search(&config);
    assert_eq!(results.len(), 2);
    assert!(Arc::ptr_eq(&results[0].matched, &results[1].matched));
}

#[test]
fn denied_properties_do_not_abort_the_traversal() {
    let node = node_with_state(serde_json::json!({ "userInfo": { "id": 1 } }));
    node.deny("sibling"); // guarded edge reads as absent

    let guarded_state = Object::new();
    guarded_state.deny("userInfo");
    let guarded = Object::new();
    guarded.insert("memoizedState", guarded_state);
    guarded.insert("child", node);

    let engine = engine_for(&guarded);
    let results = engine.search(&base_config());
    assert_eq!(results.len(), 1);
}

#[test]
fn on_result_fires_exactly_once_with_the_full_set() {
    let first = node_with_state(serde_json::json!({ "userInfo": { "id": 1 } }));
    let second = node_with_state(serde_json::json!({ "userInfo": { "id": 2 } }));
    first.insert("child", second);

    let calls = Arc::new(AtomicUsize::new(0));
    let delivered = Arc::new(AtomicUsize::new(0));
    let calls_in_cb = calls.clone();
    let delivered_in_cb = delivered.clone();

    let engine = engine_for(&first);
    let mut config = base_config();
    config.stop_after_first = false;
    config.on_result = Some(Arc::new(move |results| {
        calls_in_cb.fetch_add(1, Ordering::SeqCst);
        delivered_in_cb.store(results.len(), Ordering::SeqCst);
    }));

    let results = engine.search(&config);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(delivered.load(Ordering::SeqCst), results.len());
    assert_eq!(results.len(), 2);
}

#[test]
fn results_follow_stack_pop_order() {
    // child is pushed before sibling, so the sibling pops first.
    let via_child = node_with_state(serde_json::json!({ "userInfo": { "id": 1 } }));
    let via_sibling = node_with_state(serde_json::json!({ "userInfo": { "id": 2 } }));

    let root = Object::new();
    root.insert("child", via_child.clone());
    root.insert("sibling", via_sibling.clone());

    let engine = engine_for(&root);
    let mut config = base_config();
    config.stop_after_first = false;

    let results = engine.search(&config);
    assert_eq!(results.len(), 2);
    assert!(Arc::ptr_eq(&results[0].source, &via_sibling));
    assert!(Arc::ptr_eq(&results[1].source, &via_child));
}
