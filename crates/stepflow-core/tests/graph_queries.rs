mod support;

use petgraph::visit::EdgeRef;
use stepflow_core::{ChainStats, EngineError, NodeRole, RunOptions, ToolStatus};
use support::{fixture, AddDelta};

#[test]
fn stats_for_two_branches() {
    // E -> T1 -> T3, E -> T2
    let mut f = fixture(&[1]);
    let t = AddDelta::new(1);
    let t1 = f.add("T1", None, &t);
    f.add("T2", None, &t);
    f.add("T3", Some(t1), &t);
    assert_eq!(f.engine.get_stats(f.chain).unwrap(), ChainStats { depth: 3, width: 2 });
}

#[test]
fn stats_for_an_empty_chain() {
    let f = fixture(&[1]);
    assert_eq!(f.engine.get_stats(f.chain).unwrap(), ChainStats { depth: 1, width: 1 });
}

#[test]
fn deleting_with_dependencies_splices_the_chain() {
    let mut f = fixture(&[1]);
    let t = AddDelta::new(1);
    let t1 = f.add("T1", None, &t);
    let t2 = f.add("T2", Some(t1), &t);
    let t3 = f.add("T3", Some(t2), &t);
    f.engine.run(t3, RunOptions::default()).unwrap();

    f.engine.delete_tool(t2, true).unwrap();
    let node = f.engine.catalog().tool(t3).unwrap();
    assert_eq!(node.previous_step, Some(t1));
    assert!(!node.is_valid());
    assert!(matches!(f.engine.catalog().tool(t2), Err(EngineError::UnknownTool(_))));
    assert_eq!(f.engine.get_stats(f.chain).unwrap(), ChainStats { depth: 3, width: 1 });
}

#[test]
fn deleting_without_dependencies_drops_the_subtree() {
    let mut f = fixture(&[1]);
    let t = AddDelta::new(1);
    let t1 = f.add("T1", None, &t);
    let t2 = f.add("T2", Some(t1), &t);
    f.add("T3", Some(t2), &t);
    let other = f.add("other", None, &t);
    f.engine.delete_tool(t2, false).unwrap();
    assert_eq!(f.engine.get_all_tools(f.chain), vec![t1, other]);
}

#[test]
fn rewiring_into_a_descendant_is_rejected_without_mutation() {
    let mut f = fixture(&[1]);
    let t = AddDelta::new(1);
    let a = f.add("A", None, &t);
    let b = f.add("B", Some(a), &t);
    let c = f.add("C", Some(b), &t);
    f.engine.run(c, RunOptions::default()).unwrap();

    for bad in [a, b, c] {
        let err = f.engine.set_previous_step(a, Some(bad), false).unwrap_err();
        assert!(matches!(err, EngineError::CycleRejected { .. }));
    }
    assert_eq!(f.engine.catalog().tool(a).unwrap().previous_step, None);
    assert!(f.engine.catalog().tool(c).unwrap().is_valid());
    assert_eq!(f.engine.get_acceptable_previous_steps(a).unwrap(), Vec::<stepflow_core::ToolId>::new());
    assert_eq!(f.engine.get_acceptable_previous_steps(c).unwrap(), vec![a, b]);
}

#[test]
fn rewiring_across_chains_is_rejected() {
    let mut f = fixture(&[1]);
    let t = AddDelta::new(1);
    let a = f.add("A", None, &t);
    let other_chain = f.engine.add_chain("other", "", f.extractor).unwrap().value;
    let x = f.engine.add_tool(other_chain, "X", "", None, Box::new(t.clone())).unwrap().value;
    let err = f.engine.set_previous_step(x, Some(a), false).unwrap_err();
    assert!(matches!(err, EngineError::CycleRejected { .. }));
    assert!(matches!(f.engine.add_tool(other_chain, "Y", "", Some(a), Box::new(t.clone())),
                     Err(EngineError::CycleRejected { .. })));
}

#[test]
fn legal_rewiring_invalidates_the_moved_subtree() {
    let mut f = fixture(&[1]);
    let t = AddDelta::new(1);
    let a = f.add("A", None, &t);
    let b = f.add("B", None, &t);
    let c = f.add("C", Some(b), &t);
    f.engine.run(c, RunOptions::default()).unwrap();
    f.engine.run(a, RunOptions::default()).unwrap();

    f.engine.set_previous_step(b, Some(a), false).unwrap();
    assert_eq!(f.engine.get_all_previous_steps(c), vec![b, a]);
    assert!(!f.engine.catalog().tool(b).unwrap().is_valid());
    assert!(!f.engine.catalog().tool(c).unwrap().is_valid());
    assert!(f.engine.catalog().tool(a).unwrap().is_valid());
}

#[test]
fn next_steps_closure_visits_each_tool_once() {
    let mut f = fixture(&[1]);
    let t = AddDelta::new(1);
    let a = f.add("A", None, &t);
    let b = f.add("B", Some(a), &t);
    let c = f.add("C", Some(a), &t);
    let d = f.add("D", Some(b), &t);
    assert_eq!(f.engine.get_next_steps(a), vec![b, c]);
    assert_eq!(f.engine.get_all_next_steps(a), vec![b, c, d]);
    assert!(f.engine.get_all_next_steps(d).is_empty());
}

#[test]
fn network_and_hierarchy_reflect_previous_steps() {
    let mut f = fixture(&[1]);
    let t = AddDelta::new(1);
    let t1 = f.add("T1", None, &t);
    f.add("T2", None, &t);
    let t3 = f.add("T3", Some(t1), &t);
    f.engine.run(t3, RunOptions::default()).unwrap();

    let g = f.engine.get_tool_network(f.chain).unwrap();
    assert_eq!(g.node_count(), 4);
    assert_eq!(g.edge_count(), 3);
    let mut edges: Vec<(String, String)> = g.edge_references()
                                            .map(|e| (g[e.source()].name.clone(), g[e.target()].name.clone()))
                                            .collect();
    edges.sort();
    assert_eq!(edges,
               vec![("T1".to_string(), "T3".to_string()),
                    ("src".to_string(), "T1".to_string()),
                    ("src".to_string(), "T2".to_string())]);

    let h = f.engine.get_tool_hierarchy(f.chain).unwrap();
    assert_eq!(h.role, NodeRole::Extractor);
    assert_eq!(h.children.len(), 2);
    let first = &h.children[0];
    assert_eq!(first.name, "T1");
    assert_eq!(first.children[0].name, "T3");
    assert_eq!(first.children[0].status, Some(ToolStatus::Valid));
    assert!(first.children[0].fingerprint.is_some());
    let json = serde_json::to_value(&h).unwrap();
    assert_eq!(json["children"][1]["name"], "T2");
    assert_eq!(json["children"][1]["status"], "never_run");
}

#[test]
fn clone_resets_identity_links_results_and_notes() {
    let mut f = fixture(&[1]);
    let t = AddDelta::new(3);
    let a = f.add("A", None, &t);
    let b = f.add("B", Some(a), &t);
    f.engine.add_note(b, "looks fine", "ana").unwrap();
    f.engine.run(b, RunOptions::default()).unwrap();

    let copy = f.engine.clone_tool(b, None, None).unwrap().value;
    let node = f.engine.catalog().tool(copy).unwrap();
    assert_ne!(copy, b);
    assert_eq!(node.name, "B_copy");
    assert!(node.previous_step.is_none() && node.notes.is_empty());
    assert_eq!(node.status(), ToolStatus::NeverRun);
    assert_eq!(node.transform().config(), serde_json::json!({"delta": 3}));
    assert!(matches!(f.engine.clone_tool(b, None, None), Err(EngineError::DuplicateName { .. })));
}

#[test]
fn names_are_validated_and_unique_per_chain() {
    let mut f = fixture(&[1]);
    let t = AddDelta::new(1);
    assert!(matches!(f.try_add("two words", None, &t), Err(EngineError::InvalidName(_))));
    f.add("A", None, &t);
    assert!(matches!(f.try_add("A", None, &t), Err(EngineError::DuplicateName { .. })));
    let other = f.engine.add_chain("second", "", f.extractor).unwrap().value;
    assert!(f.engine.add_tool(other, "A", "", None, Box::new(t.clone())).is_ok());
    assert!(matches!(f.engine.add_chain("second", "", f.extractor), Err(EngineError::DuplicateName { .. })));
}

#[test]
fn deleting_a_chain_cascades_to_its_tools() {
    let mut f = fixture(&[1]);
    let t = AddDelta::new(1);
    let a = f.add("A", None, &t);
    f.add("B", Some(a), &t);
    f.engine.delete_chain(f.chain).unwrap();
    assert_eq!(f.engine.catalog().tools().count(), 0);
    assert!(f.engine.catalog().extractor(f.extractor).is_ok());
    assert!(f.engine.delete_extractor(f.extractor).is_ok());
}

#[test]
fn extractor_in_use_cannot_be_deleted() {
    let mut f = fixture(&[1]);
    assert!(matches!(f.engine.delete_extractor(f.extractor), Err(EngineError::ExtractorInUse(_))));
}

#[test]
fn editing_a_note_sets_edited() {
    let mut f = fixture(&[1]);
    let t = AddDelta::new(1);
    let a = f.add("A", None, &t);
    let idx = f.engine.add_note(a, "first", "ana").unwrap().value;
    f.engine.edit_note(a, idx, "second").unwrap();
    let note = &f.engine.catalog().tool(a).unwrap().notes[idx];
    assert_eq!(note.text, "second");
    assert!(note.edited.is_some());
    assert!(matches!(f.engine.edit_note(a, 7, "x"), Err(EngineError::UnknownNote { index: 7, .. })));
}
