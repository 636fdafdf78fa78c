mod support;

use serde_json::Value;
use stepflow_core::{Collection, DocumentStore, EngineError, ExtractOptions, Extractable, ExtractorStatus,
                    JsonFileDocumentStore, Note, Registry, RegistryError, RunOptions, ToolStatus, Transformable,
                    WorkflowEngine};
use support::{column_v, fixture_with, numbers, AddDelta, SwitchSource};

fn add_delta(config: &Value) -> Result<Box<dyn Transformable>, RegistryError> {
    let delta = config.get("delta").and_then(Value::as_i64).unwrap_or(0);
    Ok(Box::new(AddDelta::new(delta)))
}

/// Una fuente restaurada que no responde: sólo el cache puede servir datos.
fn offline_source(_: &Value) -> Result<Box<dyn Extractable>, RegistryError> {
    let s = SwitchSource::new(numbers(&[]));
    s.set(None);
    Ok(Box::new(s))
}

fn registry() -> Registry {
    let mut r = Registry::new();
    r.register_extractor("switch", offline_source).unwrap();
    r.register_transform("add_delta", add_delta).unwrap();
    r
}

#[test]
fn reopening_restores_graph_results_and_extractor_cache() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileDocumentStore::new(dir.path()).unwrap();
    let mut f = fixture_with(store, &[1, 2]);
    let (a, b) = (AddDelta::new(1), AddDelta::new(10));
    let ta = f.add("a", None, &a);
    let tb = f.add("b", Some(ta), &b);
    let tc = f.add("c", None, &a);
    f.engine.add_note(tb, "checked", "ana").unwrap();
    f.engine.run(tb, RunOptions::default().save_results(true)).unwrap();
    let fp = f.engine.catalog().tool(tb).unwrap().fingerprint();
    drop(f);

    let store = JsonFileDocumentStore::new(dir.path()).unwrap();
    let mut engine = WorkflowEngine::open(store, &registry()).unwrap();
    assert_eq!(engine.get_all_tools(engine.catalog().find_chain("main").unwrap()), vec![ta, tb, tc]);
    let node = engine.catalog().tool(tb).unwrap();
    assert_eq!(node.previous_step, Some(ta));
    assert_eq!(node.fingerprint(), fp);
    assert_eq!(node.notes.iter().map(|n: &Note| n.text.as_str()).collect::<Vec<_>>(), vec!["checked"]);
    assert_eq!(engine.catalog().tool(tc).unwrap().status(), ToolStatus::NeverRun);

    let ext = engine.catalog().find_extractor("src").unwrap();
    assert_eq!(engine.catalog().extractor(ext).unwrap().status(), ExtractorStatus::Cached);
    let data = engine.get_data(ext, ExtractOptions::default()).unwrap().value;
    assert_eq!(column_v(&data), vec![1, 2]);

    // c nunca corrió: se computa desde el cache restaurado.
    let c = engine.run(tc, RunOptions::default()).unwrap().value;
    assert_eq!(column_v(&c["data"].decode_table().unwrap()), vec![2, 3]);

    let err = engine.get_data(ext, ExtractOptions::default().ignore_cache(true)).unwrap_err();
    assert!(matches!(err, EngineError::ExtractionFailed { .. }));
}

#[test]
fn unsaved_eager_reextraction_leaves_the_store_consistent() {
    let dir = tempfile::tempdir().unwrap();
    let mut f = fixture_with(JsonFileDocumentStore::new(dir.path()).unwrap(), &[1]);
    let a = AddDelta::new(1);
    let ta = f.add("a", None, &a);
    f.engine.run(ta, RunOptions::default().save_results(true)).unwrap();

    f.source.set(Some(numbers(&[100])));
    let report = f.engine
                  .get_data(f.extractor, ExtractOptions::default().ignore_cache(true).run_subsequent(true))
                  .unwrap();
    assert!(report.is_clean());
    let live = f.engine.get_tool_data(ta, RunOptions::default()).unwrap().value;
    assert_eq!(column_v(&live), vec![101]);
    let ext = f.extractor;
    drop(f);

    // Ni el cache nuevo ni el resultado derivado de él llegaron al store.
    let mut engine = WorkflowEngine::open(JsonFileDocumentStore::new(dir.path()).unwrap(), &registry()).unwrap();
    assert_eq!(column_v(&engine.get_data(ext, ExtractOptions::default()).unwrap().value), vec![1]);
    assert_eq!(engine.catalog().tool(ta).unwrap().status(), ToolStatus::Valid);
    let restored = engine.get_tool_data(ta, RunOptions::default()).unwrap().value;
    assert_eq!(column_v(&restored), vec![2]);
}

#[test]
fn creation_order_survives_a_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let mut f = fixture_with(JsonFileDocumentStore::new(dir.path()).unwrap(), &[1]);
    let a = AddDelta::new(1);
    let mut ids = Vec::new();
    let mut prev = None;
    for i in 0..12 {
        let t = f.add(&format!("t{i}"), prev, &a);
        prev = (i % 3 == 0).then_some(t);
        ids.push(t);
    }
    let copy = f.engine.clone_tool(ids[4], None, None).unwrap().value;
    ids.push(copy);
    let second = f.engine.add_chain("second", "", f.extractor).unwrap().value;
    drop(f);

    let store = JsonFileDocumentStore::new(dir.path()).unwrap();
    let mut engine = WorkflowEngine::open(store, &registry()).unwrap();
    let main = engine.catalog().find_chain("main").unwrap();
    assert_eq!(engine.get_all_tools(main), ids);
    let chains: Vec<_> = engine.catalog().chains().map(|c| c.id).collect();
    assert_eq!(chains, vec![main, second]);

    // Lo que se agrega después de reabrir va al final.
    let ext = engine.catalog().find_extractor("src").unwrap();
    let late = engine.add_tool(main, "late", "", None, Box::new(AddDelta::new(0))).unwrap().value;
    let late_chain = engine.add_chain("third", "", ext).unwrap().value;
    drop(engine);
    let engine = WorkflowEngine::open(JsonFileDocumentStore::new(dir.path()).unwrap(), &registry()).unwrap();
    assert_eq!(engine.get_all_tools(main).last(), Some(&late));
    assert_eq!(engine.catalog().chains().last().map(|c| c.id), Some(late_chain));
}

#[test]
fn stale_flag_survives_a_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let mut f = fixture_with(JsonFileDocumentStore::new(dir.path()).unwrap(), &[4]);
    f.engine.get_data(f.extractor, ExtractOptions::default().save_results(true)).unwrap();
    f.engine.mark_stale(f.extractor, true).unwrap();
    let ext = f.extractor;
    drop(f);

    let engine = WorkflowEngine::open(JsonFileDocumentStore::new(dir.path()).unwrap(), &registry()).unwrap();
    let node = engine.catalog().extractor(ext).unwrap();
    assert_eq!(node.status(), ExtractorStatus::Stale);
    assert!(node.last_extracted_at().is_some());
}

#[test]
fn deletions_remove_documents() {
    let dir = tempfile::tempdir().unwrap();
    let mut f = fixture_with(JsonFileDocumentStore::new(dir.path()).unwrap(), &[1]);
    let a = AddDelta::new(1);
    let ta = f.add("a", None, &a);
    let tb = f.add("b", Some(ta), &a);
    f.engine.delete_tool(ta, false).unwrap();
    for id in [ta, tb] {
        assert!(f.engine.store().load(Collection::Tools, &id.to_string()).is_err());
    }
    f.engine.delete_chain(f.chain).unwrap();
    assert!(f.engine.store().list(Collection::Chains).unwrap().is_empty());
}

#[test]
fn unknown_kind_on_open_is_a_registry_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut f = fixture_with(JsonFileDocumentStore::new(dir.path()).unwrap(), &[1]);
    f.add("a", None, &AddDelta::new(1));
    drop(f);

    let mut only_source = Registry::new();
    only_source.register_extractor("switch", offline_source).unwrap();
    let err = WorkflowEngine::open(JsonFileDocumentStore::new(dir.path()).unwrap(), &only_source).unwrap_err();
    assert!(matches!(err, EngineError::Registry(RegistryError::UnknownKind { .. })));
}
