#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use stepflow_core::{Artifact, ArtifactMap, ChainId, Collection, DocumentStore, EngineError, ExtractError, Extractable,
                    ExtractorId, InMemoryDocumentStore, LinkSpec, StoreError, Table, ToolId, TransformError,
                    Transformable, WorkflowEngine};

pub fn numbers(values: &[i64]) -> Table {
    Table::from_rows(vec!["v".into()], values.iter().map(|v| vec![json!(v)]).collect()).unwrap()
}

pub fn column_v(t: &Table) -> Vec<i64> {
    t.column("v").unwrap().into_iter().map(|v| v.as_i64().unwrap()).collect()
}

/// Fuente cuya tabla puede cambiarse (o hacerse fallar) entre llamadas.
#[derive(Debug, Clone)]
pub struct SwitchSource {
    pub table: Arc<Mutex<Option<Table>>>,
    pub calls: Arc<AtomicUsize>,
}

impl SwitchSource {
    pub fn new(t: Table) -> Self {
        Self { table: Arc::new(Mutex::new(Some(t))),
               calls: Arc::new(AtomicUsize::new(0)) }
    }

    pub fn set(&self, t: Option<Table>) {
        *self.table.lock().unwrap() = t;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Extractable for SwitchSource {
    fn kind(&self) -> &'static str {
        "switch"
    }
    fn config(&self) -> Value {
        json!({})
    }
    fn run_extraction(&self) -> Result<Table, ExtractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.table
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ExtractError::Unreachable("source offline".into()))
    }
}

/// Suma `delta` a la columna `v` y cuenta invocaciones.
#[derive(Debug, Clone)]
pub struct AddDelta {
    pub delta: i64,
    pub calls: Arc<AtomicUsize>,
    pub fail: Arc<AtomicBool>,
}

impl AddDelta {
    pub fn new(delta: i64) -> Self {
        Self { delta,
               calls: Arc::new(AtomicUsize::new(0)),
               fail: Arc::new(AtomicBool::new(false)) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, v: bool) {
        self.fail.store(v, Ordering::SeqCst);
    }
}

impl Transformable for AddDelta {
    fn kind(&self) -> &'static str {
        "add_delta"
    }
    fn config(&self) -> Value {
        json!({ "delta": self.delta })
    }
    fn transform(&self, mut data: Table, _other: &ArtifactMap) -> Result<(Table, ArtifactMap), TransformError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(TransformError::Failed("boom".into()));
        }
        let v = data.require_column("v")?;
        for row in &mut data.rows {
            let n = row[v].as_i64().unwrap_or(0);
            row[v] = json!(n + self.delta);
        }
        let mut extra = ArtifactMap::new();
        extra.insert("sum".into(),
                     Artifact::object("sum", &json!(data.rows.iter().filter_map(|r| r[v].as_i64()).sum::<i64>()))?);
        Ok((data, extra))
    }
    fn box_clone(&self) -> Box<dyn Transformable> {
        Box::new(self.clone())
    }
}

/// Pasa `data` intacta y reexpone los artifacts enlazados.
#[derive(Debug, Clone)]
pub struct Linker {
    pub link: LinkSpec,
}

impl Transformable for Linker {
    fn kind(&self) -> &'static str {
        "linker"
    }
    fn config(&self) -> Value {
        serde_json::to_value(&self.link).unwrap()
    }
    fn transform(&self, data: Table, other: &ArtifactMap) -> Result<(Table, ArtifactMap), TransformError> {
        Ok((data, other.clone()))
    }
    fn linked_artifacts(&self) -> Option<LinkSpec> {
        Some(self.link.clone())
    }
    fn box_clone(&self) -> Box<dyn Transformable> {
        Box::new(self.clone())
    }
}

/// Store en memoria que puede rechazar escrituras y registra su orden.
#[derive(Debug, Default)]
pub struct FlakyStore {
    pub inner: InMemoryDocumentStore,
    pub fail_saves: Arc<AtomicBool>,
    pub saves: Arc<Mutex<Vec<(Collection, String)>>>,
}

impl DocumentStore for FlakyStore {
    fn load(&self, collection: Collection, id: &str) -> Result<Value, StoreError> {
        self.inner.load(collection, id)
    }
    fn save(&mut self, collection: Collection, id: &str, doc: &Value) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("disk full".into()));
        }
        self.saves.lock().unwrap().push((collection, id.to_string()));
        self.inner.save(collection, id, doc)
    }
    fn delete(&mut self, collection: Collection, id: &str) -> Result<(), StoreError> {
        self.inner.delete(collection, id)
    }
    fn list(&self, collection: Collection) -> Result<Vec<(String, Value)>, StoreError> {
        self.inner.list(collection)
    }
}

pub struct Fixture<S: DocumentStore> {
    pub engine: WorkflowEngine<S>,
    pub source: SwitchSource,
    pub extractor: ExtractorId,
    pub chain: ChainId,
}

pub fn fixture_with<S: DocumentStore>(store: S, data: &[i64]) -> Fixture<S> {
    let mut engine = WorkflowEngine::new(store);
    let source = SwitchSource::new(numbers(data));
    let extractor = engine.add_extractor("src", "numbers", Box::new(source.clone())).unwrap().value;
    let chain = engine.add_chain("main", "", extractor).unwrap().value;
    Fixture { engine,
              source,
              extractor,
              chain }
}

pub fn fixture(data: &[i64]) -> Fixture<InMemoryDocumentStore> {
    fixture_with(InMemoryDocumentStore::new(), data)
}

impl<S: DocumentStore> Fixture<S> {
    pub fn add(&mut self, name: &str, prev: Option<ToolId>, t: &AddDelta) -> ToolId {
        self.engine.add_tool(self.chain, name, "", prev, Box::new(t.clone())).unwrap().value
    }

    pub fn try_add(&mut self, name: &str, prev: Option<ToolId>, t: &AddDelta) -> Result<ToolId, EngineError> {
        self.engine.add_tool(self.chain, name, "", prev, Box::new(t.clone())).map(|r| r.value)
    }
}
