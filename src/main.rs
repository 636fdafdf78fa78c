//! Demo de StepFlow: arma un workflow chico desde JSON, lo corre, muestra la
//! jerarquía y exporta el resultado a CSV. Con `--features pg_demo` usa el
//! store de Postgres de `DATABASE_URL`; si no, un store en memoria.

use std::process::exit;

use stepflow::{default_registry, WorkflowFile, CONFIG};
use stepflow_core::{DocumentStore, RenderOptions, Renderable, RunOptions, WorkflowEngine};

const DEMO_WORKFLOW: &str = r#"{
  "extractors": [{
    "name": "materials",
    "description": "band gaps de referencia",
    "kind": "inline",
    "config": {
      "columns": ["name", "gap", "stable"],
      "rows": [["Si", 1.1, true], ["Ge", 0.67, true], ["C", 5.5, false], ["GaAs", 1.42, null]]
    }
  }],
  "chains": [{
    "name": "screen",
    "extractor": "materials",
    "tools": [
      { "name": "known", "kind": "required_field", "config": { "column": "stable" } },
      { "name": "semis", "kind": "filter", "previous_step": "known", "config": { "query": "gap < 2" } },
      { "name": "doubled", "kind": "simple_eval", "previous_step": "semis", "config": { "eval": "g2 = gap * 2" } },
      { "name": "summary", "kind": "summary", "previous_step": "doubled", "config": { "columns": ["gap", "g2"] } }
    ]
  }]
}"#;

fn run_demo<S>(store: S) -> Result<(), Box<dyn std::error::Error>>
    where S: DocumentStore
{
    let registry = default_registry()?;
    let mut engine = WorkflowEngine::open(store, &registry)?;
    let workflow = WorkflowFile::parse(DEMO_WORKFLOW)?.with_http_timeout(CONFIG.http_timeout_secs);
    let mut warnings = Vec::new();
    let summary = workflow.apply(&mut engine, &registry, &mut warnings)?;
    println!("[demo] added={:?} kept={:?}", summary.added, summary.kept);

    let chain = engine.catalog().find_chain("screen").ok_or("chain `screen` missing")?;
    let last = engine.catalog().find_tool(chain, "summary").ok_or("tool `summary` missing")?;
    let report = engine.run(last, RunOptions::default().save_results(true))?;
    warnings.extend(report.warnings);
    for w in &warnings {
        eprintln!("[demo] warning: {w}");
    }

    if let Some(stats) = report.value.get("stats") {
        println!("[demo] stats: {}", stats.decode_object()?);
    }
    let hierarchy = engine.get_tool_hierarchy(chain)?;
    println!("{}", serde_json::to_string_pretty(&hierarchy)?);

    let data = report.value.get("data").ok_or("result without data")?;
    let csv = data.render("csv", &RenderOptions::default())?;
    print!("{}", String::from_utf8_lossy(&csv));
    Ok(())
}

#[cfg(feature = "pg_demo")]
fn demo_store() -> Result<stepflow_persistence::PgDocumentStore, Box<dyn std::error::Error>> {
    let db = CONFIG.database.as_ref().ok_or("DATABASE_URL not set")?;
    let pool = stepflow_persistence::build_pool(&db.url, db.min_connections, db.max_connections)?;
    Ok(stepflow_persistence::PgDocumentStore::new(pool))
}

#[cfg(not(feature = "pg_demo"))]
fn demo_store() -> Result<stepflow_core::InMemoryDocumentStore, Box<dyn std::error::Error>> {
    Ok(stepflow_core::InMemoryDocumentStore::new())
}

fn main() {
    env_logger::init();
    let result = demo_store().and_then(run_demo);
    if let Err(e) = result {
        eprintln!("[demo] error: {e}");
        exit(1);
    }
}
