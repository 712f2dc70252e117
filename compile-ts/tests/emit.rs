mod common;

use common::{FakeEngine, MemorySystem};
use compile_ts::{Compiler, CompilerSettings, OutputSink, System};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn capture() -> (Arc<Mutex<Vec<(String, String)>>>, OutputSink) {
  let writes: Arc<Mutex<Vec<(String, String)>>> = Arc::new(Mutex::new(Vec::new()));
  let writes_in_sink = Arc::clone(&writes);
  let sink: OutputSink = Arc::new(move |name, text| {
    writes_in_sink.lock().push((name.to_string(), text.to_string()));
  });
  (writes, sink)
}

fn compiler_over(
  system: Arc<MemorySystem>,
  config: Option<serde_json::Value>,
) -> Compiler<FakeEngine> {
  Compiler::with_settings(
    FakeEngine::new(),
    CompilerSettings {
      config,
      system: Some(system as Arc<dyn System>),
      ..Default::default()
    },
  )
  .expect("settings are valid")
}

#[test]
fn emitted_output_is_captured_and_never_persisted() {
  let system = Arc::new(MemorySystem::new());
  let compiler = compiler_over(Arc::clone(&system), None);

  let (writes, sink) = capture();
  compiler.compile_with_output("let x = 1;", sink);

  let writes = writes.lock();
  assert_eq!(writes.len(), 1);
  assert_eq!(writes[0].0, "input.js");

  assert!(system.writes.lock().is_empty());
  assert!(system.created_directories.lock().is_empty());
}

#[test]
fn out_dir_prefixes_captured_names_without_creating_directories() {
  let system = Arc::new(MemorySystem::new());
  let compiler = compiler_over(
    Arc::clone(&system),
    Some(json!({ "compilerOptions": { "outDir": "dist" }, "include": [] })),
  );

  let (writes, sink) = capture();
  compiler.compile_with_output("let x = 1;", sink);

  assert_eq!(writes.lock()[0].0, "dist/input.js");
  assert!(system.created_directories.lock().is_empty());
}

#[test]
fn compile_without_a_sink_discards_output_silently() {
  let system = Arc::new(MemorySystem::new());
  let engine = FakeEngine::new();
  let counters = engine.counters();
  let compiler = Compiler::with_settings(
    engine,
    CompilerSettings {
      system: Some(Arc::clone(&system) as Arc<dyn System>),
      ..Default::default()
    },
  )
  .expect("settings are valid");

  compiler.compile("let x = 1;");
  assert_eq!(counters.emits.load(Ordering::SeqCst), 1);
  assert!(system.writes.lock().is_empty());
}

#[test]
fn captured_declaration_output_reparses_cleanly() {
  let system = Arc::new(MemorySystem::new());
  let compiler = compiler_over(
    Arc::clone(&system),
    Some(json!({ "compilerOptions": { "declaration": true }, "include": [] })),
  );

  let (writes, sink) = capture();
  compiler.compile_with_output("let x = 1;", sink);

  let writes = writes.lock();
  let declaration = writes
    .iter()
    .find(|(name, _)| name == "input.d.ts")
    .map(|(_, text)| text.clone())
    .expect("declaration output captured");

  let reparser = compiler_over(Arc::new(MemorySystem::new()), None);
  let reparsed = reparser.parse(&declaration);
  assert!(reparsed.diagnostics().is_empty());
}
