#![allow(dead_code)]

//! Shared fixture: an in-memory [`System`] and a deterministic engine that
//! honors the host contract (all reads, resolution, and writes go through the
//! host). Diagnostics are driven by markers in the source text so tests can
//! provoke each checking phase on demand.

use compile_ts::{
  CompilerHost, CompilerOptions, DiagnosticCategory, Engine, Program, RawDiagnostic,
  ResolvedModule, ScriptTarget, SourceFile, System,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const UNDECLARED: &str = "__undeclared";
pub const SYNTAX_MARKER: &str = "@syntax_error";
pub const GLOBAL_MARKER: &str = "@global_error";
pub const DECLARATION_MARKER: &str = "@declaration_error";

/// In-memory base system. Writes and directory creations are recorded so
/// tests can assert the core never performs them.
pub struct MemorySystem {
  files: Mutex<HashMap<String, String>>,
  pub writes: Mutex<Vec<(String, String)>>,
  pub created_directories: Mutex<Vec<String>>,
}

impl MemorySystem {
  pub fn new() -> Self {
    MemorySystem {
      files: Mutex::new(HashMap::new()),
      writes: Mutex::new(Vec::new()),
      created_directories: Mutex::new(Vec::new()),
    }
  }

  pub fn with_file(self, name: &str, text: &str) -> Self {
    self.files.lock().insert(name.to_string(), text.to_string());
    self
  }
}

impl System for MemorySystem {
  fn read_file(&self, path: &str) -> io::Result<String> {
    self
      .files
      .lock()
      .get(path)
      .cloned()
      .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("File '{path}' not found.")))
  }

  fn write_file(&self, path: &str, data: &str, _bom: bool) -> io::Result<()> {
    self.writes.lock().push((path.to_string(), data.to_string()));
    Ok(())
  }

  fn file_exists(&self, path: &str) -> bool {
    self.files.lock().contains_key(path)
  }

  fn directory_exists(&self, path: &str) -> bool {
    let prefix = format!("{path}/");
    self.files.lock().keys().any(|name| name.starts_with(&prefix))
  }

  fn create_directory(&self, path: &str) -> io::Result<()> {
    self.created_directories.lock().push(path.to_string());
    Ok(())
  }

  fn get_directories(&self, _path: &str) -> Vec<String> {
    Vec::new()
  }

  fn current_directory(&self) -> String {
    "/project".to_string()
  }

  fn newline(&self) -> &str {
    "\n"
  }

  fn use_case_sensitive_file_names(&self) -> bool {
    true
  }

  fn executable_path(&self) -> Option<PathBuf> {
    Some(PathBuf::from("/engine/bin/fake-tsc"))
  }

  fn env_var(&self, _name: &str) -> Option<String> {
    None
  }
}

#[derive(Default)]
pub struct Counters {
  pub programs_created: AtomicUsize,
  pub emits: AtomicUsize,
}

/// Deterministic engine stand-in. Loads every root through the host, pulls
/// the default lib in when the host can see it, resolves `from '...'`
/// imports through the host, and reports marker-driven diagnostics.
pub struct FakeEngine {
  counters: Arc<Counters>,
  options_diagnostic: Option<(u32, String)>,
}

impl FakeEngine {
  pub fn new() -> Self {
    FakeEngine {
      counters: Arc::new(Counters::default()),
      options_diagnostic: None,
    }
  }

  /// Report one options diagnostic per program, for classification tests.
  pub fn with_options_diagnostic(code: u32, message: &str) -> Self {
    FakeEngine {
      counters: Arc::new(Counters::default()),
      options_diagnostic: Some((code, message.to_string())),
    }
  }

  pub fn counters(&self) -> Arc<Counters> {
    Arc::clone(&self.counters)
  }
}

impl Engine for FakeEngine {
  type Program = FakeProgram;

  fn create_source_file(&self, name: &str, text: Arc<str>, target: ScriptTarget) -> Arc<SourceFile> {
    Arc::new(SourceFile::new(name, text, target))
  }

  fn create_program(
    &self,
    root_names: &[String],
    options: Arc<CompilerOptions>,
    host: Arc<dyn CompilerHost>,
  ) -> FakeProgram {
    self.counters.programs_created.fetch_add(1, Ordering::SeqCst);

    let mut read_errors = Vec::new();
    let mut files: Vec<Arc<SourceFile>> = Vec::new();
    for name in root_names {
      let file = host.get_source_file(name, options.target, Some(&mut |err| read_errors.push(err)));
      if let Some(file) = file {
        files.push(file);
      }
    }

    if !options.no_default_lib {
      let lib = host.default_lib_file_name();
      if host.file_exists(&lib) {
        if let Some(file) =
          host.get_source_file(&lib, options.target, Some(&mut |err| read_errors.push(err)))
        {
          files.push(file);
        }
      }
    }

    // Transitive import discovery, entirely through the host.
    let mut unresolved: Vec<(Arc<SourceFile>, u32, String)> = Vec::new();
    let mut next = 0;
    while next < files.len() {
      let file = Arc::clone(&files[next]);
      next += 1;
      let imports = parse_imports(file.text());
      if imports.is_empty() {
        continue;
      }
      let specifiers: Vec<String> = imports.iter().map(|(_, spec)| spec.clone()).collect();
      let resolutions = host.resolve_module_names(&specifiers, file.name());
      for ((offset, specifier), resolution) in imports.into_iter().zip(resolutions) {
        match resolution {
          Some(module) => {
            if !files.iter().any(|f| f.name() == module.resolved_file_name) {
              if let Some(loaded) = host.get_source_file(
                &module.resolved_file_name,
                options.target,
                Some(&mut |err| read_errors.push(err)),
              ) {
                files.push(loaded);
              }
            }
          }
          None => unresolved.push((Arc::clone(&file), offset, specifier)),
        }
      }
    }

    FakeProgram {
      counters: Arc::clone(&self.counters),
      options_diagnostic: self.options_diagnostic.clone(),
      options,
      host,
      files,
      unresolved,
      read_errors,
    }
  }

  fn resolve_module_name(
    &self,
    specifier: &str,
    _containing_file: &str,
    _options: &CompilerOptions,
    host: &dyn CompilerHost,
  ) -> Option<ResolvedModule> {
    // Bare-bones standard resolution: probe the filesystem the host exposes.
    for candidate in [format!("{specifier}.ts"), format!("{specifier}.d.ts")] {
      if host.file_exists(&candidate) {
        return Some(ResolvedModule::new(candidate));
      }
    }
    None
  }
}

pub struct FakeProgram {
  counters: Arc<Counters>,
  options_diagnostic: Option<(u32, String)>,
  options: Arc<CompilerOptions>,
  host: Arc<dyn CompilerHost>,
  files: Vec<Arc<SourceFile>>,
  unresolved: Vec<(Arc<SourceFile>, u32, String)>,
  read_errors: Vec<String>,
}

impl Program for FakeProgram {
  fn emit(&self) {
    self.counters.emits.fetch_add(1, Ordering::SeqCst);
    for file in &self.files {
      if file.name().ends_with(".d.ts") {
        continue;
      }
      let stem = emit_stem(file.name());
      let prefix = match &self.options.out_dir {
        Some(dir) => format!("{dir}/"),
        None => String::new(),
      };

      let js = format!("// emitted from {}\nvar {}_compiled = true;\n", file.name(), stem);
      self
        .host
        .write_file(&format!("{prefix}{stem}.js"), &js, false, None);

      if self.options.declaration {
        let dts = format!("export declare const {stem}_compiled: boolean;\n");
        self
          .host
          .write_file(&format!("{prefix}{stem}.d.ts"), &dts, false, None);
      }
    }
  }

  fn source_files(&self) -> Vec<Arc<SourceFile>> {
    self.files.clone()
  }

  fn options_diagnostics(&self) -> Vec<RawDiagnostic> {
    self
      .options_diagnostic
      .iter()
      .map(|(code, message)| {
        RawDiagnostic::new(DiagnosticCategory::Error, *code, message.as_str())
      })
      .collect()
  }

  fn global_diagnostics(&self) -> Vec<RawDiagnostic> {
    let mut diagnostics: Vec<RawDiagnostic> = self
      .read_errors
      .iter()
      .map(|err| RawDiagnostic::new(DiagnosticCategory::Error, 6053, err.as_str()))
      .collect();
    if self
      .files
      .iter()
      .any(|file| file.text().contains(GLOBAL_MARKER))
    {
      diagnostics.push(RawDiagnostic::new(
        DiagnosticCategory::Error,
        2300,
        "Duplicate identifier 'global'.",
      ));
    }
    diagnostics
  }

  fn syntactic_diagnostics(&self, file: &Arc<SourceFile>) -> Vec<RawDiagnostic> {
    marker_diagnostics(file, SYNTAX_MARKER, 1005, "';' expected.")
  }

  fn semantic_diagnostics(&self, file: &Arc<SourceFile>) -> Vec<RawDiagnostic> {
    let mut diagnostics = marker_diagnostics(
      file,
      UNDECLARED,
      2304,
      &format!("Cannot find name '{UNDECLARED}'."),
    );
    for (origin, offset, specifier) in &self.unresolved {
      if origin.name() == file.name() {
        diagnostics.push(
          RawDiagnostic::new(
            DiagnosticCategory::Error,
            2307,
            format!("Cannot find module '{specifier}'."),
          )
          .with_location(Arc::clone(file), *offset),
        );
      }
    }
    diagnostics
  }

  fn declaration_diagnostics(&self, file: &Arc<SourceFile>) -> Vec<RawDiagnostic> {
    marker_diagnostics(
      file,
      DECLARATION_MARKER,
      4025,
      "Exported variable is using private name.",
    )
  }
}

fn marker_diagnostics(
  file: &Arc<SourceFile>,
  marker: &str,
  code: u32,
  message: &str,
) -> Vec<RawDiagnostic> {
  file
    .text()
    .match_indices(marker)
    .map(|(offset, _)| {
      RawDiagnostic::new(DiagnosticCategory::Error, code, message)
        .with_location(Arc::clone(file), offset as u32)
    })
    .collect()
}

fn emit_stem(name: &str) -> String {
  let base = name.rsplit('/').next().unwrap_or(name);
  let stem = base
    .strip_suffix(".tsx")
    .or_else(|| base.strip_suffix(".ts"))
    .unwrap_or(base);
  stem
    .chars()
    .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
    .collect()
}

/// `from '<specifier>'` / `from "<specifier>"` occurrences with the byte
/// offset of the specifier.
fn parse_imports(text: &str) -> Vec<(u32, String)> {
  let mut imports = Vec::new();
  for (idx, _) in text.match_indices("from ") {
    let rest = &text[idx + 5..];
    let Some(quote) = rest.chars().next() else {
      continue;
    };
    if quote != '\'' && quote != '"' {
      continue;
    }
    let body = &rest[1..];
    if let Some(end) = body.find(quote) {
      imports.push(((idx + 6) as u32, body[..end].to_string()));
    }
  }
  imports
}
