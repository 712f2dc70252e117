use crate::diagnostic::{Diagnostic, DiagnosticType};
use crate::engine::{CompilerHost, Engine, Program, SourceFile};
use crate::error::CompileError;
use crate::host::{CompileHost, DefaultLib, SourceCache};
use crate::options::CompilerOptions;
use crate::overlay::{OutputSink, VirtualFile, VirtualSystem};
use crate::system::System;
use std::fmt::Write as _;
use std::sync::Arc;

/// Fixed logical name given to the raw string of single-string calls.
pub const SOURCE_NAME: &str = "input.ts";

/// Token substituted for the synthetic file's name in formatted diagnostics.
const SOURCE_TOKEN: &str = "<source>";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CheckMode {
  Full,
  ParseOnly,
}

/// Result of a `compile_map` call: the program, its classified diagnostics,
/// and accessors over the files the engine saw.
pub struct CompileMapResult<P: Program> {
  program: P,
  diagnostics: Vec<Diagnostic>,
  newline: String,
  synthetic: Option<Arc<SourceFile>>,
}

impl<P: Program> std::fmt::Debug for CompileMapResult<P> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("CompileMapResult")
      .field("diagnostics", &self.diagnostics)
      .field("newline", &self.newline)
      .field("synthetic", &self.synthetic)
      .finish_non_exhaustive()
  }
}

impl<P: Program> CompileMapResult<P> {
  pub fn program(&self) -> &P {
    &self.program
  }

  pub fn diagnostics(&self) -> &[Diagnostic] {
    &self.diagnostics
  }

  /// Names of every file in the program: the call's in-memory sources plus
  /// the explicit on-disk files, as enumerated by the engine.
  pub fn source_file_names(&self) -> Vec<String> {
    self
      .program
      .source_files()
      .iter()
      .map(|file| file.name().to_string())
      .collect()
  }

  pub fn source_file(&self, name: &str) -> Option<Arc<SourceFile>> {
    self
      .program
      .source_files()
      .into_iter()
      .find(|file| file.name() == name)
  }

  /// Render one diagnostic as
  /// `[<file>|<source>][(<line>,<col>): ]<Category> TS<code>: <message>`.
  ///
  /// The `<source>` token replaces the file name only when the diagnostic
  /// belongs to the synthetic file of a single-string call.
  pub fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String {
    let mut out = String::new();
    if let Some(file) = &diagnostic.file {
      let substitute = self
        .synthetic
        .as_ref()
        .is_some_and(|synthetic| synthetic.name() == file.name());
      out.push_str(if substitute { SOURCE_TOKEN } else { file.name() });
      if let Some(start) = diagnostic.start {
        let (line, column) = file.line_and_column(start);
        let _ = write!(out, "({},{})", line + 1, column + 1);
      }
      out.push_str(": ");
    }
    let _ = write!(
      out,
      "{} TS{}: {}",
      diagnostic.category,
      diagnostic.code,
      diagnostic.message_text.flatten(&self.newline)
    );
    out
  }
}

/// Result of a single-string `compile` or `parse` call. Identical to
/// [`CompileMapResult`] plus the synthetic source file itself.
pub struct CompileResult<P: Program> {
  source_file: Arc<SourceFile>,
  inner: CompileMapResult<P>,
}

impl<P: Program> CompileResult<P> {
  pub(crate) fn new(source_file: Arc<SourceFile>, mut inner: CompileMapResult<P>) -> Self {
    inner.synthetic = Some(Arc::clone(&source_file));
    CompileResult { source_file, inner }
  }

  /// The parsed tree of the call's input string.
  pub fn source_file(&self) -> &Arc<SourceFile> {
    &self.source_file
  }

  pub fn program(&self) -> &P {
    self.inner.program()
  }

  pub fn diagnostics(&self) -> &[Diagnostic] {
    self.inner.diagnostics()
  }

  pub fn source_file_names(&self) -> Vec<String> {
    self.inner.source_file_names()
  }

  pub fn get_source_file(&self, name: &str) -> Option<Arc<SourceFile>> {
    self.inner.source_file(name)
  }

  pub fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String {
    self.inner.format_diagnostic(diagnostic)
  }
}

/// One independent compilation: overlay → host → program → diagnostics.
///
/// Builds the virtual system over the call's sources, the host adapter over
/// it, asks the engine for a program rooted at the in-memory names followed
/// by the explicit file list, emits unless parse-only, and collects
/// diagnostics phase by phase.
#[allow(clippy::too_many_arguments)]
pub(crate) fn compile_sources<E: Engine>(
  engine: &Arc<E>,
  system: &Arc<dyn System>,
  options: &Arc<CompilerOptions>,
  file_names: &[String],
  sources: Vec<VirtualFile>,
  sink: Option<OutputSink>,
  mode: CheckMode,
  default_lib: &DefaultLib,
  cache: &Arc<SourceCache>,
) -> Result<CompileMapResult<E::Program>, CompileError> {
  let source_names: Vec<String> = sources.iter().map(|file| file.name.clone()).collect();
  let overlay: Arc<dyn System> =
    Arc::new(VirtualSystem::new(Arc::clone(system), sources, sink)?);
  let newline = overlay.newline().to_string();

  let host: Arc<dyn CompilerHost> = Arc::new(CompileHost::new(
    Arc::clone(engine),
    Arc::clone(&overlay),
    Arc::clone(options),
    source_names.clone(),
    default_lib.clone(),
    Some(Arc::clone(cache)),
  ));

  let mut root_names = source_names;
  root_names.extend(file_names.iter().cloned());
  let program = engine.create_program(&root_names, Arc::clone(options), host);

  let full = mode == CheckMode::Full;
  if full {
    program.emit();
  }

  let mut diagnostics = Vec::new();
  for raw in program.options_diagnostics() {
    diagnostics.push(Diagnostic::classify(raw, DiagnosticType::Option));
  }
  if full {
    for raw in program.global_diagnostics() {
      diagnostics.push(Diagnostic::classify(raw, DiagnosticType::Global));
    }
  }
  for file in program.source_files() {
    for raw in program.syntactic_diagnostics(&file) {
      diagnostics.push(Diagnostic::classify(raw, DiagnosticType::Syntactic));
    }
    if full {
      for raw in program.semantic_diagnostics(&file) {
        diagnostics.push(Diagnostic::classify(raw, DiagnosticType::Semantic));
      }
      if options.declaration {
        for raw in program.declaration_diagnostics(&file) {
          diagnostics.push(Diagnostic::classify(raw, DiagnosticType::Declaration));
        }
      }
    }
  }

  Ok(CompileMapResult {
    program,
    diagnostics,
    newline,
    synthetic: None,
  })
}
