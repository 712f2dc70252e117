//! In-memory compilation front-end over an external TypeScript-style
//! compiler engine.
//!
//! The engine (parsing, binding, type checking, emission) is consumed as an
//! opaque capability through the [`Engine`] trait. This crate supplies the
//! rest: a virtual system overlay that shadows a real [`System`] with the
//! call's in-memory sources, a [`CompilerHost`] adapter the engine drives,
//! and an orchestration layer that turns a single string or a named-source
//! map into a program plus classified diagnostics — without ever writing
//! unintended bytes to disk.
//!
//! Configuration is resolved once per [`Compiler`]; each
//! [`compile`](Compiler::compile) / [`parse`](Compiler::parse) /
//! [`compile_map`](Compiler::compile_map) call is independent and
//! self-contained.

mod compile;
mod config;
mod diagnostic;
mod engine;
mod error;
mod host;
mod options;
mod overlay;
mod system;

pub use compile::CompileMapResult;
pub use compile::CompileResult;
pub use compile::SOURCE_NAME;
pub use diagnostic::Diagnostic;
pub use diagnostic::DiagnosticCategory;
pub use diagnostic::DiagnosticType;
pub use diagnostic::MessageText;
pub use diagnostic::RawDiagnostic;
pub use engine::CompilerHost;
pub use engine::Engine;
pub use engine::Program;
pub use engine::ResolvedModule;
pub use engine::SourceFile;
pub use error::CompileError;
pub use options::default_lib_name;
pub use options::CompilerOptions;
pub use options::JsxMode;
pub use options::LibName;
pub use options::ModuleKind;
pub use options::ScriptTarget;
pub use overlay::OutputSink;
pub use overlay::VirtualFile;
pub use overlay::VirtualSystem;
pub use system::RealSystem;
pub use system::System;

use crate::compile::{compile_sources, CheckMode};
use crate::host::{DefaultLib, SourceCache};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

pub type Result<T> = std::result::Result<T, CompileError>;

/// Construction-time inputs for a [`Compiler`]. Everything is optional.
#[derive(Default)]
pub struct CompilerSettings {
  /// A tsconfig-shaped object (`compilerOptions`, `files`, `include`,
  /// `extends`, ...). Defaults apply when absent.
  pub config: Option<serde_json::Value>,
  /// Base for resolving relative entries inside `config`. Defaults to the
  /// system's current directory.
  pub base_path: Option<PathBuf>,
  /// Override for the default library's file name.
  pub default_lib_file_name: Option<String>,
  /// Override for the directory the default library is loaded from.
  pub default_lib_location: Option<String>,
  /// Substitute system capability, primarily for testing.
  pub system: Option<Arc<dyn System>>,
}

/// The public compiler facade.
///
/// Parses configuration exactly once at construction; construction fails on
/// configuration errors rather than returning a half-usable compiler. All
/// three operations funnel through the same per-call orchestration.
pub struct Compiler<E: Engine> {
  engine: Arc<E>,
  system: Arc<dyn System>,
  options: Arc<CompilerOptions>,
  file_names: Vec<String>,
  default_lib: DefaultLib,
  cache: Arc<SourceCache>,
}

impl<E: Engine> std::fmt::Debug for Compiler<E> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Compiler")
      .field("file_names", &self.file_names)
      .finish_non_exhaustive()
  }
}

impl<E: Engine> Compiler<E> {
  /// Construct with default settings (no configuration, real system).
  pub fn new(engine: E) -> Result<Self> {
    Compiler::with_settings(engine, CompilerSettings::default())
  }

  pub fn with_settings(engine: E, settings: CompilerSettings) -> Result<Self> {
    let system: Arc<dyn System> = settings
      .system
      .unwrap_or_else(|| Arc::new(RealSystem::new()));
    let base_path = settings
      .base_path
      .unwrap_or_else(|| PathBuf::from(system.current_directory()));

    let parsed = config::parse_config(settings.config.as_ref(), &base_path);
    // The "no inputs" diagnostic is expected here: every call supplies its
    // own in-memory inputs later.
    let fatal: Vec<&str> = parsed
      .errors
      .iter()
      .filter(|error| error.code != config::CODE_NO_INPUTS)
      .map(|error| error.message.as_str())
      .collect();
    if !fatal.is_empty() {
      return Err(CompileError::Config(fatal.join(system.newline())));
    }

    Ok(Compiler {
      engine: Arc::new(engine),
      system,
      options: Arc::new(parsed.options),
      file_names: parsed.file_names,
      default_lib: DefaultLib {
        file_name: settings.default_lib_file_name,
        location: settings.default_lib_location,
      },
      cache: Arc::new(SourceCache::default()),
    })
  }

  /// Resolved options shared by every call on this instance.
  pub fn options(&self) -> &CompilerOptions {
    &self.options
  }

  /// Explicit on-disk file names resolved from configuration.
  pub fn file_names(&self) -> &[String] {
    &self.file_names
  }

  /// Full compile (check + emit) of a single string under the synthetic name
  /// [`SOURCE_NAME`]. Emitted artifacts are discarded; use
  /// [`compile_with_output`](Compiler::compile_with_output) to capture them.
  pub fn compile(&self, source: &str) -> CompileResult<E::Program> {
    self.compile_string(source, None, CheckMode::Full)
  }

  pub fn compile_with_output(&self, source: &str, sink: OutputSink) -> CompileResult<E::Program> {
    self.compile_string(source, Some(sink), CheckMode::Full)
  }

  /// Syntax-only pass over a single string: no emission, and only option and
  /// syntactic diagnostics are collected.
  pub fn parse(&self, source: &str) -> CompileResult<E::Program> {
    self.compile_string(source, None, CheckMode::ParseOnly)
  }

  /// Full compile of a set of named sources that may import one another by
  /// logical name. Fails before any engine work if a name contains a path
  /// separator.
  pub fn compile_map(
    &self,
    sources: BTreeMap<String, String>,
  ) -> Result<CompileMapResult<E::Program>> {
    self.compile_map_inner(sources, None)
  }

  pub fn compile_map_with_output(
    &self,
    sources: BTreeMap<String, String>,
    sink: OutputSink,
  ) -> Result<CompileMapResult<E::Program>> {
    self.compile_map_inner(sources, Some(sink))
  }

  fn compile_string(
    &self,
    source: &str,
    sink: Option<OutputSink>,
    mode: CheckMode,
  ) -> CompileResult<E::Program> {
    let text: Arc<str> = Arc::from(source);
    let sources = vec![VirtualFile::new(SOURCE_NAME, Arc::clone(&text))];
    let inner = compile_sources(
      &self.engine,
      &self.system,
      &self.options,
      &self.file_names,
      sources,
      sink,
      mode,
      &self.default_lib,
      &self.cache,
    )
    .expect("synthetic source name is a valid flat name");
    let source_file = inner.source_file(SOURCE_NAME).unwrap_or_else(|| {
      self
        .engine
        .create_source_file(SOURCE_NAME, text, self.options.target)
    });
    CompileResult::new(source_file, inner)
  }

  fn compile_map_inner(
    &self,
    sources: BTreeMap<String, String>,
    sink: Option<OutputSink>,
  ) -> Result<CompileMapResult<E::Program>> {
    let sources: Vec<VirtualFile> = sources
      .into_iter()
      .map(|(name, text)| VirtualFile::new(name, text))
      .collect();
    compile_sources(
      &self.engine,
      &self.system,
      &self.options,
      &self.file_names,
      sources,
      sink,
      CheckMode::Full,
      &self.default_lib,
      &self.cache,
    )
  }
}
