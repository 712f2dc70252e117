use crate::diagnostic::RawDiagnostic;
use crate::options::{CompilerOptions, ScriptTarget};
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Engine-facing handle for one parsed file.
///
/// The front-end never inspects syntax; engines keep their real ASTs behind
/// this handle (typically keyed by the `Arc` identity or the file name). The
/// handle carries what diagnostics rendering needs: the name, the full text,
/// and an offset → (line, column) mapping.
#[derive(Debug)]
pub struct SourceFile {
  name: String,
  text: Arc<str>,
  target: ScriptTarget,
  line_starts: OnceCell<Vec<u32>>,
}

impl SourceFile {
  pub fn new(name: impl Into<String>, text: impl Into<Arc<str>>, target: ScriptTarget) -> Self {
    SourceFile {
      name: name.into(),
      text: text.into(),
      target,
      line_starts: OnceCell::new(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn text(&self) -> &Arc<str> {
    &self.text
  }

  pub fn target(&self) -> ScriptTarget {
    self.target
  }

  /// Zero-based line and column for a byte offset. Offsets past the end of
  /// the text clamp to the final position.
  pub fn line_and_column(&self, offset: u32) -> (u32, u32) {
    let starts = self.line_starts.get_or_init(|| {
      let mut starts = vec![0u32];
      for (idx, byte) in self.text.bytes().enumerate() {
        if byte == b'\n' {
          starts.push(idx as u32 + 1);
        }
      }
      starts
    });
    let offset = offset.min(self.text.len() as u32);
    let line = starts.partition_point(|&start| start <= offset) - 1;
    (line as u32, offset - starts[line])
  }
}

/// A module specifier resolved to a concrete file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModule {
  pub resolved_file_name: String,
}

impl ResolvedModule {
  pub fn new(resolved_file_name: impl Into<String>) -> Self {
    ResolvedModule {
      resolved_file_name: resolved_file_name.into(),
    }
  }
}

/// Everything the external engine requires to go from a file-name list to a
/// bound, checkable, emittable program.
///
/// Implemented by [`CompileHost`](crate::host::CompileHost); engines hold it
/// as `Arc<dyn CompilerHost>` for the lifetime of one program.
pub trait CompilerHost: Send + Sync {
  /// Load and parse one file. Read failures are reported through `on_error`
  /// and yield a file parsed from empty text, so the whole build is never
  /// aborted by one unreadable input.
  fn get_source_file(
    &self,
    name: &str,
    target: ScriptTarget,
    on_error: Option<&mut dyn FnMut(String)>,
  ) -> Option<Arc<SourceFile>>;

  fn default_lib_file_name(&self) -> String;

  /// Write one emitted artifact. Failures are reported through `on_error`,
  /// never raised.
  fn write_file(
    &self,
    name: &str,
    data: &str,
    write_byte_order_mark: bool,
    on_error: Option<&mut dyn FnMut(String)>,
  );

  fn current_directory(&self) -> String;
  fn canonical_file_name(&self, name: &str) -> String;
  fn use_case_sensitive_file_names(&self) -> bool;
  fn newline(&self) -> String;
  fn file_exists(&self, name: &str) -> bool;
  fn read_file(&self, name: &str) -> Option<String>;

  /// Resolve each specifier imported by `containing_file`, in order. `None`
  /// entries are unresolved imports the engine reports as it sees fit.
  fn resolve_module_names(
    &self,
    specifiers: &[String],
    containing_file: &str,
  ) -> Vec<Option<ResolvedModule>>;
}

/// One fully-bound compilation unit, built fresh for every call and owned by
/// the result returned from that call.
pub trait Program {
  /// Run emission. All side effects route through the host's `write_file`.
  fn emit(&self);

  /// Every file in the program, in the engine's enumeration order.
  fn source_files(&self) -> Vec<Arc<SourceFile>>;

  fn options_diagnostics(&self) -> Vec<RawDiagnostic>;
  fn global_diagnostics(&self) -> Vec<RawDiagnostic>;
  fn syntactic_diagnostics(&self, file: &Arc<SourceFile>) -> Vec<RawDiagnostic>;
  fn semantic_diagnostics(&self, file: &Arc<SourceFile>) -> Vec<RawDiagnostic>;
  fn declaration_diagnostics(&self, file: &Arc<SourceFile>) -> Vec<RawDiagnostic>;
}

/// The external compiler engine, consumed as an opaque capability.
pub trait Engine: Send + Sync + 'static {
  type Program: Program;

  fn create_source_file(&self, name: &str, text: Arc<str>, target: ScriptTarget)
    -> Arc<SourceFile>;

  fn create_program(
    &self,
    root_names: &[String],
    options: Arc<CompilerOptions>,
    host: Arc<dyn CompilerHost>,
  ) -> Self::Program;

  /// The engine's own resolution algorithm (real directory walking, path
  /// mapping, and whatever else it supports). The host consults this only
  /// after the in-memory set failed to resolve a specifier.
  fn resolve_module_name(
    &self,
    specifier: &str,
    containing_file: &str,
    options: &CompilerOptions,
    host: &dyn CompilerHost,
  ) -> Option<ResolvedModule>;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn line_and_column_walks_newlines() {
    let file = SourceFile::new("input.ts", "let a = 1;\nlet b = a;\n", ScriptTarget::Es2015);
    assert_eq!(file.line_and_column(0), (0, 0));
    assert_eq!(file.line_and_column(8), (0, 8));
    assert_eq!(file.line_and_column(11), (1, 0));
    assert_eq!(file.line_and_column(19), (1, 8));
  }

  #[test]
  fn offsets_past_the_end_clamp() {
    let file = SourceFile::new("input.ts", "x", ScriptTarget::Es2015);
    assert_eq!(file.line_and_column(400), (0, 1));
  }

  #[test]
  fn empty_file_maps_to_origin() {
    let file = SourceFile::new("input.ts", "", ScriptTarget::Es2015);
    assert_eq!(file.line_and_column(0), (0, 0));
  }
}
