use crate::error::CompileError;
use crate::system::System;
use ahash::AHashMap;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

/// One in-memory source for a single compile/parse/compile_map call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualFile {
  pub name: String,
  pub content: Arc<str>,
}

impl VirtualFile {
  pub fn new(name: impl Into<String>, content: impl Into<Arc<str>>) -> Self {
    VirtualFile {
      name: name.into(),
      content: content.into(),
    }
  }
}

/// Receives every (name, text) pair the engine would have written to disk.
pub type OutputSink = Arc<dyn Fn(&str, &str) + Send + Sync>;

/// A [`System`] identical to the wrapped one except for a fixed set of
/// in-memory names.
///
/// Reads and existence checks consult the shadow set first; writes are
/// captured by the sink (or discarded) and never reach the wrapped system;
/// directory creation is refused outright. Directory listing is intentionally
/// not virtualized: in-memory sources are only ever found by explicit name,
/// never by scanning.
pub struct VirtualSystem {
  base: Arc<dyn System>,
  files: AHashMap<String, Arc<str>>,
  sink: Option<OutputSink>,
  current_directory: String,
}

impl std::fmt::Debug for VirtualSystem {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("VirtualSystem")
      .field("files", &self.files.keys().collect::<Vec<_>>())
      .field("current_directory", &self.current_directory)
      .finish_non_exhaustive()
  }
}

impl VirtualSystem {
  /// Fails before any compilation work if a shadow name contains a path
  /// separator.
  pub fn new(
    base: Arc<dyn System>,
    files: Vec<VirtualFile>,
    sink: Option<OutputSink>,
  ) -> Result<Self, CompileError> {
    let mut map = AHashMap::with_capacity(files.len());
    for file in files {
      if file.name.contains('/') || file.name.contains('\\') {
        return Err(CompileError::InvalidSourceName(file.name));
      }
      map.insert(file.name, file.content);
    }
    let current_directory = base.current_directory();
    Ok(VirtualSystem {
      base,
      files: map,
      sink,
      current_directory,
    })
  }

  /// Shadow text for `path`, if its normalized form names an in-memory source.
  fn shadow(&self, path: &str) -> Option<&Arc<str>> {
    let name = normalize_virtual_name(path, &self.current_directory)?;
    self.files.get(name)
  }
}

/// Normalize `path` relative to `current_directory` for shadow-set lookup.
///
/// `./name` drops the prefix; `<cwd>/name` strips the slash-terminated cwd
/// prefix; any other absolute path can never name an in-memory source; a
/// relative path is used as-is.
pub(crate) fn normalize_virtual_name<'a>(path: &'a str, current_directory: &str) -> Option<&'a str> {
  if let Some(rest) = path.strip_prefix("./") {
    return Some(rest);
  }
  if path.starts_with('/') {
    let prefix = current_directory.trim_end_matches('/');
    return path
      .strip_prefix(prefix)
      .and_then(|rest| rest.strip_prefix('/'));
  }
  Some(path)
}

impl System for VirtualSystem {
  fn read_file(&self, path: &str) -> io::Result<String> {
    match self.shadow(path) {
      Some(text) => Ok(text.to_string()),
      None => self.base.read_file(path),
    }
  }

  fn write_file(&self, path: &str, data: &str, _write_byte_order_mark: bool) -> io::Result<()> {
    if let Some(sink) = &self.sink {
      sink(path, data);
    }
    Ok(())
  }

  fn file_exists(&self, path: &str) -> bool {
    self.shadow(path).is_some() || self.base.file_exists(path)
  }

  fn directory_exists(&self, path: &str) -> bool {
    self.base.directory_exists(path)
  }

  fn create_directory(&self, path: &str) -> io::Result<()> {
    Err(io::Error::new(
      io::ErrorKind::Unsupported,
      format!("directory creation is not allowed in a virtual system: {path}"),
    ))
  }

  fn get_directories(&self, path: &str) -> Vec<String> {
    self.base.get_directories(path)
  }

  fn current_directory(&self) -> String {
    self.current_directory.clone()
  }

  fn newline(&self) -> &str {
    self.base.newline()
  }

  fn use_case_sensitive_file_names(&self) -> bool {
    self.base.use_case_sensitive_file_names()
  }

  fn executable_path(&self) -> Option<PathBuf> {
    self.base.executable_path()
  }

  fn env_var(&self, name: &str) -> Option<String> {
    self.base.env_var(name)
  }

  fn supports_write_tracking(&self) -> bool {
    self.base.supports_write_tracking()
  }

  fn create_hash(&self, data: &str) -> Option<String> {
    self.base.create_hash(data)
  }

  fn modified_time(&self, path: &str) -> Option<SystemTime> {
    self.base.modified_time(path)
  }

  fn intercepts_writes(&self) -> bool {
    true
  }
}
