use crate::engine::{CompilerHost, Engine, ResolvedModule, SourceFile};
use crate::options::{default_lib_name, CompilerOptions, ScriptTarget};
use crate::overlay::normalize_virtual_name;
use crate::system::System;
use ahash::{AHashMap, AHashSet};
use parking_lot::{Mutex, RwLock};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

/// Permanent file-name → parsed-tree cache, shared by every call made through
/// one [`Compiler`](crate::Compiler).
///
/// Append-only: once cached, a name always maps to the same tree. On-disk
/// files are assumed immutable for the instance's lifetime, so entries are
/// never invalidated.
#[derive(Default)]
pub(crate) struct SourceCache {
  files: RwLock<AHashMap<String, Arc<SourceFile>>>,
}

impl SourceCache {
  fn get(&self, name: &str) -> Option<Arc<SourceFile>> {
    self.files.read().get(name).cloned()
  }

  fn insert(&self, name: &str, file: Arc<SourceFile>) {
    self
      .files
      .write()
      .entry(name.to_string())
      .or_insert(file);
  }
}

/// Default-library overrides carried from facade construction.
#[derive(Debug, Clone, Default)]
pub(crate) struct DefaultLib {
  pub file_name: Option<String>,
  pub location: Option<String>,
}

struct WriteRecord {
  hash: String,
  write_byte_order_mark: bool,
  modified_time: Option<SystemTime>,
}

/// The adapter satisfying every capability the engine requires from a
/// compiler host. One instance per call; the permanent source cache is the
/// only piece shared across calls.
pub(crate) struct CompileHost<E: Engine> {
  engine: Arc<E>,
  system: Arc<dyn System>,
  options: Arc<CompilerOptions>,
  /// In-memory source names for this call, checked before any resolution
  /// falls through to the engine or the cache.
  source_names: Vec<String>,
  default_lib: DefaultLib,
  cache: Option<Arc<SourceCache>>,
  /// Monotonic: a directory observed to exist is never re-checked.
  existing_directories: Mutex<AHashSet<String>>,
  write_records: Mutex<AHashMap<String, WriteRecord>>,
  /// Detected once at construction: watch mode requested and the system
  /// exposes hashing and modification times.
  track_writes: bool,
  current_directory: String,
  case_sensitive: bool,
}

impl<E: Engine> CompileHost<E> {
  pub(crate) fn new(
    engine: Arc<E>,
    system: Arc<dyn System>,
    options: Arc<CompilerOptions>,
    source_names: Vec<String>,
    default_lib: DefaultLib,
    cache: Option<Arc<SourceCache>>,
  ) -> Self {
    let track_writes = options.watch && system.supports_write_tracking();
    let current_directory = system.current_directory();
    let case_sensitive = system.use_case_sensitive_file_names();
    CompileHost {
      engine,
      system,
      options,
      source_names,
      default_lib,
      cache,
      existing_directories: Mutex::new(AHashSet::new()),
      write_records: Mutex::new(AHashMap::new()),
      track_writes,
      current_directory,
      case_sensitive,
    }
  }

  fn is_virtual_name(&self, name: &str) -> bool {
    normalize_virtual_name(name, &self.current_directory)
      .map(|normalized| self.source_names.iter().any(|source| source == normalized))
      .unwrap_or(false)
  }

  fn directory_exists_cached(&self, dir: &str) -> bool {
    if self.existing_directories.lock().contains(dir) {
      return true;
    }
    if self.system.directory_exists(dir) {
      self.existing_directories.lock().insert(dir.to_string());
      return true;
    }
    false
  }

  fn ensure_directories(&self, dir: &str) -> io::Result<()> {
    if dir.is_empty() || dir == "/" || self.directory_exists_cached(dir) {
      return Ok(());
    }
    if let Some(parent) = Path::new(dir).parent() {
      self.ensure_directories(&parent.to_string_lossy())?;
    }
    self.system.create_directory(dir)?;
    self.existing_directories.lock().insert(dir.to_string());
    Ok(())
  }

  /// True when the previous write for `name` had the same content hash and
  /// byte-order-mark flag and the file has not been touched on disk since.
  fn skip_unchanged_write(&self, name: &str, data: &str, write_byte_order_mark: bool) -> bool {
    let Some(hash) = self.system.create_hash(data) else {
      return false;
    };
    let records = self.write_records.lock();
    let Some(record) = records.get(name) else {
      return false;
    };
    record.hash == hash
      && record.write_byte_order_mark == write_byte_order_mark
      && record.modified_time == self.system.modified_time(name)
  }

  fn record_write(&self, name: &str, data: &str, write_byte_order_mark: bool) {
    let Some(hash) = self.system.create_hash(data) else {
      return;
    };
    self.write_records.lock().insert(
      name.to_string(),
      WriteRecord {
        hash,
        write_byte_order_mark,
        modified_time: self.system.modified_time(name),
      },
    );
  }
}

impl<E: Engine> CompilerHost for CompileHost<E> {
  fn get_source_file(
    &self,
    name: &str,
    target: ScriptTarget,
    on_error: Option<&mut dyn FnMut(String)>,
  ) -> Option<Arc<SourceFile>> {
    // Only genuinely on-disk files go through the permanent cache; the call's
    // in-memory sources are owned by the call and never outlive it.
    let cacheable = !self.is_virtual_name(name);
    if cacheable {
      if let Some(cached) = self.cache.as_ref().and_then(|cache| cache.get(name)) {
        return Some(cached);
      }
    }

    let text = match self.system.read_file(name) {
      Ok(text) => text,
      Err(err) => {
        if let Some(on_error) = on_error {
          on_error(err.to_string());
        }
        String::new()
      }
    };
    let file = self.engine.create_source_file(name, Arc::from(text), target);
    if cacheable {
      if let Some(cache) = self.cache.as_ref() {
        cache.insert(name, Arc::clone(&file));
      }
    }
    Some(file)
  }

  fn default_lib_file_name(&self) -> String {
    let name = self
      .default_lib
      .file_name
      .clone()
      .unwrap_or_else(|| default_lib_name(self.options.target).to_string());
    let location = match &self.default_lib.location {
      Some(location) => PathBuf::from(location),
      None => self
        .system
        .executable_path()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_default(),
    };
    location.join(name).to_string_lossy().into_owned()
  }

  fn write_file(
    &self,
    name: &str,
    data: &str,
    write_byte_order_mark: bool,
    on_error: Option<&mut dyn FnMut(String)>,
  ) {
    if self.track_writes && self.skip_unchanged_write(name, data, write_byte_order_mark) {
      return;
    }

    let mut failure = None;
    // No directory work when the system intercepts writes: nothing will
    // actually land on disk.
    if !self.system.intercepts_writes() {
      if let Some(parent) = Path::new(name).parent() {
        let parent = parent.to_string_lossy();
        if !parent.is_empty() {
          failure = self.ensure_directories(&parent).err();
        }
      }
    }

    if failure.is_none() {
      match self.system.write_file(name, data, write_byte_order_mark) {
        Ok(()) => {
          if self.track_writes {
            self.record_write(name, data, write_byte_order_mark);
          }
        }
        Err(err) => failure = Some(err),
      }
    }

    if let (Some(err), Some(on_error)) = (failure, on_error) {
      on_error(err.to_string());
    }
  }

  fn current_directory(&self) -> String {
    self.current_directory.clone()
  }

  fn canonical_file_name(&self, name: &str) -> String {
    if self.case_sensitive {
      name.to_string()
    } else {
      name.to_lowercase()
    }
  }

  fn use_case_sensitive_file_names(&self) -> bool {
    self.case_sensitive
  }

  fn newline(&self) -> String {
    self.system.newline().to_string()
  }

  fn file_exists(&self, name: &str) -> bool {
    self.system.file_exists(name)
  }

  fn read_file(&self, name: &str) -> Option<String> {
    self.system.read_file(name).ok()
  }

  fn resolve_module_names(
    &self,
    specifiers: &[String],
    containing_file: &str,
  ) -> Vec<Option<ResolvedModule>> {
    let containing_is_virtual = self.is_virtual_name(containing_file);
    specifiers
      .iter()
      .map(|specifier| {
        if containing_is_virtual {
          // In-memory modules importing each other resolve to each other even
          // though no real directory structure backs them.
          for candidate in [format!("{specifier}.ts"), format!("{specifier}.d.ts")] {
            if self.source_names.iter().any(|name| *name == candidate) {
              return Some(ResolvedModule::new(candidate));
            }
          }
        }
        self
          .engine
          .resolve_module_name(specifier, containing_file, &self.options, self)
      })
      .collect()
  }
}
