use std::hash::Hasher;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Operating-system capability consumed by the host adapter.
///
/// Two implementations exist: [`RealSystem`] (pass-through to the process's
/// actual environment) and [`VirtualSystem`](crate::VirtualSystem) (the
/// in-memory shadowing overlay). Callers may substitute their own, primarily
/// for testing.
pub trait System: Send + Sync + 'static {
  fn read_file(&self, path: &str) -> io::Result<String>;
  fn write_file(&self, path: &str, data: &str, write_byte_order_mark: bool) -> io::Result<()>;
  fn file_exists(&self, path: &str) -> bool;
  fn directory_exists(&self, path: &str) -> bool;
  fn create_directory(&self, path: &str) -> io::Result<()>;
  /// Names of the directories directly under `path`.
  fn get_directories(&self, path: &str) -> Vec<String>;
  fn current_directory(&self) -> String;
  fn newline(&self) -> &str;
  fn use_case_sensitive_file_names(&self) -> bool;
  /// Path of the running executable, used to derive the default library
  /// location when none is configured.
  fn executable_path(&self) -> Option<PathBuf>;
  fn env_var(&self, name: &str) -> Option<String>;

  /// Whether [`create_hash`](System::create_hash) and
  /// [`modified_time`](System::modified_time) are meaningful. The host checks
  /// this once at construction instead of probing on every write.
  fn supports_write_tracking(&self) -> bool {
    false
  }

  fn create_hash(&self, data: &str) -> Option<String> {
    let _ = data;
    None
  }

  fn modified_time(&self, path: &str) -> Option<SystemTime> {
    let _ = path;
    None
  }

  /// True when `write_file` never reaches a real filesystem, so callers must
  /// not create parent directories on this system's behalf.
  fn intercepts_writes(&self) -> bool {
    false
  }
}

/// Pass-through implementation over `std::fs` and `std::env`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealSystem;

impl RealSystem {
  pub fn new() -> Self {
    RealSystem
  }
}

impl System for RealSystem {
  fn read_file(&self, path: &str) -> io::Result<String> {
    std::fs::read_to_string(path)
  }

  fn write_file(&self, path: &str, data: &str, write_byte_order_mark: bool) -> io::Result<()> {
    if write_byte_order_mark {
      let mut bytes = Vec::with_capacity(data.len() + 3);
      bytes.extend_from_slice(b"\xEF\xBB\xBF");
      bytes.extend_from_slice(data.as_bytes());
      std::fs::write(path, bytes)
    } else {
      std::fs::write(path, data)
    }
  }

  fn file_exists(&self, path: &str) -> bool {
    Path::new(path).is_file()
  }

  fn directory_exists(&self, path: &str) -> bool {
    Path::new(path).is_dir()
  }

  fn create_directory(&self, path: &str) -> io::Result<()> {
    std::fs::create_dir(path)
  }

  fn get_directories(&self, path: &str) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(path) else {
      return Vec::new();
    };
    let mut dirs: Vec<String> = entries
      .filter_map(|entry| entry.ok())
      .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
      .map(|entry| entry.file_name().to_string_lossy().into_owned())
      .collect();
    dirs.sort();
    dirs
  }

  fn current_directory(&self) -> String {
    std::env::current_dir()
      .map(|dir| dir.to_string_lossy().into_owned())
      .unwrap_or_else(|_| String::from("/"))
  }

  fn newline(&self) -> &str {
    "\n"
  }

  fn use_case_sensitive_file_names(&self) -> bool {
    !cfg!(any(windows, target_os = "macos"))
  }

  fn executable_path(&self) -> Option<PathBuf> {
    std::env::current_exe().ok()
  }

  fn env_var(&self, name: &str) -> Option<String> {
    std::env::var(name).ok()
  }

  fn supports_write_tracking(&self) -> bool {
    true
  }

  fn create_hash(&self, data: &str) -> Option<String> {
    let mut hasher = ahash::AHasher::default();
    hasher.write(data.as_bytes());
    Some(format!("{:016x}", hasher.finish()))
  }

  fn modified_time(&self, path: &str) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|meta| meta.modified()).ok()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hash_is_stable_for_identical_content() {
    let system = RealSystem::new();
    assert_eq!(system.create_hash("let x = 1;"), system.create_hash("let x = 1;"));
    assert_ne!(system.create_hash("let x = 1;"), system.create_hash("let x = 2;"));
  }

  #[test]
  fn real_system_reports_write_tracking() {
    let system = RealSystem::new();
    assert!(system.supports_write_tracking());
    assert!(!system.intercepts_writes());
  }
}
