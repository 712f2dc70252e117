use thiserror::Error;

/// Failures the front-end itself can raise.
///
/// Everything else — unreadable source files, failed writes, every
/// checking-phase finding — is reported as [`Diagnostic`](crate::Diagnostic)
/// data or routed through the engine's per-file error callbacks, because the
/// purpose of this crate is to report problems in the compiled input, not to
/// fail the tool embedding it.
#[derive(Debug, Error)]
pub enum CompileError {
  /// Configuration could not be resolved at construction time. The message is
  /// the newline-joined text of every configuration diagnostic.
  #[error("configuration error: {0}")]
  Config(String),
  /// An in-memory source name contained a directory separator. In-memory
  /// sources are flat logical names; directory structure must come from real
  /// on-disk files.
  #[error("in-memory source name '{0}' must not contain a path separator")]
  InvalidSourceName(String),
}
