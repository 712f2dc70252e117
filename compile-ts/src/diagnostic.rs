use crate::engine::SourceFile;
use std::fmt;
use std::sync::Arc;

/// Severity reported by the engine. Opaque pass-through: the front-end never
/// reinterprets what a category means, it only renders the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
  Warning,
  Error,
  Suggestion,
  Message,
}

impl DiagnosticCategory {
  pub fn as_str(&self) -> &'static str {
    match self {
      DiagnosticCategory::Warning => "Warning",
      DiagnosticCategory::Error => "Error",
      DiagnosticCategory::Suggestion => "Suggestion",
      DiagnosticCategory::Message => "Message",
    }
  }
}

impl fmt::Display for DiagnosticCategory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Which checking phase produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticType {
  Option,
  Global,
  Syntactic,
  Semantic,
  Declaration,
}

impl DiagnosticType {
  pub fn as_str(&self) -> &'static str {
    match self {
      DiagnosticType::Option => "option",
      DiagnosticType::Global => "global",
      DiagnosticType::Syntactic => "syntactic",
      DiagnosticType::Semantic => "semantic",
      DiagnosticType::Declaration => "declaration",
    }
  }
}

impl fmt::Display for DiagnosticType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Message body: a single string, or a chain of nested parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageText {
  Single(String),
  Chain {
    text: String,
    details: Vec<MessageText>,
  },
}

impl MessageText {
  /// Render the whole tree as one string, each nested part on its own
  /// `newline`-joined line indented two spaces per depth.
  pub fn flatten(&self, newline: &str) -> String {
    let mut out = String::new();
    self.flatten_into(&mut out, newline, 0);
    out
  }

  fn flatten_into(&self, out: &mut String, newline: &str, depth: usize) {
    if depth > 0 {
      out.push_str(newline);
      for _ in 0..depth {
        out.push_str("  ");
      }
    }
    match self {
      MessageText::Single(text) => out.push_str(text),
      MessageText::Chain { text, details } => {
        out.push_str(text);
        for detail in details {
          detail.flatten_into(out, newline, depth + 1);
        }
      }
    }
  }
}

impl From<&str> for MessageText {
  fn from(text: &str) -> Self {
    MessageText::Single(text.to_string())
  }
}

impl From<String> for MessageText {
  fn from(text: String) -> Self {
    MessageText::Single(text)
  }
}

/// One issue as the engine reports it, before phase classification.
#[derive(Debug, Clone)]
pub struct RawDiagnostic {
  pub file: Option<Arc<SourceFile>>,
  /// Byte offset of the issue within `file`, when known.
  pub start: Option<u32>,
  pub category: DiagnosticCategory,
  pub code: u32,
  pub message_text: MessageText,
}

impl RawDiagnostic {
  pub fn new(category: DiagnosticCategory, code: u32, message: impl Into<MessageText>) -> Self {
    RawDiagnostic {
      file: None,
      start: None,
      category,
      code,
      message_text: message.into(),
    }
  }

  pub fn with_location(mut self, file: Arc<SourceFile>, start: u32) -> Self {
    self.file = Some(file);
    self.start = Some(start);
    self
  }
}

/// One reported issue, tagged with the phase that produced it. Created fresh
/// per call, never mutated.
#[derive(Debug, Clone)]
pub struct Diagnostic {
  pub file: Option<Arc<SourceFile>>,
  pub start: Option<u32>,
  pub category: DiagnosticCategory,
  pub code: u32,
  pub message_text: MessageText,
  pub diagnostic_type: DiagnosticType,
}

impl Diagnostic {
  pub(crate) fn classify(raw: RawDiagnostic, diagnostic_type: DiagnosticType) -> Self {
    Diagnostic {
      file: raw.file,
      start: raw.start,
      category: raw.category,
      code: raw.code,
      message_text: raw.message_text,
      diagnostic_type,
    }
  }
}

impl PartialEq for Diagnostic {
  /// Content equality: two diagnostics are equal when they say the same thing
  /// about the same place, regardless of which call produced them.
  fn eq(&self, other: &Self) -> bool {
    let same_file = match (&self.file, &other.file) {
      (Some(a), Some(b)) => a.name() == b.name(),
      (None, None) => true,
      _ => false,
    };
    same_file
      && self.start == other.start
      && self.category == other.category
      && self.code == other.code
      && self.message_text == other.message_text
      && self.diagnostic_type == other.diagnostic_type
  }
}

impl Eq for Diagnostic {}
