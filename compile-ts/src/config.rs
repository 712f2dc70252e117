use crate::options::{CompilerOptions, JsxMode, LibName, ModuleKind, ScriptTarget};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub(crate) const CODE_NO_INPUTS: u32 = 18003;
const CODE_CIRCULAR_EXTENDS: u32 = 18000;
const CODE_EMPTY_FILES: u32 = 18002;
const CODE_PARSE_FAILURE: u32 = 5014;
const CODE_FILE_NOT_FOUND: u32 = 6053;
const CODE_BAD_OPTION_VALUE: u32 = 6046;

/// One configuration problem. These are collected, not raised; the facade
/// decides which of them are fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConfigDiagnostic {
  pub code: u32,
  pub message: String,
}

impl ConfigDiagnostic {
  fn new(code: u32, message: impl Into<String>) -> Self {
    ConfigDiagnostic {
      code,
      message: message.into(),
    }
  }
}

/// Result of resolving a tsconfig-shaped object once per compiler instance.
#[derive(Debug, Clone, Default)]
pub(crate) struct ParsedConfig {
  pub options: CompilerOptions,
  /// Explicit on-disk file names, sorted and deduplicated.
  pub file_names: Vec<String>,
  pub errors: Vec<ConfigDiagnostic>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawConfig {
  extends: Option<String>,
  compiler_options: RawCompilerOptions,
  files: Option<Vec<String>>,
  include: Option<Vec<String>>,
  exclude: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawCompilerOptions {
  target: Option<String>,
  module: Option<String>,
  lib: Option<Vec<String>>,
  jsx: Option<String>,
  declaration: Option<bool>,
  out_dir: Option<String>,
  strict: Option<bool>,
  strict_null_checks: Option<bool>,
  no_lib: Option<bool>,
  no_default_lib: Option<bool>,
  watch: Option<bool>,
}

/// Resolve a configuration object (or defaults when absent) into options plus
/// the explicit file list. Never touches the overlay: configuration and the
/// files it references live on the real filesystem by definition.
pub(crate) fn parse_config(config: Option<&serde_json::Value>, base_path: &Path) -> ParsedConfig {
  let Some(config) = config else {
    return ParsedConfig::default();
  };

  let mut errors = Vec::new();
  let mut raw: RawConfig = match serde_json::from_value(config.clone()) {
    Ok(raw) => raw,
    Err(err) => {
      return ParsedConfig {
        errors: vec![ConfigDiagnostic::new(
          CODE_PARSE_FAILURE,
          format!("Failed to parse configuration: {err}."),
        )],
        ..ParsedConfig::default()
      };
    }
  };

  if let Some(extends) = raw.extends.take() {
    let mut visited = HashSet::new();
    if let Some(base) = load_extends_chain(base_path, &extends, &mut visited, &mut errors) {
      raw = merge_raw_configs(base, raw);
    }
  }

  let options = compiler_options_from_raw(&raw.compiler_options, &mut errors);
  let file_names = resolve_file_names(base_path, &raw, &mut errors);

  if file_names.is_empty() {
    errors.push(ConfigDiagnostic::new(
      CODE_NO_INPUTS,
      format!(
        "No inputs were found in config file. Specified 'include' paths were {:?} and 'exclude' paths were {:?}.",
        raw.include.clone().unwrap_or_else(|| vec!["**/*".to_string()]),
        raw.exclude.clone().unwrap_or_default(),
      ),
    ));
  }

  ParsedConfig {
    options,
    file_names,
    errors,
  }
}

fn load_extends_chain(
  config_dir: &Path,
  extends: &str,
  visited: &mut HashSet<PathBuf>,
  errors: &mut Vec<ConfigDiagnostic>,
) -> Option<RawConfig> {
  let path = match resolve_extends_path(config_dir, extends) {
    Ok(path) => path,
    Err(message) => {
      errors.push(ConfigDiagnostic::new(CODE_FILE_NOT_FOUND, message));
      return None;
    }
  };

  if !visited.insert(path.clone()) {
    errors.push(ConfigDiagnostic::new(
      CODE_CIRCULAR_EXTENDS,
      format!(
        "Circularity detected while resolving configuration: {}.",
        path.display()
      ),
    ));
    return None;
  }

  let text = match fs::read_to_string(&path) {
    Ok(text) => text,
    Err(err) => {
      errors.push(ConfigDiagnostic::new(
        CODE_FILE_NOT_FOUND,
        format!("Failed to read extended config {}: {err}.", path.display()),
      ));
      return None;
    }
  };

  let mut current: RawConfig = match json5::from_str(&text) {
    Ok(raw) => raw,
    Err(err) => {
      errors.push(ConfigDiagnostic::new(
        CODE_PARSE_FAILURE,
        format!("Failed to parse {}: {err}.", path.display()),
      ));
      return None;
    }
  };

  let Some(extends) = current.extends.take() else {
    return Some(current);
  };
  let parent_dir = path.parent().unwrap_or(config_dir).to_path_buf();
  match load_extends_chain(&parent_dir, &extends, visited, errors) {
    Some(base) => Some(merge_raw_configs(base, current)),
    None => Some(current),
  }
}

fn resolve_extends_path(config_dir: &Path, extends: &str) -> Result<PathBuf, String> {
  if extends.starts_with('.') || Path::new(extends).is_absolute() {
    return resolve_extends_file(&resolve_path_relative_to(config_dir, Path::new(extends)));
  }

  for ancestor in config_dir.ancestors() {
    let base = ancestor.join("node_modules").join(extends);
    if let Ok(resolved) = resolve_extends_file(&base) {
      return Ok(resolved);
    }
  }

  Err(format!(
    "Failed to resolve extended config '{extends}' from {}.",
    config_dir.display()
  ))
}

fn resolve_extends_file(candidate: &Path) -> Result<PathBuf, String> {
  let mut attempts = Vec::new();
  attempts.push(candidate.to_path_buf());
  if candidate.extension().is_none() {
    attempts.push(candidate.with_extension("json"));
  }
  if candidate.is_dir() {
    attempts.push(candidate.join("tsconfig.json"));
  }

  for attempt in attempts {
    if attempt.is_file() {
      return attempt
        .canonicalize()
        .map_err(|err| format!("Failed to read extended config {}: {err}.", attempt.display()));
    }
  }

  Err(format!(
    "Extended config {} does not exist.",
    candidate.display()
  ))
}

fn merge_raw_configs(base: RawConfig, overlay: RawConfig) -> RawConfig {
  RawConfig {
    extends: None,
    compiler_options: merge_raw_compiler_options(base.compiler_options, overlay.compiler_options),
    files: overlay.files.or(base.files),
    include: overlay.include.or(base.include),
    exclude: overlay.exclude.or(base.exclude),
  }
}

fn merge_raw_compiler_options(
  base: RawCompilerOptions,
  overlay: RawCompilerOptions,
) -> RawCompilerOptions {
  RawCompilerOptions {
    target: overlay.target.or(base.target),
    module: overlay.module.or(base.module),
    lib: overlay.lib.or(base.lib),
    jsx: overlay.jsx.or(base.jsx),
    declaration: overlay.declaration.or(base.declaration),
    out_dir: overlay.out_dir.or(base.out_dir),
    strict: overlay.strict.or(base.strict),
    strict_null_checks: overlay.strict_null_checks.or(base.strict_null_checks),
    no_lib: overlay.no_lib.or(base.no_lib),
    no_default_lib: overlay.no_default_lib.or(base.no_default_lib),
    watch: overlay.watch.or(base.watch),
  }
}

fn compiler_options_from_raw(
  raw: &RawCompilerOptions,
  errors: &mut Vec<ConfigDiagnostic>,
) -> CompilerOptions {
  let mut options = CompilerOptions::default();

  if let Some(value) = raw.target.as_deref() {
    match parse_script_target(value) {
      Some(target) => options.target = target,
      None => errors.push(bad_option_value("target", value)),
    }
  }

  if let Some(value) = raw.module.as_deref() {
    match parse_module_kind(value) {
      Some(module) => options.module = module,
      None => errors.push(bad_option_value("module", value)),
    }
  }

  if let Some(libs) = raw.lib.as_ref() {
    let mut parsed = Vec::new();
    for value in libs {
      match parse_lib_name(value) {
        Some(lib) => parsed.push(lib),
        None => errors.push(bad_option_value("lib", value)),
      }
    }
    parsed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    parsed.dedup();
    options.libs = parsed;
  }

  if let Some(value) = raw.jsx.as_deref() {
    match parse_jsx_mode(value) {
      Some(jsx) => options.jsx = Some(jsx),
      None => errors.push(bad_option_value("jsx", value)),
    }
  }

  options.declaration = raw.declaration.unwrap_or(false);
  options.out_dir = raw.out_dir.clone();
  options.strict = raw.strict.unwrap_or(false);
  options.strict_null_checks = raw.strict_null_checks.or(raw.strict).unwrap_or(false);
  options.watch = raw.watch.unwrap_or(false);

  if raw.no_lib.unwrap_or(false) || raw.no_default_lib.unwrap_or(false) {
    options.no_default_lib = true;
    options.libs.clear();
  }

  options
}

fn bad_option_value(option: &str, value: &str) -> ConfigDiagnostic {
  ConfigDiagnostic::new(
    CODE_BAD_OPTION_VALUE,
    format!("Argument for '{option}' option has unsupported value '{value}'."),
  )
}

fn parse_script_target(raw: &str) -> Option<ScriptTarget> {
  match raw.trim().to_ascii_lowercase().as_str() {
    "es3" => Some(ScriptTarget::Es3),
    "es5" => Some(ScriptTarget::Es5),
    "es2015" | "es6" => Some(ScriptTarget::Es2015),
    "es2016" => Some(ScriptTarget::Es2016),
    "es2017" => Some(ScriptTarget::Es2017),
    "es2018" => Some(ScriptTarget::Es2018),
    "es2019" => Some(ScriptTarget::Es2019),
    "es2020" => Some(ScriptTarget::Es2020),
    "es2021" => Some(ScriptTarget::Es2021),
    "es2022" => Some(ScriptTarget::Es2022),
    "esnext" => Some(ScriptTarget::EsNext),
    _ => None,
  }
}

fn parse_module_kind(raw: &str) -> Option<ModuleKind> {
  match raw.trim().to_ascii_lowercase().as_str() {
    "none" => Some(ModuleKind::None),
    "commonjs" => Some(ModuleKind::CommonJs),
    "amd" => Some(ModuleKind::Amd),
    "umd" => Some(ModuleKind::Umd),
    "system" => Some(ModuleKind::System),
    "es2015" | "es6" => Some(ModuleKind::Es2015),
    "esnext" => Some(ModuleKind::EsNext),
    _ => None,
  }
}

fn parse_lib_name(raw: &str) -> Option<LibName> {
  let normalized = raw.trim().to_ascii_lowercase();
  let base = normalized.split('.').next().unwrap_or(&normalized);
  match base {
    "es5" => Some(LibName::Es5),
    "es2015" | "es6" => Some(LibName::Es2015),
    "es2016" => Some(LibName::Es2016),
    "es2017" => Some(LibName::Es2017),
    "es2018" => Some(LibName::Es2018),
    "es2019" => Some(LibName::Es2019),
    "es2020" => Some(LibName::Es2020),
    "es2021" => Some(LibName::Es2021),
    "es2022" => Some(LibName::Es2022),
    "esnext" => Some(LibName::EsNext),
    "dom" => Some(LibName::Dom),
    _ => None,
  }
}

fn parse_jsx_mode(raw: &str) -> Option<JsxMode> {
  match raw.trim().to_ascii_lowercase().as_str() {
    "preserve" | "react-native" => Some(JsxMode::Preserve),
    "react" => Some(JsxMode::React),
    "react-jsx" => Some(JsxMode::ReactJsx),
    "react-jsxdev" => Some(JsxMode::ReactJsxdev),
    _ => None,
  }
}

fn resolve_file_names(
  base_path: &Path,
  raw: &RawConfig,
  errors: &mut Vec<ConfigDiagnostic>,
) -> Vec<String> {
  if let Some(files) = raw.files.as_ref() {
    if files.is_empty() {
      errors.push(ConfigDiagnostic::new(
        CODE_EMPTY_FILES,
        "The 'files' list in config file is empty.",
      ));
      return Vec::new();
    }

    let mut resolved = Vec::new();
    for file in files {
      let path = resolve_path_relative_to(base_path, Path::new(file));
      if !path.is_file() {
        errors.push(ConfigDiagnostic::new(
          CODE_FILE_NOT_FOUND,
          format!("File '{}' not found.", path.display()),
        ));
        continue;
      }
      resolved.push(path.to_string_lossy().into_owned());
    }
    resolved.sort();
    resolved.dedup();
    return resolved;
  }

  let include = raw
    .include
    .clone()
    .unwrap_or_else(|| vec!["**/*".to_string()]);
  let exclude = raw.exclude.clone().unwrap_or_else(|| {
    vec![
      "node_modules".to_string(),
      "bower_components".to_string(),
      "jspm_packages".to_string(),
    ]
  });

  let include_set = match build_globset(&include) {
    Ok(set) => set,
    Err(message) => {
      errors.push(ConfigDiagnostic::new(CODE_PARSE_FAILURE, message));
      return Vec::new();
    }
  };
  let exclude_set = match build_globset(&exclude) {
    Ok(set) => set,
    Err(message) => {
      errors.push(ConfigDiagnostic::new(CODE_PARSE_FAILURE, message));
      return Vec::new();
    }
  };

  let mut files = Vec::new();
  for entry in WalkDir::new(base_path)
    .follow_links(false)
    .into_iter()
    .filter_map(|entry| entry.ok())
  {
    if !entry.file_type().is_file() || !is_supported_source_file(entry.path()) {
      continue;
    }
    let Ok(rel) = entry.path().strip_prefix(base_path) else {
      continue;
    };
    if !include_set.is_match(rel) || exclude_set.is_match(rel) {
      continue;
    }
    files.push(entry.path().to_string_lossy().into_owned());
  }

  files.sort();
  files.dedup();
  files
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, String> {
  let mut builder = GlobSetBuilder::new();
  for pattern in patterns {
    let expanded = expand_directory_pattern(pattern.trim());
    if expanded.is_empty() {
      continue;
    }
    let glob =
      Glob::new(&expanded).map_err(|err| format!("Invalid glob pattern '{pattern}': {err}."))?;
    builder.add(glob);
  }
  builder
    .build()
    .map_err(|err| format!("Failed to build glob matcher: {err}."))
}

fn expand_directory_pattern(pattern: &str) -> String {
  if pattern.chars().any(|ch| matches!(ch, '*' | '?' | '[' | ']')) {
    return pattern.to_string();
  }

  let trimmed = pattern.trim_end_matches('/');
  if trimmed.is_empty() {
    return "**/*".to_string();
  }
  let file_name = Path::new(trimmed)
    .file_name()
    .and_then(|name| name.to_str())
    .unwrap_or("");
  if file_name.ends_with(".d.ts") {
    return trimmed.to_string();
  }
  match Path::new(trimmed).extension().and_then(|ext| ext.to_str()) {
    Some(_) => trimmed.to_string(),
    None => format!("{trimmed}/**/*"),
  }
}

fn is_supported_source_file(path: &Path) -> bool {
  let name = path.file_name().and_then(|name| name.to_str()).unwrap_or("");
  if name.ends_with(".d.ts") {
    return true;
  }
  matches!(
    path.extension().and_then(|ext| ext.to_str()),
    Some("ts" | "tsx")
  )
}

fn resolve_path_relative_to(base: &Path, path: &Path) -> PathBuf {
  if path.is_absolute() {
    path.to_path_buf()
  } else {
    base.join(path)
  }
}
