use std::fmt;

/// Target language level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ScriptTarget {
  Es3,
  Es5,
  #[default]
  Es2015,
  Es2016,
  Es2017,
  Es2018,
  Es2019,
  Es2020,
  Es2021,
  Es2022,
  EsNext,
}

/// Module emit format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ModuleKind {
  None,
  #[default]
  CommonJs,
  Amd,
  Umd,
  System,
  Es2015,
  EsNext,
}

/// JSX handling mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JsxMode {
  Preserve,
  React,
  ReactJsx,
  ReactJsxdev,
}

/// Named libraries that can be referenced from configuration.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum LibName {
  Es5,
  Es2015,
  Es2016,
  Es2017,
  Es2018,
  Es2019,
  Es2020,
  Es2021,
  Es2022,
  EsNext,
  Dom,
}

impl LibName {
  pub fn as_str(&self) -> &'static str {
    match self {
      LibName::Es5 => "lib.es5.d.ts",
      LibName::Es2015 => "lib.es2015.d.ts",
      LibName::Es2016 => "lib.es2016.d.ts",
      LibName::Es2017 => "lib.es2017.d.ts",
      LibName::Es2018 => "lib.es2018.d.ts",
      LibName::Es2019 => "lib.es2019.d.ts",
      LibName::Es2020 => "lib.es2020.d.ts",
      LibName::Es2021 => "lib.es2021.d.ts",
      LibName::Es2022 => "lib.es2022.d.ts",
      LibName::EsNext => "lib.esnext.d.ts",
      LibName::Dom => "lib.dom.d.ts",
    }
  }
}

impl fmt::Display for LibName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Resolved compiler configuration.
///
/// Produced once per [`Compiler`](crate::Compiler) instance and shared by
/// reference across every call made through it; never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompilerOptions {
  pub target: ScriptTarget,
  pub module: ModuleKind,
  /// Explicitly requested libs, empty when the default lib applies.
  pub libs: Vec<LibName>,
  /// Emit `.d.ts` declaration files and run declaration checking.
  pub declaration: bool,
  pub out_dir: Option<String>,
  pub strict: bool,
  pub strict_null_checks: bool,
  /// If true, do not load any default library.
  pub no_default_lib: bool,
  pub jsx: Option<JsxMode>,
  /// Gates the host's skip-unchanged-write logic; this front-end never runs
  /// an actual watch loop.
  pub watch: bool,
}

impl Default for CompilerOptions {
  fn default() -> Self {
    CompilerOptions {
      target: ScriptTarget::default(),
      module: ModuleKind::default(),
      libs: Vec::new(),
      declaration: false,
      out_dir: None,
      strict: false,
      strict_null_checks: false,
      no_default_lib: false,
      jsx: None,
      watch: false,
    }
  }
}

/// Default library file name for a target when no override is configured.
pub fn default_lib_name(target: ScriptTarget) -> &'static str {
  match target {
    ScriptTarget::Es3 | ScriptTarget::Es5 => "lib.d.ts",
    ScriptTarget::Es2015 => "lib.es2015.d.ts",
    ScriptTarget::Es2016 => "lib.es2016.d.ts",
    ScriptTarget::Es2017 => "lib.es2017.d.ts",
    ScriptTarget::Es2018 => "lib.es2018.d.ts",
    ScriptTarget::Es2019 => "lib.es2019.d.ts",
    ScriptTarget::Es2020 => "lib.es2020.d.ts",
    ScriptTarget::Es2021 => "lib.es2021.d.ts",
    ScriptTarget::Es2022 => "lib.es2022.d.ts",
    ScriptTarget::EsNext => "lib.esnext.d.ts",
  }
}
