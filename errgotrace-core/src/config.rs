//! Configuration file support for errgotrace
//!
//! Loads project-specific configuration from JSON files.
//!
//! Search order:
//! 1. Explicit path (--config CLI flag)
//! 2. `.errgotracerc.json` in the working directory
//! 3. `errgotrace.config.json` in the working directory
//!
//! All fields are optional. CLI flags take precedence over config file values.

use crate::codegen::DEFAULT_IMPORT_PATH;
use crate::language::PrinterKind;
use crate::signature::FunctionFilter;
use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Inclusion pattern used when neither the file nor the CLI sets one
pub const DEFAULT_FILTER: &str = ".";

/// Config file names tried in order during discovery
pub const CONFIG_FILE_NAMES: &[&str] = &[".errgotracerc.json", "errgotrace.config.json"];

/// errgotrace configuration loaded from a JSON config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrgotraceConfig {
    /// Regex a qualified name must match to be instrumented (default: `.`)
    #[serde(default)]
    pub filter: Option<String>,

    /// Regex excluding qualified names; wins over `filter`
    #[serde(default)]
    pub exclude: Option<String>,

    /// Only instrument exported functions
    #[serde(default)]
    pub exported_only: Option<bool>,

    /// Import path of the runtime support package
    #[serde(default)]
    pub import_path: Option<String>,

    /// Glob patterns for files to leave untouched
    #[serde(default)]
    pub skip: Vec<String>,

    /// Canonical printer to use
    #[serde(default)]
    pub printer: Option<PrinterKind>,
}

/// Resolved configuration with compiled patterns
///
/// Built once per run and passed by reference into every file operation.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub filter: FunctionFilter,
    pub import_path: String,
    /// Compiled skip patterns
    pub skip: GlobSet,
    pub printer: PrinterKind,
    /// Path the config was loaded from (None if defaults)
    pub config_path: Option<PathBuf>,
}

impl ErrgotraceConfig {
    /// Validate the configuration for logical errors
    pub fn validate(&self) -> Result<()> {
        if let Some(ref filter) = self.filter {
            regex::Regex::new(filter)
                .with_context(|| format!("invalid filter pattern: {}", filter))?;
        }
        if let Some(ref exclude) = self.exclude {
            regex::Regex::new(exclude)
                .with_context(|| format!("invalid exclude pattern: {}", exclude))?;
        }

        if let Some(ref import_path) = self.import_path {
            validate_import_path(import_path)?;
        }

        for pattern in &self.skip {
            Glob::new(pattern).with_context(|| format!("invalid skip pattern: {}", pattern))?;
        }

        Ok(())
    }

    /// Layer `overrides` on top of this config
    ///
    /// Scalar fields set in `overrides` replace ours; skip patterns accumulate.
    pub fn merge(&mut self, overrides: ErrgotraceConfig) {
        if overrides.filter.is_some() {
            self.filter = overrides.filter;
        }
        if overrides.exclude.is_some() {
            self.exclude = overrides.exclude;
        }
        if overrides.exported_only.is_some() {
            self.exported_only = overrides.exported_only;
        }
        if overrides.import_path.is_some() {
            self.import_path = overrides.import_path;
        }
        if overrides.printer.is_some() {
            self.printer = overrides.printer;
        }
        self.skip.extend(overrides.skip);
    }

    /// Resolve config into compiled form ready for use
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        self.validate()?;

        let filter = FunctionFilter::new(
            self.filter.as_deref().unwrap_or(DEFAULT_FILTER),
            self.exclude.as_deref().unwrap_or(""),
            self.exported_only.unwrap_or(false),
        )?;

        let skip = {
            let mut builder = GlobSetBuilder::new();
            for pattern in &self.skip {
                builder.add(Glob::new(pattern)?);
            }
            builder.build()?
        };

        Ok(ResolvedConfig {
            filter,
            import_path: self
                .import_path
                .clone()
                .unwrap_or_else(|| DEFAULT_IMPORT_PATH.to_string()),
            skip,
            printer: self.printer.unwrap_or_default(),
            config_path: None,
        })
    }
}

/// The path ends up inside a Go string literal on its own line
fn validate_import_path(import_path: &str) -> Result<()> {
    if import_path.trim().is_empty() {
        anyhow::bail!("import_path must not be empty");
    }
    if let Some(bad) = import_path
        .chars()
        .find(|c| matches!(c, '"' | '\\' | '`') || c.is_whitespace() || c.is_control())
    {
        anyhow::bail!(
            "import_path contains invalid character {:?} (got {:?})",
            bad,
            import_path
        );
    }
    Ok(())
}

impl ResolvedConfig {
    /// Check if a file path matches one of the skip patterns
    pub fn should_skip(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        self.skip.is_match(path_str.as_ref())
    }

    /// Build a ResolvedConfig with all defaults (no config file)
    pub fn defaults() -> Result<Self> {
        ErrgotraceConfig::default().resolve()
    }
}

/// Discover and load a config file from `dir`
///
/// Returns `None` if no config file is found (use defaults).
pub fn discover_config(dir: &Path) -> Result<Option<(ErrgotraceConfig, PathBuf)>> {
    for name in CONFIG_FILE_NAMES {
        let path = dir.join(name);
        if path.exists() {
            let config = load_config_file(&path)?;
            return Ok(Some((config, path)));
        }
    }
    Ok(None)
}

/// Load config from an explicit file path
pub fn load_config_file(path: &Path) -> Result<ErrgotraceConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: ErrgotraceConfig = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("invalid config in: {}", path.display()))?;

    Ok(config)
}

/// Load, merge and resolve config for a run
///
/// If `config_path` is provided, loads from that file. Otherwise, discovers
/// config in `dir`. `overrides` (usually CLI flags) are layered on top.
pub fn load_and_resolve(
    dir: &Path,
    config_path: Option<&Path>,
    overrides: ErrgotraceConfig,
) -> Result<ResolvedConfig> {
    let (mut config, source_path) = if let Some(path) = config_path {
        let config = load_config_file(path)?;
        (config, Some(path.to_path_buf()))
    } else {
        match discover_config(dir)? {
            Some((config, path)) => (config, Some(path)),
            None => (ErrgotraceConfig::default(), None),
        }
    };

    config.merge(overrides);

    let mut resolved = config.resolve()?;
    resolved.config_path = source_path;
    Ok(resolved)
}
