//! Configuration resolution and path discovery.
//!
//! Resolution order: CLI arguments → environment variables → XDG paths → defaults.

use std::path::{Path, PathBuf};

/// Discovered configuration paths.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// Path to profiler.json (or None for built-in tunables).
    pub config: Option<PathBuf>,

    /// Directory holding the three schema table files (or None for the
    /// built-in tables).
    pub schema_dir: Option<PathBuf>,

    /// Path to phi_policy.json (or None for the built-in policy).
    pub phi_policy: Option<PathBuf>,

    pub config_source: ConfigSource,
    pub schema_source: ConfigSource,
    pub phi_policy_source: ConfigSource,
}

/// Where a configuration file was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Environment variable names.
pub const ENV_CONFIG_PATH: &str = "HP_CONFIG";
pub const ENV_SCHEMA_DIR: &str = "HP_SCHEMA_DIR";
pub const ENV_PHI_POLICY_PATH: &str = "HP_PHI_POLICY";
pub const ENV_CONFIG_DIR: &str = "HP_CONFIG_DIR";

/// Standard file names inside a config directory.
const CONFIG_FILENAME: &str = "profiler.json";
const SCHEMA_DIRNAME: &str = "schemas";
const PHI_POLICY_FILENAME: &str = "phi_policy.json";

/// Application name for XDG directories.
const APP_NAME: &str = "hl7-profiler";

/// Resolve configuration paths using the standard resolution order.
///
/// Resolution order for each entry:
/// 1. Explicit CLI path (taken as-is; a missing file is a load error later)
/// 2. Direct environment variable (HP_CONFIG, HP_SCHEMA_DIR, HP_PHI_POLICY)
/// 3. HP_CONFIG_DIR environment variable + standard name
/// 4. XDG config directory (~/.config/hl7-profiler/)
/// 5. Built-in defaults (None)
pub fn resolve_config(
    cli_config: Option<&Path>,
    cli_schema_dir: Option<&Path>,
    cli_phi_policy: Option<&Path>,
) -> ConfigPaths {
    let mut paths = ConfigPaths::default();

    paths.config = resolve_single(
        cli_config,
        ENV_CONFIG_PATH,
        CONFIG_FILENAME,
        Path::is_file,
        &mut paths.config_source,
    );

    paths.schema_dir = resolve_single(
        cli_schema_dir,
        ENV_SCHEMA_DIR,
        SCHEMA_DIRNAME,
        Path::is_dir,
        &mut paths.schema_source,
    );

    paths.phi_policy = resolve_single(
        cli_phi_policy,
        ENV_PHI_POLICY_PATH,
        PHI_POLICY_FILENAME,
        Path::is_file,
        &mut paths.phi_policy_source,
    );

    paths
}

fn resolve_single(
    cli_path: Option<&Path>,
    env_var: &str,
    name: &str,
    exists: fn(&Path) -> bool,
    source: &mut ConfigSource,
) -> Option<PathBuf> {
    // 1. CLI argument
    if let Some(path) = cli_path {
        *source = ConfigSource::CliArgument;
        return Some(path.to_path_buf());
    }

    // 2. Environment variable (direct path)
    if let Ok(env_path) = std::env::var(env_var) {
        let path = PathBuf::from(env_path);
        if exists(&path) {
            *source = ConfigSource::Environment;
            return Some(path);
        }
    }

    // 3. Environment variable (config dir)
    if let Ok(config_dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = PathBuf::from(config_dir).join(name);
        if exists(&path) {
            *source = ConfigSource::Environment;
            return Some(path);
        }
    }

    // 4. XDG config directory
    if let Some(dir) = xdg_config_dir() {
        let path = dir.join(name);
        if exists(&path) {
            *source = ConfigSource::XdgConfig;
            return Some(path);
        }
    }

    // 5. Built-in default (None)
    *source = ConfigSource::BuiltinDefault;
    None
}

/// Get the XDG config directory for hl7-profiler.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_source_display() {
        assert_eq!(format!("{}", ConfigSource::CliArgument), "CLI argument");
        assert_eq!(
            format!("{}", ConfigSource::Environment),
            "environment variable"
        );
        assert_eq!(format!("{}", ConfigSource::XdgConfig), "XDG config");
        assert_eq!(
            format!("{}", ConfigSource::BuiltinDefault),
            "builtin default"
        );
    }

    #[test]
    fn test_cli_path_taken_verbatim() {
        let missing = Path::new("/definitely/not/here/profiler.json");
        let paths = resolve_config(Some(missing), None, None);
        assert_eq!(paths.config_source, ConfigSource::CliArgument);
        assert_eq!(paths.config.as_deref(), Some(missing));
    }

    #[test]
    fn test_xdg_dir_name() {
        if let Some(dir) = xdg_config_dir() {
            assert!(dir.ends_with(APP_NAME));
        }
    }
}
