//! CLI utilities for binaries
//!
//! Resolves which configuration file a binary loads.

use std::path::PathBuf;

/// Type of configuration to load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigType {
    /// Dashboard configuration (config/dashboard.yaml)
    Dashboard,
    /// Custom path, given on the command line
    Custom(String),
}

impl ConfigType {
    /// Get the default path for this config type
    pub fn default_path(&self) -> &str {
        match self {
            ConfigType::Dashboard => "config/dashboard.yaml",
            ConfigType::Custom(path) => path,
        }
    }

    /// Environment variable that overrides the default path
    ///
    /// Custom paths are explicit and never overridden.
    pub fn env_var_name(&self) -> Option<&str> {
        match self {
            ConfigType::Dashboard => Some("DASHBOARD_CONFIG_PATH"),
            ConfigType::Custom(_) => None,
        }
    }
}

/// Load configuration path from environment or use default
///
/// # Examples
/// ```
/// use admin_realtime::bin_common::{load_config_from_env, ConfigType};
///
/// let path = load_config_from_env(ConfigType::Custom("my.yaml".to_string()));
/// assert_eq!(path.to_str(), Some("my.yaml"));
/// ```
pub fn load_config_from_env(config_type: ConfigType) -> PathBuf {
    config_type
        .env_var_name()
        .and_then(|name| std::env::var(name).ok())
        .filter(|path| !path.trim().is_empty())
        .unwrap_or_else(|| config_type.default_path().to_string())
        .into()
}

/// Parse command line arguments for a binary
///
/// Returns a vector of arguments (excluding the program name)
pub fn parse_args() -> Vec<String> {
    std::env::args().skip(1).collect()
}

/// First positional argument as a custom config path, else the dashboard default
pub fn config_type_from_args(args: &[String]) -> ConfigType {
    match args.first() {
        Some(path) if !path.starts_with('-') => ConfigType::Custom(path.clone()),
        _ => ConfigType::Dashboard,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_type_paths() {
        assert_eq!(ConfigType::Dashboard.default_path(), "config/dashboard.yaml");

        let custom = ConfigType::Custom("custom/path.yaml".to_string());
        assert_eq!(custom.default_path(), "custom/path.yaml");
    }

    #[test]
    fn test_config_type_env_vars() {
        assert_eq!(ConfigType::Dashboard.env_var_name(), Some("DASHBOARD_CONFIG_PATH"));
        assert_eq!(ConfigType::Custom("x".to_string()).env_var_name(), None);
    }

    #[test]
    fn test_config_type_from_args() {
        assert_eq!(config_type_from_args(&[]), ConfigType::Dashboard);
        assert_eq!(
            config_type_from_args(&["staging.yaml".to_string()]),
            ConfigType::Custom("staging.yaml".to_string())
        );
        assert_eq!(config_type_from_args(&["--verbose".to_string()]), ConfigType::Dashboard);
    }
}
