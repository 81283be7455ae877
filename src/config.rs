//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$MHTML2HTML_CONFIG` (environment variable)
//! 2. `~/.config/mhtml2html/config.toml` (Linux/macOS)
//!    `%APPDATA%\mhtml2html\config.toml` (Windows)
//! 3. Built-in defaults

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::inline::ConvertOptions;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Conversion defaults.
    pub convert: ConvertConfig,
    /// Output formatting.
    pub output: OutputConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Override cache directory for logs.
    pub cache_dir: Option<PathBuf>,
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
}

/// Conversion defaults, overridable per run from the command line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Inline `cid:` frames as nested `data:` documents.
    pub convert_iframes: bool,
    /// Target for the `<base>` element added to `<head>`. Empty disables it.
    pub base_target: String,
    /// Remove `integrity` attributes.
    pub strip_integrity: bool,
}

/// Output formatting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print JSON from `inspect --json`.
    pub pretty_json: bool,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            log_level: "warn".to_string(),
        }
    }
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            convert_iframes: false,
            base_target: "_parent".to_string(),
            strip_integrity: true,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty_json: true }
    }
}

impl From<&ConvertConfig> for ConvertOptions {
    fn from(config: &ConvertConfig) -> Self {
        let target = config.base_target.trim();
        Self {
            convert_iframes: config.convert_iframes,
            base_target: (!target.is_empty()).then(|| target.to_string()),
            strip_integrity: config.strip_integrity,
        }
    }
}

// ── Load ────────────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    if let Some(path) = config_file_path() {
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<Config>(&contents) {
                    Ok(cfg) => {
                        tracing::info!(path = %path.display(), "Loaded config");
                        return cfg;
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to parse config, using defaults"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to read config file, using defaults"
                    );
                }
            }
        }
    }
    Config::default()
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("MHTML2HTML_CONFIG") {
        return Some(PathBuf::from(env_path));
    }
    dirs::config_dir().map(|d| d.join("mhtml2html").join("config.toml"))
}

/// Return the cache directory used for logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mhtml2html")
}

/// Return the log file path.
pub fn log_file_path(config: &Config) -> PathBuf {
    cache_dir(config).join("mhtml2html.log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.general.log_level, "warn");
        assert!(!cfg.convert.convert_iframes);
        assert_eq!(cfg.convert.base_target, "_parent");
        assert!(cfg.convert.strip_integrity);
        assert!(cfg.output.pretty_json);
    }

    #[test]
    fn test_serialize_deserialize_roundtrip() {
        let mut cfg = Config::default();
        cfg.convert.convert_iframes = true;
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let parsed: Config = toml::from_str(&toml_str).expect("deserialize");
        assert!(parsed.convert.convert_iframes);
        assert_eq!(parsed.general.log_level, cfg.general.log_level);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let partial = r#"
[convert]
base_target = "_top"
"#;
        let cfg: Config = toml::from_str(partial).expect("parse partial");
        assert_eq!(cfg.convert.base_target, "_top");
        // Other fields use defaults
        assert!(cfg.convert.strip_integrity);
        assert_eq!(cfg.general.log_level, "warn");
    }

    #[test]
    fn test_convert_options_from_config() {
        let options = ConvertOptions::from(&ConvertConfig::default());
        assert_eq!(options, ConvertOptions::default());

        let cfg = ConvertConfig {
            base_target: "  ".to_string(),
            ..ConvertConfig::default()
        };
        assert_eq!(ConvertOptions::from(&cfg).base_target, None);
    }

    #[test]
    fn test_log_file_in_cache_dir() {
        let mut cfg = Config::default();
        cfg.general.cache_dir = Some(PathBuf::from("/tmp/m2h"));
        assert_eq!(log_file_path(&cfg), PathBuf::from("/tmp/m2h/mhtml2html.log"));
    }
}
