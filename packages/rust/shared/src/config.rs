//! Application configuration for msgview.
//!
//! User config lives at `~/.msgview/msgview.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MsgviewError, Result};
use crate::types::{DEFAULT_PATTERN, SENTINEL_FILE_NAME};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "msgview.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".msgview";

// ---------------------------------------------------------------------------
// Config structs (matching msgview.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Input and output locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// File selection rules.
    #[serde(default)]
    pub bundle: BundleRulesConfig,
}

/// `[paths]` section. Relative paths are resolved against the root directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding the conversation transcripts.
    #[serde(default = "default_messages_dir")]
    pub messages_dir: String,

    /// HTML template containing the data marker.
    #[serde(default = "default_template")]
    pub template: String,

    /// Generated viewer file.
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            messages_dir: default_messages_dir(),
            template: default_template(),
            output: default_output(),
        }
    }
}

fn default_messages_dir() -> String {
    "messages".into()
}
fn default_template() -> String {
    "viewer_template.html".into()
}
fn default_output() -> String {
    "viewer.html".into()
}

/// `[bundle]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleRulesConfig {
    /// Glob matched against file names directly under the messages directory.
    #[serde(default = "default_pattern")]
    pub pattern: String,

    /// Exact file names that are never bundled.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

impl Default for BundleRulesConfig {
    fn default() -> Self {
        Self {
            pattern: default_pattern(),
            exclude: default_exclude(),
        }
    }
}

fn default_pattern() -> String {
    DEFAULT_PATTERN.into()
}
fn default_exclude() -> Vec<String> {
    vec![SENTINEL_FILE_NAME.into()]
}

// ---------------------------------------------------------------------------
// Bundle config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime bundle configuration with fully resolved paths.
#[derive(Debug, Clone)]
pub struct BundleConfig {
    /// Directory scanned for transcripts.
    pub messages_dir: PathBuf,
    /// Template file path.
    pub template: PathBuf,
    /// Output file path.
    pub output: PathBuf,
    /// File-name glob, e.g. `*.txt`.
    pub pattern: String,
    /// File names skipped even when they match the pattern.
    pub exclude: Vec<String>,
}

impl BundleConfig {
    /// Build a runtime config, resolving relative paths against `root`.
    pub fn resolve(config: &AppConfig, root: &Path) -> Self {
        Self {
            messages_dir: resolve_path(root, &config.paths.messages_dir),
            template: resolve_path(root, &config.paths.template),
            output: resolve_path(root, &config.paths.output),
            pattern: config.bundle.pattern.clone(),
            exclude: config.bundle.exclude.clone(),
        }
    }
}

impl From<&AppConfig> for BundleConfig {
    /// Resolve against the current directory (paths stay relative).
    fn from(config: &AppConfig) -> Self {
        Self::resolve(config, Path::new(""))
    }
}

/// Join `path` onto `root` unless it is already absolute.
pub fn resolve_path(root: &Path, path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.msgview/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| MsgviewError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.msgview/msgview.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| MsgviewError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        MsgviewError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let path = config_file_path()?;
    init_config_at(&path)?;
    Ok(path)
}

/// Write a default config file at `path`, creating parent directories.
pub fn init_config_at(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| MsgviewError::io(dir, e))?;
    }

    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| MsgviewError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| MsgviewError::io(path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("messages_dir"));
        assert!(toml_str.contains("orphaned.txt"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.paths.template, "viewer_template.html");
        assert_eq!(parsed.bundle.pattern, "*.txt");
        assert_eq!(parsed.bundle.exclude, vec!["orphaned.txt".to_string()]);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let toml_str = r#"
[paths]
output = "/srv/www/messages.html"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.paths.output, "/srv/www/messages.html");
        assert_eq!(config.paths.messages_dir, "messages");
        assert_eq!(config.bundle.exclude, vec!["orphaned.txt".to_string()]);
    }

    #[test]
    fn bundle_config_resolves_against_root() {
        let mut app = AppConfig::default();
        app.paths.output = std::env::temp_dir()
            .join("viewer.html")
            .to_string_lossy()
            .into_owned();

        let bundle = BundleConfig::resolve(&app, Path::new("/data/export"));
        assert_eq!(bundle.messages_dir, Path::new("/data/export/messages"));
        assert_eq!(bundle.template, Path::new("/data/export/viewer_template.html"));
        assert_eq!(bundle.output, std::env::temp_dir().join("viewer.html"));
    }

    #[test]
    fn bundle_config_from_app_config_is_relative() {
        let bundle = BundleConfig::from(&AppConfig::default());
        assert_eq!(bundle.messages_dir, Path::new("messages"));
        assert_eq!(bundle.pattern, "*.txt");
    }

    #[test]
    fn load_config_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("msgview.toml");
        std::fs::write(&path, "[paths\nbroken").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }

    #[test]
    fn init_config_at_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("msgview.toml");
        init_config_at(&path).unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.paths.messages_dir, "messages");
    }
}
