//! Configuration loading.
//!
//! Configuration lives in a `chainlint.toml` under a `[chainlint]` table,
//! discovered by walking up from the analysis root. Everything is optional;
//! the core analysis takes no options at all — configuration only selects
//! rules and scopes the file walk.

use std::fs;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use serde::Deserialize;

/// Name of the project configuration file.
pub const CONFIG_FILENAME: &str = "chainlint.toml";

#[derive(Debug, Deserialize, Default, Clone)]
/// Top-level configuration struct.
pub struct Config {
    #[serde(default)]
    /// The main configuration section for chainlint.
    pub chainlint: ChainlintConfig,
    /// The path to the configuration file this was loaded from.
    /// `None` when using defaults or programmatic config.
    #[serde(skip)]
    pub config_file_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default, Clone)]
/// Configuration options for chainlint.
pub struct ChainlintConfig {
    /// List of folders to exclude (in addition to the defaults).
    pub exclude_folders: Option<Vec<String>>,
    /// Folders to force-include (overrides default exclusions).
    pub include_folders: Option<Vec<String>>,
    /// Rule ids or names to disable everywhere.
    pub ignore: Option<Vec<String>>,
    /// Per-file ignore overrides (glob -> rule ids/names).
    #[serde(alias = "per-file-ignores")]
    pub per_file_ignores: Option<FxHashMap<String, Vec<String>>>,
    /// HTTP method registration order enforced by route-grouping.
    pub method_order: Option<Vec<String>>,
    /// Constructor names recognized as application instances.
    pub app_constructors: Option<Vec<String>>,
    /// Exit non-zero when findings exist.
    pub fail_on_issues: Option<bool>,
}

impl Config {
    /// Loads configuration by walking up from `path` until a
    /// `chainlint.toml` is found; falls back to defaults.
    #[must_use]
    pub fn load_from_path(path: &Path) -> Config {
        let mut current = path.to_path_buf();
        if current.is_file() {
            current.pop();
        }

        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                if let Ok(content) = fs::read_to_string(&candidate) {
                    if let Ok(mut config) = toml::from_str::<Config>(&content) {
                        config.config_file_path = Some(candidate);
                        return config;
                    }
                }
            }
            if !current.pop() {
                break;
            }
        }

        Config::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let content = r#"
            [chainlint]
            exclude_folders = ["generated"]
            ignore = ["no-process-env", "CHL-S204"]
            method_order = ["use", "get", "post"]
            app_constructors = ["Hono", "OpenAPIHono"]
            fail_on_issues = true

            [chainlint.per_file_ignores]
            "tests/**" = ["no-multiple-next"]
        "#;
        let config: Config = toml::from_str(content).unwrap();
        assert_eq!(
            config.chainlint.exclude_folders.as_deref(),
            Some(&["generated".to_owned()][..])
        );
        assert_eq!(config.chainlint.ignore.as_ref().map(Vec::len), Some(2));
        assert_eq!(config.chainlint.fail_on_issues, Some(true));
        let per_file = config.chainlint.per_file_ignores.unwrap();
        assert_eq!(per_file["tests/**"], vec!["no-multiple-next".to_owned()]);
    }

    #[test]
    fn empty_config_is_all_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.chainlint.ignore.is_none());
        assert!(config.chainlint.method_order.is_none());
    }

    #[test]
    fn discovery_walks_up_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("src").join("routes");
        fs::create_dir_all(&nested).unwrap();
        fs::write(
            dir.path().join(CONFIG_FILENAME),
            "[chainlint]\nignore = [\"route-grouping\"]\n",
        )
        .unwrap();

        let config = Config::load_from_path(&nested);
        assert_eq!(
            config.chainlint.ignore.as_deref(),
            Some(&["route-grouping".to_owned()][..])
        );
        assert!(config.config_file_path.is_some());
    }

    #[test]
    fn missing_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from_path(dir.path());
        assert!(config.config_file_path.is_none());
    }
}
