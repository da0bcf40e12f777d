//! Collection config resolution.
//!
//! Implements deterministic resolution order:
//! 1. Explicit CLI flag (--config)
//! 2. SB_COLLECT_CONFIG environment variable
//! 3. $XDG_CONFIG_HOME/support-bundle/collect.json
//! 4. ~/.config/support-bundle/collect.json (platform config dir)
//! 5. Built-in defaults
//!
//! Steps 3 and 4 apply only when the file exists. An explicit path that
//! does not exist is an error.

use std::env;
use std::path::{Path, PathBuf};

use sb_collect::{CollectError, CollectionOptions};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Directory name under the config root.
pub const CONFIG_DIR_NAME: &str = "support-bundle";

/// Config file name inside [`CONFIG_DIR_NAME`].
pub const CONFIG_FILE_NAME: &str = "collect.json";

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "SB_COLLECT_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config in {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: CollectError,
    },
}

/// Where the effective options came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigResolution {
    CliFlag,
    EnvVar,
    XdgConfig,
    UserConfig,
    Default,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigSource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub resolution: ConfigResolution,
}

/// Environment inputs to resolution, captured once.
#[derive(Debug, Clone, Default)]
pub struct ConfigEnv {
    /// Value of SB_COLLECT_CONFIG.
    pub config_file: Option<PathBuf>,
    /// Value of XDG_CONFIG_HOME.
    pub xdg_config_home: Option<PathBuf>,
    /// Platform user config directory.
    pub user_config_dir: Option<PathBuf>,
}

impl ConfigEnv {
    pub fn from_process() -> Self {
        let non_empty = |name: &str| env::var_os(name).filter(|v| !v.is_empty()).map(PathBuf::from);
        ConfigEnv {
            config_file: non_empty(CONFIG_ENV_VAR),
            xdg_config_home: non_empty("XDG_CONFIG_HOME"),
            user_config_dir: dirs::config_dir(),
        }
    }
}

/// Configuration resolver with deterministic resolution order.
#[derive(Debug)]
pub struct ConfigResolver {
    cli_path: Option<PathBuf>,
    env: ConfigEnv,
}

impl ConfigResolver {
    pub fn new(cli_path: Option<PathBuf>, env: ConfigEnv) -> Self {
        ConfigResolver { cli_path, env }
    }

    /// Resolver reading the live process environment.
    pub fn from_process(cli_path: Option<PathBuf>) -> Self {
        Self::new(cli_path, ConfigEnv::from_process())
    }

    /// Resolve the config file path.
    pub fn resolve_path(&self) -> (Option<PathBuf>, ConfigResolution) {
        if let Some(ref path) = self.cli_path {
            return (Some(path.clone()), ConfigResolution::CliFlag);
        }

        if let Some(ref path) = self.env.config_file {
            return (Some(path.clone()), ConfigResolution::EnvVar);
        }

        let candidates = [
            (&self.env.xdg_config_home, ConfigResolution::XdgConfig),
            (&self.env.user_config_dir, ConfigResolution::UserConfig),
        ];
        for (dir, resolution) in candidates {
            if let Some(dir) = dir {
                let path = dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME);
                if path.is_file() {
                    return (Some(path), resolution);
                }
            }
        }

        (None, ConfigResolution::Default)
    }

    /// Load options from the resolved path, or defaults.
    pub fn load(&self) -> Result<(CollectionOptions, ConfigSource), ConfigError> {
        let (path, resolution) = self.resolve_path();

        let Some(path) = path else {
            debug!("No collection config found; using defaults");
            return Ok((
                CollectionOptions::default(),
                ConfigSource {
                    path: None,
                    resolution: ConfigResolution::Default,
                },
            ));
        };

        let options = load_file(&path)?;
        debug!(path = %path.display(), ?resolution, "Loaded collection config");

        Ok((
            options,
            ConfigSource {
                path: Some(path.display().to_string()),
                resolution,
            },
        ))
    }
}

fn load_file(path: &Path) -> Result<CollectionOptions, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let options = CollectionOptions::from_json(&content).map_err(|source| ConfigError::Invalid {
        path: path.to_path_buf(),
        source,
    })?;

    // Surface bad patterns and limits at load time, not mid-collection.
    options.to_spec().map_err(|source| ConfigError::Invalid {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(options)
}

/// Per-field CLI overrides applied on top of loaded options.
#[derive(Debug, Clone, Default)]
pub struct OptionOverrides {
    pub include: Option<String>,
    pub exclude: Option<String>,
    pub case_insensitive: bool,
    pub max_depth: Option<usize>,
    pub max_file_size: Option<u64>,
    pub suffix: Option<String>,
}

impl OptionOverrides {
    pub fn apply(&self, mut options: CollectionOptions) -> CollectionOptions {
        if let Some(ref include) = self.include {
            options.include = include.clone();
        }
        if let Some(ref exclude) = self.exclude {
            options.exclude = exclude.clone();
        }
        if self.case_insensitive {
            options.case_sensitive = false;
        }
        if let Some(max_depth) = self.max_depth {
            options.max_depth = max_depth;
        }
        if let Some(max_file_size) = self.max_file_size {
            options.max_file_size = max_file_size;
        }
        if let Some(ref suffix) = self.suffix {
            options.allowed_suffix = Some(suffix.clone());
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &Path, json: &str) -> PathBuf {
        let path = dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn test_defaults_when_nothing_configured() {
        let temp = TempDir::new().unwrap();
        let resolver = ConfigResolver::new(
            None,
            ConfigEnv {
                user_config_dir: Some(temp.path().to_path_buf()),
                ..Default::default()
            },
        );
        let (options, source) = resolver.load().unwrap();
        assert_eq!(options, CollectionOptions::default());
        assert_eq!(source.resolution, ConfigResolution::Default);
        assert!(source.path.is_none());
    }

    #[test]
    fn test_resolution_order() {
        let temp = TempDir::new().unwrap();
        let xdg = temp.path().join("xdg");
        let user = temp.path().join("user");
        write_config(&xdg, r#"{"exclude": "xdg/**"}"#);
        write_config(&user, r#"{"exclude": "user/**"}"#);
        let explicit = temp.path().join("explicit.json");
        fs::write(&explicit, r#"{"exclude": "explicit/**"}"#).unwrap();
        let from_env = temp.path().join("env.json");
        fs::write(&from_env, r#"{"exclude": "env/**"}"#).unwrap();

        let env = ConfigEnv {
            config_file: Some(from_env.clone()),
            xdg_config_home: Some(xdg.clone()),
            user_config_dir: Some(user.clone()),
        };

        let (options, source) = ConfigResolver::new(Some(explicit), env.clone()).load().unwrap();
        assert_eq!(options.exclude, "explicit/**");
        assert_eq!(source.resolution, ConfigResolution::CliFlag);

        let (options, source) = ConfigResolver::new(None, env.clone()).load().unwrap();
        assert_eq!(options.exclude, "env/**");
        assert_eq!(source.resolution, ConfigResolution::EnvVar);

        let env = ConfigEnv {
            config_file: None,
            ..env
        };
        let (options, source) = ConfigResolver::new(None, env.clone()).load().unwrap();
        assert_eq!(options.exclude, "xdg/**");
        assert_eq!(source.resolution, ConfigResolution::XdgConfig);

        let env = ConfigEnv {
            xdg_config_home: Some(temp.path().join("empty-xdg")),
            ..env
        };
        let (options, source) = ConfigResolver::new(None, env).load().unwrap();
        assert_eq!(options.exclude, "user/**");
        assert_eq!(source.resolution, ConfigResolution::UserConfig);
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let temp = TempDir::new().unwrap();
        let resolver = ConfigResolver::new(Some(temp.path().join("nope.json")), ConfigEnv::default());
        assert!(matches!(resolver.load(), Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_invalid_config_rejected_at_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.json");

        fs::write(&path, r#"{"max_depth": 0}"#).unwrap();
        let resolver = ConfigResolver::new(Some(path.clone()), ConfigEnv::default());
        assert!(matches!(resolver.load(), Err(ConfigError::Invalid { .. })));

        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(resolver.load(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_overrides_apply_per_field() {
        let base = CollectionOptions {
            include: "**/*.xml".to_string(),
            exclude: "workflow/**".to_string(),
            ..Default::default()
        };
        let overrides = OptionOverrides {
            exclude: Some(String::new()),
            case_insensitive: true,
            max_depth: Some(2),
            ..Default::default()
        };

        let options = overrides.apply(base);
        assert_eq!(options.include, "**/*.xml");
        assert_eq!(options.exclude, "");
        assert!(!options.case_sensitive);
        assert_eq!(options.max_depth, 2);
        assert_eq!(options.max_file_size, sb_collect::DEFAULT_MAX_FILE_SIZE);
    }
}
