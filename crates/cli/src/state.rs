use std::{fs, path::PathBuf, sync::Arc};

use serde::{Deserialize, Serialize};
use store::{BlobEngine, EngineConfig, LocalFilestore, S3Settings, TargetFactory};

pub const APP_NAME: &str = "stash";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const FILESTORE_DIR_NAME: &str = "filestore";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Storage location: `s3://<access_id>:<secret>@<bucket>`, or anything
    /// else (conventionally `file`) for the local filestore
    #[serde(default = "default_location")]
    pub location: String,
    /// Catalog/database identifier prefixed to every key
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Base directory of the local filestore (defaults to stash_dir/filestore)
    #[serde(default)]
    pub filestore_path: Option<PathBuf>,
    /// Serve remote misses from the local filestore
    #[serde(default = "default_legacy_fallback")]
    pub legacy_fallback: bool,
    /// S3 endpoint settings
    #[serde(default)]
    pub s3: S3Settings,
}

fn default_location() -> String {
    "file".to_string()
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_legacy_fallback() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            location: default_location(),
            namespace: default_namespace(),
            filestore_path: None,
            legacy_fallback: default_legacy_fallback(),
            s3: S3Settings::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the stash directory (~/.stash)
    pub stash_dir: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Base directory of the local filestore
    pub filestore_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the stash directory path (custom or default ~/.stash)
    pub fn stash_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new stash directory with the given (or default) config
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let stash_dir = Self::stash_dir(custom_path)?;
        let config_path = stash_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&stash_dir)?;

        let config = config.unwrap_or_default();
        let filestore_path = Self::resolve_filestore(&stash_dir, &config);
        fs::create_dir_all(&filestore_path)?;

        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        Ok(Self {
            stash_dir,
            config_path,
            filestore_path,
            config,
        })
    }

    /// Load existing state from the stash directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let stash_dir = Self::stash_dir(custom_path)?;
        let config_path = stash_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Err(StateError::NotInitialized(stash_dir));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;
        let filestore_path = Self::resolve_filestore(&stash_dir, &config);

        Ok(Self {
            stash_dir,
            config_path,
            filestore_path,
            config,
        })
    }

    fn resolve_filestore(stash_dir: &std::path::Path, config: &AppConfig) -> PathBuf {
        config
            .filestore_path
            .clone()
            .unwrap_or_else(|| stash_dir.join(FILESTORE_DIR_NAME))
    }

    pub fn factory(&self) -> TargetFactory {
        TargetFactory::s3(self.config.s3.clone())
    }

    pub fn filestore(&self) -> LocalFilestore {
        LocalFilestore::new(&self.filestore_path, &self.config.namespace)
    }

    /// Engine wired to the configured location, namespace and filestore.
    pub fn engine(&self) -> BlobEngine {
        let config = EngineConfig::new(self.config.namespace.clone())
            .with_legacy_fallback(self.config.legacy_fallback);
        BlobEngine::new(
            config,
            Arc::new(self.config.location.clone()),
            self.factory(),
            Arc::new(self.filestore()),
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("stash directory already initialized")]
    AlreadyInitialized,

    #[error("stash directory not initialized at {0}, run `stash init` first")]
    NotInitialized(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to write config: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("failed to read config: {0}")]
    TomlDe(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_then_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().join("stash");

        let config = AppConfig {
            location: "s3://AKIA123:secret@mybucket".to_string(),
            namespace: "db1".to_string(),
            ..Default::default()
        };
        let state = AppState::init(Some(dir.clone()), Some(config.clone())).unwrap();
        assert!(state.config_path.exists());
        assert!(state.filestore_path.exists());

        let loaded = AppState::load(Some(dir.clone())).unwrap();
        assert_eq!(loaded.config, config);
        assert_eq!(loaded.filestore_path, dir.join(FILESTORE_DIR_NAME));

        assert!(matches!(
            AppState::init(Some(dir), None),
            Err(StateError::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_load_uninitialized() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            AppState::load(Some(temp_dir.path().join("missing"))),
            Err(StateError::NotInitialized(_))
        ));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            location = "s3://id:secret@bucket"

            [s3]
            host = "http://localhost:9000"
            "#,
        )
        .unwrap();
        assert_eq!(config.namespace, "default");
        assert!(config.legacy_fallback);
        assert_eq!(config.s3.endpoint(), "http://localhost:9000");
        assert_eq!(config.s3.region(), "us-east-1");
    }
}
