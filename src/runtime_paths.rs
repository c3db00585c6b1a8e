use directories::ProjectDirs;
use once_cell::sync::Lazy;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

const APP_NAME: &str = "kreat";

static APP_ROOT_OVERRIDE: Lazy<RwLock<Option<PathBuf>>> = Lazy::new(|| RwLock::new(None));

/// Points the data directory somewhere else (tests, portable installs).
pub fn set_app_root_override(path: Option<PathBuf>) {
    *APP_ROOT_OVERRIDE
        .write()
        .unwrap_or_else(PoisonError::into_inner) = path;
}

/// `$XDG_DATA_HOME/kreat` or the platform equivalent; the temp dir when the
/// home directory cannot be resolved.
pub fn app_root() -> PathBuf {
    if let Some(root) = APP_ROOT_OVERRIDE
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
    {
        return root;
    }
    ProjectDirs::from("ai", APP_NAME, APP_NAME)
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join(APP_NAME))
}

pub fn default_config_path() -> String {
    app_root().join("config.json").display().to_string()
}

pub fn secrets_dir() -> PathBuf {
    app_root().join("secrets")
}
