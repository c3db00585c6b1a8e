use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use std::path::PathBuf;

use crate::error::{KreatError, Result};

pub const AZURE_OPENAI_API_KEY: &str = "AZURE_OPENAI_API_KEY";
pub const AZURE_OPENAI_API_VERSION: &str = "AZURE_OPENAI_API_VERSION";
pub const AZURE_OPENAI_CHAT_DEPLOYMENT_NAME: &str = "AZURE_OPENAI_CHAT_DEPLOYMENT_NAME";
pub const AZURE_OPENAI_ENDPOINT: &str = "AZURE_OPENAI_ENDPOINT";
pub const EXA_API_KEY: &str = "EXA_API_KEY";

/// Named secrets: the process environment wins, then one file per secret
/// under the app data directory.
#[derive(Debug, Clone)]
pub struct SecretStore {
    root: PathBuf,
    read_env: bool,
}

impl Default for SecretStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretStore {
    pub fn new() -> Self {
        Self::at(crate::runtime_paths::secrets_dir())
    }

    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            read_env: true,
        }
    }

    pub fn without_env(mut self) -> Self {
        self.read_env = false;
        self
    }

    fn secret_file(&self, name: &str) -> PathBuf {
        self.root.join(URL_SAFE_NO_PAD.encode(name.as_bytes()))
    }

    fn env_secret(&self, name: &str) -> Option<String> {
        if !self.read_env {
            return None;
        }
        std::env::var(name).ok().and_then(|value| {
            let trimmed = value.trim().to_string();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        })
    }

    pub fn get(&self, name: &str) -> Result<Option<String>> {
        if let Some(value) = self.env_secret(name) {
            return Ok(Some(value));
        }

        let path = self.secret_file(name);
        match std::fs::read_to_string(&path) {
            Ok(raw) => {
                let trimmed = raw.trim().to_string();
                Ok(if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed)
                })
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(KreatError::Config(format!("failed to read secret {name}: {err}"))),
        }
    }

    pub fn set(&self, name: &str, value: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(KreatError::Input("secret name cannot be empty".to_string()));
        }
        std::fs::create_dir_all(&self.root)?;
        let path = self.secret_file(name);
        std::fs::write(&path, value.trim())?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        match std::fs::remove_file(self.secret_file(name)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_secrets_round_trip_and_blank_values_are_absent() {
        let temp = tempfile::tempdir().expect("temp dir");
        let store = SecretStore::at(temp.path()).without_env();

        assert_eq!(store.get("EXA_API_KEY").unwrap(), None);
        store.set("EXA_API_KEY", "  exa-123\n").unwrap();
        assert_eq!(store.get("EXA_API_KEY").unwrap(), Some("exa-123".to_string()));

        store.set("EXA_API_KEY", "   ").unwrap();
        assert_eq!(store.get("EXA_API_KEY").unwrap(), None);

        store.delete("EXA_API_KEY").unwrap();
        store.delete("EXA_API_KEY").unwrap();
    }

    #[test]
    fn environment_wins_over_file() {
        let temp = tempfile::tempdir().expect("temp dir");
        let name = "KREAT_SECRETS_TEST_ENV_WINS";
        let store = SecretStore::at(temp.path());
        store.set(name, "from-file").unwrap();

        std::env::set_var(name, "from-env");
        assert_eq!(store.get(name).unwrap(), Some("from-env".to_string()));
        std::env::remove_var(name);

        assert_eq!(store.get(name).unwrap(), Some("from-file".to_string()));
    }

    #[test]
    fn rejects_empty_names() {
        let temp = tempfile::tempdir().expect("temp dir");
        let err = SecretStore::at(temp.path()).set(" ", "v").unwrap_err();
        assert!(matches!(err, KreatError::Input(_)));
    }
}
