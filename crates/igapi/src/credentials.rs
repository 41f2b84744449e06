//! Credential storage.
//!
//! Credentials are kept as `{"username": ..., "password": ...}` JSON in the
//! user config directory. The file is owner-only on Unix.

use crate::error::{IgError, Result};
use crate::session::Credentials;
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Source of credentials for [`crate::IgClient::login_from_store`].
#[async_trait]
pub trait CredentialStore: Send + Sync + fmt::Debug {
    async fn load(&self) -> Result<Credentials>;

    async fn save(&self, credentials: &Credentials) -> Result<()>;

    /// Forget stored credentials. Erasing an empty store is not an error.
    async fn erase(&self) -> Result<()>;
}

/// JSON file credential store.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/igapi/credentials.json`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("igapi")
            .join("credentials.json")
    }

    pub fn with_default_path() -> Self {
        Self::new(Self::default_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<Credentials> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(IgError::Credentials(format!(
                    "no credentials at {}",
                    self.path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };
        let credentials: Credentials = serde_json::from_str(&contents).map_err(|e| {
            IgError::Credentials(format!("{} is not valid: {e}", self.path.display()))
        })?;
        if credentials.username.is_empty() || credentials.password.expose_secret().is_empty() {
            return Err(IgError::Credentials(format!(
                "{} has an empty username or password",
                self.path.display()
            )));
        }
        Ok(credentials)
    }

    async fn save(&self, credentials: &Credentials) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_vec_pretty(credentials)?;

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        // Owner-only from creation, so the password never sits under umask bits.
        #[cfg(unix)]
        options.mode(0o600);
        let mut file = options.open(&self.path).await?;

        // `mode` only applies to new files; tighten one left by an older run.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .await?;
        }

        file.write_all(&contents).await?;
        file.flush().await?;

        #[cfg(windows)]
        {
            tracing::warn!(
                "credentials stored without permission hardening on Windows"
            );
        }

        Ok(())
    }

    async fn erase(&self) -> Result<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
