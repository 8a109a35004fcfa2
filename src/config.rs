//! Configuration for tosheets.
//!
//! The home directory, `$TOSHEETS_HOME` (default `~/.tosheets`), holds the OAuth credentials:
//! `client_secret.json`, downloaded from the Google Cloud Console, and `token.json`, written by
//! the consent flow. The client secret may live elsewhere if `--client-secret` is given.

use crate::error::{ErrorType, IntoResult};
use crate::{utils, Result};
use anyhow::Context;
use std::path::{Path, PathBuf};

const CLIENT_SECRET_JSON: &str = "client_secret.json";
const TOKEN_JSON: &str = "token.json";

/// Resolved paths of the credential files.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Config {
    root: PathBuf,
    client_secret_path: PathBuf,
    token_path: PathBuf,
}

impl Config {
    /// Creates the `home` directory if it does not exist and canonicalizes it. A relative
    /// `client_secret` is resolved against the current directory, not against `home`.
    pub async fn load(home: impl Into<PathBuf>, client_secret: Option<&Path>) -> Result<Self> {
        let maybe_relative = home.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the tosheets home directory")
            .pub_result(ErrorType::Config)?;
        let root = utils::canonicalize(&maybe_relative)
            .await
            .pub_result(ErrorType::Config)?;

        let client_secret_path = match client_secret {
            Some(p) => p.to_path_buf(),
            None => root.join(CLIENT_SECRET_JSON),
        };
        Ok(Self {
            token_path: root.join(TOKEN_JSON),
            client_secret_path,
            root,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn client_secret_path(&self) -> PathBuf {
        self.client_secret_path.clone()
    }

    pub fn token_path(&self) -> PathBuf {
        self.token_path.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_creates_home() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("nested").join(".tosheets");
        let config = Config::load(&home, None).await.unwrap();
        assert!(config.root().is_dir());
        assert_eq!(
            config.client_secret_path(),
            config.root().join(CLIENT_SECRET_JSON)
        );
        assert_eq!(config.token_path(), config.root().join(TOKEN_JSON));
    }

    #[tokio::test]
    async fn test_config_custom_client_secret() {
        let dir = TempDir::new().unwrap();
        let secret = dir.path().join("elsewhere.json");
        let config = Config::load(dir.path(), Some(secret.as_path())).await.unwrap();
        assert_eq!(config.client_secret_path(), secret);
        assert!(config.token_path().starts_with(config.root()));
    }

    #[tokio::test]
    async fn test_config_home_is_a_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file");
        utils::write(&file, "x").await.unwrap();
        let err = Config::load(&file, None).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
    }
}
