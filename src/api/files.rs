//! Serialization and deserialization structures for Google OAuth credential files.
//! - `client_secret.json`: OAuth 2.0 client credentials from Google Cloud Console
//! - `token.json`: the access and refresh tokens obtained from the consent flow

use crate::api::OAUTH_SCOPES;
use crate::error::Res;
use crate::utils;
use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use serde::de::{DeserializeOwned, Error};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// This redirect needs to be present in the OAuth credential file, or else OAuth will not work.
const REDIRECT: &str = "http://localhost";

/// Holds the `path` and the `data` of a JSON file so that it can be saved back to where it came
/// from.
#[derive(Default, Debug, Clone)]
pub(super) struct File<F>
where
    F: Serialize + DeserializeOwned + Clone + Debug,
{
    path: PathBuf,
    data: F,
}

impl<F> File<F>
where
    F: Serialize + DeserializeOwned + Clone + Debug,
{
    /// Load data from a file and create a File instance
    pub(super) async fn load(path: impl Into<PathBuf>) -> Res<Self> {
        let path = path.into();
        let data: F = utils::deserialize(&path).await?;
        Ok(Self { path, data })
    }

    /// Create a File instance with the given path and data
    pub(super) fn new(path: impl Into<PathBuf>, data: F) -> Self {
        Self {
            path: path.into(),
            data,
        }
    }

    /// Save the current data to the file with owner-only permissions.
    pub(super) async fn save(&self) -> Res<()> {
        let json =
            serde_json::to_string_pretty(&self.data).context("Failed to serialize data to JSON")?;
        utils::write(&self.path, json).await?;

        #[cfg(unix)]
        {
            use std::fs::Permissions;
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, Permissions::from_mode(0o600))
                .context("Failed to set file permissions")?;
        }

        Ok(())
    }

    pub(super) fn data(&self) -> &F {
        &self.data
    }

    pub(super) fn data_mut(&mut self) -> &mut F {
        &mut self.data
    }

    pub(super) fn path(&self) -> &Path {
        &self.path
    }
}

/// Represents the structure of the `client_secret.json` file downloaded from Google Cloud Console.
///
/// This file contains OAuth 2.0 Desktop Application credentials. The standard format from Google
/// has an "installed" wrapper around the actual credentials.
///
/// Example:
/// ```json
/// {
///   "installed": {
///     "client_id": "YOUR_CLIENT_ID.apps.googleusercontent.com",
///     "client_secret": "YOUR_CLIENT_SECRET",
///     "redirect_uris": ["http://localhost"],
///     "auth_uri": "https://accounts.google.com/o/oauth2/auth",
///     "token_uri": "https://oauth2.googleapis.com/token"
///   }
/// }
/// ```
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) struct SecretFile {
    installed: InstalledCredentials,
}

impl SecretFile {
    /// Loads the OAuth client credentials from `client_secret.json`.
    pub(crate) async fn load(path: &Path) -> Res<SecretFile> {
        utils::deserialize(path)
            .await
            .context("Unable to read the OAuth client secret file")
    }

    pub(super) fn client_id(&self) -> &str {
        &self.installed.client_id
    }

    pub(super) fn client_secret(&self) -> &str {
        &self.installed.client_secret
    }

    pub(super) fn auth_uri(&self) -> &str {
        &self.installed.auth_uri
    }

    pub(super) fn token_uri(&self) -> &str {
        &self.installed.token_uri
    }

    /// The loopback host used for the consent flow redirect, without a port.
    pub(super) fn redirect_host(&self) -> &str {
        self.installed.redirect_uris.value()
    }
}

/// The actual OAuth credentials nested within the `client_secret.json` file.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) struct InstalledCredentials {
    client_id: String,
    client_secret: String,

    /// Should contain "http://localhost" or "http://127.0.0.1" (without a port number)
    redirect_uris: RedirectUris,

    auth_uri: String,
    token_uri: String,
}

#[derive(Default, Debug, Clone)]
struct RedirectUris(Vec<String>);

impl RedirectUris {
    fn value(&self) -> &str {
        self.0
            .iter()
            .find(|s| is_valid_redirect(s))
            .map(String::as_str)
            .unwrap_or(REDIRECT)
    }
}

impl Serialize for RedirectUris {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RedirectUris {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let vec = Vec::<String>::deserialize(deserializer)?;
        if !vec.iter().any(|s| is_valid_redirect(s)) {
            return Err(D::Error::custom(format!(
                "At least one of the redirects needs to be {REDIRECT}, but this was not found. \
                When creating the OAuth client for tosheets, you must include '{REDIRECT}'"
            )));
        }
        Ok(RedirectUris(vec))
    }
}

fn is_valid_redirect(s: &str) -> bool {
    s == REDIRECT || s == "http://127.0.0.1"
}

/// How we save the token information that we receive from Google OAuth.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(super) struct TokenFile {
    scopes: Vec<String>,
    access_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
    id_token: Option<String>,
}

impl TokenFile {
    pub(super) async fn load(p: impl AsRef<Path>) -> Res<File<Self>> {
        let file: File<Self> = File::load(p.as_ref())
            .await
            .context("Unable to deserialize the token JSON file")?;
        file.data().validate_scopes()?;
        Ok(file)
    }

    fn validate_scopes(&self) -> Res<()> {
        let found_scopes: HashSet<&str> = self.scopes.iter().map(|s| s.as_str()).collect();
        for &required_scope in OAUTH_SCOPES {
            if !found_scopes.contains(required_scope) {
                bail!("OAuth scope '{required_scope}' is missing.");
            }
        }
        Ok(())
    }

    pub(super) fn new(
        scopes: Vec<String>,
        access_token: String,
        refresh_token: String,
        expires_at: DateTime<Utc>,
        id_token: Option<String>,
    ) -> Self {
        Self {
            scopes,
            access_token,
            refresh_token,
            expires_at,
            id_token,
        }
    }

    pub(super) fn access_token(&self) -> &str {
        &self.access_token
    }

    pub(super) fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    pub(super) fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Check if the token is expired or will expire soon (within 5 minutes)
    pub(super) fn is_expired(&self) -> bool {
        let now = Utc::now();
        let buffer = chrono::Duration::minutes(5);
        self.expires_at <= now + buffer
    }

    /// Update the token with new values
    pub(super) fn update(
        &mut self,
        access_token: String,
        expires_at: DateTime<Utc>,
        refresh_token: Option<String>,
    ) {
        self.access_token = access_token;
        self.expires_at = expires_at;
        if let Some(rt) = refresh_token {
            self.refresh_token = rt;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SECRET_JSON: &str = r#"
{
    "installed": {
        "client_id": "YOUR_CLIENT_ID.apps.googleusercontent.com",
        "client_secret": "YOUR_CLIENT_SECRET",
        "redirect_uris": ["http://127.0.0.1", "https://example.com:4040/whatever"],
        "auth_uri": "https://accounts.google.com/o/oauth2/auth",
        "token_uri": "https://oauth2.googleapis.com/token"
    }
}
"#;

    #[tokio::test]
    async fn test_client_secret_good_redirect() {
        let temp_dir = TempDir::new().unwrap();
        let p = temp_dir.path().join("file.json");
        utils::write(&p, SECRET_JSON).await.unwrap();
        let secret_file = SecretFile::load(&p).await.unwrap();
        assert_eq!("http://127.0.0.1", secret_file.redirect_host());
        assert_eq!(
            "YOUR_CLIENT_ID.apps.googleusercontent.com",
            secret_file.client_id()
        );
        assert_eq!("YOUR_CLIENT_SECRET", secret_file.client_secret());
        assert_eq!(
            "https://accounts.google.com/o/oauth2/auth",
            secret_file.auth_uri()
        );
        assert_eq!("https://oauth2.googleapis.com/token", secret_file.token_uri());
    }

    #[tokio::test]
    async fn test_client_secret_bad_redirect() {
        let json_data = SECRET_JSON.replace("http://127.0.0.1", "http://localhost:9900");
        let temp_dir = TempDir::new().unwrap();
        let p = temp_dir.path().join("file.json");
        utils::write(&p, json_data).await.unwrap();
        let parse_result = SecretFile::load(&p).await;
        assert!(parse_result.is_err());
        let parse_error_message = format!("{:?}", parse_result.err().unwrap());
        assert!(
            parse_error_message.contains("At least one of the redirects needs to be http://localhost")
        );
    }

    #[tokio::test]
    async fn test_validate_token_file_missing_scope() {
        let json = r##"
        {
            "scopes": ["https://www.googleapis.com/auth/drive.readonly"],
            "access_token":"abc12",
            "refresh_token":"xyz89",
            "expires_at":"2025-01-01T00:00:00Z",
            "id_token":null
        }
        "##;
        let tmp = TempDir::new().unwrap();
        let json_path = tmp.path().join("token.json");
        utils::write(&json_path, json).await.unwrap();

        let error_message = TokenFile::load(&json_path).await.unwrap_err().to_string();
        assert!(error_message.contains("https://www.googleapis.com/auth/spreadsheets"));
    }

    #[tokio::test]
    async fn test_token_file_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let json_path = tmp.path().join("token.json");
        let expires_at = Utc::now() + chrono::Duration::hours(1);
        let token = TokenFile::new(
            OAUTH_SCOPES.iter().map(|s| s.to_string()).collect(),
            "abc12".to_string(),
            "xyz89".to_string(),
            expires_at,
            None,
        );
        File::new(&json_path, token).save().await.unwrap();

        let mut loaded = TokenFile::load(&json_path).await.unwrap();
        assert_eq!(loaded.path(), json_path.as_path());
        assert_eq!(loaded.data().access_token(), "abc12");
        assert_eq!(loaded.data().refresh_token(), "xyz89");
        assert!(!loaded.data().is_expired());

        loaded
            .data_mut()
            .update("new-access".to_string(), Utc::now(), None);
        assert_eq!(loaded.data().access_token(), "new-access");
        assert_eq!(loaded.data().refresh_token(), "xyz89");
        assert!(loaded.data().is_expired());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&json_path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }
}
