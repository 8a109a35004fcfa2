//! The remote spreadsheet collaborator.
//!
//! Everything tosheets does to a spreadsheet goes through the `Sheet` trait. `GoogleSheet` talks
//! to the Google Sheets API; `TestSheet` keeps everything in memory and records each call.

mod files;
mod google;
mod oauth;
mod sheet_test_client;

use crate::address::GridCell;
use crate::cell::Row;
use crate::error::{ErrorType, IntoResult, Res};
use crate::{Config, Result};
use tracing::debug;

pub(crate) use oauth::TokenProvider;
pub use sheet_test_client::{Call, TestSheet};

// OAuth scopes required for Sheets API access.
const OAUTH_SCOPES: &[&str] = &["https://www.googleapis.com/auth/spreadsheets"];

/// When this environment variable is set and non-empty, tosheets uses `TestSheet` instead of
/// Google Sheets.
pub const TEST_MODE_ENV: &str = "TOSHEETS_IN_TEST_MODE";

/// One method per remote operation. Every method returns a result; nothing here prints or exits.
#[async_trait::async_trait]
pub trait Sheet {
    /// Creates a new spreadsheet titled `title` and returns its ID.
    async fn create_spreadsheet(&mut self, title: &str) -> Res<String>;

    /// Adds a sheet (tab) titled `title`.
    async fn add_sheet(&mut self, spreadsheet_id: &str, title: &str) -> Res<()>;

    /// Deletes the sheet with the numeric `sheet_id`.
    async fn delete_sheet(&mut self, spreadsheet_id: &str, sheet_id: i64) -> Res<()>;

    /// Looks up the numeric ID of the sheet titled `title`, or of the first sheet when `title` is
    /// `None`.
    async fn sheet_id(&mut self, spreadsheet_id: &str, title: Option<&str>) -> Res<i64>;

    /// Appends `rows` after the table found at `range`.
    async fn append(&mut self, spreadsheet_id: &str, range: &str, rows: &[Row]) -> Res<()>;

    /// Overwrites the cells starting at `range` with `rows`.
    async fn update(&mut self, spreadsheet_id: &str, range: &str, rows: &[Row]) -> Res<()>;

    /// Clears the values in `range`.
    async fn clear(&mut self, spreadsheet_id: &str, range: &str) -> Res<()>;

    /// Sets the note of a single cell.
    async fn insert_note(
        &mut self,
        spreadsheet_id: &str,
        sheet_id: i64,
        cell: GridCell,
        note: &str,
    ) -> Res<()>;

    /// Returns the formatted values in `range`, row by row.
    async fn get(&mut self, spreadsheet_id: &str, range: &str) -> Res<Vec<Vec<String>>>;
}

/// Whether tosheets talks to Google or to the in-memory `TestSheet`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Google,
    Test,
}

impl Mode {
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(v) if !v.is_empty() => Mode::Test,
            _ => Mode::Google,
        }
    }
}

/// Creates the `Sheet` for `mode`. In `Mode::Google` this loads (or, on first use, obtains) the
/// OAuth token, so credentials are resolved exactly once per process.
pub async fn sheet(config: &Config, mode: Mode) -> Result<Box<dyn Sheet + Send>> {
    debug!("Creating the {mode:?} sheet client");
    match mode {
        Mode::Test => Ok(Box::new(TestSheet::default())),
        Mode::Google => {
            let secret = config.client_secret_path();
            if !secret.is_file() {
                return Err(crate::Error::config(format!(
                    "The OAuth client secret file is missing: {}. Download the OAuth client \
                    credentials for a Desktop app from the Google Cloud Console and save them \
                    there, or pass --client-secret.",
                    secret.display()
                )));
            }
            let token_provider = TokenProvider::load_or_initialize(&secret, &config.token_path())
                .await
                .pub_result(ErrorType::Remote)?;
            let client = google::GoogleSheet::new(token_provider)
                .await
                .pub_result(ErrorType::Remote)?;
            Ok(Box::new(client))
        }
    }
}
