//! These structs provide the CLI interface for tosheets.

use clap::Parser;
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// tosheets: send stdin to your Google Sheets.
///
/// Reads delimited text from stdin (or a file given with -i) and appends it to a spreadsheet
/// starting at the cell given with -c. Numbers are sent as numbers unless -k is given. With -x the
/// direction is reversed and the range is printed as CSV.
///
/// --new-sheet creates a spreadsheet to work on. Otherwise the spreadsheet is taken from
/// --spreadsheet, or else the TOSHEETS_SPREADSHEET environment variable. The sheet is taken from
/// -s, or else the TOSHEETS_SHEET environment variable, or else the first visible sheet is used.
///
/// The first run opens a browser to authorize access to Google Sheets. Put the OAuth client
/// credentials of a Google Cloud "Desktop app" in $TOSHEETS_HOME/client_secret.json first.
#[derive(Debug, Parser, Clone)]
#[command(name = "tosheets", version)]
pub struct Args {
    /// Start appending (or updating, exporting, wiping, annotating) at CELL, e.g. A1 or A1:C10.
    #[arg(short = 'c', value_name = "CELL")]
    cell: Option<String>,

    /// Update CELL(s) instead of appending.
    #[arg(short = 'u')]
    update: bool,

    /// Keep fields as they are (do not try to convert to int or float).
    #[arg(short = 'k')]
    keep: bool,

    /// Export instead of import: print the range as CSV.
    #[arg(short = 'x')]
    export: bool,

    /// Add a new sheet named by -s (or TOSHEETS_SHEET).
    #[arg(short = 'a')]
    add_sheet: bool,

    /// Remove the sheet named by -s (or TOSHEETS_SHEET).
    #[arg(short = 'r')]
    remove_sheet: bool,

    /// Wipe the values in CELL(s).
    #[arg(short = 'w')]
    wipe: bool,

    /// Insert NOTE on CELL.
    #[arg(short = 'n', value_name = "NOTE")]
    note: Option<String>,

    /// Use sheet name SHEET, otherwise TOSHEETS_SHEET, otherwise the first visible sheet.
    #[arg(short = 's', value_name = "SHEET")]
    sheet: Option<String>,

    /// The spreadsheet ID or URL (docs.google.com/spreadsheets/d/<spreadsheetId>/...). Defaults to
    /// the TOSHEETS_SPREADSHEET environment variable.
    #[arg(long, value_name = "SPREADSHEET")]
    spreadsheet: Option<String>,

    /// Create a new spreadsheet with the chosen name and print its ID so it can be piped/stored.
    /// Takes precedence over --spreadsheet.
    #[arg(long, value_name = "NAME")]
    new_sheet: Option<String>,

    /// The character that separates fields.
    #[arg(short = 'd', value_name = "DELIMITER", default_value_t = ' ')]
    delimiter: char,

    /// The character used to quote fields containing the delimiter, the quote character or
    /// newlines.
    #[arg(short = 'q', value_name = "QUOTE_CHAR", default_value_t = '"')]
    quote: char,

    /// Read this file instead of stdin.
    #[arg(short = 'i', value_name = "CSV")]
    input: Option<PathBuf>,

    /// Open a browser with the spreadsheet when done.
    #[arg(long)]
    open: bool,

    #[clap(flatten)]
    common: Common,
}

impl Args {
    pub fn cell(&self) -> Option<&str> {
        self.cell.as_deref()
    }

    pub fn update(&self) -> bool {
        self.update
    }

    pub fn keep(&self) -> bool {
        self.keep
    }

    pub fn export(&self) -> bool {
        self.export
    }

    pub fn add_sheet(&self) -> bool {
        self.add_sheet
    }

    pub fn remove_sheet(&self) -> bool {
        self.remove_sheet
    }

    pub fn wipe(&self) -> bool {
        self.wipe
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn sheet(&self) -> Option<&str> {
        self.sheet.as_deref()
    }

    pub fn spreadsheet(&self) -> Option<&str> {
        self.spreadsheet.as_deref()
    }

    pub fn new_sheet(&self) -> Option<&str> {
        self.new_sheet.as_deref()
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    pub fn quote(&self) -> char {
        self.quote
    }

    pub fn input(&self) -> Option<&Path> {
        self.input.as_deref()
    }

    pub fn open(&self) -> bool {
        self.open
    }

    pub fn common(&self) -> &Common {
        &self.common
    }
}

/// Logging and credential options.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where OAuth credentials are kept. Defaults to ~/.tosheets
    #[arg(long, env = "TOSHEETS_HOME", default_value_t = default_tosheets_home())]
    home: DisplayPath,

    /// The OAuth client secret JSON file. Defaults to $TOSHEETS_HOME/client_secret.json
    #[arg(long, env = "TOSHEETS_CLIENT_SECRET")]
    client_secret: Option<PathBuf>,
}

impl Common {
    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn home(&self) -> &DisplayPath {
        &self.home
    }

    pub fn client_secret(&self) -> Option<&Path> {
        self.client_secret.as_deref()
    }
}

fn default_tosheets_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join(".tosheets"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --home or TOSHEETS_HOME instead of relying on the default \
                tosheets home directory.",
            );
            PathBuf::from(".tosheets")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}
