//! Spreadsheet identifiers and A1 range addresses.

use serde::Serialize;
use std::fmt::{Display, Formatter};

const URL_HOST_PATH: &str = "docs.google.com/spreadsheets/d/";

/// Returns the bare spreadsheet ID when `s` is a Google Sheets URL, otherwise returns `s` unchanged.
///
/// The URL must start with `http://` or `https://` followed by
/// `docs.google.com/spreadsheets/d/<ID>`. The ID runs until the next `/`, `?` or `#`.
///
/// ```
/// use tosheets::canonicalize_spreadsheet_id;
/// let url = "https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82/edit#gid=0";
/// assert_eq!(canonicalize_spreadsheet_id(url), "1a7Km9FxQwRbPt82");
/// assert_eq!(canonicalize_spreadsheet_id("1a7Km9FxQwRbPt82"), "1a7Km9FxQwRbPt82");
/// ```
pub fn canonicalize_spreadsheet_id(s: &str) -> &str {
    let Some(rest) = s
        .strip_prefix("https://")
        .or_else(|| s.strip_prefix("http://"))
    else {
        return s;
    };
    let Some(rest) = rest.strip_prefix(URL_HOST_PATH) else {
        return s;
    };
    let id = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if id.is_empty() {
        s
    } else {
        id
    }
}

/// The URL used to open a spreadsheet in the browser.
pub fn edit_url(spreadsheet_id: &str) -> String {
    format!("https://docs.google.com/spreadsheets/d/{spreadsheet_id}/edit#gid=0")
}

/// Picks the sheet name: the explicit one if given, else the environment default. Empty strings
/// are treated as absent.
pub fn sheet_name<'a>(explicit: Option<&'a str>, default: Option<&'a str>) -> Option<&'a str> {
    explicit
        .filter(|s| !s.is_empty())
        .or(default.filter(|s| !s.is_empty()))
}

/// A range in A1 notation, optionally prefixed with `SheetName!`, e.g. `Data!A1:C10`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RangeAddress(String);

impl RangeAddress {
    /// Builds the address from the explicit sheet name, the environment default and the cell or
    /// range token. Without either sheet name the address is just the token, which targets the
    /// first visible sheet.
    pub fn resolve(explicit: Option<&str>, default: Option<&str>, cell: &str) -> Self {
        match sheet_name(explicit, default) {
            Some(sheet) => Self(format!("{sheet}!{cell}")),
            None => Self(cell.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RangeAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RangeAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A zero-based cell position within a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct GridCell {
    pub row: u32,
    pub column: u32,
}

impl GridCell {
    /// Parses an A1 cell token such as `C7` into `GridCell { row: 6, column: 2 }`.
    ///
    /// A range such as `B2:D9` yields its top-left cell, and a `Sheet!` prefix is ignored. Returns
    /// `None` for anything that is not a cell reference.
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.rsplit('!').next().unwrap_or(token);
        let first = token.split(':').next().unwrap_or(token).trim();
        let first = first.replace('$', "");
        let split = first.find(|c: char| !c.is_ascii_alphabetic())?;
        let (letters, digits) = first.split_at(split);
        if letters.is_empty() || letters.len() > 3 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let mut column: u32 = 0;
        for b in letters.bytes() {
            column = column * 26 + u32::from(b.to_ascii_uppercase() - b'A' + 1);
        }
        let row: u32 = digits.parse().ok()?;
        if row == 0 {
            return None;
        }
        Some(Self {
            row: row - 1,
            column: column - 1,
        })
    }
}
