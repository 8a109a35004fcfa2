//! tosheets pipes delimited text into Google Sheets and exports ranges back out as CSV.

mod address;
mod api;
pub mod args;
mod cell;
pub mod commands;
mod config;
pub mod dispatch;
mod error;
mod ingest;
mod utils;

pub use address::{canonicalize_spreadsheet_id, edit_url, GridCell, RangeAddress};
pub use api::{sheet, Call, Mode, Sheet, TestSheet};
pub use cell::{Cell, CoercionPolicy, Row};
pub use config::Config;
pub use error::{Error, ErrorType, Result};
pub use ingest::{read_rows, Format, Records, Source};
