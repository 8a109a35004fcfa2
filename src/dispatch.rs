//! Resolves parsed arguments and environment defaults into one `Invocation`.
//!
//! Every configuration error is raised here, before credentials are loaded or any remote call is
//! made.

use crate::address::{canonicalize_spreadsheet_id, sheet_name, GridCell, RangeAddress};
use crate::args::Args;
use crate::cell::CoercionPolicy;
use crate::error::Error;
use crate::ingest::{Format, Source};
use crate::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const SPREADSHEET_ENV: &str = "TOSHEETS_SPREADSHEET";
pub const SHEET_ENV: &str = "TOSHEETS_SHEET";

/// The spreadsheet and sheet defaults taken from the environment.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Env {
    spreadsheet: Option<String>,
    sheet: Option<String>,
}

impl Env {
    pub fn new(spreadsheet: Option<&str>, sheet: Option<&str>) -> Self {
        Self {
            spreadsheet: spreadsheet.map(str::to_string),
            sheet: sheet.map(str::to_string),
        }
    }

    /// Reads `TOSHEETS_SPREADSHEET` and `TOSHEETS_SHEET`.
    pub fn from_process() -> Self {
        Self {
            spreadsheet: std::env::var(SPREADSHEET_ENV).ok(),
            sheet: std::env::var(SHEET_ENV).ok(),
        }
    }

    fn spreadsheet(&self) -> Option<&str> {
        self.spreadsheet.as_deref().filter(|s| !s.is_empty())
    }

    fn sheet(&self) -> Option<&str> {
        self.sheet.as_deref()
    }
}

/// The spreadsheet an invocation works on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Target {
    /// A canonical spreadsheet ID.
    Existing(String),
    /// A spreadsheet to be created with this title.
    New { title: String },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    #[default]
    Append,
    Update,
}

serde_plain::derive_display_from_serialize!(WriteMode);

/// The single operation an invocation performs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Operation {
    AddSheet {
        title: String,
    },
    RemoveSheet {
        title: String,
    },
    InsertNote {
        sheet: Option<String>,
        cell: GridCell,
        note: String,
    },
    Wipe {
        range: RangeAddress,
    },
    Export {
        range: RangeAddress,
    },
    Write {
        range: RangeAddress,
        mode: WriteMode,
        source: Source,
        format: Format,
        policy: CoercionPolicy,
    },
}

/// Everything one run of tosheets needs, built once and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invocation {
    target: Target,
    operation: Operation,
    open: bool,
}

impl Invocation {
    /// Picks the operation by priority (add sheet, remove sheet, note, wipe, export, write) and the
    /// spreadsheet target (`--new-sheet`, then `--spreadsheet`, then `TOSHEETS_SPREADSHEET`).
    pub fn resolve(args: &Args, env: &Env) -> Result<Self> {
        let target = resolve_target(args, env)?;
        let sheet = sheet_name(args.sheet(), env.sheet());
        let range = || -> Result<RangeAddress> {
            let cell = require_cell(args)?;
            Ok(RangeAddress::resolve(args.sheet(), env.sheet(), cell))
        };

        let operation = if args.add_sheet() {
            Operation::AddSheet {
                title: require_sheet(sheet, "add")?,
            }
        } else if args.remove_sheet() {
            Operation::RemoveSheet {
                title: require_sheet(sheet, "remove")?,
            }
        } else if let Some(note) = args.note() {
            let token = require_cell(args)?;
            let cell = GridCell::parse(token).ok_or_else(|| {
                Error::config(format!("'{token}' is not a cell reference such as A1"))
            })?;
            Operation::InsertNote {
                sheet: sheet.map(str::to_string),
                cell,
                note: note.to_string(),
            }
        } else if args.wipe() {
            Operation::Wipe { range: range()? }
        } else if args.export() {
            Operation::Export { range: range()? }
        } else {
            Operation::Write {
                range: range()?,
                mode: if args.update() {
                    WriteMode::Update
                } else {
                    WriteMode::Append
                },
                source: Source::from_path(args.input()),
                format: Format::new(args.delimiter(), args.quote())?,
                policy: CoercionPolicy::from_keep_raw(args.keep()),
            }
        };

        Ok(Self {
            target,
            operation,
            open: args.open(),
        })
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    pub fn open(&self) -> bool {
        self.open
    }
}

fn resolve_target(args: &Args, env: &Env) -> Result<Target> {
    if let Some(title) = args.new_sheet().filter(|s| !s.is_empty()) {
        if let Some(ignored) = args.spreadsheet().filter(|s| !s.is_empty()) {
            warn!("--new-sheet creates a new spreadsheet; ignoring --spreadsheet {ignored}");
        }
        return Ok(Target::New {
            title: title.to_string(),
        });
    }
    if let Some(spreadsheet) = args.spreadsheet().filter(|s| !s.is_empty()) {
        return Ok(Target::Existing(
            canonicalize_spreadsheet_id(spreadsheet).to_string(),
        ));
    }
    match env.spreadsheet() {
        Some(spreadsheet) => Ok(Target::Existing(
            canonicalize_spreadsheet_id(spreadsheet).to_string(),
        )),
        None => Err(Error::config(format!(
            "No spreadsheet given. Pass --spreadsheet or --new-sheet, or set {SPREADSHEET_ENV}"
        ))),
    }
}

fn require_cell(args: &Args) -> Result<&str> {
    args.cell()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| Error::config("A cell or range is required, e.g. -c A1"))
}

fn require_sheet(sheet: Option<&str>, verb: &str) -> Result<String> {
    sheet.map(str::to_string).ok_or_else(|| {
        Error::config(format!(
            "A sheet name is required to {verb} a sheet. Pass -s or set {SHEET_ENV}"
        ))
    })
}
