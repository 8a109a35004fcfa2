//! Command handlers for the tosheets CLI.
//!
//! `run` performs the one operation an `Invocation` selects. Data meant for other programs
//! (spreadsheet IDs, sheet titles, exported CSV) is written to `out`; everything else is logged.

mod export;
mod sheets;
mod write;

use crate::api::Sheet;
use crate::dispatch::{Invocation, Operation, Target};
use crate::error::{ErrorType, IntoResult};
use crate::ingest::read_rows;
use crate::Result;
use anyhow::Context;
use serde::Serialize;
use std::fmt::Debug;
use std::io::Write;
use tracing::{debug, info};

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// What a successful run did.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    spreadsheet_id: String,
    created: bool,
    operation: Operation,
    rows: usize,
}

impl Report {
    /// The canonical ID of the spreadsheet that was operated on.
    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    /// Whether the spreadsheet was created by this run.
    pub fn created(&self) -> bool {
        self.created
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    /// Rows written to the spreadsheet, or data rows exported from it.
    pub fn rows(&self) -> usize {
        self.rows
    }
}

/// Performs the operation selected by `invocation` against `sheet`.
///
/// For writes, the input is read and coerced before anything remote happens, so an unreadable
/// input file never leaves a half-created spreadsheet behind. When the target is a new
/// spreadsheet, it is created first and its ID is written to `out` on its own line.
///
/// # Errors
///
/// - `ErrorType::FileAccess` if the input cannot be opened or read.
/// - `ErrorType::Remote` if any call to `sheet` fails.
/// - `ErrorType::EmptyResult` if an export finds no data rows.
pub async fn run(
    invocation: &Invocation,
    sheet: &mut (dyn Sheet + Send),
    out: &mut dyn Write,
) -> Result<Out<Report>> {
    let operation = invocation.operation();
    let rows = match operation {
        Operation::Write {
            source,
            format,
            policy,
            ..
        } => {
            let rows = read_rows(source, *format, *policy)?;
            debug!("Read {} rows from {source:?}", rows.len());
            Some(rows)
        }
        _ => None,
    };

    let (spreadsheet_id, created) = match invocation.target() {
        Target::Existing(id) => (id.clone(), false),
        Target::New { title } => {
            let id = sheet
                .create_spreadsheet(title)
                .await
                .pub_result(ErrorType::Remote)?;
            info!("Created spreadsheet '{title}'");
            emit(out, &id)?;
            (id, true)
        }
    };
    let id = spreadsheet_id.as_str();

    let (message, count) = match operation {
        Operation::AddSheet { title } => {
            let message = sheets::add_sheet(sheet, id, title).await?;
            emit(out, title)?;
            (message, 0)
        }
        Operation::RemoveSheet { title } => (sheets::remove_sheet(sheet, id, title).await?, 0),
        Operation::InsertNote { sheet: name, cell, note } => (
            sheets::insert_note(sheet, id, name.as_deref(), *cell, note).await?,
            0,
        ),
        Operation::Wipe { range } => (sheets::wipe(sheet, id, range).await?, 0),
        Operation::Export { range } => {
            let count = export::export(sheet, id, range, out).await?;
            (format!("Exported {count} rows from {range}"), count)
        }
        Operation::Write { range, mode, .. } => {
            let rows = rows.unwrap_or_default();
            let message = write::write(sheet, id, range, *mode, &rows).await?;
            (message, rows.len())
        }
    };

    Ok(Out::new(
        message,
        Report {
            spreadsheet_id,
            created,
            operation: operation.clone(),
            rows: count,
        },
    ))
}

/// Writes one line of data to `out`.
fn emit(out: &mut dyn Write, line: &str) -> Result<()> {
    writeln!(out, "{line}")
        .and_then(|_| out.flush())
        .context("Unable to write to stdout")
        .pub_result(ErrorType::Internal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Call, TestSheet};
    use crate::args::Args;
    use crate::cell::Cell;
    use crate::dispatch::Env;
    use crate::utils;
    use clap::Parser;
    use tempfile::TempDir;

    fn invocation(argv: &[&str]) -> Invocation {
        let args =
            Args::try_parse_from(std::iter::once("tosheets").chain(argv.iter().copied())).unwrap();
        Invocation::resolve(&args, &Env::new(Some("sid"), None)).unwrap()
    }

    async fn input(dir: &TempDir, contents: &str) -> String {
        let path = dir.path().join("input.txt");
        utils::write(&path, contents).await.unwrap();
        path.to_string_lossy().to_string()
    }

    #[tokio::test]
    async fn test_append_from_file() {
        let dir = TempDir::new().unwrap();
        let path = input(&dir, "a,1,2.5\nb,3,4.5\n").await;
        let mut sheet = TestSheet::default();
        let mut out = Vec::new();

        let done = run(
            &invocation(&["-c", "A1", "-d", ",", "-i", path.as_str(), "-s", "Data"]),
            &mut sheet,
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(
            sheet.calls(),
            &[Call::Append {
                spreadsheet_id: "sid".into(),
                range: "Data!A1".into(),
                rows: vec![
                    vec![Cell::Text("a".into()), Cell::Int(1), Cell::Float(2.5)],
                    vec![Cell::Text("b".into()), Cell::Int(3), Cell::Float(4.5)],
                ],
            }]
        );
        let report = done.structure().unwrap();
        assert_eq!(report.rows(), 2);
        assert_eq!(report.spreadsheet_id(), "sid");
        assert!(!report.created());
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_update_keeps_text() {
        let dir = TempDir::new().unwrap();
        let path = input(&dir, "007 x\n").await;
        let mut sheet = TestSheet::default();

        run(
            &invocation(&["-c", "B2", "-u", "-k", "-i", path.as_str()]),
            &mut sheet,
            &mut Vec::new(),
        )
        .await
        .unwrap();

        assert_eq!(
            sheet.calls(),
            &[Call::Update {
                spreadsheet_id: "sid".into(),
                range: "B2".into(),
                rows: vec![vec![Cell::Text("007".into()), Cell::Text("x".into())]],
            }]
        );
    }

    #[tokio::test]
    async fn test_missing_input_makes_no_remote_call() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.txt").to_string_lossy().to_string();
        let mut sheet = TestSheet::default();

        let err = run(
            &invocation(&["-c", "A1", "-i", missing.as_str(), "--new-sheet", "Fresh"]),
            &mut sheet,
            &mut Vec::new(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.error_type(), ErrorType::FileAccess);
        assert!(sheet.calls().is_empty());
    }

    #[tokio::test]
    async fn test_add_sheet_only_adds() {
        let mut sheet = TestSheet::default();
        let mut out = Vec::new();

        run(&invocation(&["-a", "-s", "foo"]), &mut sheet, &mut out)
            .await
            .unwrap();

        assert_eq!(
            sheet.calls(),
            &[Call::AddSheet {
                spreadsheet_id: "sid".into(),
                title: "foo".into()
            }]
        );
        assert_eq!(String::from_utf8(out).unwrap(), "foo\n");
        assert_eq!(sheet.sheet_titles(), vec!["Sheet1", "foo"]);
    }

    #[tokio::test]
    async fn test_remove_sheet() {
        let mut sheet = TestSheet::default().with_sheet(42, "old");

        run(&invocation(&["-r", "-s", "old"]), &mut sheet, &mut Vec::new())
            .await
            .unwrap();

        assert_eq!(
            sheet.calls(),
            &[
                Call::SheetId {
                    spreadsheet_id: "sid".into(),
                    title: Some("old".into())
                },
                Call::DeleteSheet {
                    spreadsheet_id: "sid".into(),
                    sheet_id: 42
                },
            ]
        );
        assert_eq!(sheet.sheet_titles(), vec!["Sheet1"]);
    }

    #[tokio::test]
    async fn test_remove_missing_sheet_is_remote_error() {
        let mut sheet = TestSheet::default();
        let err = run(&invocation(&["-r", "-s", "nope"]), &mut sheet, &mut Vec::new())
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Remote);
        assert!(!sheet
            .calls()
            .iter()
            .any(|c| matches!(c, Call::DeleteSheet { .. })));
    }

    #[tokio::test]
    async fn test_insert_note_on_first_sheet() {
        let mut sheet = TestSheet::default();

        run(
            &invocation(&["-n", "checked", "-c", "C7"]),
            &mut sheet,
            &mut Vec::new(),
        )
        .await
        .unwrap();

        assert_eq!(
            sheet.calls(),
            &[
                Call::SheetId {
                    spreadsheet_id: "sid".into(),
                    title: None
                },
                Call::InsertNote {
                    spreadsheet_id: "sid".into(),
                    sheet_id: 0,
                    cell: crate::address::GridCell { row: 6, column: 2 },
                    note: "checked".into(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_wipe() {
        let mut sheet = TestSheet::default().with_values("Data!A1:B2", vec![vec!["x"]]);

        run(
            &invocation(&["-w", "-c", "A1:B2", "-s", "Data"]),
            &mut sheet,
            &mut Vec::new(),
        )
        .await
        .unwrap();

        assert_eq!(
            sheet.calls(),
            &[Call::Clear {
                spreadsheet_id: "sid".into(),
                range: "Data!A1:B2".into()
            }]
        );
    }

    #[tokio::test]
    async fn test_export_writes_csv() {
        let mut sheet = TestSheet::default().with_values(
            "A1:C3",
            vec![
                vec!["name", "count", "note"],
                vec!["a", "1"],
                vec!["b, c", "2", "x", "extra"],
            ],
        );
        let mut out = Vec::new();

        let done = run(&invocation(&["-x", "-c", "A1:C3"]), &mut sheet, &mut out)
            .await
            .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "name,count,note\na,1,\n\"b, c\",2,x\n"
        );
        assert_eq!(done.structure().unwrap().rows(), 2);
    }

    #[tokio::test]
    async fn test_export_header_only_is_empty_result() {
        let mut sheet = TestSheet::default().with_values("A1:B2", vec![vec!["h1", "h2"]]);
        let mut out = Vec::new();

        let err = run(&invocation(&["-x", "-c", "A1:B2"]), &mut sheet, &mut out)
            .await
            .unwrap_err();

        assert_eq!(err.error_type(), ErrorType::EmptyResult);
        assert!(err.to_string().contains("No data found"));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_export_blank_header_is_empty_result() {
        let mut sheet = TestSheet::default().with_values(
            "A1:B3",
            vec![vec![], vec!["a", "1"], vec!["b", "2"]],
        );
        let mut out = Vec::new();

        let err = run(&invocation(&["-x", "-c", "A1:B3"]), &mut sheet, &mut out)
            .await
            .unwrap_err();

        assert_eq!(err.error_type(), ErrorType::EmptyResult);
        assert!(err.to_string().contains("No header found"));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_export_nothing_is_empty_result() {
        let mut sheet = TestSheet::default();
        let err = run(&invocation(&["-x", "-c", "A1"]), &mut sheet, &mut Vec::new())
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::EmptyResult);
    }

    #[tokio::test]
    async fn test_new_spreadsheet_is_the_target() {
        let mut sheet = TestSheet::default();
        let mut out = Vec::new();

        let done = run(
            &invocation(&["-a", "-s", "tab", "--new-sheet", "Report"]),
            &mut sheet,
            &mut out,
        )
        .await
        .unwrap();

        let report = done.structure().unwrap();
        assert!(report.created());
        let id = report.spreadsheet_id().to_string();
        assert_eq!(String::from_utf8(out).unwrap(), format!("{id}\ntab\n"));
        assert_eq!(
            sheet.calls(),
            &[
                Call::CreateSpreadsheet {
                    title: "Report".into()
                },
                Call::AddSheet {
                    spreadsheet_id: id,
                    title: "tab".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_remote_failure() {
        let mut sheet = TestSheet::default().failing("permission denied");
        let err = run(&invocation(&["-w", "-c", "A1"]), &mut sheet, &mut Vec::new())
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Remote);
        assert!(err.to_string().contains("permission denied"));
        assert_eq!(sheet.calls().len(), 1);
    }
}
