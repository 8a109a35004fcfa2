//! Operations that change the structure or annotations of a spreadsheet rather than its values.

use crate::address::{GridCell, RangeAddress};
use crate::api::Sheet;
use crate::error::{ErrorType, IntoResult};
use crate::Result;
use tracing::debug;

pub(super) async fn add_sheet(
    sheet: &mut (dyn Sheet + Send),
    spreadsheet_id: &str,
    title: &str,
) -> Result<String> {
    sheet
        .add_sheet(spreadsheet_id, title)
        .await
        .pub_result(ErrorType::Remote)?;
    Ok(format!("Added sheet '{title}'"))
}

/// Looks up the numeric ID of the sheet named `title`, then deletes it.
pub(super) async fn remove_sheet(
    sheet: &mut (dyn Sheet + Send),
    spreadsheet_id: &str,
    title: &str,
) -> Result<String> {
    let sheet_id = sheet
        .sheet_id(spreadsheet_id, Some(title))
        .await
        .pub_result(ErrorType::Remote)?;
    debug!("Sheet '{title}' has ID {sheet_id}");
    sheet
        .delete_sheet(spreadsheet_id, sheet_id)
        .await
        .pub_result(ErrorType::Remote)?;
    Ok(format!("Removed sheet '{title}'"))
}

/// Sets the note of `cell` on the named sheet, or on the first sheet when `name` is `None`.
pub(super) async fn insert_note(
    sheet: &mut (dyn Sheet + Send),
    spreadsheet_id: &str,
    name: Option<&str>,
    cell: GridCell,
    note: &str,
) -> Result<String> {
    let sheet_id = sheet
        .sheet_id(spreadsheet_id, name)
        .await
        .pub_result(ErrorType::Remote)?;
    sheet
        .insert_note(spreadsheet_id, sheet_id, cell, note)
        .await
        .pub_result(ErrorType::Remote)?;
    Ok(format!(
        "Inserted note at row {}, column {} of sheet {sheet_id}",
        cell.row + 1,
        cell.column + 1
    ))
}

pub(super) async fn wipe(
    sheet: &mut (dyn Sheet + Send),
    spreadsheet_id: &str,
    range: &RangeAddress,
) -> Result<String> {
    sheet
        .clear(spreadsheet_id, range.as_str())
        .await
        .pub_result(ErrorType::Remote)?;
    Ok(format!("Wiped {range}"))
}
