use crate::address::RangeAddress;
use crate::api::Sheet;
use crate::cell::Row;
use crate::dispatch::WriteMode;
use crate::error::{ErrorType, IntoResult};
use crate::Result;

/// Sends `rows` to `range`, either after the existing table or over the cells at `range`.
/// Values are sent as RAW input, so text is never parsed as a formula or a date.
pub(super) async fn write(
    sheet: &mut (dyn Sheet + Send),
    spreadsheet_id: &str,
    range: &RangeAddress,
    mode: WriteMode,
    rows: &[Row],
) -> Result<String> {
    let sent = match mode {
        WriteMode::Append => sheet.append(spreadsheet_id, range.as_str(), rows).await,
        WriteMode::Update => sheet.update(spreadsheet_id, range.as_str(), rows).await,
    };
    sent.pub_result(ErrorType::Remote)?;
    let count = rows.len();
    Ok(format!(
        "Wrote {count} row{} at {range} ({mode})",
        if count == 1 { "" } else { "s" }
    ))
}
