use crate::address::RangeAddress;
use crate::api::Sheet;
use crate::error::{Error, ErrorType, IntoResult};
use crate::Result;
use anyhow::{anyhow, Context};
use std::io::Write;
use tracing::debug;

/// Fetches `range` and writes it to `out` as comma-separated CSV. The first row is the header;
/// every data row is padded with empty fields or truncated to the header's width. Returns the
/// number of data rows written.
///
/// Fails with `ErrorType::EmptyResult`, writing nothing, when the range holds no data rows or its
/// first row is blank.
pub(super) async fn export(
    sheet: &mut (dyn Sheet + Send),
    spreadsheet_id: &str,
    range: &RangeAddress,
    out: &mut dyn Write,
) -> Result<usize> {
    let values = sheet
        .get(spreadsheet_id, range.as_str())
        .await
        .pub_result(ErrorType::Remote)?;
    let mut values = values.into_iter();
    let header = values.next().unwrap_or_default();
    let data: Vec<Vec<String>> = values.collect();
    if data.is_empty() {
        return Err(Error::new(
            ErrorType::EmptyResult,
            anyhow!("No data found in {range}"),
        ));
    }
    if header.is_empty() {
        return Err(Error::new(
            ErrorType::EmptyResult,
            anyhow!("No header found in the first row of {range}"),
        ));
    }

    let width = header.len();
    debug!("Exporting {} rows, {width} columns wide", data.len());
    let mut writer = csv::Writer::from_writer(out);
    writer
        .write_record(&header)
        .context("Unable to write the CSV header")
        .pub_result(ErrorType::Internal)?;
    for mut row in data.iter().cloned() {
        row.resize(width, String::new());
        writer
            .write_record(&row)
            .context("Unable to write a CSV row")
            .pub_result(ErrorType::Internal)?;
    }
    writer
        .flush()
        .context("Unable to write to stdout")
        .pub_result(ErrorType::Internal)?;
    Ok(data.len())
}
