//! Implements the `Sheet` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without using Google Sheets (see `TOSHEETS_IN_TEST_MODE`).

use crate::address::GridCell;
use crate::api::Sheet;
use crate::cell::Row;
use crate::error::Res;
use anyhow::{bail, Context};
use std::collections::HashMap;

/// The name of the sheet every `TestSheet` starts with.
pub const DEFAULT_SHEET: &str = "Sheet1";

/// A remote call made against a `TestSheet`.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateSpreadsheet {
        title: String,
    },
    AddSheet {
        spreadsheet_id: String,
        title: String,
    },
    DeleteSheet {
        spreadsheet_id: String,
        sheet_id: i64,
    },
    SheetId {
        spreadsheet_id: String,
        title: Option<String>,
    },
    Append {
        spreadsheet_id: String,
        range: String,
        rows: Vec<Row>,
    },
    Update {
        spreadsheet_id: String,
        range: String,
        rows: Vec<Row>,
    },
    Clear {
        spreadsheet_id: String,
        range: String,
    },
    InsertNote {
        spreadsheet_id: String,
        sheet_id: i64,
        cell: GridCell,
        note: String,
    },
    Get {
        spreadsheet_id: String,
        range: String,
    },
}

/// An implementation of the `Sheet` trait that does not use Google sheets. It records every call,
/// keeps a list of sheets, and returns canned values from `get`.
#[derive(Debug, Clone)]
pub struct TestSheet {
    calls: Vec<Call>,
    sheets: Vec<(i64, String)>,
    values: HashMap<String, Vec<Vec<String>>>,
    failure: Option<String>,
    next_spreadsheet: u32,
}

impl Default for TestSheet {
    /// A spreadsheet with one empty sheet named `Sheet1`.
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            sheets: vec![(0, DEFAULT_SHEET.to_string())],
            values: HashMap::new(),
            failure: None,
            next_spreadsheet: 0,
        }
    }
}

impl TestSheet {
    /// Makes `get(range)` return `rows`.
    pub fn with_values<S>(mut self, range: &str, rows: Vec<Vec<S>>) -> Self
    where
        S: Into<String>,
    {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        self.values.insert(range.to_string(), rows);
        self
    }

    /// Adds a sheet with the given numeric ID and title.
    pub fn with_sheet(mut self, sheet_id: i64, title: &str) -> Self {
        self.sheets.push((sheet_id, title.to_string()));
        self
    }

    /// Makes every call fail with `message`, as a remote error would.
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// The titles of the sheets, in order.
    pub fn sheet_titles(&self) -> Vec<&str> {
        self.sheets.iter().map(|(_, title)| title.as_str()).collect()
    }

    fn record(&mut self, call: Call) -> Res<()> {
        self.calls.push(call);
        match &self.failure {
            Some(message) => bail!("{message}"),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl Sheet for TestSheet {
    async fn create_spreadsheet(&mut self, title: &str) -> Res<String> {
        self.record(Call::CreateSpreadsheet {
            title: title.to_string(),
        })?;
        self.next_spreadsheet += 1;
        Ok(format!(
            "test-{}-{}",
            self.next_spreadsheet,
            uuid::Uuid::new_v4().simple()
        ))
    }

    async fn add_sheet(&mut self, spreadsheet_id: &str, title: &str) -> Res<()> {
        self.record(Call::AddSheet {
            spreadsheet_id: spreadsheet_id.to_string(),
            title: title.to_string(),
        })?;
        if self.sheets.iter().any(|(_, t)| t == title) {
            bail!("A sheet with the name \"{title}\" already exists");
        }
        let next_id = self.sheets.iter().map(|(id, _)| id + 1).max().unwrap_or(0);
        self.sheets.push((next_id, title.to_string()));
        Ok(())
    }

    async fn delete_sheet(&mut self, spreadsheet_id: &str, sheet_id: i64) -> Res<()> {
        self.record(Call::DeleteSheet {
            spreadsheet_id: spreadsheet_id.to_string(),
            sheet_id,
        })?;
        let position = self
            .sheets
            .iter()
            .position(|(id, _)| *id == sheet_id)
            .with_context(|| format!("No sheet with ID {sheet_id}"))?;
        self.sheets.remove(position);
        Ok(())
    }

    async fn sheet_id(&mut self, spreadsheet_id: &str, title: Option<&str>) -> Res<i64> {
        self.record(Call::SheetId {
            spreadsheet_id: spreadsheet_id.to_string(),
            title: title.map(str::to_string),
        })?;
        let found = match title {
            Some(title) => self.sheets.iter().find(|(_, t)| t == title),
            None => self.sheets.first(),
        };
        found
            .map(|(id, _)| *id)
            .with_context(|| format!("Sheet '{}' not found", title.unwrap_or_default()))
    }

    async fn append(&mut self, spreadsheet_id: &str, range: &str, rows: &[Row]) -> Res<()> {
        self.record(Call::Append {
            spreadsheet_id: spreadsheet_id.to_string(),
            range: range.to_string(),
            rows: rows.to_vec(),
        })?;
        let stored = self.values.entry(range.to_string()).or_default();
        stored.extend(
            rows.iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect()),
        );
        Ok(())
    }

    async fn update(&mut self, spreadsheet_id: &str, range: &str, rows: &[Row]) -> Res<()> {
        self.record(Call::Update {
            spreadsheet_id: spreadsheet_id.to_string(),
            range: range.to_string(),
            rows: rows.to_vec(),
        })?;
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect();
        self.values.insert(range.to_string(), rows);
        Ok(())
    }

    async fn clear(&mut self, spreadsheet_id: &str, range: &str) -> Res<()> {
        self.record(Call::Clear {
            spreadsheet_id: spreadsheet_id.to_string(),
            range: range.to_string(),
        })?;
        self.values.remove(range);
        Ok(())
    }

    async fn insert_note(
        &mut self,
        spreadsheet_id: &str,
        sheet_id: i64,
        cell: GridCell,
        note: &str,
    ) -> Res<()> {
        self.record(Call::InsertNote {
            spreadsheet_id: spreadsheet_id.to_string(),
            sheet_id,
            cell,
            note: note.to_string(),
        })
    }

    async fn get(&mut self, spreadsheet_id: &str, range: &str) -> Res<Vec<Vec<String>>> {
        self.record(Call::Get {
            spreadsheet_id: spreadsheet_id.to_string(),
            range: range.to_string(),
        })?;
        Ok(self.values.get(range).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;

    #[tokio::test]
    async fn test_append_then_get() {
        let mut sheet = TestSheet::default();
        let rows = vec![vec![Cell::Text("a".into()), Cell::Int(1)]];
        sheet.append("id", "A1", &rows).await.unwrap();
        sheet.append("id", "A1", &rows).await.unwrap();
        let values = sheet.get("id", "A1").await.unwrap();
        assert_eq!(values, vec![vec!["a", "1"], vec!["a", "1"]]);
        assert_eq!(sheet.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_add_and_delete_sheet() {
        let mut sheet = TestSheet::default();
        sheet.add_sheet("id", "metrics").await.unwrap();
        assert!(sheet.add_sheet("id", "metrics").await.is_err());
        let sheet_id = sheet.sheet_id("id", Some("metrics")).await.unwrap();
        assert_eq!(sheet_id, 1);
        sheet.delete_sheet("id", sheet_id).await.unwrap();
        assert_eq!(sheet.sheet_titles(), vec![DEFAULT_SHEET]);
    }

    #[tokio::test]
    async fn test_failing_records_the_call() {
        let mut sheet = TestSheet::default().failing("quota exceeded");
        let err = sheet.clear("id", "A1").await.unwrap_err();
        assert_eq!(err.to_string(), "quota exceeded");
        assert_eq!(
            sheet.calls(),
            &[Call::Clear {
                spreadsheet_id: "id".into(),
                range: "A1".into()
            }]
        );
    }
}
