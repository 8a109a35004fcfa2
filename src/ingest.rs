//! Reads delimited records from stdin or a file.

use crate::cell::{CoercionPolicy, Row};
use crate::error::{Error, ErrorType, IntoResult};
use crate::Result;
use anyhow::Context;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Where records are read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Source {
    Stdin,
    File(PathBuf),
}

impl Source {
    pub fn from_path(path: Option<&Path>) -> Self {
        match path {
            Some(p) => Source::File(p.to_path_buf()),
            None => Source::Stdin,
        }
    }

    fn open(&self) -> Result<Box<dyn Read>> {
        match self {
            Source::Stdin => Ok(Box::new(std::io::stdin())),
            Source::File(path) => {
                let file = File::open(path)
                    .with_context(|| format!("Unable to open input file {}", path.display()))
                    .pub_result(ErrorType::FileAccess)?;
                Ok(Box::new(BufReader::new(file)))
            }
        }
    }
}

/// The delimiter and quote character of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Format {
    delimiter: u8,
    quote: u8,
}

impl Default for Format {
    fn default() -> Self {
        Self {
            delimiter: b' ',
            quote: b'"',
        }
    }
}

impl Format {
    /// Both characters must be single ASCII characters.
    pub fn new(delimiter: char, quote: char) -> Result<Self> {
        Ok(Self {
            delimiter: ascii_byte("delimiter", delimiter)?,
            quote: ascii_byte("quote character", quote)?,
        })
    }

    pub fn delimiter(&self) -> char {
        char::from(self.delimiter)
    }

    pub fn quote(&self) -> char {
        char::from(self.quote)
    }
}

fn ascii_byte(what: &str, c: char) -> Result<u8> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        Err(Error::config(format!(
            "The {what} must be a single ASCII character, got '{c}'"
        )))
    }
}

/// A single pass over the records of a source. The source is closed when this is dropped.
pub struct Records {
    inner: csv::StringRecordsIntoIter<Box<dyn Read>>,
    source: Source,
}

impl Records {
    /// Opens `source`. Fails with `ErrorType::FileAccess` if the file cannot be opened.
    pub fn open(source: &Source, format: Format) -> Result<Self> {
        let reader = source.open()?;
        let inner = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(format.delimiter)
            .quote(format.quote)
            .from_reader(reader)
            .into_records();
        Ok(Self {
            inner,
            source: source.clone(),
        })
    }
}

impl Iterator for Records {
    type Item = Result<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.inner.next()?;
        let source = &self.source;
        Some(
            record
                .map(|r| r.iter().map(str::to_string).collect())
                .with_context(|| format!("Unable to read a record from {source:?}"))
                .pub_result(ErrorType::FileAccess),
        )
    }
}

/// Reads every record of `source` and coerces each field with `policy`.
pub fn read_rows(source: &Source, format: Format, policy: CoercionPolicy) -> Result<Vec<Row>> {
    Records::open(source, format)?
        .map(|fields| fields.map(|f| policy.coerce_row(&f)))
        .collect()
}
