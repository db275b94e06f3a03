//! CSV ingestion for menu nutrition files.
//!
//! The published menu exports come in mixed encodings (UTF-16 with BOM for
//! the food file, UTF-8 or Windows-1252 elsewhere), use `-` for unmeasured
//! values and carry unit annotations in their headers. This module turns
//! such a file into a clean [`NutritionTable`].

use super::dataset::NutritionTable;
use super::naming::normalize_column_names;
use crate::error::{NutriError, Result, ResultExt as _};
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;

pub const DEFAULT_MISSING_MARKER: &str = "-";

#[derive(Clone, Debug)]
pub struct LoadOptions {
    /// Cell text that stands for "no measurement".
    pub missing_marker: String,
    /// Rows scanned for schema inference.
    pub infer_schema_length: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            missing_marker: DEFAULT_MISSING_MARKER.to_owned(),
            infer_schema_length: 10_000,
        }
    }
}

/// Load `path` as the `category` table. The first column becomes the
/// item-name label.
///
/// # Errors
///
/// Returns [`NutriError::InvalidPath`] if the file does not exist and
/// [`NutriError::DataProcessing`] if it cannot be parsed as CSV.
pub fn load_table(path: &Path, category: &str, options: &LoadOptions) -> Result<NutritionTable> {
    if !path.exists() {
        return Err(NutriError::InvalidPath(format!(
            "CSV file not found at path: {}",
            path.display()
        )));
    }

    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let (text, encoding) = decode(&bytes);
    tracing::info!(
        path = %path.display(),
        encoding = encoding.name(),
        "loading {category} dataset"
    );

    let table = parse_csv(text.into_bytes(), category, options)?;
    tracing::info!(
        category,
        rows = table.height(),
        columns = ?table.columns(),
        "dataset loaded"
    );
    Ok(table)
}

/// Parse UTF-8 CSV bytes into a table with normalized column names.
///
/// # Errors
///
/// Returns [`NutriError::DataProcessing`] for malformed CSV or a file
/// without columns.
pub fn parse_csv(utf8: Vec<u8>, category: &str, options: &LoadOptions) -> Result<NutritionTable> {
    let parse_options = CsvParseOptions::default()
        .with_null_values(Some(NullValues::AllColumnsSingle(
            options.missing_marker.as_str().into(),
        )));

    let mut frame = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(options.infer_schema_length))
        .with_parse_options(parse_options)
        .into_reader_with_file_handle(Cursor::new(utf8))
        .finish()
        .context("Failed to read CSV")?;

    let raw_names: Vec<String> = frame
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect();
    let names = normalize_column_names(&raw_names);
    frame.set_column_names(names.iter().map(String::as_str))?;

    // A column with no measured cell infers as text; keep it a nutrient.
    let all_missing: Vec<String> = frame
        .get_columns()
        .iter()
        .skip(1)
        .filter(|col| !col.is_empty() && !col.dtype().is_primitive_numeric() && col.null_count() == col.len())
        .map(|col| col.name().to_string())
        .collect();
    for name in all_missing {
        let numeric = frame.column(&name)?.cast(&DataType::Float64)?;
        frame.with_column(numeric)?;
    }

    let label = names
        .first()
        .ok_or_else(|| NutriError::DataProcessing("CSV file has no columns".to_owned()))?;
    NutritionTable::new(category, frame, Some(label))
}

/// Decode raw file bytes to UTF-8 text.
///
/// A byte-order mark wins; otherwise valid UTF-8 is taken as-is and anything
/// else is read as Windows-1252.
pub fn decode(bytes: &[u8]) -> (String, &'static Encoding) {
    let encoding = detect_encoding(bytes);
    let (text, actual, _had_errors) = encoding.decode(bytes);
    (text.into_owned(), actual)
}

pub fn detect_encoding(bytes: &[u8]) -> &'static Encoding {
    if let Some((encoding, _bom_len)) = Encoding::for_bom(bytes) {
        return encoding;
    }
    if std::str::from_utf8(bytes).is_ok() {
        UTF_8
    } else {
        WINDOWS_1252
    }
}
