//! The tabular dataset handed to the statistics engine.
//!
//! A [`NutritionTable`] wraps a Polars [`DataFrame`] whose first column is
//! the item-name label and whose remaining columns are nutrients. Column
//! names are already normalized by the loader; the engine matches them
//! exactly. Missing measurements are Polars nulls.

use crate::error::{NutriError, Result};
use polars::prelude::*;

#[derive(Clone, Debug)]
pub struct NutritionTable {
    category: String,
    label_column: Option<String>,
    frame: DataFrame,
}

impl NutritionTable {
    /// Wrap a frame. `label_column`, when given, must exist in the frame and
    /// is excluded from the nutrient columns.
    ///
    /// # Errors
    ///
    /// Returns [`NutriError::UnknownColumn`] if the label column is absent.
    pub fn new(
        category: impl Into<String>,
        frame: DataFrame,
        label_column: Option<&str>,
    ) -> Result<Self> {
        let category = category.into();
        if let Some(label) = label_column
            && frame.column(label).is_err()
        {
            return Err(NutriError::UnknownColumn {
                category,
                column: label.to_owned(),
            });
        }

        Ok(Self {
            category,
            label_column: label_column.map(str::to_owned),
            frame,
        })
    }

    /// Same rows and columns under another category name.
    #[must_use]
    pub fn renamed(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn label_column(&self) -> Option<&str> {
        self.label_column.as_deref()
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Number of rows (menu items).
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Nutrient column names in stored order, label column excluded.
    pub fn columns(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .filter(|name| Some(name.as_str()) != self.label_column())
            .collect()
    }

    /// Nutrient columns whose dtype is numeric.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.frame
            .get_columns()
            .iter()
            .filter(|col| col.dtype().is_primitive_numeric())
            .map(|col| col.name().to_string())
            .filter(|name| Some(name.as_str()) != self.label_column())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        Some(name) != self.label_column() && self.frame.column(name).is_ok()
    }

    /// Case-insensitive lookup of a nutrient column, for interactive input.
    pub fn resolve_column(&self, name: &str) -> Option<String> {
        let wanted = name.trim();
        self.columns()
            .into_iter()
            .find(|col| col.eq_ignore_ascii_case(wanted))
    }

    /// Values of a nutrient column as `Float64`, nulls preserved.
    ///
    /// Non-numeric text becomes null.
    ///
    /// # Errors
    ///
    /// Returns [`NutriError::UnknownColumn`] if the column does not exist.
    pub fn values(&self, column: &str) -> Result<Float64Chunked> {
        if !self.has_column(column) {
            return Err(self.unknown_column(column));
        }
        let series = self.frame.column(column)?.as_materialized_series();
        let cast = series.cast(&DataType::Float64)?;
        Ok(cast.f64()?.clone())
    }

    /// Item names in row order, if the table carries a label column.
    pub fn labels(&self) -> Option<Vec<String>> {
        let label = self.label_column()?;
        let series = self.frame.column(label).ok()?.as_materialized_series();
        let text = series.cast(&DataType::String).ok()?;
        let ca = text.str().ok()?;
        Some(
            ca.into_iter()
                .map(|v| v.unwrap_or_default().to_owned())
                .collect(),
        )
    }

    /// Derived table keeping only the rows where `mask` is true.
    ///
    /// # Errors
    ///
    /// Returns [`NutriError::DataProcessing`] if the mask length differs
    /// from the table height.
    pub fn select_rows(&self, mask: &BooleanChunked) -> Result<Self> {
        let frame = self.frame.filter(mask)?;
        Ok(Self {
            category: self.category.clone(),
            label_column: self.label_column.clone(),
            frame,
        })
    }

    /// Full CSV dump of every row and column.
    ///
    /// # Errors
    ///
    /// Returns [`NutriError::DataProcessing`] if the writer fails.
    pub fn to_csv_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        let mut frame = self.frame.clone();
        CsvWriter::new(&mut buf)
            .include_header(true)
            .finish(&mut frame)?;
        String::from_utf8(buf).map_err(|e| NutriError::DataProcessing(e.to_string()))
    }

    pub(crate) fn unknown_column(&self, column: &str) -> NutriError {
        NutriError::UnknownColumn {
            category: self.category.clone(),
            column: column.to_owned(),
        }
    }
}
