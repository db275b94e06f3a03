use super::catalog::Catalog;
use super::dataset::NutritionTable;
use super::profiling::{column_sum, profile_column};
use super::types::{CategoryStats, DescriptiveReport, NutrientRatios, SummaryTable};
use crate::error::Result;

pub const FAT: &str = "Fat";
pub const PROTEIN: &str = "Protein";
pub const CARB: &str = "Carb";

/// Summary table and ratios for every registered category.
///
/// # Errors
///
/// Only fails if Polars cannot cast a numeric column to `Float64`.
pub fn descriptive_stats(catalog: &Catalog) -> Result<DescriptiveReport> {
    let categories = catalog
        .iter()
        .map(category_stats)
        .collect::<Result<Vec<_>>>()?;

    Ok(DescriptiveReport { categories })
}

/// Descriptive statistics of one table.
///
/// # Errors
///
/// Only fails if Polars cannot cast a numeric column to `Float64`.
pub fn category_stats(table: &NutritionTable) -> Result<CategoryStats> {
    let mut summary = SummaryTable::default();
    for column in table.numeric_columns() {
        let profile = profile_column(&table.values(&column)?)?;
        summary.columns.push((column, profile));
    }

    let ratios = nutrient_ratios(table)?;
    tracing::debug!(
        category = table.category(),
        columns = summary.columns.len(),
        has_ratios = ratios.is_some(),
        "computed descriptive statistics"
    );

    Ok(CategoryStats {
        category: table.category().to_owned(),
        summary,
        ratios,
    })
}

/// Ratios of column totals; `None` unless Fat, Protein and Carb all exist.
///
/// A zero denominator yields an infinite or NaN ratio rather than an error.
///
/// # Errors
///
/// Only fails if Polars cannot cast one of the three columns.
pub fn nutrient_ratios(table: &NutritionTable) -> Result<Option<NutrientRatios>> {
    if ![FAT, PROTEIN, CARB].iter().all(|c| table.has_column(c)) {
        return Ok(None);
    }

    let fat = column_sum(&table.values(FAT)?);
    let protein = column_sum(&table.values(PROTEIN)?);
    let carb = column_sum(&table.values(CARB)?);

    Ok(Some(NutrientRatios {
        fat_to_protein: fat / protein,
        protein_to_carb: protein / carb,
        carb_to_fat: carb / fat,
    }))
}
