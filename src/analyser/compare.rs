//! Cross-category comparison tables.
//!
//! Categories are heterogeneous: a nutrient that one menu records may be
//! absent from another. An absent column is data absence, not an error, and
//! shows up as an all-missing [`ComparisonRecord`].

use super::catalog::Catalog;
use super::dataset::NutritionTable;
use super::profiling::{profile_column, round2};
use super::types::{CategoryComparison, ComparisonRecord, ComparisonResult};
use crate::error::{NutriError, Result};
use std::collections::{BTreeMap, BTreeSet};

pub const MIN_CATEGORIES: usize = 2;

/// Compare `nutrients` (or the shared nutrients) across all categories.
///
/// A caller-supplied list is used verbatim. Without one, the working set is
/// the intersection of every category's columns, sorted lexicographically.
///
/// # Errors
///
/// Returns [`NutriError::InsufficientCategories`] with fewer than two
/// registered categories.
pub fn compare(catalog: &Catalog, nutrients: Option<&[String]>) -> Result<ComparisonResult> {
    if catalog.len() < MIN_CATEGORIES {
        return Err(NutriError::InsufficientCategories {
            found: catalog.len(),
        });
    }

    let nutrients = match nutrients {
        Some(list) => list.to_vec(),
        None => shared_nutrients(catalog),
    };
    tracing::debug!(?nutrients, "comparing {} categories", catalog.len());

    let categories = catalog
        .iter()
        .map(|table| {
            let mut records = BTreeMap::new();
            for nutrient in &nutrients {
                records.insert(nutrient.clone(), comparison_record(table, nutrient)?);
            }
            Ok(CategoryComparison {
                category: table.category().to_owned(),
                nutrients: records,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ComparisonResult {
        nutrients,
        categories,
    })
}

/// Columns present in every category, sorted.
pub fn shared_nutrients(catalog: &Catalog) -> Vec<String> {
    let mut tables = catalog.iter();
    let Some(first) = tables.next() else {
        return Vec::new();
    };

    let mut shared: BTreeSet<String> = first.columns().into_iter().collect();
    for table in tables {
        let columns: BTreeSet<String> = table.columns().into_iter().collect();
        shared.retain(|c| columns.contains(c));
    }
    shared.into_iter().collect()
}

/// Nine-field record for one column, rounded to two decimals.
///
/// # Errors
///
/// Only fails if Polars cannot cast the column to `Float64`.
pub fn comparison_record(table: &NutritionTable, nutrient: &str) -> Result<ComparisonRecord> {
    if !table.has_column(nutrient) {
        return Ok(ComparisonRecord::missing());
    }

    let profile = profile_column(&table.values(nutrient)?)?;
    Ok(ComparisonRecord {
        count: Some(profile.count),
        mean: profile.mean.map(round2),
        median: profile.median.map(round2),
        std: profile.std.map(round2),
        min: profile.min.map(round2),
        max: profile.max.map(round2),
        q25: profile.q25.map(round2),
        q50: profile.q50.map(round2),
        q75: profile.q75.map(round2),
    })
}
