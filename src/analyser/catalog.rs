//! Category → table mapping, built once and then only queried.
//!
//! ```text
//!   CatalogBuilder::register("food", ..)
//!   CatalogBuilder::register("drinks", ..)
//!            │ build()
//!            ▼
//!        Catalog  (immutable, Send + Sync)
//!            │
//!   ┌────────┼──────────────┐
//!   ▼        ▼              ▼
//! stats   compare        filter
//! ```

use super::dataset::NutritionTable;
use super::filter::{self, FilterCriterion};
use super::types::{ComparisonResult, DescriptiveReport};
use super::{compare, stats};
use crate::error::{NutriError, Result};

/// Collects tables during the load phase.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    tables: Vec<NutritionTable>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `table` under `category`, replacing any table already registered
    /// under that name. A replaced category keeps its original position.
    pub fn register(&mut self, category: impl Into<String>, table: NutritionTable) -> &mut Self {
        let table = table.renamed(category);
        tracing::debug!(
            category = table.category(),
            rows = table.height(),
            "registering dataset"
        );

        match self
            .tables
            .iter_mut()
            .find(|t| t.category() == table.category())
        {
            Some(slot) => *slot = table,
            None => self.tables.push(table),
        }
        self
    }

    pub fn build(self) -> Catalog {
        Catalog {
            tables: self.tables,
        }
    }
}

/// Read-only set of registered tables in registration order.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    tables: Vec<NutritionTable>,
}

impl Catalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NutritionTable> {
        self.tables.iter()
    }

    pub fn categories(&self) -> Vec<&str> {
        self.tables.iter().map(NutritionTable::category).collect()
    }

    pub fn get(&self, category: &str) -> Option<&NutritionTable> {
        self.tables.iter().find(|t| t.category() == category)
    }

    /// # Errors
    ///
    /// Returns [`NutriError::UnknownCategory`] if `category` is not registered.
    pub fn require(&self, category: &str) -> Result<&NutritionTable> {
        self.get(category)
            .ok_or_else(|| NutriError::UnknownCategory(category.to_owned()))
    }

    /// See [`stats::descriptive_stats`].
    ///
    /// # Errors
    ///
    /// Propagates Polars cast failures.
    pub fn descriptive_stats(&self) -> Result<DescriptiveReport> {
        stats::descriptive_stats(self)
    }

    /// See [`compare::compare`].
    ///
    /// # Errors
    ///
    /// Returns [`NutriError::InsufficientCategories`] with fewer than two
    /// categories.
    pub fn compare(&self, nutrients: Option<&[String]>) -> Result<ComparisonResult> {
        compare::compare(self, nutrients)
    }

    /// See [`filter::filter_many`].
    ///
    /// # Errors
    ///
    /// Returns [`NutriError::UnknownCategory`] or [`NutriError::UnknownColumn`].
    pub fn filter_many(
        &self,
        criterion: &FilterCriterion,
        categories: Option<&[String]>,
    ) -> Result<Vec<NutritionTable>> {
        filter::filter_many(self, criterion, categories)
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a NutritionTable;
    type IntoIter = std::slice::Iter<'a, NutritionTable>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use polars::prelude::*;

    fn table(rows: &[f64]) -> Result<NutritionTable> {
        let frame = DataFrame::new(vec![Column::from(Series::new(
            "Calories".into(),
            rows.to_vec(),
        ))])?;
        Ok(NutritionTable::new("unnamed", frame, None)?)
    }

    #[test]
    fn test_register_renames_and_keeps_order() -> Result<()> {
        let mut builder = Catalog::builder();
        builder
            .register("food", table(&[1.0])?)
            .register("drinks", table(&[2.0])?)
            .register("food", table(&[3.0, 4.0])?);
        let catalog = builder.build();

        assert_eq!(catalog.categories(), vec!["food", "drinks"]);
        assert_eq!(catalog.require("food")?.height(), 2, "overwritten in place");
        Ok(())
    }

    #[test]
    fn test_unknown_category() {
        let catalog = Catalog::builder().build();
        assert!(
            matches!(catalog.require("snacks"), Err(NutriError::UnknownCategory(_))),
            "unregistered category"
        );
    }

    #[test]
    fn test_catalog_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Catalog>();
    }
}
