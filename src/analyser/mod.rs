//! Statistics and comparison engine for menu nutrition data.
//!
//! ```text
//!   menu CSV
//!      │
//!      ▼
//!  ┌────────┐
//!  │   io   │  decode, parse, normalize headers → NutritionTable
//!  └────────┘
//!      │
//!      ▼
//!  ┌─────────┐
//!  │ catalog │  register once → immutable Catalog
//!  └─────────┘
//!      │
//!      ├──► stats    per-category summary + macro ratios
//!      ├──► compare  category × nutrient records
//!      └──► filter   derived tables
//! ```

pub mod catalog;
pub mod compare;
pub mod dataset;
pub mod filter;
pub mod io;
pub mod naming;
pub mod profiling;
pub mod stats;
pub mod types;

pub use catalog::{Catalog, CatalogBuilder};
pub use compare::{compare, shared_nutrients};
pub use dataset::NutritionTable;
pub use filter::{
    FilterCriterion, FilterExpression, FilterOperator, Operand, OperatorPolicy, filter,
    filter_many, filter_with_policy,
};
pub use io::{LoadOptions, load_table};
pub use stats::descriptive_stats;
pub use types::{
    CategoryComparison, CategoryStats, ColumnProfile, ComparisonMetric, ComparisonRecord,
    ComparisonResult, DescriptiveReport, MetricMatrix, NutrientRatios, Statistic, SummaryTable,
};
