use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::NutriError;

/// Row names of a descriptive summary table, in display order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Statistic {
    Count,
    Mean,
    Std,
    Min,
    Q25,
    Q50,
    Q75,
    Max,
}

impl Statistic {
    pub const ALL: [Self; 8] = [
        Self::Count,
        Self::Mean,
        Self::Std,
        Self::Min,
        Self::Q25,
        Self::Q50,
        Self::Q75,
        Self::Max,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Mean => "mean",
            Self::Std => "std",
            Self::Min => "min",
            Self::Q25 => "25%",
            Self::Q50 => "50%",
            Self::Q75 => "75%",
            Self::Max => "max",
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-column sample statistics over the non-missing values.
///
/// `std` is `None` with fewer than two values; every other field is `None`
/// only when the column has no values at all.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub count: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub q25: Option<f64>,
    pub q50: Option<f64>,
    pub q75: Option<f64>,
    pub sum: f64,
}

impl ColumnProfile {
    pub fn statistic(&self, stat: Statistic) -> Option<f64> {
        match stat {
            Statistic::Count => Some(self.count as f64),
            Statistic::Mean => self.mean,
            Statistic::Std => self.std,
            Statistic::Min => self.min,
            Statistic::Q25 => self.q25,
            Statistic::Q50 => self.q50,
            Statistic::Q75 => self.q75,
            Statistic::Max => self.max,
        }
    }
}

/// `describe()`-style table: one profile per numeric column, in column order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryTable {
    pub columns: Vec<(String, ColumnProfile)>,
}

impl SummaryTable {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn profile(&self, column: &str) -> Option<&ColumnProfile> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, profile)| profile)
    }

    pub fn value(&self, stat: Statistic, column: &str) -> Option<f64> {
        self.profile(column).and_then(|p| p.statistic(stat))
    }

    pub fn count(&self, column: &str) -> Option<usize> {
        self.profile(column).map(|p| p.count)
    }
}

/// Ratios of column totals across a whole category.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NutrientRatios {
    pub fat_to_protein: f64,
    pub protein_to_carb: f64,
    pub carb_to_fat: f64,
}

impl NutrientRatios {
    pub fn entries(&self) -> [(&'static str, f64); 3] {
        [
            ("fat_to_protein", self.fat_to_protein),
            ("protein_to_carb", self.protein_to_carb),
            ("carb_to_fat", self.carb_to_fat),
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category: String,
    pub summary: SummaryTable,
    /// Present only when Fat, Protein and Carb all exist.
    pub ratios: Option<NutrientRatios>,
}

/// Output of `descriptive_stats`, one entry per category in registration order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveReport {
    pub categories: Vec<CategoryStats>,
}

impl DescriptiveReport {
    pub fn get(&self, category: &str) -> Option<&CategoryStats> {
        self.categories.iter().find(|c| c.category == category)
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// The nine comparison fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonMetric {
    Count,
    Mean,
    Median,
    Std,
    Min,
    Max,
    #[serde(rename = "25%")]
    Q25,
    #[serde(rename = "50%")]
    Q50,
    #[serde(rename = "75%")]
    Q75,
}

impl ComparisonMetric {
    pub const ALL: [Self; 9] = [
        Self::Count,
        Self::Mean,
        Self::Median,
        Self::Std,
        Self::Min,
        Self::Max,
        Self::Q25,
        Self::Q50,
        Self::Q75,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Std => "std",
            Self::Min => "min",
            Self::Max => "max",
            Self::Q25 => "25%",
            Self::Q50 => "50%",
            Self::Q75 => "75%",
        }
    }
}

impl fmt::Display for ComparisonMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComparisonMetric {
    type Err = NutriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == wanted)
            .or(match wanted.as_str() {
                "q25" | "p25" => Some(Self::Q25),
                "q50" | "p50" => Some(Self::Q50),
                "q75" | "p75" => Some(Self::Q75),
                _ => None,
            })
            .ok_or_else(|| NutriError::Other(format!("Unknown comparison metric '{s}'")))
    }
}

/// Fixed-shape comparison record. `None` means missing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRecord {
    pub count: Option<usize>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub q25: Option<f64>,
    pub q50: Option<f64>,
    pub q75: Option<f64>,
}

impl ComparisonRecord {
    /// All nine fields missing.
    pub fn missing() -> Self {
        Self::default()
    }

    pub fn is_missing(&self) -> bool {
        *self == Self::missing()
    }

    pub fn metric(&self, metric: ComparisonMetric) -> Option<f64> {
        match metric {
            ComparisonMetric::Count => self.count.map(|c| c as f64),
            ComparisonMetric::Mean => self.mean,
            ComparisonMetric::Median => self.median,
            ComparisonMetric::Std => self.std,
            ComparisonMetric::Min => self.min,
            ComparisonMetric::Max => self.max,
            ComparisonMetric::Q25 => self.q25,
            ComparisonMetric::Q50 => self.q50,
            ComparisonMetric::Q75 => self.q75,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryComparison {
    pub category: String,
    pub nutrients: BTreeMap<String, ComparisonRecord>,
}

/// Output of `compare`: every category has a record for every nutrient.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Working nutrient set, in the order used for rendering.
    pub nutrients: Vec<String>,
    pub categories: Vec<CategoryComparison>,
}

impl ComparisonResult {
    pub fn record(&self, category: &str, nutrient: &str) -> Option<&ComparisonRecord> {
        self.categories
            .iter()
            .find(|c| c.category == category)
            .and_then(|c| c.nutrients.get(nutrient))
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.category.as_str())
    }

    /// Category × nutrient matrix of a single metric.
    pub fn matrix(&self, metric: ComparisonMetric) -> MetricMatrix {
        let values = self
            .categories
            .iter()
            .map(|c| {
                self.nutrients
                    .iter()
                    .map(|n| c.nutrients.get(n).and_then(|r| r.metric(metric)))
                    .collect()
            })
            .collect();

        MetricMatrix {
            metric,
            categories: self.categories.iter().map(|c| c.category.clone()).collect(),
            nutrients: self.nutrients.clone(),
            values,
        }
    }
}

/// `values[category][nutrient]`, aligned with `categories` and `nutrients`.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricMatrix {
    pub metric: ComparisonMetric,
    pub categories: Vec<String>,
    pub nutrients: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl MetricMatrix {
    pub fn get(&self, category: usize, nutrient: usize) -> Option<f64> {
        self.values
            .get(category)
            .and_then(|row| row.get(nutrient))
            .copied()
            .flatten()
    }
}
