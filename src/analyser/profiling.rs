//! Numeric profiling of a single nutrient column.
//!
//! All statistics skip missing values. Quantiles use linear interpolation
//! between closest ranks, `std` is the sample standard deviation (ddof = 1).
//! Aggregations run over the stored row order, so repeated calls over the
//! same column produce bit-identical results.

use super::types::ColumnProfile;
use crate::error::Result;
use polars::prelude::*;

pub fn profile_column(ca: &Float64Chunked) -> Result<ColumnProfile> {
    let count = ca.len() - ca.null_count();

    if count == 0 {
        return Ok(ColumnProfile::default());
    }

    let std = if count < 2 { None } else { ca.std(1) };

    Ok(ColumnProfile {
        count,
        mean: ca.mean(),
        median: ca.median(),
        std,
        min: ca.min(),
        max: ca.max(),
        q25: ca.quantile(0.25, QuantileMethod::Linear)?,
        q50: ca.quantile(0.50, QuantileMethod::Linear)?,
        q75: ca.quantile(0.75, QuantileMethod::Linear)?,
        sum: column_sum(ca),
    })
}

/// Sum of the non-missing values, accumulated in row order.
pub fn column_sum(ca: &Float64Chunked) -> f64 {
    ca.into_iter().flatten().sum()
}

/// Round to two decimal places, ties to even.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
