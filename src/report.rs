//! Text rendering of engine results.
//!
//! Every function returns a `String` so the CLI decides where it goes
//! (stdout, a chart file, or both). Missing values render as `NaN` in
//! tables and `n/a` in charts.

use crate::analyser::{
    ColumnProfile, ComparisonMetric, ComparisonResult, DescriptiveReport, NutritionTable,
    Statistic,
};
use crate::error::Result;
use crate::utils::fmt_opt;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

const RULE_WIDTH: usize = 80;
const BAR_CHAR: char = '█';

pub const DESCRIPTIVE_CHART_FILE: &str = "descriptive_stats_bar_chart.txt";
pub const COMPARISON_CHART_FILE: &str = "comparison_stats_bar_chart.txt";

fn banner(out: &mut String, title: &str) {
    let rule = "=".repeat(RULE_WIDTH);
    let _ = write!(out, "\n{rule}\n{title}\n{rule}\n");
}

fn section(out: &mut String, title: &str) {
    let rule = "-".repeat(RULE_WIDTH);
    let _ = write!(out, "\n{rule}\n{title}\n{rule}\n");
}

/// Plain-text grid: first column left-aligned, the rest right-aligned.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let mut out = String::new();
    let mut push_row = |cells: &[String]| {
        let line: Vec<String> = cells
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (cell, &w))| {
                if i == 0 {
                    format!("{cell:<w$}")
                } else {
                    format!("{cell:>w$}")
                }
            })
            .collect();
        let _ = writeln!(out, "{}", line.join("  ").trim_end());
    };

    push_row(headers);
    for row in rows {
        push_row(row.as_slice());
    }
    out
}

fn format_metric(metric: ComparisonMetric, value: Option<f64>) -> String {
    match (metric, value) {
        (ComparisonMetric::Count, Some(v)) => format!("{v:.0}"),
        _ => fmt_opt(value),
    }
}

fn profile_metric(profile: &ColumnProfile, metric: ComparisonMetric) -> Option<f64> {
    match metric {
        ComparisonMetric::Count => Some(profile.count as f64),
        ComparisonMetric::Mean => profile.mean,
        ComparisonMetric::Median => profile.median,
        ComparisonMetric::Std => profile.std,
        ComparisonMetric::Min => profile.min,
        ComparisonMetric::Max => profile.max,
        ComparisonMetric::Q25 => profile.q25,
        ComparisonMetric::Q50 => profile.q50,
        ComparisonMetric::Q75 => profile.q75,
    }
}

/// Per-category summary tables and macro ratios.
pub fn render_descriptive(report: &DescriptiveReport) -> String {
    if report.is_empty() {
        return "No data to display.\n".to_owned();
    }

    let mut out = String::new();
    for stats in &report.categories {
        banner(
            &mut out,
            &format!("{} DESCRIPTIVE STATISTICS", stats.category.to_uppercase()),
        );

        out.push_str("\nBasic Statistics:\n");
        if stats.summary.is_empty() {
            out.push_str("  (no numeric columns)\n");
        } else {
            let headers: Vec<String> = std::iter::once(String::new())
                .chain(stats.summary.column_names().map(str::to_owned))
                .collect();
            let rows: Vec<Vec<String>> = Statistic::ALL
                .iter()
                .map(|&stat| {
                    std::iter::once(stat.as_str().to_owned())
                        .chain(
                            stats
                                .summary
                                .columns
                                .iter()
                                .map(|(_, profile)| fmt_opt(profile.statistic(stat))),
                        )
                        .collect()
                })
                .collect();
            out.push_str(&render_table(&headers, &rows));
        }

        out.push_str("\nRatios:\n");
        match &stats.ratios {
            Some(ratios) => {
                for (name, value) in ratios.entries() {
                    let _ = writeln!(out, "  {name:<16}: {value:.2}");
                }
            }
            None => out.push_str("  (requires Fat, Protein and Carb columns)\n"),
        }
    }
    out
}

/// One nutrient × category matrix per requested metric. An empty `metrics`
/// slice renders all nine.
pub fn render_comparison(result: &ComparisonResult, metrics: &[ComparisonMetric]) -> String {
    if result.categories.is_empty() {
        return "No comparison data to display.\n".to_owned();
    }
    let metrics = if metrics.is_empty() {
        &ComparisonMetric::ALL[..]
    } else {
        metrics
    };

    let mut out = String::new();
    banner(&mut out, "DATASETS COMPARISON");

    for &metric in metrics {
        let matrix = result.matrix(metric);
        section(
            &mut out,
            &format!("{} COMPARISON", metric.as_str().to_uppercase()),
        );

        let headers: Vec<String> = std::iter::once(String::new())
            .chain(matrix.categories.iter().cloned())
            .collect();
        let rows: Vec<Vec<String>> = matrix
            .nutrients
            .iter()
            .enumerate()
            .map(|(n, nutrient)| {
                std::iter::once(nutrient.clone())
                    .chain((0..matrix.categories.len()).map(|c| format_metric(metric, matrix.get(c, n))))
                    .collect()
            })
            .collect();
        out.push_str(&render_table(&headers, &rows));
    }
    out.push('\n');
    out
}

/// A group of labelled bars sharing one heading.
struct BarGroup {
    heading: String,
    bars: Vec<(String, Option<f64>)>,
}

/// Horizontal bar chart scaled so the largest magnitude fills `width`.
fn render_bar_chart(title: &str, groups: &[BarGroup], width: usize) -> String {
    let peak = groups
        .iter()
        .flat_map(|g| g.bars.iter().filter_map(|(_, v)| *v))
        .filter(|v| v.is_finite())
        .fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let label_width = groups
        .iter()
        .flat_map(|g| g.bars.iter().map(|(label, _)| label.chars().count()))
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}", "-".repeat(title.chars().count()));

    for group in groups {
        let _ = writeln!(out, "{}", group.heading);
        for (label, value) in &group.bars {
            match value {
                Some(v) if v.is_finite() => {
                    let len = if peak > 0.0 {
                        ((v.abs() / peak) * width as f64).round() as usize
                    } else {
                        0
                    };
                    let bar: String = std::iter::repeat_n(BAR_CHAR, len).collect();
                    let _ = writeln!(out, "  {label:<label_width$} |{bar} {}", fmt_opt(Some(*v)));
                }
                _ => {
                    let _ = writeln!(out, "  {label:<label_width$} | n/a");
                }
            }
        }
    }
    out
}

/// One chart per category: a bar group per nutrient, a bar per metric.
pub fn render_descriptive_chart(
    report: &DescriptiveReport,
    metrics: &[ComparisonMetric],
    width: usize,
) -> String {
    let metric_names: Vec<&str> = metrics.iter().map(|m| m.as_str()).collect();
    let mut out = String::new();
    for stats in &report.categories {
        let groups: Vec<BarGroup> = stats
            .summary
            .columns
            .iter()
            .map(|(nutrient, profile)| BarGroup {
                heading: nutrient.clone(),
                bars: metrics
                    .iter()
                    .map(|&m| (m.as_str().to_owned(), profile_metric(profile, m)))
                    .collect(),
            })
            .collect();
        let title = format!(
            "{} descriptive statistics ({})",
            stats.category,
            metric_names.join(", ")
        );
        out.push_str(&render_bar_chart(&title, &groups, width));
        out.push('\n');
    }
    out
}

/// One chart per metric: a bar group per nutrient, a bar per category.
pub fn render_comparison_chart(
    result: &ComparisonResult,
    metrics: &[ComparisonMetric],
    width: usize,
) -> String {
    let mut out = String::new();
    for &metric in metrics {
        let matrix = result.matrix(metric);
        let groups: Vec<BarGroup> = matrix
            .nutrients
            .iter()
            .enumerate()
            .map(|(n, nutrient)| BarGroup {
                heading: nutrient.clone(),
                bars: matrix
                    .categories
                    .iter()
                    .enumerate()
                    .map(|(c, category)| (category.clone(), matrix.get(c, n)))
                    .collect(),
            })
            .collect();
        let title = format!("{} comparison", metric.as_str().to_uppercase());
        out.push_str(&render_bar_chart(&title, &groups, width));
        out.push('\n');
    }
    out
}

fn column_cells(table: &NutritionTable, name: &str) -> Result<Vec<String>> {
    let column = table.frame().column(name)?;
    if column.dtype().is_primitive_numeric() {
        let values = table.values(name)?;
        return Ok(values.into_iter().map(fmt_opt).collect());
    }
    let text = column.as_materialized_series().cast(&polars::prelude::DataType::String)?;
    Ok(text
        .str()?
        .into_iter()
        .map(|v| v.map_or_else(|| "NaN".to_owned(), str::to_owned))
        .collect())
}

/// A filtered table followed by its row count.
///
/// # Errors
///
/// Returns [`crate::error::NutriError::DataProcessing`] if a column cannot
/// be read as text.
pub fn render_filtered(table: &NutritionTable) -> Result<String> {
    let names: Vec<String> = table
        .frame()
        .get_column_names()
        .into_iter()
        .map(|n| n.to_string())
        .collect();
    let columns = names
        .iter()
        .map(|name| column_cells(table, name))
        .collect::<Result<Vec<_>>>()?;
    let rows: Vec<Vec<String>> = (0..table.height())
        .map(|r| columns.iter().map(|col| col[r].clone()).collect())
        .collect();

    let mut out = String::new();
    banner(&mut out, "FILTERED RESULTS:");
    out.push('\n');
    if rows.is_empty() {
        out.push_str("(no matching rows)\n");
    } else {
        out.push_str(&render_table(&names, &rows));
    }
    let _ = writeln!(out, "\nTotal rows after filtering: {}", table.height());
    Ok(out)
}

/// Write a rendered chart under `dir`, creating it if needed.
///
/// # Errors
///
/// Returns [`crate::error::NutriError::Io`] if the directory or file cannot
/// be written.
pub fn save_chart(dir: &Path, file_name: &str, contents: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    std::fs::write(&path, contents)?;
    tracing::info!(path = %path.display(), "saved chart");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyser::{Catalog, FilterCriterion, filter};
    use anyhow::Result;
    use polars::prelude::*;

    fn table(category: &str, columns: Vec<Series>) -> Result<NutritionTable> {
        let frame = DataFrame::new(columns.into_iter().map(Column::from).collect())?;
        Ok(NutritionTable::new(category, frame, Some("Item"))?)
    }

    fn catalog() -> Result<Catalog> {
        let food = table(
            "food",
            vec![
                Series::new("Item".into(), vec!["Scone", "Bagel"]),
                Series::new("Calories".into(), vec![480.0, 300.0]),
                Series::new("Fat".into(), vec![2.0, 4.0]),
                Series::new("Protein".into(), vec![1.0, 1.0]),
                Series::new("Carb".into(), vec![1.0, 3.0]),
            ],
        )?;
        let drinks = table(
            "drinks",
            vec![
                Series::new("Item".into(), vec!["Latte", "Tea"]),
                Series::new("Calories".into(), vec![Some(190.0), None]),
            ],
        )?;
        let mut builder = Catalog::builder();
        builder.register("food", food).register("drinks", drinks);
        Ok(builder.build())
    }

    #[test]
    fn test_render_table_aligns_columns() {
        let headers = vec![String::new(), "Calories".to_owned()];
        let rows = vec![
            vec!["mean".to_owned(), "5.00".to_owned()],
            vec!["max".to_owned(), "100.00".to_owned()],
        ];
        let text = render_table(&headers, &rows);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["      Calories", "mean      5.00", "max     100.00"]);
    }

    #[test]
    fn test_descriptive_lists_ratios_only_when_present() -> Result<()> {
        let report = catalog()?.descriptive_stats()?;
        let text = render_descriptive(&report);
        assert!(text.contains("FOOD DESCRIPTIVE STATISTICS"), "{text}");
        assert!(text.contains("DRINKS DESCRIPTIVE STATISTICS"), "{text}");
        assert!(text.contains("  fat_to_protein  : 3.00"), "{text}");
        assert!(text.contains("  carb_to_fat     : 0.67"), "{text}");
        assert!(text.contains("(requires Fat, Protein and Carb columns)"), "{text}");
        Ok(())
    }

    #[test]
    fn test_empty_report_message() {
        assert_eq!(
            render_descriptive(&DescriptiveReport::default()),
            "No data to display.\n"
        );
    }

    #[test]
    fn test_comparison_sections_per_metric() -> Result<()> {
        let result = catalog()?.compare(None)?;
        let text = render_comparison(&result, &[ComparisonMetric::Mean, ComparisonMetric::Count]);
        assert!(text.contains("DATASETS COMPARISON"), "{text}");
        assert!(text.contains("MEAN COMPARISON"), "{text}");
        assert!(text.contains("COUNT COMPARISON"), "{text}");
        assert!(!text.contains("MAX COMPARISON"), "only requested metrics");
        assert!(text.contains("390.00"), "food mean calories: {text}");
        Ok(())
    }

    #[test]
    fn test_comparison_chart_marks_missing() -> Result<()> {
        let result = catalog()?.compare(Some(&["Calories".to_owned(), "Fat".to_owned()]))?;
        let chart = render_comparison_chart(&result, &[ComparisonMetric::Mean], 10);
        assert!(chart.contains("MEAN comparison"), "{chart}");
        assert!(chart.contains("n/a"), "drinks has no Fat: {chart}");
        let full_bar: String = std::iter::repeat_n(BAR_CHAR, 10).collect();
        assert!(chart.contains(&full_bar), "peak value fills the width: {chart}");
        Ok(())
    }

    #[test]
    fn test_descriptive_chart_has_bar_per_metric() -> Result<()> {
        let report = catalog()?.descriptive_stats()?;
        let chart = render_descriptive_chart(
            &report,
            &[ComparisonMetric::Mean, ComparisonMetric::Max],
            20,
        );
        assert!(chart.contains("food descriptive statistics (mean, max)"), "{chart}");
        assert!(chart.contains("  mean |"), "{chart}");
        assert!(chart.contains("  max  |"), "{chart}");
        Ok(())
    }

    #[test]
    fn test_filtered_shows_rows_and_count() -> Result<()> {
        let catalog = catalog()?;
        let food = catalog.require("food")?;
        let filtered = filter(food, &"Calories > 400".parse::<FilterCriterion>()?)?;
        let text = render_filtered(&filtered)?;
        assert!(text.contains("FILTERED RESULTS:"), "{text}");
        assert!(text.contains("Scone"), "{text}");
        assert!(!text.contains("Bagel"), "{text}");
        assert!(text.contains("Total rows after filtering: 1"), "{text}");
        Ok(())
    }

    #[test]
    fn test_save_chart_creates_directory() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let target = dir.path().join("charts");
        let path = save_chart(&target, COMPARISON_CHART_FILE, "chart")?;
        assert_eq!(std::fs::read_to_string(path)?, "chart");
        Ok(())
    }
}
