//! Threshold and range filters over nutrient columns.
//!
//! A [`FilterCriterion`] is a nutrient, an operator and an operand. Applying
//! it yields a derived table with the matching rows in their original order
//! and every column kept. Missing values never match.
//!
//! Criteria can be written as short expressions:
//!
//! ```text
//! Calories > 300
//! protein<5
//! Sodium == 0
//! Fat gt 10
//! Calories between 200 400      (also 200..400, 200,400, 200 and 400)
//! ```

use super::catalog::Catalog;
use super::dataset::NutritionTable;
use crate::error::{NutriError, Result};
use polars::prelude::*;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    GreaterThan,
    LessThan,
    Equal,
    Between,
}

impl FilterOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::GreaterThan => ">",
            Self::LessThan => "<",
            Self::Equal => "==",
            Self::Between => "between",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for FilterOperator {
    type Err = NutriError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            ">" | "gt" => Ok(Self::GreaterThan),
            "<" | "lt" => Ok(Self::LessThan),
            "==" | "eq" => Ok(Self::Equal),
            "between" => Ok(Self::Between),
            _ => Err(NutriError::UnsupportedOperator(s.trim().to_owned())),
        }
    }
}

/// A single threshold, or an inclusive `(low, high)` range for `between`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Operand {
    Value(f64),
    Range(f64, f64),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v}"),
            Self::Range(low, high) => write!(f, "{low}..{high}"),
        }
    }
}

/// What to do with an operator outside the four recognized ones.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OperatorPolicy {
    /// Fail with [`NutriError::UnsupportedOperator`].
    #[default]
    Strict,
    /// Return the table unfiltered and log a warning.
    Permissive,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FilterCriterion {
    pub nutrient: String,
    pub operator: FilterOperator,
    pub operand: Operand,
}

impl FilterCriterion {
    /// # Errors
    ///
    /// Returns [`NutriError::InvalidOperand`] if `between` is not given a
    /// range or another operator is given one.
    pub fn new(nutrient: impl Into<String>, operator: FilterOperator, operand: Operand) -> Result<Self> {
        let shape_ok = matches!(
            (operator, operand),
            (FilterOperator::Between, Operand::Range(..))
                | (
                    FilterOperator::GreaterThan | FilterOperator::LessThan | FilterOperator::Equal,
                    Operand::Value(_)
                )
        );
        if !shape_ok {
            return Err(NutriError::InvalidOperand {
                operator: operator.to_string(),
                reason: match operator {
                    FilterOperator::Between => "expected a (low, high) pair".to_owned(),
                    _ => "expected a single number".to_owned(),
                },
            });
        }

        Ok(Self {
            nutrient: nutrient.into(),
            operator,
            operand,
        })
    }

    /// Build a criterion from an operator token such as `">"` or `"between"`.
    ///
    /// # Errors
    ///
    /// Returns [`NutriError::UnsupportedOperator`] for an unknown token and
    /// [`NutriError::InvalidOperand`] for a mismatched operand.
    pub fn parse(nutrient: impl Into<String>, operator: &str, operand: Operand) -> Result<Self> {
        Self::new(nutrient, operator.parse()?, operand)
    }

    /// Parse `NUTRIENT OP NUMBER` or `NUTRIENT between LOW HIGH`.
    ///
    /// # Errors
    ///
    /// Returns [`NutriError::UnsupportedOperator`] for an unknown operator and
    /// [`NutriError::InvalidExpression`] for malformed input.
    pub fn parse_expression(text: &str) -> Result<Self> {
        let FilterExpression {
            nutrient,
            operator,
            operand,
        } = FilterExpression::parse(text)?;
        Self::parse(nutrient, &operator, operand)
    }

    /// Whether a single cell satisfies the criterion. Missing never matches.
    pub fn matches(&self, value: Option<f64>) -> bool {
        let Some(v) = value else {
            return false;
        };
        match (self.operator, self.operand) {
            (FilterOperator::GreaterThan, Operand::Value(x)) => v > x,
            (FilterOperator::LessThan, Operand::Value(x)) => v < x,
            (FilterOperator::Equal, Operand::Value(x)) => v == x,
            (FilterOperator::Between, Operand::Range(low, high)) => low <= v && v <= high,
            _ => false,
        }
    }
}

impl fmt::Display for FilterCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.nutrient, self.operator, self.operand)
    }
}

impl FromStr for FilterCriterion {
    type Err = NutriError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_expression(s)
    }
}

/// A filter expression split into its parts, with the operator token kept
/// as written so an unrecognized one can still go through
/// [`filter_with_policy`].
#[derive(Clone, Debug, PartialEq)]
pub struct FilterExpression {
    pub nutrient: String,
    pub operator: String,
    pub operand: Operand,
}

impl FilterExpression {
    /// # Errors
    ///
    /// Returns [`NutriError::InvalidExpression`] for malformed input and
    /// [`NutriError::UnsupportedOperator`] when an unknown operator is
    /// followed by something other than numbers.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(NutriError::InvalidExpression("empty expression".to_owned()));
        }

        let (nutrient, operator, value) = if let Some(start) = text.find(['<', '>', '=', '!']) {
            let (nutrient, rest) = text.split_at(start);
            let op_len = rest
                .find(|c: char| !matches!(c, '<' | '>' | '=' | '!'))
                .unwrap_or(rest.len());
            let (op, value) = rest.split_at(op_len);
            (nutrient.to_owned(), op.to_owned(), value.to_owned())
        } else {
            let tokens: Vec<&str> = text.split_whitespace().collect();
            let op_index = operator_position(&tokens)
                .ok_or_else(|| NutriError::InvalidExpression(format!("no operator in '{text}'")))?;
            (
                tokens.get(..op_index).unwrap_or_default().join(" "),
                tokens.get(op_index).copied().unwrap_or_default().to_owned(),
                tokens.get(op_index + 1..).unwrap_or_default().join(" "),
            )
        };

        let nutrient = expect_nutrient(&nutrient, text)?;
        let operand = parse_operand(&operator, &value, text)?;
        Ok(Self {
            nutrient,
            operator,
            operand,
        })
    }
}

fn is_word_operator(token: &str) -> bool {
    matches!(
        token.to_ascii_lowercase().as_str(),
        "gt" | "lt" | "eq" | "between"
    )
}

fn looks_numeric(token: &str) -> bool {
    token.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'))
}

/// Index of the operator among whitespace-separated tokens. Nutrient names
/// may span several tokens, so an unknown word is taken to be the token
/// right before the operand.
fn operator_position(tokens: &[&str]) -> Option<usize> {
    if let Some(index) = tokens.iter().skip(1).position(|t| is_word_operator(t)) {
        return Some(index + 1);
    }
    tokens
        .iter()
        .skip(2)
        .position(|t| looks_numeric(t))
        .map(|index| index + 1)
        .or_else(|| tokens.len().checked_sub(2).filter(|&index| index >= 1))
}

fn expect_nutrient(nutrient: &str, text: &str) -> Result<String> {
    let nutrient = nutrient.trim();
    if nutrient.is_empty() {
        return Err(NutriError::InvalidExpression(format!(
            "missing nutrient name in '{text}'"
        )));
    }
    Ok(nutrient.to_owned())
}

fn parse_number(token: &str, text: &str) -> Result<f64> {
    token
        .trim()
        .parse::<f64>()
        .map_err(|e| NutriError::InvalidExpression(format!("'{}' in '{text}': {e}", token.trim())))
}

fn parse_operand(operator: &str, value: &str, text: &str) -> Result<Operand> {
    match operator.parse::<FilterOperator>() {
        Ok(FilterOperator::Between) => parse_range(value, text),
        Ok(_) => Ok(Operand::Value(parse_number(value, text)?)),
        // Unknown operators take whichever operand shape parses.
        Err(unsupported) => match parse_number(value, text) {
            Ok(number) => Ok(Operand::Value(number)),
            Err(_) => parse_range(value, text).or(Err(unsupported)),
        },
    }
}

fn parse_range(value: &str, text: &str) -> Result<Operand> {
    let value = value.trim();
    let parts: Vec<&str> = if value.contains("..") {
        value.split("..").collect()
    } else {
        value
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty() && !t.eq_ignore_ascii_case("and"))
            .collect()
    };

    match parts.as_slice() {
        [low, high] => Ok(Operand::Range(parse_number(low, text)?, parse_number(high, text)?)),
        _ => Err(NutriError::InvalidExpression(format!(
            "'between' needs exactly two bounds in '{text}'"
        ))),
    }
}

/// Rows of `table` satisfying `criterion`.
///
/// `between` bounds are inclusive and never swapped: `low > high` matches
/// nothing.
///
/// # Errors
///
/// Returns [`NutriError::UnknownColumn`] if the nutrient is not a column.
pub fn filter(table: &NutritionTable, criterion: &FilterCriterion) -> Result<NutritionTable> {
    if !table.has_column(&criterion.nutrient) {
        return Err(table.unknown_column(&criterion.nutrient));
    }

    let values = table.values(&criterion.nutrient)?;
    let flags: Vec<bool> = values.into_iter().map(|v| criterion.matches(v)).collect();
    let mask = BooleanChunked::from_slice("mask".into(), &flags);
    let filtered = table.select_rows(&mask)?;

    tracing::debug!(
        category = table.category(),
        criterion = %criterion,
        kept = filtered.height(),
        of = table.height(),
        "filtered dataset"
    );
    Ok(filtered)
}

/// Filter with a raw operator token, honouring `policy` for unknown ones.
///
/// # Errors
///
/// Returns [`NutriError::UnknownColumn`], [`NutriError::InvalidOperand`],
/// or under [`OperatorPolicy::Strict`] [`NutriError::UnsupportedOperator`].
pub fn filter_with_policy(
    table: &NutritionTable,
    nutrient: &str,
    operator: &str,
    operand: Operand,
    policy: OperatorPolicy,
) -> Result<NutritionTable> {
    match FilterCriterion::parse(nutrient, operator, operand) {
        Ok(criterion) => filter(table, &criterion),
        Err(NutriError::UnsupportedOperator(op)) if policy == OperatorPolicy::Permissive => {
            if !table.has_column(nutrient) {
                return Err(table.unknown_column(nutrient));
            }
            tracing::warn!(
                operator = %op,
                category = table.category(),
                "operator not recognized, returning unfiltered dataset"
            );
            Ok(table.clone())
        }
        Err(e) => Err(e),
    }
}

/// Apply one criterion to several categories (all of them by default).
///
/// # Errors
///
/// Returns [`NutriError::UnknownCategory`] for an unregistered category and
/// [`NutriError::UnknownColumn`] if any selected table lacks the nutrient.
pub fn filter_many(
    catalog: &Catalog,
    criterion: &FilterCriterion,
    categories: Option<&[String]>,
) -> Result<Vec<NutritionTable>> {
    match categories {
        Some(names) => names
            .iter()
            .map(|name| filter(catalog.require(name)?, criterion))
            .collect(),
        None => catalog.iter().map(|table| filter(table, criterion)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn calories(values: Vec<Option<f64>>) -> Result<NutritionTable> {
        let items: Vec<String> = (0..values.len()).map(|i| format!("item{i}")).collect();
        let frame = DataFrame::new(vec![
            Column::from(Series::new("Item".into(), items)),
            Column::from(Series::new("Calories".into(), values)),
        ])?;
        Ok(NutritionTable::new("food", frame, Some("Item"))?)
    }

    fn kept(table: &NutritionTable) -> Result<Vec<Option<f64>>> {
        Ok(table.values("Calories")?.into_iter().collect())
    }

    #[test]
    fn test_greater_than() -> Result<()> {
        let table = calories(vec![Some(100.0), Some(300.0), Some(500.0)])?;
        let criterion = FilterCriterion::parse("Calories", ">", Operand::Value(300.0))?;
        assert_eq!(kept(&filter(&table, &criterion)?)?, vec![Some(500.0)]);
        Ok(())
    }

    #[test]
    fn test_between_is_inclusive() -> Result<()> {
        let table = calories(vec![Some(100.0), Some(300.0), Some(500.0)])?;
        let criterion = FilterCriterion::parse("Calories", "between", Operand::Range(200.0, 400.0))?;
        assert_eq!(kept(&filter(&table, &criterion)?)?, vec![Some(300.0)]);

        let edges = FilterCriterion::parse("Calories", "between", Operand::Range(100.0, 300.0))?;
        assert_eq!(kept(&filter(&table, &edges)?)?, vec![Some(100.0), Some(300.0)]);
        Ok(())
    }

    #[test]
    fn test_reversed_range_matches_nothing() -> Result<()> {
        let table = calories(vec![Some(100.0), Some(300.0)])?;
        let criterion = FilterCriterion::parse("Calories", "between", Operand::Range(400.0, 0.0))?;
        assert!(filter(&table, &criterion)?.is_empty(), "bounds are not swapped");
        Ok(())
    }

    #[test]
    fn test_missing_never_matches() -> Result<()> {
        let table = calories(vec![None, Some(5.0)])?;
        let criteria = [
            FilterCriterion::parse("Calories", ">", Operand::Value(f64::MIN))?,
            FilterCriterion::parse("Calories", "<", Operand::Value(f64::MAX))?,
            FilterCriterion::parse("Calories", "==", Operand::Value(5.0))?,
            FilterCriterion::parse("Calories", "between", Operand::Range(f64::MIN, f64::MAX))?,
        ];
        for criterion in &criteria {
            assert_eq!(
                kept(&filter(&table, criterion)?)?,
                vec![Some(5.0)],
                "{criterion} must skip the missing row"
            );
        }
        Ok(())
    }

    #[test]
    fn test_filter_preserves_order_and_columns() -> Result<()> {
        let table = calories(vec![Some(9.0), Some(1.0), Some(7.0)])?;
        let criterion = FilterCriterion::parse("Calories", ">", Operand::Value(2.0))?;
        let result = filter(&table, &criterion)?;
        assert_eq!(kept(&result)?, vec![Some(9.0), Some(7.0)]);
        assert_eq!(result.labels(), Some(vec!["item0".to_owned(), "item2".to_owned()]));
        assert_eq!(result.frame().width(), table.frame().width());
        assert_eq!(table.height(), 3, "source table untouched");
        Ok(())
    }

    #[test]
    fn test_unknown_column() -> Result<()> {
        let table = calories(vec![Some(1.0)])?;
        let criterion = FilterCriterion::parse("Fiber", ">", Operand::Value(5.0))?;
        assert!(
            matches!(filter(&table, &criterion), Err(NutriError::UnknownColumn { column, .. }) if column == "Fiber"),
            "Fiber is not a column"
        );
        Ok(())
    }

    #[test]
    fn test_unsupported_operator_strict_and_permissive() -> Result<()> {
        let table = calories(vec![Some(1.0), Some(2.0)])?;
        let strict = filter_with_policy(&table, "Calories", ">=", Operand::Value(1.0), OperatorPolicy::Strict);
        assert!(
            matches!(strict, Err(NutriError::UnsupportedOperator(ref op)) if op == ">="),
            "strict mode fails loudly"
        );

        let permissive =
            filter_with_policy(&table, "Calories", ">=", Operand::Value(1.0), OperatorPolicy::Permissive)?;
        assert_eq!(permissive.height(), 2, "permissive mode passes the table through");
        Ok(())
    }

    #[test]
    fn test_operand_shape_is_checked() {
        assert!(
            matches!(
                FilterCriterion::parse("Calories", "between", Operand::Value(1.0)),
                Err(NutriError::InvalidOperand { .. })
            ),
            "between needs a range"
        );
        assert!(
            matches!(
                FilterCriterion::parse("Calories", ">", Operand::Range(1.0, 2.0)),
                Err(NutriError::InvalidOperand { .. })
            ),
            "> needs a single value"
        );
    }

    #[test]
    fn test_expression_grammar() -> Result<()> {
        let c: FilterCriterion = "Calories > 300".parse()?;
        assert_eq!(c.operator, FilterOperator::GreaterThan);
        assert_eq!(c.operand, Operand::Value(300.0));

        let c: FilterCriterion = "protein<5".parse()?;
        assert_eq!((c.nutrient.as_str(), c.operator), ("protein", FilterOperator::LessThan));

        let c: FilterCriterion = "Sodium == 0".parse()?;
        assert_eq!(c.operator, FilterOperator::Equal);

        let c: FilterCriterion = "Fat gt 10.5".parse()?;
        assert_eq!(c.operand, Operand::Value(10.5));

        for text in [
            "Calories between 200 400",
            "Calories between 200..400",
            "Calories BETWEEN 200, 400",
            "Calories between 200 and 400",
        ] {
            let c: FilterCriterion = text.parse()?;
            assert_eq!(c.operand, Operand::Range(200.0, 400.0), "{text}");
        }
        Ok(())
    }

    #[test]
    fn test_expression_errors() {
        assert!(
            matches!("Calories >= 3".parse::<FilterCriterion>(), Err(NutriError::UnsupportedOperator(_))),
            ">= is not supported"
        );
        assert!(
            matches!("Calories like 3".parse::<FilterCriterion>(), Err(NutriError::UnsupportedOperator(_))),
            "unknown word operator"
        );
        assert!(
            matches!("Calories > lots".parse::<FilterCriterion>(), Err(NutriError::InvalidExpression(_))),
            "operand must be numeric"
        );
        assert!(
            matches!("Calories".parse::<FilterCriterion>(), Err(NutriError::InvalidExpression(_))),
            "operator is required"
        );
        assert!(
            matches!("> 3".parse::<FilterCriterion>(), Err(NutriError::InvalidExpression(_))),
            "nutrient is required"
        );
        assert!(
            matches!("Calories between 1".parse::<FilterCriterion>(), Err(NutriError::InvalidExpression(_))),
            "between needs two bounds"
        );
    }

    #[test]
    fn test_unknown_word_operator_after_multi_word_nutrient() {
        for (text, expected) in [
            ("Total Fat like 3", "like"),
            ("Total Fat like lots", "like"),
            ("Vitamin B12 within 1 2", "within"),
        ] {
            let result = text.parse::<FilterCriterion>();
            assert!(
                matches!(&result, Err(NutriError::UnsupportedOperator(op)) if op == expected),
                "{text} should name '{expected}', got {result:?}"
            );
        }
    }

    #[test]
    fn test_expression_keeps_raw_operator() -> Result<()> {
        let parts = FilterExpression::parse("Total Fat like 3")?;
        assert_eq!(parts.nutrient, "Total Fat", "nutrient spans the leading tokens");
        assert_eq!(parts.operator, "like", "operator token is kept as written");
        assert_eq!(parts.operand, Operand::Value(3.0), "single operand");

        let parts = FilterExpression::parse("Calories >= 100")?;
        assert_eq!((parts.nutrient.as_str(), parts.operator.as_str()), ("Calories", ">="), "symbolic split");

        let table = calories(vec![Some(1.0), Some(2.0)])?;
        let passed = filter_with_policy(
            &table,
            &parts.nutrient,
            &parts.operator,
            parts.operand,
            OperatorPolicy::Permissive,
        )?;
        assert_eq!(passed.height(), 2, "permissive mode passes the table through");
        Ok(())
    }
}
