use crate::analyser::Catalog;
use crate::error::Result;
use std::fmt::Write as _;

/// Dump every registered table as CSV, one labelled block per category.
///
/// # Errors
///
/// Returns [`crate::error::NutriError::DataProcessing`] if a table cannot be
/// serialized.
pub fn build_context(catalog: &Catalog) -> Result<String> {
    let mut context = String::new();
    for table in catalog {
        let csv = table.to_csv_string()?;
        let _ = writeln!(context, "{} data:\n{}", table.category(), csv.trim_end());
    }
    tracing::debug!(
        categories = catalog.len(),
        bytes = context.len(),
        "built assistant context"
    );
    Ok(context)
}
