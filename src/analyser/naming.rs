/// Strip unit annotations and stray punctuation from a nutrient header.
///
/// `" Carb. (g)"` becomes `"Carb"`, `"Calories (kcal)"` becomes `"Calories"`.
/// Everything from an opening parenthesis up to its closing one is dropped,
/// together with the whitespace in front of it.
pub fn normalize_column_name(name: &str) -> String {
    let mut clean = String::with_capacity(name.len());
    let mut depth = 0usize;

    for c in name.trim().chars() {
        match c {
            '(' => {
                depth += 1;
                let kept = clean.trim_end().len();
                clean.truncate(kept);
            }
            ')' if depth > 0 => depth -= 1,
            '.' => {}
            _ if depth == 0 => clean.push(c),
            _ => {}
        }
    }

    clean.trim().to_owned()
}

/// Normalize a full header row, suffixing duplicates with `_1`, `_2`, ...
pub fn normalize_column_names(names: &[String]) -> Vec<String> {
    let mut cleaned_names = Vec::with_capacity(names.len());
    let mut seen = std::collections::HashSet::new();

    for name in names {
        let clean_base = normalize_column_name(name);
        let mut clean = clean_base.clone();
        let mut count = 0;

        while seen.contains(&clean) {
            count += 1;
            clean = format!("{clean_base}_{count}");
        }

        seen.insert(clean.clone());
        cleaned_names.push(clean);
    }
    cleaned_names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_units_and_dots() {
        assert_eq!(normalize_column_name(" Carb. (g)"), "Carb");
        assert_eq!(normalize_column_name("Calories (kcal)"), "Calories");
        assert_eq!(normalize_column_name("Fat (g)"), "Fat");
        assert_eq!(normalize_column_name("  Protein  "), "Protein");
    }

    #[test]
    fn test_keeps_text_after_annotation() {
        assert_eq!(normalize_column_name("Sodium (mg) total"), "Sodium total");
    }

    #[test]
    fn test_duplicates_are_suffixed() {
        let names = vec!["Fat (g)".to_owned(), "Fat".to_owned(), "Fat.".to_owned()];
        assert_eq!(normalize_column_names(&names), vec!["Fat", "Fat_1", "Fat_2"]);
    }
}
