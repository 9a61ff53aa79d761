use std::collections::HashMap;

/// One spreadsheet row, already stripped of the header.
pub type Row = Vec<String>;

// Column positions are contractual: the remote sheets are not under our
// control, so these indices must match the external layout exactly.
pub const APPLICANT_NAME_COL: usize = 1;
pub const MENTOR_MARKER_COL: usize = 20;
pub const MENTOR_MARKER_OK: &str = "ok";
pub const MENTOR_CATEGORY_COL: usize = 5;
pub const MENTOR_CANDIDATE_COL: usize = 2;
pub const INTERVIEW_ASSIGNED_COL: usize = 1;
pub const INTERVIEW_RECEIVED_COL: usize = 2;

/// Cell access that treats rows shorter than the wanted column as empty.
/// A malformed row is "no match" for every filter, never an error.
pub fn cell(row: &[String], col: usize) -> Option<&str> {
    row.get(col).map(String::as_str)
}

/// Rows where any cell contains the needle (case-insensitive).
pub fn filter_any_column<'a>(rows: &'a [Row], needle: &str) -> Vec<&'a Row> {
    let needle = needle.to_lowercase();
    rows.iter()
        .filter(|row| row.iter().any(|c| c.to_lowercase().contains(&needle)))
        .collect()
}

/// Rows where the given column contains the needle (case-insensitive).
pub fn filter_column_contains<'a>(rows: &'a [Row], col: usize, needle: &str) -> Vec<&'a Row> {
    let needle = needle.to_lowercase();
    rows.iter()
        .filter(|row| {
            cell(row, col).is_some_and(|c| c.to_lowercase().contains(&needle))
        })
        .collect()
}

/// Rows where the given column equals the value after trimming, ignoring case.
pub fn filter_column_equals<'a>(rows: &'a [Row], col: usize, value: &str) -> Vec<&'a Row> {
    let value = value.trim().to_lowercase();
    rows.iter()
        .filter(|row| cell(row, col).is_some_and(|c| c.trim().to_lowercase() == value))
        .collect()
}

/// The complement of `filter_column_equals` over well-formed rows; rows
/// without the column match neither filter.
pub fn filter_column_not_equals<'a>(rows: &'a [Row], col: usize, value: &str) -> Vec<&'a Row> {
    let value = value.trim().to_lowercase();
    rows.iter()
        .filter(|row| cell(row, col).is_some_and(|c| c.trim().to_lowercase() != value))
        .collect()
}

/// Rows whose given column is present and non-blank.
pub fn filter_column_nonempty(rows: &[Row], col: usize) -> Vec<&Row> {
    rows.iter()
        .filter(|row| cell(row, col).is_some_and(|c| !c.trim().is_empty()))
        .collect()
}

/// First row per key-column value, in original order. Keys compare exactly
/// (case-sensitive); rows without the key column are dropped.
pub fn first_occurrences(rows: &[Row], key_col: usize) -> Vec<&Row> {
    let mut seen = std::collections::HashSet::new();
    rows.iter()
        .filter(|row| match cell(row, key_col) {
            Some(key) => seen.insert(key.to_string()),
            None => false,
        })
        .collect()
}

/// The combined applications search: a row matches when `any_needle` appears
/// in any cell or `name_needle` appears in the name column. Both empty means
/// the full set.
pub fn search_applications<'a>(
    rows: &'a [Row],
    any_needle: &str,
    name_needle: &str,
) -> Vec<&'a Row> {
    let any_needle = any_needle.trim().to_lowercase();
    let name_needle = name_needle.trim().to_lowercase();
    if any_needle.is_empty() && name_needle.is_empty() {
        return rows.iter().collect();
    }
    rows.iter()
        .filter(|row| {
            let any_hit = !any_needle.is_empty()
                && row.iter().any(|c| c.to_lowercase().contains(&any_needle));
            let name_hit = !name_needle.is_empty()
                && cell(row, APPLICANT_NAME_COL)
                    .is_some_and(|c| c.to_lowercase().contains(&name_needle));
            any_hit || name_hit
        })
        .collect()
}

/// Key values that occur more than once across the union of all sources.
/// Two rows with the same key in one source count the same as one row in
/// each of two sources.
fn repeated_keys(sources: &[&[Row]], key_col: usize) -> std::collections::HashSet<String> {
    let mut counts: HashMap<&str, u32> = HashMap::new();
    let mut repeated = std::collections::HashSet::new();
    for source in sources {
        for row in *source {
            if let Some(key) = cell(row, key_col) {
                let n = counts.entry(key).or_insert(0);
                *n += 1;
                if *n == 2 {
                    repeated.insert(key.to_string());
                }
            }
        }
    }
    repeated
}

/// Every row whose key occurs in more than one place across the sources,
/// first occurrence onward, source order then row order preserved.
pub fn repeated_rows(sources: &[&[Row]], key_col: usize) -> Vec<Row> {
    let repeated = repeated_keys(sources, key_col);
    let mut out = Vec::new();
    for source in sources {
        for row in *source {
            if cell(row, key_col).is_some_and(|key| repeated.contains(key)) {
                out.push(row.clone());
            }
        }
    }
    out
}

/// Distinct trimmed values of a column, sorted. Blank values are skipped.
pub fn distinct_column_values(rows: &[Row], col: usize) -> Vec<String> {
    let mut values: Vec<String> = rows
        .iter()
        .filter_map(|row| cell(row, col))
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    values.sort();
    values.dedup();
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn any_column_filter_is_case_insensitive() {
        let rows = vec![row(&["1", "Ada Lovelace", "x"]), row(&["2", "Grace", "y"])];
        let hits = filter_any_column(&rows, "lovelace");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0][1], "Ada Lovelace");
    }

    #[test]
    fn column_filter_skips_short_rows() {
        let rows = vec![row(&["only one cell"]), row(&["1", "Ada"])];
        let hits = filter_column_contains(&rows, 1, "ada");
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn equality_filter_trims_and_ignores_case() {
        let rows = vec![
            row(&["a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p", "q", "r", "s", "t", " OK "]),
            row(&["a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p", "q", "r", "s", "t", "no"]),
            row(&["short"]),
        ];
        assert_eq!(filter_column_equals(&rows, MENTOR_MARKER_COL, "ok").len(), 1);
        // the short row has no marker column at all, so it matches neither
        assert_eq!(filter_column_not_equals(&rows, MENTOR_MARKER_COL, "ok").len(), 1);
    }

    #[test]
    fn nonempty_filter_ignores_whitespace_cells() {
        let rows = vec![
            row(&["p1", "mentor a"]),
            row(&["p2", "   "]),
            row(&["p3"]),
        ];
        let hits = filter_column_nonempty(&rows, INTERVIEW_ASSIGNED_COL);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0][0], "p1");
    }

    #[test]
    fn first_occurrences_keeps_first_row_per_key() {
        let rows = vec![
            row(&["1", "X", "a"]),
            row(&["2", "Y", "b"]),
            row(&["3", "X", "c"]),
        ];
        let unique = first_occurrences(&rows, APPLICANT_NAME_COL);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0][2], "a");
        assert_eq!(unique[1][1], "Y");
    }

    #[test]
    fn first_occurrences_is_case_sensitive() {
        let rows = vec![row(&["1", "x"]), row(&["2", "X"])];
        assert_eq!(first_occurrences(&rows, 1).len(), 2);
    }

    #[test]
    fn combined_search_matches_either_needle() {
        let rows = vec![
            row(&["1", "Ada", "math"]),
            row(&["2", "Grace", "compilers"]),
            row(&["3", "Edsger", "graphs"]),
        ];
        let hits = search_applications(&rows, "compilers", "ada");
        assert_eq!(hits.len(), 2);
        assert!(search_applications(&rows, "", "").len() == 3);
    }

    #[test]
    fn repeated_rows_across_two_of_three_sources() {
        // name "X" appears in source 1 and 2 but not 3; unique names excluded
        let current = vec![row(&["1", "X"]), row(&["2", "Solo"])];
        let cohort1 = vec![row(&["3", "X"]), row(&["4", "Other"])];
        let cohort2 = vec![row(&["5", "Third"])];
        let out = repeated_rows(
            &[&current, &cohort1, &cohort2],
            APPLICANT_NAME_COL,
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out[0][0], "1");
        assert_eq!(out[1][0], "3");
    }

    #[test]
    fn repeated_rows_counts_duplicates_within_one_source() {
        let current = vec![row(&["1", "X"]), row(&["2", "X"])];
        let empty: Vec<Row> = Vec::new();
        let out = repeated_rows(&[&current, &empty, &empty], APPLICANT_NAME_COL);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn repeated_rows_ignores_short_rows() {
        let current = vec![row(&["no name"]), row(&["1", "X"])];
        let cohort1 = vec![row(&["2", "X"])];
        let out = repeated_rows(&[&current, &cohort1], APPLICANT_NAME_COL);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn distinct_values_are_sorted_and_deduped() {
        let rows = vec![
            row(&["a", "b", "c", "d", "e", "backend"]),
            row(&["a", "b", "c", "d", "e", " ai "]),
            row(&["a", "b", "c", "d", "e", "backend"]),
            row(&["short"]),
        ];
        assert_eq!(
            distinct_column_values(&rows, MENTOR_CATEGORY_COL),
            vec!["ai".to_string(), "backend".to_string()]
        );
    }
}
