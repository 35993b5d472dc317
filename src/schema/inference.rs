// Column type inference
// Every value in a column has to fit the chosen type. A missing or empty cell
// makes the column TEXT straight away.

use super::ColumnType;
use crate::tabular::RawTable;

/// Narrowest type that fits every row's cell at `column`.
///
/// The boolean and numeric candidates are tracked independently and the
/// survivors are checked in the order BOOLEAN, INTEGER, FLOAT. Only unsigned
/// digit strings count as numbers: `-1`, `1e5` and `1,5` are TEXT.
/// With no rows at all every candidate survives and the result is BOOLEAN.
pub fn infer(rows: &[Vec<String>], column: usize) -> ColumnType {
    let mut is_bool = true;
    let mut is_int = true;
    let mut is_float = true;

    for row in rows {
        let value = match row.get(column) {
            Some(cell) => cell.trim(),
            None => return ColumnType::Text,
        };

        if value.is_empty() {
            return ColumnType::Text;
        }

        is_bool = is_bool && (value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false"));
        is_int = is_int && is_digits(value);
        is_float = is_float && is_decimal(value);
    }

    if is_bool {
        ColumnType::Boolean
    } else if is_int {
        ColumnType::Integer
    } else if is_float {
        ColumnType::Float
    } else {
        ColumnType::Text
    }
}

/// Types for every header position of a table
pub fn infer_all(table: &RawTable) -> Vec<ColumnType> {
    (0..table.headers.len())
        .map(|column| infer(&table.rows, column))
        .collect()
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// `digits` or `digits.digits`
fn is_decimal(s: &str) -> bool {
    match s.split_once('.') {
        Some((whole, fraction)) => is_digits(whole) && is_digits(fraction),
        None => is_digits(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(values: &[&str]) -> Vec<Vec<String>> {
        values.iter().map(|v| vec![v.to_string()]).collect()
    }

    #[test]
    fn test_all_digits_is_integer() {
        assert_eq!(infer(&column(&["1", "20", "007"]), 0), ColumnType::Integer);
    }

    #[test]
    fn test_one_decimal_makes_float() {
        assert_eq!(infer(&column(&["1", "2.5", "3"]), 0), ColumnType::Float);
    }

    #[test]
    fn test_one_empty_cell_makes_text() {
        assert_eq!(infer(&column(&["1", "", "3"]), 0), ColumnType::Text);
        assert_eq!(infer(&column(&["true", "  "]), 0), ColumnType::Text);
    }

    #[test]
    fn test_booleans_any_case() {
        assert_eq!(infer(&column(&["true", "FALSE", "True"]), 0), ColumnType::Boolean);
        assert_eq!(infer(&column(&["true", "yes"]), 0), ColumnType::Text);
        assert_eq!(infer(&column(&["true", "1"]), 0), ColumnType::Text);
    }

    #[test]
    fn test_signs_exponents_and_separators_are_text() {
        assert_eq!(infer(&column(&["-1", "2"]), 0), ColumnType::Text);
        assert_eq!(infer(&column(&["1e5"]), 0), ColumnType::Text);
        assert_eq!(infer(&column(&["1,5"]), 0), ColumnType::Text);
        assert_eq!(infer(&column(&["1."]), 0), ColumnType::Text);
        assert_eq!(infer(&column(&[".5"]), 0), ColumnType::Text);
        assert_eq!(infer(&column(&["1.2.3"]), 0), ColumnType::Text);
    }

    #[test]
    fn test_short_row_makes_text() {
        let rows = vec![vec!["1".to_string(), "2".to_string()], vec!["3".to_string()]];
        assert_eq!(infer(&rows, 0), ColumnType::Integer);
        assert_eq!(infer(&rows, 1), ColumnType::Text);
    }

    #[test]
    fn test_no_rows_is_boolean() {
        assert_eq!(infer(&[], 0), ColumnType::Boolean);
    }

    #[test]
    fn test_infer_all() {
        let table = RawTable {
            headers: vec!["a".into(), "b".into(), "c".into()],
            rows: vec![vec!["1".into(), "2.5".into(), "x".into()]],
        };
        assert_eq!(
            infer_all(&table),
            vec![ColumnType::Integer, ColumnType::Float, ColumnType::Text]
        );
    }
}
