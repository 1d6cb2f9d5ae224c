use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::{ClassifiedRow, Row};

static ROW_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]+(?:\.[0-9]+)?$").expect("hardcoded row id regex is valid")
});

static NUMERIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9][0-9,]*\.?[0-9]*$").expect("hardcoded numeric token regex is valid")
});

pub fn is_row_id(token: &str) -> bool {
    ROW_ID_RE.is_match(token)
}

pub fn looks_numeric(token: &str) -> bool {
    NUMERIC_RE.is_match(token)
}

pub fn row_number(row_id: &str) -> Option<f64> {
    if is_row_id(row_id) {
        row_id.parse().ok()
    } else {
        None
    }
}

pub fn compare_row_ids(left: &str, right: &str) -> Ordering {
    match (row_number(left), row_number(right)) {
        (Some(left), Some(right)) => left.total_cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => left.cmp(right),
    }
}

/// Splits ordered row tokens into identifier, label and values.
///
/// Returns `None` when the first token is not a row identifier. Once the first
/// numeric-looking token appears, every later token is a value, including
/// text such as a unit of measure.
pub fn classify_tokens<S: AsRef<str>>(tokens: &[S]) -> Option<ClassifiedRow> {
    let (first, rest) = tokens.split_first()?;
    let row_id = first.as_ref();
    if !is_row_id(row_id) {
        return None;
    }

    let mut label_words = Vec::new();
    let mut values: Vec<String> = Vec::new();
    for token in rest {
        let token = token.as_ref();
        if !values.is_empty() || looks_numeric(token) {
            values.push(token.to_string());
        } else {
            label_words.push(token);
        }
    }

    Some(ClassifiedRow {
        row_id: row_id.to_string(),
        label: label_words.join(" "),
        values,
    })
}

pub fn classify_row(row: &Row) -> Option<ClassifiedRow> {
    let texts = row.texts().collect::<Vec<_>>();
    classify_tokens(&texts)
}

pub fn classify_rows(rows: &[Row]) -> Vec<ClassifiedRow> {
    rows.iter().filter_map(classify_row).collect()
}
