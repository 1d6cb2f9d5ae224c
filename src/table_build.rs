use std::collections::HashSet;

use tracing::debug;

use crate::model::{ClassifiedRow, ColumnNaming, JoinKey, Table};

pub fn table_width(rows: &[ClassifiedRow]) -> usize {
    rows.iter().map(ClassifiedRow::width).max().unwrap_or(0)
}

pub fn pad_header(header: &mut Vec<String>, width: usize, naming: ColumnNaming, label: &str) {
    while header.len() < width {
        let position = header.len() + 1;
        header.push(naming.placeholder(label, position));
    }
}

pub(crate) fn normalize_rows(rows: &[Vec<String>], width: usize) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| {
            let mut out = row.clone();
            out.resize(width, String::new());
            out
        })
        .collect()
}

/// Lays classified rows out under `header`.
///
/// The table is as wide as its widest row: a short header is padded with
/// generated names, a long one is cut back, short rows get empty cells.
/// Returns `None` when there are no rows.
pub fn build_table(
    header: &[String],
    rows: &[ClassifiedRow],
    naming: ColumnNaming,
    label: &str,
) -> Option<Table> {
    if rows.is_empty() {
        return None;
    }

    let width = table_width(rows);
    let mut header = header.to_vec();
    pad_header(&mut header, width, naming, label);
    header.truncate(width);

    let cells = rows.iter().map(ClassifiedRow::cells).collect::<Vec<_>>();
    Some(Table {
        header,
        rows: normalize_rows(&cells, width),
    })
}

pub fn dedup_by_key(rows: Vec<ClassifiedRow>, key: JoinKey) -> Vec<ClassifiedRow> {
    let mut seen = HashSet::new();
    let before = rows.len();
    let kept = rows
        .into_iter()
        .filter(|row| seen.insert(key.key_of(row)))
        .collect::<Vec<_>>();
    if kept.len() < before {
        debug!(
            dropped = before - kept.len(),
            "suppressed rows with duplicate keys"
        );
    }
    kept
}
