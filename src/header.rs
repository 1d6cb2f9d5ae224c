use crate::model::{KeyColumns, Token};
use crate::rows::assemble_rows;

pub const DEFAULT_HEADER_CUTOFF: f64 = 150.0;

pub fn detect_header_lines(tokens: &[Token], cutoff: f64) -> Vec<String> {
    let candidates = tokens
        .iter()
        .filter(|token| token.y < cutoff)
        .cloned()
        .collect::<Vec<_>>();

    assemble_rows(&candidates)
        .iter()
        .map(crate::model::Row::line)
        .collect()
}

pub fn select_header_line(lines: &[String]) -> Option<&str> {
    let mut best: Option<(&str, usize)> = None;
    for line in lines {
        let words = line.split_whitespace().count();
        if best.is_none_or(|(_, best_words)| words > best_words) {
            best = Some((line.as_str(), words));
        }
    }
    best.map(|(line, _)| line)
}

pub fn header_from_line(line: &str, key_columns: &KeyColumns) -> Vec<String> {
    let mut header = key_columns.prefix();
    header.extend(line.split_whitespace().skip(2).map(str::to_string));
    header
}

pub fn detect_page_header(
    tokens: &[Token],
    cutoff: f64,
    key_columns: &KeyColumns,
) -> Option<Vec<String>> {
    let lines = detect_header_lines(tokens, cutoff);
    select_header_line(&lines).map(|line| header_from_line(line, key_columns))
}
