//! Positional row grouping.
//!
//! Tokens are bucketed by their vertical offset rounded to one decimal place.
//! There is no tolerance window: two tokens whose offsets straddle a rounding
//! boundary land in different rows even when they are closer than 0.05 apart.

use std::collections::BTreeMap;

use crate::model::{Row, Token};

/// Bucket key for a vertical offset, in tenths of a unit.
///
/// Rounds the exact binary value to one decimal (half to even), so `100.35`,
/// stored just below the half, lands in `1003`.
#[allow(clippy::cast_possible_truncation)]
pub fn row_bucket(y: f64) -> i64 {
    format!("{y:.1}")
        .replace('.', "")
        .parse()
        .unwrap_or_else(|_| (y * 10.0).round_ties_even() as i64)
}

pub fn assemble_rows(tokens: &[Token]) -> Vec<Row> {
    let mut buckets: BTreeMap<i64, Vec<Token>> = BTreeMap::new();
    for token in tokens {
        buckets
            .entry(row_bucket(token.y))
            .or_default()
            .push(token.clone());
    }

    buckets
        .into_values()
        .map(|mut tokens| {
            tokens.sort_by(|left, right| {
                left.x
                    .total_cmp(&right.x)
                    .then_with(|| left.text.cmp(&right.text))
            });
            Row { tokens }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{assemble_rows, row_bucket};
    use crate::model::Token;

    fn texts(row: &crate::model::Row) -> Vec<&str> {
        row.texts().collect()
    }

    #[test]
    fn empty_page_has_no_rows() {
        assert!(assemble_rows(&[]).is_empty());
    }

    #[test]
    fn groups_by_rounded_offset_and_orders_left_to_right() {
        let tokens = vec![
            Token::new("200", 300.0, 210.04),
            Token::new("1", 20.0, 210.01),
            Token::new("Nursing", 60.0, 209.98),
            Token::new("Header", 20.0, 100.0),
        ];

        let rows = assemble_rows(&tokens);
        assert_eq!(rows.len(), 2);
        assert_eq!(texts(&rows[0]), vec!["Header"]);
        assert_eq!(texts(&rows[1]), vec!["1", "Nursing", "200"]);
    }

    #[test]
    fn tokens_straddling_a_rounding_boundary_split() {
        let tokens = vec![Token::new("a", 10.0, 50.04), Token::new("b", 20.0, 50.06)];
        let rows = assemble_rows(&tokens);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn equal_offsets_fall_back_to_text_order() {
        let tokens = vec![Token::new("b", 10.0, 5.0), Token::new("a", 10.0, 5.0)];
        let rows = assemble_rows(&tokens);
        assert_eq!(texts(&rows[0]), vec!["a", "b"]);
    }

    #[test]
    fn bucket_rounds_half_to_even() {
        assert_eq!(row_bucket(1.25), 12);
        assert_eq!(row_bucket(1.75), 18);
        assert_eq!(row_bucket(12.0), 120);
    }

    #[test]
    fn bucket_rounds_the_stored_value_not_the_scaled_one() {
        assert_eq!(row_bucket(100.35), 1003);
        assert_eq!(row_bucket(100.31), 1003);
        assert_eq!(row_bucket(-0.04), 0);

        let rows = assemble_rows(&[Token::new("b", 40.0, 100.35), Token::new("a", 10.0, 100.31)]);
        assert_eq!(rows.len(), 1);
        assert_eq!(texts(&rows[0]), vec!["a", "b"]);
    }
}
