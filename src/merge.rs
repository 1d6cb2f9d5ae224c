use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use crate::classify::compare_row_ids;
use crate::model::{ColumnNaming, JoinKey, KeyColumns, PartialTable, Table};
use crate::table_build::{build_table, dedup_by_key};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    KeyUnion,
    Concatenate,
    SideBySideJoin(JoinKey),
}

impl MergeStrategy {
    pub const fn name(self) -> &'static str {
        match self {
            Self::KeyUnion => "key_union",
            Self::Concatenate => "concatenate",
            Self::SideBySideJoin(JoinKey::Label) => "side_by_side(label)",
            Self::SideBySideJoin(JoinKey::RowAndLabel) => "side_by_side(row_and_label)",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScheduleMerger {
    pub strategy: MergeStrategy,
    pub key_columns: KeyColumns,
    pub naming: ColumnNaming,
    pub label: String,
}

impl ScheduleMerger {
    pub fn new(
        strategy: MergeStrategy,
        key_columns: KeyColumns,
        naming: ColumnNaming,
        label: impl Into<String>,
    ) -> Self {
        Self {
            strategy,
            key_columns,
            naming,
            label: label.into(),
        }
    }

    pub fn combine(&self, parts: Vec<PartialTable>) -> Option<Table> {
        match self.strategy {
            MergeStrategy::KeyUnion => self.key_union(parts),
            MergeStrategy::Concatenate => self.concatenate(parts),
            MergeStrategy::SideBySideJoin(join_on) => self.side_by_side(parts, join_on),
        }
    }

    fn key_union(&self, parts: Vec<PartialTable>) -> Option<Table> {
        let mut columns = self.key_columns.prefix();
        let mut merged: IndexMap<(String, String), IndexMap<String, String>> = IndexMap::new();

        for part in parts {
            let value_columns = part
                .header
                .as_deref()
                .and_then(|header| header.get(2..))
                .unwrap_or_default();
            for name in value_columns {
                if !columns.contains(name) {
                    columns.push(name.clone());
                }
            }

            for row in dedup_by_key(part.rows, JoinKey::RowAndLabel) {
                if row.values.len() > value_columns.len() {
                    debug!(
                        part = %part.part,
                        row_id = %row.row_id,
                        dropped = row.values.len() - value_columns.len(),
                        "row has more values than declared columns"
                    );
                }
                let cells = merged.entry((row.row_id, row.label)).or_default();
                for (name, value) in value_columns.iter().zip(row.values) {
                    cells.insert(name.clone(), value);
                }
            }
        }

        if merged.is_empty() {
            return None;
        }

        let mut keyed = merged.into_iter().collect::<Vec<_>>();
        keyed.sort_by(|((left, _), _), ((right, _), _)| compare_row_ids(left, right));

        let rows = keyed
            .into_iter()
            .map(|((row_id, label), mut cells)| {
                let mut row = vec![row_id, label];
                row.extend(
                    columns[2..]
                        .iter()
                        .map(|name| cells.swap_remove(name).unwrap_or_default()),
                );
                row
            })
            .collect();

        Some(Table {
            header: columns,
            rows,
        })
    }

    fn concatenate(&self, parts: Vec<PartialTable>) -> Option<Table> {
        let header = parts
            .iter()
            .find_map(|part| part.header.clone())
            .unwrap_or_else(|| self.key_columns.prefix());
        let rows = parts
            .into_iter()
            .flat_map(|part| part.rows)
            .collect::<Vec<_>>();

        build_table(&header, &rows, self.naming, &self.label)
    }

    fn side_by_side(&self, parts: Vec<PartialTable>, join_on: JoinKey) -> Option<Table> {
        let mut header = join_on.columns(&self.key_columns);
        let mut keys: IndexSet<Vec<String>> = IndexSet::new();
        let mut joined_parts = Vec::new();

        for part in parts {
            let part_header = part
                .header
                .clone()
                .unwrap_or_else(|| self.key_columns.prefix());
            let rows = dedup_by_key(part.rows, join_on);
            let Some(table) = build_table(&part_header, &rows, self.naming, &part.part) else {
                continue;
            };

            let value_width = table.column_count() - 2;
            header.extend(table.header[2..].iter().cloned());

            let mut by_key = IndexMap::new();
            for (row, cells) in rows.iter().zip(table.rows) {
                let key = join_on.key_of(row);
                keys.insert(key.clone());
                by_key.insert(key, cells[2..].to_vec());
            }
            joined_parts.push((value_width, by_key));
        }

        if keys.is_empty() {
            return None;
        }

        let rows = keys
            .into_iter()
            .map(|key| {
                let mut row = key.clone();
                for (value_width, by_key) in &joined_parts {
                    match by_key.get(&key) {
                        Some(values) => row.extend(values.iter().cloned()),
                        None => row.extend(std::iter::repeat_n(String::new(), *value_width)),
                    }
                }
                row
            })
            .collect();

        Some(Table { header, rows })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{MergeStrategy, ScheduleMerger};
    use crate::model::{ClassifiedRow, ColumnNaming, JoinKey, KeyColumns, PartialTable};

    fn row(row_id: &str, label: &str, values: &[&str]) -> ClassifiedRow {
        ClassifiedRow {
            row_id: row_id.to_string(),
            label: label.to_string(),
            values: values.iter().map(ToString::to_string).collect(),
        }
    }

    fn part(name: &str, header: Option<&[&str]>, rows: Vec<ClassifiedRow>) -> PartialTable {
        PartialTable {
            part: name.to_string(),
            header: header.map(|names| names.iter().map(ToString::to_string).collect()),
            rows,
        }
    }

    fn merger(strategy: MergeStrategy) -> ScheduleMerger {
        ScheduleMerger::new(
            strategy,
            KeyColumns::default(),
            ColumnNaming::Labelled,
            "schedule",
        )
    }

    #[test]
    fn key_union_last_writer_wins_per_column() {
        let parts = vec![
            part("p1", Some(&["row_id", "label", "X"]), vec![row("1", "A", &["5"])]),
            part(
                "p2",
                Some(&["row_id", "label", "X", "Y"]),
                vec![row("1", "A", &["9", "2"])],
            ),
        ];

        let table = merger(MergeStrategy::KeyUnion)
            .combine(parts)
            .expect("merge should produce rows");
        assert_eq!(table.header, vec!["row_id", "label", "X", "Y"]);
        assert_eq!(table.rows, vec![vec!["1", "A", "9", "2"]]);
    }

    #[test]
    fn key_union_sorts_and_fills_missing_columns() {
        let parts = vec![
            part(
                "costs",
                Some(&["row_id", "label", "Cost"]),
                vec![
                    row("10", "Lab", &["100"]),
                    row("2", "Pharmacy", &["20", "extra"]),
                    row("2", "Pharmacy", &["999"]),
                ],
            ),
            part(
                "units",
                Some(&["row_id", "label", "Units"]),
                vec![row("1.5", "Rehab", &["7"]), row("abc", "Misc", &["1"])],
            ),
        ];

        let table = merger(MergeStrategy::KeyUnion)
            .combine(parts)
            .expect("merge should produce rows");
        assert_eq!(table.header, vec!["row_id", "label", "Cost", "Units"]);
        assert_eq!(
            table.rows,
            vec![
                vec!["1.5", "Rehab", "", "7"],
                vec!["2", "Pharmacy", "20", ""],
                vec!["10", "Lab", "100", ""],
                vec!["abc", "Misc", "", "1"],
            ]
        );
    }

    #[test]
    fn concatenation_keeps_part_order() {
        let parts = vec![
            part("p1", None, vec![row("5", "E", &["1"])]),
            part(
                "p2",
                Some(&["row_id", "label", "Amount"]),
                vec![row("1", "A", &["2", "3"])],
            ),
            part("p3", Some(&["row_id", "label", "Other"]), vec![row("3", "C", &[])]),
        ];

        let table = merger(MergeStrategy::Concatenate)
            .combine(parts)
            .expect("merge should produce rows");
        assert_eq!(
            table.header,
            vec!["row_id", "label", "Amount", "schedule_col4"]
        );
        let ids = table.rows.iter().map(|row| row[0].as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["5", "1", "3"]);
        assert_eq!(table.rows[2], vec!["3", "C", "", ""]);
    }

    #[test]
    fn side_by_side_outer_joins_on_label() {
        let parts = vec![
            part(
                "part1",
                Some(&["row_id", "label", "A"]),
                vec![row("1", "Rent", &["10"]), row("2", "Power", &["20"])],
            ),
            part("part2", None, vec![row("1", "Rent", &["30", "31"])]),
            part(
                "part3",
                Some(&["row_id", "label", "C"]),
                vec![
                    row("2", "Power", &["40"]),
                    row("9", "Water", &["50"]),
                    row("9", "Water", &["51"]),
                ],
            ),
        ];

        let table = merger(MergeStrategy::SideBySideJoin(JoinKey::Label))
            .combine(parts)
            .expect("merge should produce rows");
        assert_eq!(
            table.header,
            vec!["label", "A", "part2_col3", "part2_col4", "C"]
        );
        assert_eq!(
            table.rows,
            vec![
                vec!["Rent", "10", "30", "31", ""],
                vec!["Power", "20", "", "", "40"],
                vec!["Water", "", "", "", "50"],
            ]
        );
    }

    #[test]
    fn side_by_side_on_composite_key_keeps_both_key_columns() {
        let parts = vec![
            part("part1", Some(&["row_id", "label", "A"]), vec![row("1", "Rent", &["10"])]),
            part("part2", Some(&["row_id", "label", "B"]), vec![row("2", "Rent", &["20"])]),
        ];

        let table = merger(MergeStrategy::SideBySideJoin(JoinKey::RowAndLabel))
            .combine(parts)
            .expect("merge should produce rows");
        assert_eq!(table.header, vec!["row_id", "label", "A", "B"]);
        assert_eq!(
            table.rows,
            vec![vec!["1", "Rent", "10", ""], vec!["2", "Rent", "", "20"]]
        );
    }

    #[test]
    fn every_strategy_reports_empty_input() {
        for strategy in [
            MergeStrategy::KeyUnion,
            MergeStrategy::Concatenate,
            MergeStrategy::SideBySideJoin(JoinKey::Label),
        ] {
            let parts = vec![part("p1", Some(&["row_id", "label"]), Vec::new())];
            assert!(merger(strategy).combine(parts).is_none());
        }
    }
}
