use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ExtractError;
use crate::merge::MergeStrategy;
use crate::model::{ColumnNaming, JoinKey, KeyColumns};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnGroup {
    pub pages: Vec<usize>,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartSpec {
    pub label: String,
    pub pages: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ScheduleLayout {
    Concatenate { pages: Vec<usize> },
    KeyUnion { groups: Vec<ColumnGroup> },
    SideBySide { join_on: JoinKey, parts: Vec<PartSpec> },
}

impl ScheduleLayout {
    pub fn strategy(&self) -> MergeStrategy {
        match self {
            Self::Concatenate { .. } => MergeStrategy::Concatenate,
            Self::KeyUnion { .. } => MergeStrategy::KeyUnion,
            Self::SideBySide { join_on, .. } => MergeStrategy::SideBySideJoin(*join_on),
        }
    }

    pub fn pages(&self) -> Vec<usize> {
        match self {
            Self::Concatenate { pages } => pages.clone(),
            Self::KeyUnion { groups } => groups
                .iter()
                .flat_map(|group| group.pages.iter().copied())
                .collect(),
            Self::SideBySide { parts, .. } => parts
                .iter()
                .flat_map(|part| part.pages.iter().copied())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSpec {
    pub name: String,
    #[serde(default)]
    pub key_columns: KeyColumns,
    #[serde(default)]
    pub naming: ColumnNaming,
    pub layout: ScheduleLayout,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScheduleCatalog {
    pub schedules: Vec<ScheduleSpec>,
}

impl ScheduleCatalog {
    pub fn from_json_str(json: &str) -> Result<Self, ExtractError> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_path(path: &Path) -> Result<Self, ExtractError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn get(&self, name: &str) -> Option<&ScheduleSpec> {
        self.schedules.iter().find(|spec| spec.name == name)
    }

    pub fn validate(&self) -> Result<(), ExtractError> {
        let invalid = |message: String| Err(ExtractError::InvalidCatalog(message));

        let mut names = HashSet::new();
        for spec in &self.schedules {
            if spec.name.trim().is_empty() {
                return invalid("schedule name cannot be empty".to_string());
            }
            if !names.insert(spec.name.as_str()) {
                return invalid(format!("duplicate schedule name '{}'", spec.name));
            }

            match &spec.layout {
                ScheduleLayout::Concatenate { pages } if pages.is_empty() => {
                    return invalid(format!("schedule '{}' has no pages", spec.name));
                }
                ScheduleLayout::KeyUnion { groups } => {
                    if groups.is_empty() {
                        return invalid(format!("schedule '{}' has no column groups", spec.name));
                    }
                    for (index, group) in groups.iter().enumerate() {
                        if group.pages.is_empty() || group.columns.is_empty() {
                            return invalid(format!(
                                "column group {} of schedule '{}' needs pages and columns",
                                index + 1,
                                spec.name
                            ));
                        }
                    }
                }
                ScheduleLayout::SideBySide { parts, .. } => {
                    if parts.is_empty() {
                        return invalid(format!("schedule '{}' has no parts", spec.name));
                    }
                    if let Some(part) = parts.iter().find(|part| part.pages.is_empty()) {
                        return invalid(format!(
                            "part '{}' of schedule '{}' has no pages",
                            part.label, spec.name
                        ));
                    }
                }
                ScheduleLayout::Concatenate { .. } => {}
            }
        }

        Ok(())
    }

    pub fn hospital_cost_report() -> Self {
        let cost_center = KeyColumns::new("Line No.", "Cost Center Description");
        let description = KeyColumns::new("Line No.", "Description");

        let mut schedules = vec![ScheduleSpec {
            name: "schedule_ii_merged".to_string(),
            key_columns: cost_center.clone(),
            naming: ColumnNaming::Numbered,
            layout: ScheduleLayout::KeyUnion {
                groups: vec![
                    group(
                        3..=6,
                        &[
                            "Expense Before Reclassi-fication",
                            "Direct Expense",
                            "Expense After Stepdown(Excl Cap)",
                            "Expense After Stepdown(Incl Cap)",
                            "Patient Service Expense By Dept(Excl Cap)",
                            "Patient Service Expense By Dept(Incl Cap)",
                        ],
                    ),
                    group(
                        7..=10,
                        &[
                            "Gross Revenue by Department",
                            "Patient Expense by Service(Excl Cap)",
                            "Patient Expense by Service(Incl Cap)",
                            "Gross Revenue by Service",
                            "Non-Physician FTE",
                            "Physician FTE",
                        ],
                    ),
                    group(11..=14, &["Number of Units", "Unit of measure"]),
                ],
            },
        }];

        let concatenated = [
            ("schedule_iii", vec![15, 16, 17]),
            ("schedule_iiia", vec![18]),
            ("schedule_iiib", vec![19]),
            ("schedule_iv_iv-a", vec![20, 21]),
            ("schedule_iv_iv-b", vec![22]),
            ("schedule_iv_iv-c", vec![23]),
            ("schedule_iv_iv-d", vec![23]),
            ("schedule_iv_iv-e", vec![24]),
            ("schedule_va_part1", vec![25, 26, 27]),
            ("schedule_va_part2", vec![28, 29, 30]),
            ("schedule_va_part3", vec![31, 32, 33]),
            ("schedule_vb", vec![34]),
        ];
        schedules.extend(concatenated.into_iter().map(|(name, pages)| {
            concatenate(name, pages, &cost_center, ColumnNaming::Numbered)
        }));

        schedules.push(ScheduleSpec {
            name: "schedule_vi_merged".to_string(),
            key_columns: cost_center.clone(),
            naming: ColumnNaming::Labelled,
            layout: ScheduleLayout::SideBySide {
                join_on: JoinKey::RowAndLabel,
                parts: (0..7)
                    .map(|index| PartSpec {
                        label: format!("part{}", index + 1),
                        pages: vec![35 + index * 2, 36 + index * 2],
                    })
                    .collect(),
            },
        });
        schedules.push(concatenate(
            "schedule_via",
            vec![49],
            &cost_center,
            ColumnNaming::Bare,
        ));

        let schedule_vii = [
            ("schedule_vii", vec![50, 51]),
            ("schedule_viib", vec![55]),
            ("schedule_viic", vec![56]),
            ("schedule_viid", vec![57]),
        ];
        schedules.extend(schedule_vii.into_iter().map(|(name, pages)| {
            concatenate(name, pages, &description, ColumnNaming::Labelled)
        }));

        schedules.push(ScheduleSpec {
            name: "schedule_viia_merged".to_string(),
            key_columns: description,
            naming: ColumnNaming::Labelled,
            layout: ScheduleLayout::SideBySide {
                join_on: JoinKey::Label,
                parts: (0..3)
                    .map(|index| PartSpec {
                        label: format!("viia_part{}", index + 1),
                        pages: vec![52 + index],
                    })
                    .collect(),
            },
        });

        Self { schedules }
    }
}

fn group(pages: std::ops::RangeInclusive<usize>, columns: &[&str]) -> ColumnGroup {
    ColumnGroup {
        pages: pages.collect(),
        columns: columns.iter().map(ToString::to_string).collect(),
    }
}

fn concatenate(
    name: &str,
    pages: Vec<usize>,
    key_columns: &KeyColumns,
    naming: ColumnNaming,
) -> ScheduleSpec {
    ScheduleSpec {
        name: name.to_string(),
        key_columns: key_columns.clone(),
        naming,
        layout: ScheduleLayout::Concatenate { pages },
    }
}

#[cfg(test)]
mod tests {
    use super::{ScheduleCatalog, ScheduleLayout};
    use crate::error::ExtractError;
    use crate::merge::MergeStrategy;
    use crate::model::{ColumnNaming, JoinKey, KeyColumns};

    #[test]
    fn built_in_catalog_is_valid() {
        let catalog = ScheduleCatalog::hospital_cost_report();
        catalog.validate().expect("built-in catalog should validate");
        assert_eq!(catalog.schedules.len(), 20);

        let vi = catalog.get("schedule_vi_merged").expect("schedule VI exists");
        assert_eq!(vi.layout.strategy(), MergeStrategy::SideBySideJoin(JoinKey::RowAndLabel));
        assert_eq!(vi.layout.pages(), (35..=48).collect::<Vec<_>>());

        let ii = catalog.get("schedule_ii_merged").expect("schedule II exists");
        assert_eq!(ii.layout.pages(), (3..=14).collect::<Vec<_>>());

        let viia = catalog.get("schedule_viia_merged").expect("schedule VII-A exists");
        assert_eq!(viia.layout.pages(), vec![52, 53, 54]);
        assert_eq!(viia.key_columns.label, "Description");
    }

    #[test]
    fn parses_json_catalog_with_defaults() {
        let catalog = ScheduleCatalog::from_json_str(
            r#"{
                "schedules": [
                    {"name": "demo", "layout": {"strategy": "concatenate", "pages": [0, 1]}},
                    {
                        "name": "joined",
                        "naming": "labelled",
                        "key_columns": {"row_id": "Line", "label": "Item"},
                        "layout": {
                            "strategy": "side_by_side",
                            "join_on": "row_and_label",
                            "parts": [{"label": "a", "pages": [2]}]
                        }
                    }
                ]
            }"#,
        )
        .expect("catalog should parse");

        let demo = catalog.get("demo").expect("demo schedule exists");
        assert_eq!(demo.key_columns, KeyColumns::default());
        assert_eq!(demo.naming, ColumnNaming::Numbered);
        assert_eq!(demo.layout, ScheduleLayout::Concatenate { pages: vec![0, 1] });

        let joined = catalog.get("joined").expect("joined schedule exists");
        assert_eq!(joined.key_columns, KeyColumns::new("Line", "Item"));
        assert_eq!(
            joined.layout.strategy(),
            MergeStrategy::SideBySideJoin(JoinKey::RowAndLabel)
        );
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = ScheduleCatalog::from_json_str(
            r#"{"schedules": [
                {"name": "a", "layout": {"strategy": "concatenate", "pages": [0]}},
                {"name": "a", "layout": {"strategy": "concatenate", "pages": [1]}}
            ]}"#,
        )
        .expect_err("duplicate names should fail");
        assert!(matches!(
            err,
            ExtractError::InvalidCatalog(message) if message.contains("duplicate")
        ));
    }

    #[test]
    fn rejects_key_union_group_without_columns() {
        let err = ScheduleCatalog::from_json_str(
            r#"{"schedules": [
                {"name": "a", "layout": {
                    "strategy": "key_union",
                    "groups": [{"pages": [0], "columns": []}]
                }}
            ]}"#,
        )
        .expect_err("group without columns should fail");
        assert!(matches!(err, ExtractError::InvalidCatalog(_)));
    }
}
