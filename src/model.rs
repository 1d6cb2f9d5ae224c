use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    #[serde(alias = "x0")]
    pub x: f64,
    #[serde(alias = "top")]
    pub y: f64,
}

impl Token {
    pub fn new(text: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            text: text.into(),
            x,
            y,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub tokens: Vec<Token>,
}

impl Row {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(|token| token.text.as_str())
    }

    pub fn line(&self) -> String {
        self.texts().collect::<Vec<_>>().join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedRow {
    pub row_id: String,
    pub label: String,
    pub values: Vec<String>,
}

impl ClassifiedRow {
    pub fn width(&self) -> usize {
        self.values.len() + 2
    }

    pub fn cells(&self) -> Vec<String> {
        let mut cells = Vec::with_capacity(self.width());
        cells.push(self.row_id.clone());
        cells.push(self.label.clone());
        cells.extend(self.values.iter().cloned());
        cells
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyColumns {
    pub row_id: String,
    pub label: String,
}

impl KeyColumns {
    pub fn new(row_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            row_id: row_id.into(),
            label: label.into(),
        }
    }

    pub fn prefix(&self) -> Vec<String> {
        vec![self.row_id.clone(), self.label.clone()]
    }
}

impl Default for KeyColumns {
    fn default() -> Self {
        Self::new("row_id", "label")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnNaming {
    #[default]
    Numbered,
    Labelled,
    Bare,
}

impl ColumnNaming {
    /// `position` is the 1-based column position of the generated name.
    pub fn placeholder(self, label: &str, position: usize) -> String {
        match self {
            Self::Numbered => format!("Column_{position}"),
            Self::Labelled => format!("{label}_col{position}"),
            Self::Bare => format!("col{position}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinKey {
    #[default]
    Label,
    RowAndLabel,
}

impl JoinKey {
    pub fn key_of(self, row: &ClassifiedRow) -> Vec<String> {
        match self {
            Self::Label => vec![row.label.clone()],
            Self::RowAndLabel => vec![row.row_id.clone(), row.label.clone()],
        }
    }

    pub fn columns(self, key_columns: &KeyColumns) -> Vec<String> {
        match self {
            Self::Label => vec![key_columns.label.clone()],
            Self::RowAndLabel => key_columns.prefix(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialTable {
    pub part: String,
    pub header: Option<Vec<String>>,
    pub rows: Vec<ClassifiedRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.header.len()
    }
}

#[cfg(test)]
mod tests {
    use super::{ClassifiedRow, ColumnNaming, JoinKey, KeyColumns, Token};

    #[test]
    fn token_accepts_pdfplumber_field_names() {
        let token: Token =
            serde_json::from_str(r#"{"text":"12","x0":40.5,"top":101.2,"x1":50.0}"#)
                .expect("token should deserialize");
        assert_eq!(token, Token::new("12", 40.5, 101.2));
    }

    #[test]
    fn placeholder_styles() {
        assert_eq!(ColumnNaming::Numbered.placeholder("p", 5), "Column_5");
        assert_eq!(ColumnNaming::Labelled.placeholder("part2", 5), "part2_col5");
        assert_eq!(ColumnNaming::Bare.placeholder("p", 5), "col5");
    }

    #[test]
    fn join_key_selects_key_cells() {
        let row = ClassifiedRow {
            row_id: "7".to_string(),
            label: "Pharmacy".to_string(),
            values: vec!["10".to_string()],
        };
        assert_eq!(JoinKey::Label.key_of(&row), vec!["Pharmacy"]);
        assert_eq!(JoinKey::RowAndLabel.key_of(&row), vec!["7", "Pharmacy"]);
        assert_eq!(
            JoinKey::Label.columns(&KeyColumns::default()),
            vec!["label"]
        );
    }
}
