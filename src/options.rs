use std::collections::BTreeSet;
use std::str::FromStr;

use crate::header::DEFAULT_HEADER_CUTOFF;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSelection {
    names: BTreeSet<String>,
}

impl ScheduleSelection {
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl FromStr for ScheduleSelection {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let names = value
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect::<BTreeSet<_>>();

        if names.is_empty() {
            return Err("schedule selection cannot be empty".to_string());
        }

        Ok(Self { names })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    pub header_cutoff: f64,
    pub delimiter: u8,
    pub schedules: Option<ScheduleSelection>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            header_cutoff: DEFAULT_HEADER_CUTOFF,
            delimiter: b',',
            schedules: None,
        }
    }
}
