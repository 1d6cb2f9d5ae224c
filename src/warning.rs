use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningCode {
    EmptyPage,
    EmptyPart,
    EmptySchedule,
    HeaderNotDetected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractWarning {
    pub code: WarningCode,
    pub message: String,
    pub schedule: Option<String>,
    pub part: Option<String>,
    pub page_index: Option<usize>,
}

impl ExtractWarning {
    #[must_use]
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            schedule: None,
            part: None,
            page_index: None,
        }
    }

    #[must_use]
    pub fn with_schedule(mut self, schedule: impl Into<String>) -> Self {
        self.schedule = Some(schedule.into());
        self
    }

    #[must_use]
    pub fn with_part(mut self, part: impl Into<String>) -> Self {
        self.part = Some(part.into());
        self
    }

    #[must_use]
    pub fn with_page_index(mut self, page_index: usize) -> Self {
        self.page_index = Some(page_index);
        self
    }
}

impl fmt::Display for ExtractWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.code)?;
        if let Some(schedule) = &self.schedule {
            write!(f, " schedule={schedule}")?;
        }
        if let Some(part) = &self.part {
            write!(f, " part={part}")?;
        }
        if let Some(page_index) = self.page_index {
            write!(f, " page={}", page_index + 1)?;
        }
        write!(f, ": {}", self.message)
    }
}
