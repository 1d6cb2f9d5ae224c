pub mod catalog;
pub mod classify;
mod csv_out;
mod error;
pub mod header;
pub mod merge;
pub mod model;
mod options;
mod pdf_reader;
pub mod rows;
pub mod table_build;
mod warning;
mod word_source;

use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::catalog::{ScheduleCatalog, ScheduleLayout, ScheduleSpec};
use crate::classify::classify_rows;
use crate::csv_out::write_csv;
use crate::header::detect_page_header;
use crate::merge::ScheduleMerger;
use crate::model::{PartialTable, Table};
use crate::rows::assemble_rows;

pub use csv_out::write_table_to_string;
pub use error::ExtractError;
pub use options::{ExtractOptions, ScheduleSelection};
pub use pdf_reader::PdfWordSource;
pub use warning::{ExtractWarning, WarningCode};
pub use word_source::{InMemoryWordSource, WordSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleStatus {
    Success,
    Warning,
    Failure,
}

impl ScheduleStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Failure => "failure",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleReport {
    pub name: String,
    pub status: ScheduleStatus,
    pub row_count: usize,
    pub column_count: usize,
    pub output: Option<PathBuf>,
    pub warnings: Vec<ExtractWarning>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionReport {
    pub schedules: Vec<ScheduleReport>,
}

impl ExtractionReport {
    pub fn row_count(&self) -> usize {
        self.schedules.iter().map(|schedule| schedule.row_count).sum()
    }

    pub fn written_count(&self) -> usize {
        self.schedules
            .iter()
            .filter(|schedule| schedule.output.is_some())
            .count()
    }

    pub fn has_failures(&self) -> bool {
        self.schedules
            .iter()
            .any(|schedule| schedule.status == ScheduleStatus::Failure)
    }

    pub fn get(&self, name: &str) -> Option<&ScheduleReport> {
        self.schedules.iter().find(|schedule| schedule.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleOutcome {
    /// `None` when no page of the schedule produced a row.
    pub table: Option<Table>,
    pub warnings: Vec<ExtractWarning>,
}

fn collect_part<S: WordSource + ?Sized>(
    source: &S,
    spec: &ScheduleSpec,
    options: &ExtractOptions,
    part: &str,
    pages: &[usize],
    detect_headers: bool,
    warnings: &mut Vec<ExtractWarning>,
) -> Result<PartialTable, ExtractError> {
    let mut header = None;
    let mut rows = Vec::new();

    for &page_index in pages {
        let tokens = source.page_tokens(page_index)?;

        if detect_headers {
            match detect_page_header(&tokens, options.header_cutoff, &spec.key_columns) {
                Some(detected) => header = Some(detected),
                None => debug!(
                    schedule = %spec.name,
                    page = page_index + 1,
                    "no header candidates; keeping previous header"
                ),
            }
        }

        let page_rows = classify_rows(&assemble_rows(&tokens));
        debug!(
            schedule = %spec.name,
            part,
            page = page_index + 1,
            rows = page_rows.len(),
            "classified page rows"
        );
        if page_rows.is_empty() {
            warnings.push(
                ExtractWarning::new(
                    WarningCode::EmptyPage,
                    "no rows starting with a line number were found on this page",
                )
                .with_schedule(&spec.name)
                .with_part(part)
                .with_page_index(page_index),
            );
        }
        rows.extend(page_rows);
    }

    Ok(PartialTable {
        part: part.to_string(),
        header,
        rows,
    })
}

pub fn extract_schedule<S: WordSource + ?Sized>(
    source: &S,
    spec: &ScheduleSpec,
    options: &ExtractOptions,
) -> Result<ScheduleOutcome, ExtractError> {
    let mut warnings = Vec::new();
    let mut parts = Vec::new();

    match &spec.layout {
        ScheduleLayout::Concatenate { pages } => {
            let part = collect_part(
                source,
                spec,
                options,
                &spec.name,
                pages,
                true,
                &mut warnings,
            )?;
            if !part.rows.is_empty() && part.header.is_none() {
                warnings.push(
                    ExtractWarning::new(
                        WarningCode::HeaderNotDetected,
                        "no header line above the cutoff on any page; using generated column names",
                    )
                    .with_schedule(&spec.name),
                );
            }
            parts.push(part);
        }
        ScheduleLayout::KeyUnion { groups } => {
            for (index, group) in groups.iter().enumerate() {
                let label = format!("group{}", index + 1);
                let mut part = collect_part(
                    source,
                    spec,
                    options,
                    &label,
                    &group.pages,
                    false,
                    &mut warnings,
                )?;
                if part.rows.is_empty() {
                    warnings.push(
                        ExtractWarning::new(WarningCode::EmptyPart, "column group produced no rows")
                            .with_schedule(&spec.name)
                            .with_part(&label),
                    );
                }

                let mut header = spec.key_columns.prefix();
                header.extend(group.columns.iter().cloned());
                part.header = Some(header);
                parts.push(part);
            }
        }
        ScheduleLayout::SideBySide {
            parts: part_specs, ..
        } => {
            for part_spec in part_specs {
                let part = collect_part(
                    source,
                    spec,
                    options,
                    &part_spec.label,
                    &part_spec.pages,
                    true,
                    &mut warnings,
                )?;
                if part.rows.is_empty() {
                    warnings.push(
                        ExtractWarning::new(
                            WarningCode::EmptyPart,
                            "part produced no rows and is left out of the join",
                        )
                        .with_schedule(&spec.name)
                        .with_part(&part_spec.label),
                    );
                } else if part.header.is_none() {
                    warnings.push(
                        ExtractWarning::new(
                            WarningCode::HeaderNotDetected,
                            "no header line above the cutoff; using generated column names",
                        )
                        .with_schedule(&spec.name)
                        .with_part(&part_spec.label),
                    );
                }
                parts.push(part);
            }
        }
    }

    let merger = ScheduleMerger::new(
        spec.layout.strategy(),
        spec.key_columns.clone(),
        spec.naming,
        spec.name.clone(),
    );
    let table = merger.combine(parts);
    if table.is_none() {
        warnings.push(
            ExtractWarning::new(
                WarningCode::EmptySchedule,
                "no rows were extracted for this schedule; output skipped",
            )
            .with_schedule(&spec.name),
        );
    }

    Ok(ScheduleOutcome { table, warnings })
}

fn persist_schedule(
    spec: &ScheduleSpec,
    outcome: ScheduleOutcome,
    output_dir: &Path,
    delimiter: u8,
) -> ScheduleReport {
    let ScheduleOutcome { table, warnings } = outcome;
    let mut report = ScheduleReport {
        name: spec.name.clone(),
        status: ScheduleStatus::Warning,
        row_count: 0,
        column_count: 0,
        output: None,
        warnings,
        error: None,
    };

    let Some(table) = table else {
        return report;
    };

    let path = output_dir.join(format!("{}.csv", spec.name));
    match write_csv(&path, &table, delimiter) {
        Ok(()) => {
            report.row_count = table.row_count();
            report.column_count = table.column_count();
            report.output = Some(path);
            if report.warnings.is_empty() {
                report.status = ScheduleStatus::Success;
            }
        }
        Err(error) => {
            report.status = ScheduleStatus::Failure;
            report.error = Some(error.to_string());
        }
    }

    report
}

fn log_schedule_summary(report: &ScheduleReport) {
    for warning in &report.warnings {
        warn!(%warning, "extraction warning");
    }

    let status = report.status.as_str();
    match (&report.output, &report.error) {
        (Some(path), _) if report.status == ScheduleStatus::Success => info!(
            schedule = %report.name,
            status,
            rows = report.row_count,
            columns = report.column_count,
            path = %path.display(),
            "schedule extracted"
        ),
        (Some(path), _) => warn!(
            schedule = %report.name,
            status,
            rows = report.row_count,
            columns = report.column_count,
            path = %path.display(),
            "schedule extracted with warnings"
        ),
        (None, Some(reason)) => error!(
            schedule = %report.name,
            status,
            error = %reason,
            "failed to write schedule output"
        ),
        (None, None) => warn!(
            schedule = %report.name,
            status,
            "no data extracted; schedule skipped"
        ),
    }
}

pub fn extract_schedules<S: WordSource + ?Sized>(
    source: &S,
    catalog: &ScheduleCatalog,
    output_dir: &Path,
    options: &ExtractOptions,
) -> Result<ExtractionReport, ExtractError> {
    catalog.validate()?;
    if let Some(selection) = &options.schedules {
        if let Some(unknown) = selection.names().find(|name| catalog.get(name).is_none()) {
            return Err(ExtractError::UnknownSchedule(unknown.to_string()));
        }
    }
    if options.header_cutoff.is_nan() || options.header_cutoff <= 0.0 {
        return Err(ExtractError::InvalidOption(
            "header cutoff must be a positive number".to_string(),
        ));
    }

    std::fs::create_dir_all(output_dir)?;

    let mut report = ExtractionReport::default();
    for spec in catalog.schedules.iter().filter(|spec| {
        options
            .schedules
            .as_ref()
            .is_none_or(|selection| selection.contains(&spec.name))
    }) {
        let outcome = extract_schedule(source, spec, options)?;
        let schedule_report = persist_schedule(spec, outcome, output_dir, options.delimiter);
        log_schedule_summary(&schedule_report);
        report.schedules.push(schedule_report);
    }

    Ok(report)
}

pub fn extract_pdf_schedules(
    input_pdf: &Path,
    catalog: &ScheduleCatalog,
    output_dir: &Path,
    options: &ExtractOptions,
) -> Result<ExtractionReport, ExtractError> {
    let source = PdfWordSource::open(input_pdf)?;
    extract_schedules(&source, catalog, output_dir, options)
}
