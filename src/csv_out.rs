use std::path::Path;

use csv::WriterBuilder;

use crate::error::ExtractError;
use crate::model::Table;

pub(crate) fn write_csv(path: &Path, table: &Table, delimiter: u8) -> Result<(), ExtractError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)?;
    writer.write_record(&table.header)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_table_to_string(table: &Table, delimiter: u8) -> Result<String, ExtractError> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::<u8>::new());
    writer.write_record(&table.header)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    let bytes = writer
        .into_inner()
        .map_err(|error| ExtractError::Csv(error.into_error().into()))?;
    String::from_utf8(bytes)
        .map_err(|error| ExtractError::InvalidOption(format!("invalid utf-8 csv output: {error}")))
}
