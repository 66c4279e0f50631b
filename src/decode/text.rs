//! Delimited text formats: USGS RDB, marker-delimited CSV, configurable tables and
//! CNRFC ensemble traces.

use crate::decode::error::DecodeError;
use crate::decode::Record;
use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter, Trim};
use serde_json::Value;

/// First calendar year of the historical traces in a CNRFC ensemble.
pub const ENSEMBLE_FIRST_YEAR: i64 = 1950;

/// Where a delimited table takes its column names from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderRow {
    /// The file has no header; every row is data.
    Named(&'static [&'static str]),
    /// The header is the first row within `max_row` rows whose cells are all non-empty
    /// and non-numeric. Rows before it are skipped.
    Detect { max_row: usize },
}

/// Dialect of a delimited download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLayout {
    pub delimiter: u8,
    pub quote: u8,
    pub header: HeaderRow,
}

/// Decodes RDB: tab-separated, `#` comment lines, and a column-width row after the header.
///
/// RDB cells are never quoted, so quote characters are kept as text.
pub fn decode_rdb(body: &str) -> Result<Vec<Record>, DecodeError> {
    let mut rows = ReaderBuilder::new()
        .delimiter(b'\t')
        .comment(Some(b'#'))
        .quoting(false)
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes())
        .into_records();

    let header = next_row(&mut rows)?
        .ok_or_else(|| DecodeError::MissingHeader("RDB column names".to_string()))?;
    // Column widths and types, e.g. "5s\t15s\t50s".
    next_row(&mut rows)?;

    collect_rows(&header, rows)
}

/// Decodes comma-separated rows with standard `"` quoting. Cells are trimmed.
///
/// With `begin_marker`, the header is the line after the first line whose first cell
/// equals the marker. With `end_marker`, decoding stops at the first line starting with it.
/// Markers are matched line by line before parsing, so text around them may be anything.
pub fn decode_csv(
    body: &str,
    begin_marker: Option<&str>,
    end_marker: Option<&str>,
) -> Result<Vec<Record>, DecodeError> {
    let section = marked_section(body, begin_marker, end_marker)?;
    let mut rows = ReaderBuilder::new()
        .trim(Trim::All)
        .has_headers(false)
        .flexible(true)
        .from_reader(section.as_bytes())
        .into_records();

    let header = next_row(&mut rows)?
        .ok_or_else(|| DecodeError::MissingHeader("CSV header".to_string()))?;
    collect_rows(&header, rows)
}

/// Decodes a delimited download described by `layout`.
pub fn decode_table(body: &str, layout: &TableLayout) -> Result<Vec<Record>, DecodeError> {
    let mut rows = ReaderBuilder::new()
        .delimiter(layout.delimiter)
        .quote(layout.quote)
        .trim(Trim::All)
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes())
        .into_records();

    let header = match layout.header {
        HeaderRow::Named(names) => StringRecord::from(names.to_vec()),
        HeaderRow::Detect { max_row } => {
            let mut found = None;
            for _ in 0..max_row {
                match next_row(&mut rows)? {
                    Some(row) if looks_like_header(&row) => {
                        found = Some(row);
                        break;
                    }
                    Some(_) => {}
                    None => break,
                }
            }
            found.ok_or_else(|| {
                DecodeError::MissingHeader(format!("header within the first {max_row} rows"))
            })?
        }
    };
    collect_rows(&header, rows)
}

/// Decodes a CNRFC ensemble CSV into one record per site, trace and day.
///
/// The first row repeats each site name once per trace; traces of one site are numbered
/// by year starting at 1950. The second row holds units and is skipped. Every later row
/// starts with the timestamp followed by one value per trace. Records come out grouped by
/// site in the order sites first appear, with `site`, `date`, `year` and `value` fields.
pub fn decode_ensemble_csv(body: &str) -> Result<Vec<Record>, DecodeError> {
    let mut rows = ReaderBuilder::new()
        .trim(Trim::All)
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes())
        .into_records();

    let header = next_row(&mut rows)?
        .ok_or_else(|| DecodeError::MissingHeader("ensemble site row".to_string()))?;
    next_row(&mut rows)?;

    let mut sites: Vec<(String, Vec<Record>)> = Vec::new();
    let mut columns: Vec<(usize, i64)> = Vec::new();
    for site in header.iter().skip(1) {
        let index = match sites.iter().position(|(name, _)| name == site) {
            Some(index) => index,
            None => {
                sites.push((site.to_string(), Vec::new()));
                sites.len() - 1
            }
        };
        let traces = columns.iter().filter(|(column, _)| *column == index).count();
        columns.push((index, ENSEMBLE_FIRST_YEAR + traces as i64));
    }

    for row in rows {
        let row = row?;
        let Some(date) = row.get(0).filter(|date| !date.is_empty()) else {
            continue;
        };
        for (&(index, year), value) in columns.iter().zip(row.iter().skip(1)) {
            let (site, records) = &mut sites[index];
            let mut record = Record::new();
            record.insert("site".to_string(), Value::String(site.clone()));
            record.insert("date".to_string(), Value::String(date.to_string()));
            record.insert("year".to_string(), Value::from(year));
            record.insert("value".to_string(), Value::String(value.to_string()));
            records.push(record);
        }
    }

    Ok(sites.into_iter().flat_map(|(_, records)| records).collect())
}

fn marked_section(
    body: &str,
    begin_marker: Option<&str>,
    end_marker: Option<&str>,
) -> Result<String, DecodeError> {
    let mut lines = body.lines();
    if let Some(marker) = begin_marker {
        lines
            .by_ref()
            .find(|line| first_cell(line) == marker)
            .ok_or_else(|| DecodeError::MissingHeader(marker.to_string()))?;
    }
    Ok(lines
        .take_while(|line| end_marker.map_or(true, |marker| first_cell(line) != marker))
        .collect::<Vec<_>>()
        .join("\n"))
}

fn first_cell(line: &str) -> &str {
    line.split(',').next().unwrap_or_default().trim()
}

fn looks_like_header(row: &StringRecord) -> bool {
    row.len() > 1
        && row
            .iter()
            .all(|cell| !cell.is_empty() && cell.parse::<f64>().is_err())
}

/// Next row that has at least one non-blank cell.
fn next_row(rows: &mut StringRecordsIntoIter<&[u8]>) -> Result<Option<StringRecord>, DecodeError> {
    for row in rows.by_ref() {
        let row = row?;
        if row.iter().any(|cell| !cell.trim().is_empty()) {
            return Ok(Some(row));
        }
    }
    Ok(None)
}

fn collect_rows(
    header: &StringRecord,
    mut rows: StringRecordsIntoIter<&[u8]>,
) -> Result<Vec<Record>, DecodeError> {
    let mut records = Vec::new();
    while let Some(row) = next_row(&mut rows)? {
        records.push(to_record(header, &row));
    }
    Ok(records)
}

fn to_record(header: &StringRecord, row: &StringRecord) -> Record {
    header
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let cell = row.get(index).unwrap_or_default();
            (name.to_string(), Value::String(cell.to_string()))
        })
        .collect()
}
