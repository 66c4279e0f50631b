pub mod error;
pub mod json;
pub mod text;
pub mod xml;

use crate::decode::error::DecodeError;
use crate::decode::text::TableLayout;
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// One decoded row of a webservice response.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// XML rows whose fields are attribute pairs on repeated column elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRows {
    pub row_tag: &'static str,
    pub column_tag: &'static str,
    pub name_attribute: &'static str,
    pub value_attribute: &'static str,
}

/// Response body format of a webservice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// A JSON array of objects, optionally nested under a top-level key.
    Json { namespace: Option<&'static str> },
    /// Tab-delimited USGS RDB.
    Rdb,
    /// Comma-separated rows, optionally framed by marker rows.
    Csv {
        begin: Option<&'static str>,
        end: Option<&'static str>,
    },
    /// Delimited rows with their own delimiter, quote character and header rule.
    Table(TableLayout),
    /// CNRFC ensemble traces, one column per site and trace year.
    EnsembleCsv,
    /// Repeated XML elements found by following `item_path` from the root.
    Xml { item_path: &'static [&'static str] },
    /// Repeated XML row elements built from name/value column attributes.
    XmlColumns(ColumnRows),
    /// CUAHSI WaterML 1.1 time series.
    WaterMl,
    /// A zip archive whose first member is decoded as `member`.
    Zip { member: &'static Format },
}

impl Format {
    pub fn name(&self) -> &'static str {
        match self {
            Format::Json { .. } => "json",
            Format::Rdb => "rdb",
            Format::Csv { .. } => "csv",
            Format::Table(_) => "table",
            Format::EnsembleCsv => "ensemble-csv",
            Format::Xml { .. } | Format::XmlColumns(_) => "xml",
            Format::WaterMl => "waterml",
            Format::Zip { .. } => "zip",
        }
    }

    pub fn decode(&self, body: &[u8]) -> Result<Vec<Record>, DecodeError> {
        match *self {
            Format::Json { namespace } => json::decode_json(body, namespace),
            Format::Rdb => text::decode_rdb(std::str::from_utf8(body)?),
            Format::Csv { begin, end } => text::decode_csv(std::str::from_utf8(body)?, begin, end),
            Format::Table(layout) => text::decode_table(std::str::from_utf8(body)?, &layout),
            Format::EnsembleCsv => text::decode_ensemble_csv(std::str::from_utf8(body)?),
            Format::Xml { item_path } => xml::decode_xml(std::str::from_utf8(body)?, item_path),
            Format::XmlColumns(columns) => xml::decode_column_rows(
                std::str::from_utf8(body)?,
                columns.row_tag,
                columns.column_tag,
                columns.name_attribute,
                columns.value_attribute,
            ),
            Format::WaterMl => xml::decode_waterml(std::str::from_utf8(body)?),
            Format::Zip { member } => member.decode(&first_zip_member(body)?),
        }
    }
}

/// Extracts the first file of a zip archive.
fn first_zip_member(body: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut archive = ZipArchive::new(Cursor::new(body))?;
    if archive.is_empty() {
        return Err(DecodeError::UnexpectedShape("empty zip archive".to_string()));
    }
    let mut file = archive.by_index(0)?;
    let mut contents = Vec::new();
    file.read_to_end(&mut contents)?;
    Ok(contents)
}
