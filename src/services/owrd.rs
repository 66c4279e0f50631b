//! Oregon Water Resources Department (OWRD) observation well downloads.

use crate::decode::text::{HeaderRow, TableLayout};
use crate::decode::Format;
use crate::options::filter_option::FilterOption;
use crate::options::schema::{Schema, SchemaCache, BASE_OPTIONS};
use crate::request::builder::RequestBuilder;
use crate::request::error::SerializeError;
use crate::request::params::SerializedParams;
use crate::services::{required_text, Webservice};

pub const OWRD_BASE_URL: &str = "http://filepickup.wrd.state.or.us/files/Publications/obswells/data/";

/// Name of the published file, e.g. `owrd_wls.txt`.
pub const FILENAME: &str = "filename";

/// Files are tab-separated with a free-form preamble before the column names.
const WELL_TABLE: TableLayout = TableLayout {
    delimiter: b'\t',
    quote: b'"',
    header: HeaderRow::Detect { max_row: 15 },
};

fn declare_schema() -> Schema {
    Schema::base()
        .ignore(BASE_OPTIONS)
        .with(FILENAME, FilterOption::text().required(true).build())
}

static SCHEMA: SchemaCache = SchemaCache::new(declare_schema);

/// Loads one OWRD observation well file: `owrd_wls.txt` (water levels),
/// `owrd_master.txt` (wells) or `owrd_redrills.txt` (redrilled wells).
#[derive(Debug, Clone)]
pub struct OwrdWells {
    base_url: String,
}

impl Default for OwrdWells {
    fn default() -> Self {
        Self {
            base_url: OWRD_BASE_URL.to_string(),
        }
    }
}

impl OwrdWells {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Webservice for OwrdWells {
    fn name(&self) -> &str {
        "owrd-wells"
    }

    fn schema(&self) -> &'static Schema {
        SCHEMA.resolve()
    }

    fn url(&self, request: &RequestBuilder<'_>) -> Result<String, SerializeError> {
        let filename = required_text(self.name(), request, FILENAME)?;
        Ok(format!("{}{}", self.base_url, filename))
    }

    fn serialize(&self, _request: &RequestBuilder<'_>) -> Result<SerializedParams, SerializeError> {
        Ok(SerializedParams::new())
    }

    fn format(&self, _request: &RequestBuilder<'_>) -> Format {
        Format::Table(WELL_TABLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::error::OptionError;
    use crate::raw_values;
    use serde_json::json;

    #[test]
    fn test_url_from_filename() {
        let owrd = OwrdWells::new();
        let request = owrd
            .request(raw_values! { "filename" => "owrd_wls.txt" })
            .unwrap();
        assert_eq!(
            owrd.url(&request).unwrap(),
            "http://filepickup.wrd.state.or.us/files/Publications/obswells/data/owrd_wls.txt"
        );
        assert!(owrd.params(&request).unwrap().is_empty());
    }

    #[test]
    fn test_filename_is_required() {
        let error = OwrdWells::new().request(raw_values! {}).unwrap_err();
        assert!(matches!(
            error.errors(),
            [OptionError::MissingRequiredValue { .. }]
        ));
    }

    #[test]
    fn test_rows_after_preamble() {
        let owrd = OwrdWells::new();
        let request = owrd
            .request(raw_values! { "filename" => "owrd_wls.txt" })
            .unwrap();
        let body = "Oregon Water Resources Department\n\
Observation well water levels\n\
\n\
logid\tmeasured_date\twl_depth\n\
KLAM 1234\t2014-06-12\t22.41\n\
LANE 0042\t2014-06-13\t8.10\n";
        let rows = owrd.format(&request).decode(body.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["logid"], json!("KLAM 1234"));
        assert_eq!(rows[1]["wl_depth"], json!("8.10"));
    }
}
