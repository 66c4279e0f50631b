//! USGS hydrologic unit codes (HUCs) and expansion to 8-digit cataloging units.

use crate::decode::text::{HeaderRow, TableLayout};
use crate::decode::{Format, Record};
use crate::options::schema::{Schema, SchemaCache, BASE_OPTIONS};
use crate::request::builder::RequestBuilder;
use crate::request::error::SerializeError;
use crate::request::params::SerializedParams;
use crate::services::Webservice;
use serde_json::Value;

pub const HUC_URL: &str = "http://water.usgs.gov/GIS/huc_rdb.txt";

fn declare_schema() -> Schema {
    Schema::base().ignore(BASE_OPTIONS)
}

static SCHEMA: SchemaCache = SchemaCache::new(declare_schema);

/// Loads the table of hydrologic units, one record per unit with `huc` and `basin` fields.
#[derive(Debug, Clone)]
pub struct HucCodes {
    url: String,
}

impl Default for HucCodes {
    fn default() -> Self {
        Self {
            url: HUC_URL.to_string(),
        }
    }
}

impl HucCodes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

impl Webservice for HucCodes {
    fn name(&self) -> &str {
        "usgs-huc"
    }

    fn schema(&self) -> &'static Schema {
        SCHEMA.resolve()
    }

    fn url(&self, _request: &RequestBuilder<'_>) -> Result<String, SerializeError> {
        Ok(self.url.clone())
    }

    fn serialize(&self, _request: &RequestBuilder<'_>) -> Result<SerializedParams, SerializeError> {
        Ok(SerializedParams::new())
    }

    fn format(&self, _request: &RequestBuilder<'_>) -> Format {
        Format::Table(TableLayout {
            delimiter: b'\t',
            quote: b'"',
            header: HeaderRow::Detect { max_row: 15 },
        })
    }
}

fn field<'a>(record: &'a Record, name: &str) -> &'a str {
    record.get(name).and_then(Value::as_str).unwrap_or_default()
}

/// Every 8-digit HUC under `query`, which is either a code prefix (`1801`) or a basin
/// name (`Klamath`, case-insensitive).
///
/// A name matching several units resolves to the shortest, most general code. Unknown
/// names give an empty list.
///
/// ```
/// use climata::services::huc8::huc8s;
/// use serde_json::json;
///
/// let hucs: Vec<_> = [
///     json!({"huc": "1801", "basin": "Klamath-Northern California Coastal"}),
///     json!({"huc": "180102", "basin": "Klamath"}),
///     json!({"huc": "18010201", "basin": "Williamson"}),
///     json!({"huc": "18010206", "basin": "Upper Klamath"}),
///     json!({"huc": "18020001", "basin": "Goose Lake"}),
/// ]
/// .into_iter()
/// .filter_map(|row| row.as_object().cloned())
/// .collect();
///
/// assert_eq!(huc8s(&hucs, "klamath"), vec!["18010201", "18010206"]);
/// assert_eq!(huc8s(&hucs, "1802"), vec!["18020001"]);
/// ```
pub fn huc8s(hucs: &[Record], query: &str) -> Vec<String> {
    let query = query.trim();
    let prefix = if query.chars().all(|c| c.is_ascii_digit()) {
        Some(query)
    } else {
        hucs.iter()
            .filter(|row| field(row, "basin").eq_ignore_ascii_case(query))
            .map(|row| field(row, "huc"))
            .min_by_key(|huc| huc.len())
    };

    let Some(prefix) = prefix.filter(|prefix| !prefix.is_empty()) else {
        return Vec::new();
    };
    hucs.iter()
        .map(|row| field(row, "huc"))
        .filter(|huc| huc.len() == 8 && huc.starts_with(prefix))
        .map(str::to_string)
        .collect()
}

/// `basin` itself when it is already an 8-digit HUC, otherwise [`huc8s`] of it.
pub fn expand_basin(hucs: &[Record], basin: &str) -> Vec<String> {
    let basin = basin.trim();
    if basin.len() == 8 && basin.chars().all(|c| c.is_ascii_digit()) {
        vec![basin.to_string()]
    } else {
        huc8s(hucs, basin)
    }
}
