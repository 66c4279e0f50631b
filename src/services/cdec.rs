//! California Data Exchange Center (CDEC) station list.

use crate::decode::error::DecodeError;
use crate::decode::text::{HeaderRow, TableLayout};
use crate::decode::{Format, Record};
use crate::options::schema::{Schema, SchemaCache, BASE_OPTIONS};
use crate::request::builder::RequestBuilder;
use crate::request::error::SerializeError;
use crate::request::params::SerializedParams;
use crate::services::Webservice;
use serde_json::Value;

pub const CDEC_STATIONS_URL: &str = "http://cdec.water.ca.gov/misc/all_stations.csv";

/// Columns of the station list, which has no header row.
pub const STATION_FIELDS: [&str; 7] = [
    "station_code",
    "url",
    "description",
    "no_of_records",
    "lat",
    "long",
    "extra",
];

fn declare_schema() -> Schema {
    Schema::base().ignore(BASE_OPTIONS)
}

static SCHEMA: SchemaCache = SchemaCache::new(declare_schema);

/// Loads every station CDEC publishes, with its coordinates and record count.
///
/// Cells are quoted with `'`. Descriptions holding an unquoted comma spill into one
/// extra column; those rows are shifted back so `lat` and `long` line up, and the
/// spilled text is rejoined to the description.
#[derive(Debug, Clone)]
pub struct CdecStations {
    url: String,
}

impl Default for CdecStations {
    fn default() -> Self {
        Self {
            url: CDEC_STATIONS_URL.to_string(),
        }
    }
}

impl CdecStations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    fn realign(record: &mut Record) {
        let extra = record
            .insert("extra".to_string(), Value::String(String::new()))
            .and_then(|value| value.as_str().map(str::to_string))
            .unwrap_or_default();
        if extra.is_empty() {
            return;
        }
        let text = |record: &Record, field: &str| {
            record
                .get(field)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let description = format!(
            "{},{}",
            text(record, "description"),
            text(record, "no_of_records")
        );
        let no_of_records = text(record, "lat");
        let lat = text(record, "long");
        record.insert("description".to_string(), Value::String(description));
        record.insert("no_of_records".to_string(), Value::String(no_of_records));
        record.insert("lat".to_string(), Value::String(lat));
        record.insert("long".to_string(), Value::String(extra));
    }
}

impl Webservice for CdecStations {
    fn name(&self) -> &str {
        "cdec-stations"
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
            delimiter: b',',
            quote: b'\'',
            header: HeaderRow::Named(&STATION_FIELDS),
        })
    }

    fn normalize(
        &self,
        records: Vec<Record>,
        _request: &RequestBuilder<'_>,
    ) -> Result<Vec<Record>, DecodeError> {
        Ok(records
            .into_iter()
            .map(|mut record| {
                Self::realign(&mut record);
                record
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw_values;
    use serde_json::json;

    #[test]
    fn test_station_rows() {
        let cdec = CdecStations::new();
        let request = cdec.request(raw_values! {}).unwrap();
        let body = "'KLO','http://cdec.water.ca.gov/cgi-progs/stationInfo?station_id=KLO','KLAMATH R AT ORLEANS',12,41.3036,-123.5339\n\
'TUR','http://cdec.water.ca.gov/cgi-progs/stationInfo?station_id=TUR','KLAMATH R NR KLAMATH, TURWAR CREEK',8,41.5129,-123.9903\n\
'OLS','http://cdec.water.ca.gov/cgi-progs/stationInfo?station_id=OLS',KLAMATH RIVER AT ORLEANS, HUMBOLDT CO,44,41.3036,-123.5339\n";
        let records = cdec.format(&request).decode(body.as_bytes()).unwrap();
        let rows = cdec.normalize(records, &request).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["station_code"], json!("KLO"));
        assert_eq!(rows[0]["lat"], json!("41.3036"));
        assert_eq!(rows[1]["description"], json!("KLAMATH R NR KLAMATH, TURWAR CREEK"));
        assert_eq!(rows[1]["long"], json!("-123.9903"));
        assert_eq!(rows[2]["description"], json!("KLAMATH RIVER AT ORLEANS,HUMBOLDT CO"));
        assert_eq!(rows[2]["no_of_records"], json!("44"));
        assert_eq!(rows[2]["lat"], json!("41.3036"));
        assert_eq!(rows[2]["long"], json!("-123.5339"));
        assert!(rows.iter().all(|row| row["extra"] == json!("")));
    }

    #[test]
    fn test_options_are_ignored() {
        let cdec = CdecStations::new();
        let request = cdec.request(raw_values! { "state" => "CA" }).unwrap();
        assert_eq!(request.warnings().len(), 1);
        assert!(cdec.params(&request).unwrap().is_empty());
        assert_eq!(cdec.url(&request).unwrap(), CDEC_STATIONS_URL);
    }
}
