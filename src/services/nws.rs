//! National Weather Service river forecasts: AHPS hydrographs and CNRFC ensembles.

use crate::decode::error::DecodeError;
use crate::decode::{Format, Record};
use crate::options::filter_option::FilterOption;
use crate::options::schema::{
    Schema, SchemaCache, BASIN, COUNTY, END_DATE, PARAMETER, START_DATE, STATE, STATION,
};
use crate::request::builder::RequestBuilder;
use crate::request::error::SerializeError;
use crate::request::params::SerializedParams;
use crate::services::{required_date, required_text, Webservice};
use serde_json::Value;

pub const AHPS_URL: &str = "http://water.weather.gov/ahps2/hydrograph_to_xml.php";
pub const CNRFC_BASE_URL: &str = "http://www.cnrfc.noaa.gov/csv/";

pub const REGION: &str = "region";

fn declare_hydro_schema() -> Schema {
    Schema::base()
        .ignore([START_DATE, END_DATE, STATE, COUNTY, PARAMETER, BASIN])
        .with(STATION, FilterOption::text().wire_name("gage").build())
}

fn declare_ensemble_schema() -> Schema {
    Schema::base()
        .ignore([STATE, COUNTY, PARAMETER])
        .with(END_DATE, FilterOption::date().build())
        .with(BASIN, FilterOption::text().required(true).build())
        .with(
            REGION,
            FilterOption::choice(["cnrfc"]).default_value("cnrfc").build(),
        )
}

static HYDRO_SCHEMA: SchemaCache = SchemaCache::new(declare_hydro_schema);
static ENSEMBLE_SCHEMA: SchemaCache = SchemaCache::new(declare_ensemble_schema);

/// Three-day stage and flow forecast for one AHPS gage.
#[derive(Debug, Clone)]
pub struct HydroForecast {
    url: String,
}

impl Default for HydroForecast {
    fn default() -> Self {
        Self {
            url: AHPS_URL.to_string(),
        }
    }
}

impl HydroForecast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

impl Webservice for HydroForecast {
    fn name(&self) -> &str {
        "nws-hydroforecast"
    }

    fn schema(&self) -> &'static Schema {
        HYDRO_SCHEMA.resolve()
    }

    fn url(&self, _request: &RequestBuilder<'_>) -> Result<String, SerializeError> {
        Ok(self.url.clone())
    }

    fn format(&self, _request: &RequestBuilder<'_>) -> Format {
        Format::Xml {
            item_path: &["forecast", "datum"],
        }
    }

    /// Keeps the forecast time and names the stage and flow columns after their units.
    fn normalize(
        &self,
        records: Vec<Record>,
        _request: &RequestBuilder<'_>,
    ) -> Result<Vec<Record>, DecodeError> {
        Ok(records
            .into_iter()
            .map(|record| {
                let mut row = Record::new();
                let valid = record
                    .get("valid")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                row.insert(
                    "date".to_string(),
                    Value::String(valid.replace("-00:00", "")),
                );
                for series in ["primary", "secondary"] {
                    let name = record
                        .get(&format!("{}.name", series))
                        .and_then(Value::as_str)
                        .unwrap_or(series);
                    let value = record.get(series).cloned().unwrap_or(Value::Null);
                    row.insert(name.to_string(), value);
                }
                row
            })
            .collect())
    }
}

/// Daily ensemble streamflow forecasts from the California Nevada River Forecast Center.
///
/// The forecast issued on `start_date` for `basin` is a zip archive holding one CSV of
/// traces. Each record is one `site`, trace `year`, `date` and `value`; `station` and
/// `end_date` only narrow the rows taken from it.
#[derive(Debug, Clone)]
pub struct EnsembleForecast {
    base_url: String,
}

impl Default for EnsembleForecast {
    fn default() -> Self {
        Self {
            base_url: CNRFC_BASE_URL.to_string(),
        }
    }
}

impl EnsembleForecast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Drops rows for other stations and rows dated after `end_date`.
    ///
    /// Rows are expected to carry `site` and `date` (`%Y-%m-%d %H:%M:%S`) fields.
    pub fn filter_rows(records: Vec<Record>, request: &RequestBuilder<'_>) -> Vec<Record> {
        let stations = request.texts(STATION);
        let cutoff = request
            .date(END_DATE)
            .map(|date| format!("{} 23:59:59", date.format("%Y-%m-%d")));
        records
            .into_iter()
            .filter(|record| {
                stations.is_empty()
                    || record
                        .get("site")
                        .and_then(Value::as_str)
                        .is_some_and(|site| stations.iter().any(|station| station == site))
            })
            .filter(|record| match (&cutoff, record.get("date").and_then(Value::as_str)) {
                (Some(cutoff), Some(date)) => date <= cutoff.as_str(),
                _ => true,
            })
            .collect()
    }
}

impl Webservice for EnsembleForecast {
    fn name(&self) -> &str {
        "cnrfc-ensemble"
    }

    fn schema(&self) -> &'static Schema {
        ENSEMBLE_SCHEMA.resolve()
    }

    fn url(&self, request: &RequestBuilder<'_>) -> Result<String, SerializeError> {
        let start = required_date(self.name(), request, START_DATE)?;
        let basin = required_text(self.name(), request, BASIN)?;
        Ok(format!(
            "{}{}12_{}_hefs_csv_daily.zip",
            self.base_url,
            start.format("%Y%m%d"),
            basin
        ))
    }

    /// Everything is encoded in the URL.
    fn serialize(&self, _request: &RequestBuilder<'_>) -> Result<SerializedParams, SerializeError> {
        Ok(SerializedParams::new())
    }

    fn format(&self, _request: &RequestBuilder<'_>) -> Format {
        Format::Zip {
            member: &Format::EnsembleCsv,
        }
    }

    fn normalize(
        &self,
        records: Vec<Record>,
        request: &RequestBuilder<'_>,
    ) -> Result<Vec<Record>, DecodeError> {
        Ok(Self::filter_rows(records, request))
    }
}
