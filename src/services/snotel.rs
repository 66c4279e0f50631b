//! NRCS SNOTEL Air-Water Database (AWDB) SOAP operations.
//!
//! The AWDB is only reachable over SOAP. Requests are validated and serialized here
//! into a [`SoapCall`]; sending the envelope is left to a SOAP client.

use crate::decode::{Format, Record};
use crate::options::filter_option::FilterOption;
use crate::options::schema::{
    Schema, SchemaCache, BASE_OPTIONS, BASIN, COUNTY, END_DATE, PARAMETER, START_DATE, STATE,
    STATION,
};
use crate::request::builder::RequestBuilder;
use crate::request::error::SerializeError;
use crate::request::params::SerializedParams;
use crate::services::{Transport, Webservice};
use crate::utils::fill_date_range;
use serde::Serialize;
use serde_json::Value;

pub const AWDB_WSDL_URL: &str = "https://wcc.sc.egov.usda.gov/awdbWebService/services?WSDL";

pub const MIN_LATITUDE: &str = "min_latitude";
pub const MAX_LATITUDE: &str = "max_latitude";
pub const MIN_ELEVATION: &str = "min_elevation";
pub const MAX_ELEVATION: &str = "max_elevation";
pub const ORDINALS: &str = "ordinals";
pub const STATION_IDS: &str = "station_ids";
pub const BEGIN_HOUR: &str = "begin_hour";
pub const END_HOUR: &str = "end_hour";
pub const FORECAST_PERIOD: &str = "forecast_period";
pub const PUBLICATION_DATE: &str = "publication_date";

/// Begin and end dates of `getData` results carry a time of day.
const AWDB_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The supported AWDB operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnotelFunction {
    /// Station triplets matching region and element filters.
    Stations,
    StationMetadata,
    /// Elements recorded at one station.
    StationElements,
    /// Daily values of one element.
    DailyData,
    /// Hourly values of one element.
    HourlyData,
    /// Streamflow forecast published on a given date.
    Forecast,
}

impl SnotelFunction {
    pub fn operation(&self) -> &'static str {
        match self {
            SnotelFunction::Stations => "getStations",
            SnotelFunction::StationMetadata => "getStationMetadata",
            SnotelFunction::StationElements => "getStationElements",
            SnotelFunction::DailyData => "getData",
            SnotelFunction::HourlyData => "getHourlyData",
            SnotelFunction::Forecast => "getForecast",
        }
    }
}

fn snotel_base() -> Schema {
    Schema::base().ignore(BASE_OPTIONS)
}

fn text_field(wire_name: &str) -> FilterOption {
    FilterOption::text()
        .wire_name(wire_name)
        .required(true)
        .build()
}

fn date_field(wire_name: &str) -> FilterOption {
    FilterOption::date()
        .wire_name(wire_name)
        .required(true)
        .build()
}

fn declare_stations() -> Schema {
    let multi = |wire_name: &str| FilterOption::text().wire_name(wire_name).multi(true).build();
    let single = |wire_name: &str| FilterOption::text().wire_name(wire_name).build();
    snotel_base()
        .with(STATE, multi("stateCds"))
        .with(COUNTY, multi("countyNames"))
        .with(BASIN, multi("hucs"))
        .with(PARAMETER, multi("elementCds"))
        .with(MIN_LATITUDE, single("minLatitude"))
        .with(MAX_LATITUDE, single("maxLatitude"))
        .with(MIN_ELEVATION, single("minElevation"))
        .with(MAX_ELEVATION, single("maxElevation"))
        .with(ORDINALS, single("ordinals"))
        .with(STATION_IDS, multi("stationIds"))
}

fn declare_station_metadata() -> Schema {
    snotel_base().with(STATION, text_field("stationTriplet"))
}

fn declare_station_elements() -> Schema {
    snotel_base()
        .with(START_DATE, FilterOption::date().wire_name("beginDate").build())
        .with(END_DATE, FilterOption::date().wire_name("endDate").build())
        .with(STATION, text_field("stationTriplet"))
}

fn declare_daily_data() -> Schema {
    snotel_base()
        .with(STATION, text_field("stationTriplets"))
        .with(PARAMETER, text_field("elementCd"))
        .with(START_DATE, date_field("beginDate"))
        .with(END_DATE, date_field("endDate"))
}

fn declare_hourly_data() -> Schema {
    declare_daily_data()
        .with(BEGIN_HOUR, FilterOption::text().wire_name("beginHour").build())
        .with(END_HOUR, FilterOption::text().wire_name("endHour").build())
}

fn declare_forecast() -> Schema {
    snotel_base()
        .with(STATION, text_field("stationTriplets"))
        .with(PARAMETER, text_field("elementCd"))
        .with(FORECAST_PERIOD, text_field("forecastPeriod"))
        .with(PUBLICATION_DATE, date_field("publicationDate"))
}

static STATIONS: SchemaCache = SchemaCache::new(declare_stations);
static STATION_METADATA: SchemaCache = SchemaCache::new(declare_station_metadata);
static STATION_ELEMENTS: SchemaCache = SchemaCache::new(declare_station_elements);
static DAILY_DATA: SchemaCache = SchemaCache::new(declare_daily_data);
static HOURLY_DATA: SchemaCache = SchemaCache::new(declare_hourly_data);
static FORECAST: SchemaCache = SchemaCache::new(declare_forecast);

/// A serialized AWDB operation, ready to be wrapped in a SOAP envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SoapCall {
    pub function: &'static str,
    pub params: SerializedParams,
}

/// One AWDB operation.
///
/// ```
/// use climata::services::snotel::Snotel;
/// use climata::services::Webservice;
/// use climata::raw_values;
///
/// let snotel = Snotel::daily_data();
/// let request = snotel.request(raw_values! {
///     "station" => "302:OR:SNTL",
///     "parameter" => "WTEQ",
///     "start_date" => "2014-07-01",
///     "end_date" => "2014-07-31",
/// })?;
/// let call = snotel.soap_call(&request)?;
/// assert_eq!(call.function, "getData");
/// assert_eq!(call.params.get("stationTriplets"), Some("302:OR:SNTL"));
/// assert_eq!(call.params.get("duration"), Some("DAILY"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Snotel {
    function: SnotelFunction,
}

impl Snotel {
    pub fn new(function: SnotelFunction) -> Self {
        Self { function }
    }

    pub fn stations() -> Self {
        Self::new(SnotelFunction::Stations)
    }

    pub fn station_metadata() -> Self {
        Self::new(SnotelFunction::StationMetadata)
    }

    pub fn station_elements() -> Self {
        Self::new(SnotelFunction::StationElements)
    }

    pub fn daily_data() -> Self {
        Self::new(SnotelFunction::DailyData)
    }

    pub fn hourly_data() -> Self {
        Self::new(SnotelFunction::HourlyData)
    }

    pub fn forecast() -> Self {
        Self::new(SnotelFunction::Forecast)
    }

    pub fn function(&self) -> SnotelFunction {
        self.function
    }

    pub fn soap_call(&self, request: &RequestBuilder<'_>) -> Result<SoapCall, SerializeError> {
        Ok(SoapCall {
            function: self.function.operation(),
            params: self.params(request)?,
        })
    }

    /// Turns a `getData` result into dated rows.
    ///
    /// The service reports only the first and last date of a series, so each value is
    /// paired with its day by position.
    pub fn daily_rows(
        begin_date: &str,
        end_date: &str,
        values: &[Value],
        flags: &[Value],
    ) -> Result<Vec<Record>, chrono::ParseError> {
        let dates = fill_date_range(begin_date, end_date, AWDB_DATE_FORMAT)?;
        Ok(dates
            .into_iter()
            .zip(values)
            .enumerate()
            .map(|(index, (date, value))| {
                let mut row = Record::new();
                row.insert(
                    "date".to_string(),
                    Value::String(date.format("%Y-%m-%d").to_string()),
                );
                row.insert("value".to_string(), value.clone());
                row.insert(
                    "flag".to_string(),
                    flags.get(index).cloned().unwrap_or(Value::Null),
                );
                row
            })
            .collect())
    }
}

impl Webservice for Snotel {
    fn name(&self) -> &str {
        self.function.operation()
    }

    fn schema(&self) -> &'static Schema {
        match self.function {
            SnotelFunction::Stations => STATIONS.resolve(),
            SnotelFunction::StationMetadata => STATION_METADATA.resolve(),
            SnotelFunction::StationElements => STATION_ELEMENTS.resolve(),
            SnotelFunction::DailyData => DAILY_DATA.resolve(),
            SnotelFunction::HourlyData => HOURLY_DATA.resolve(),
            SnotelFunction::Forecast => FORECAST.resolve(),
        }
    }

    fn url(&self, _request: &RequestBuilder<'_>) -> Result<String, SerializeError> {
        Ok(AWDB_WSDL_URL.to_string())
    }

    fn default_params(&self) -> &'static [(&'static str, &'static str)] {
        match self.function {
            SnotelFunction::Stations => &[("logicalAnd", "true")],
            SnotelFunction::DailyData => &[
                ("ordinal", "1"),
                ("duration", "DAILY"),
                ("getFlags", "true"),
                ("alwaysReturnDailyFeb29", "false"),
            ],
            SnotelFunction::HourlyData => &[("ordinal", "1")],
            _ => &[],
        }
    }

    fn format(&self, _request: &RequestBuilder<'_>) -> Format {
        Format::Xml {
            item_path: match self.function {
                SnotelFunction::Stations => &["Body", "getStationsResponse", "return"],
                SnotelFunction::StationMetadata => {
                    &["Body", "getStationMetadataResponse", "return"]
                }
                SnotelFunction::StationElements => {
                    &["Body", "getStationElementsResponse", "return"]
                }
                SnotelFunction::DailyData => &["Body", "getDataResponse", "return"],
                SnotelFunction::HourlyData => &["Body", "getHourlyDataResponse", "return"],
                SnotelFunction::Forecast => &["Body", "getForecastResponse", "return"],
            },
        }
    }

    fn transport(&self) -> Transport {
        Transport::Soap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::error::OptionError;
    use crate::raw_values;
    use serde_json::json;

    #[test]
    fn test_station_search_params() {
        let snotel = Snotel::stations();
        let request = snotel
            .request(raw_values! {
                "basin" => ["17060105", "17060106"],
                "parameter" => "WTEQ",
                "min_elevation" => 5000,
            })
            .unwrap();
        let call = snotel.soap_call(&request).unwrap();
        assert_eq!(call.function, "getStations");
        assert_eq!(call.params.get("logicalAnd"), Some("true"));
        assert_eq!(call.params.get("hucs"), Some("17060105,17060106"));
        assert_eq!(call.params.get("elementCds"), Some("WTEQ"));
        assert_eq!(call.params.get("minElevation"), Some("5000"));
    }

    #[test]
    fn test_metadata_requires_station() {
        let error = Snotel::station_metadata()
            .request(raw_values! {})
            .unwrap_err();
        assert_eq!(
            error.errors(),
            &[OptionError::MissingRequiredValue {
                name: STATION.to_string()
            }]
        );
    }

    #[test]
    fn test_forecast_publication_date() {
        let snotel = Snotel::forecast();
        let request = snotel
            .request(raw_values! {
                "station" => "13340000:ID:USGS",
                "parameter" => "SRVO",
                "forecast_period" => "APR-JUL",
                "publication_date" => "2014-04-01",
            })
            .unwrap();
        let call = snotel.soap_call(&request).unwrap();
        assert_eq!(call.params.get("publicationDate"), Some("2014-04-01"));
        assert_eq!(call.params.get("forecastPeriod"), Some("APR-JUL"));
        assert_eq!(snotel.transport(), Transport::Soap);
    }

    #[test]
    fn test_soap_call_to_json() {
        let snotel = Snotel::station_metadata();
        let request = snotel
            .request(raw_values! { "station" => "302:OR:SNTL" })
            .unwrap();
        let call = snotel.soap_call(&request).unwrap();
        assert_eq!(
            serde_json::to_value(&call).unwrap(),
            json!({
                "function": "getStationMetadata",
                "params": [["stationTriplet", "302:OR:SNTL"]]
            })
        );
    }

    #[test]
    fn test_daily_rows() {
        let rows = Snotel::daily_rows(
            "2014-07-01 00:00:00",
            "2014-07-03 00:00:00",
            &[json!(1.5), json!(1.2), json!(0.9)],
            &[json!("V"), json!("V")],
        )
        .unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2]["date"], json!("2014-07-03"));
        assert_eq!(rows[2]["value"], json!(0.9));
        assert_eq!(rows[2]["flag"], Value::Null);
        assert_eq!(rows[0]["flag"], json!("V"));
    }
}
