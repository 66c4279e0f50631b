//! Applied Climate Information System (ACIS) web services.
//!
//! Simple requests go out as plain query parameters; once an element carries extra
//! settings the whole request is sent as a JSON object in the `params` parameter.

use crate::decode::error::DecodeError;
use crate::decode::{Format, Record};
use crate::options::filter_option::FilterOption;
use crate::options::schema::{Schema, SchemaCache, END_DATE, PARAMETER, START_DATE, STATION};
use crate::options::value::Scalar;
use crate::request::builder::RequestBuilder;
use crate::request::error::SerializeError;
use crate::request::params::{ParamValue, SerializedParams};
use crate::request::serializer::{JsonParamsSerializer, ParamSerializer};
use crate::services::Webservice;
use crate::utils::date_range;
use serde_json::{Map, Value};

pub const ACIS_BASE_URL: &str = "http://data.rcc-acis.org/";

/// Per-element flags requested alongside each value, e.g. `f` (flag) or `t` (obs time).
pub const ADD: &str = "add";

/// Metadata fields requested for every station.
pub const DEFAULT_META_FIELDS: [&str; 8] = [
    "name", "state", "sids", "ll", "elev", "uid", "county", "climdiv",
];

/// Wire names that select the stations a request covers.
const REGION_PARAMS: [&str; 4] = ["state", "county", "basin", "sids"];

/// Station id authorities, by the numeric code ACIS appends to each id.
const AUTHORITIES: [(&str, &str); 10] = [
    ("1", "WBAN"),
    ("2", "COOP"),
    ("3", "FAA"),
    ("4", "WMO"),
    ("5", "ICAO"),
    ("6", "GHCN"),
    ("7", "NWSLI"),
    ("8", "RCC"),
    ("9", "ThreadEx"),
    ("10", "CoCoRaHS"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcisEndpoint {
    /// `StnMeta`: station metadata for a region.
    StationMeta,
    /// `MultiStnData`: daily series for every station in a region.
    StationData,
}

impl AcisEndpoint {
    pub fn path(&self) -> &'static str {
        match self {
            AcisEndpoint::StationMeta => "StnMeta",
            AcisEndpoint::StationData => "MultiStnData",
        }
    }

    fn namespace(&self) -> &'static str {
        match self {
            AcisEndpoint::StationMeta => "meta",
            AcisEndpoint::StationData => "data",
        }
    }
}

fn declare_meta_schema() -> Schema {
    Schema::base()
        .with(START_DATE, FilterOption::date().wire_name("sdate").build())
        .with(END_DATE, FilterOption::date().wire_name("edate").build())
        .with(STATION, FilterOption::text().wire_name("sids").multi(true).build())
        .with(PARAMETER, FilterOption::text().wire_name("elems").multi(true).build())
}

fn declare_data_schema() -> Schema {
    declare_meta_schema()
        .with(
            START_DATE,
            FilterOption::date().wire_name("sdate").required(true).build(),
        )
        .with(
            END_DATE,
            FilterOption::date().wire_name("edate").required(true).build(),
        )
        .with(ADD, FilterOption::text().multi(true).build())
}

static META_SCHEMA: SchemaCache = SchemaCache::new(declare_meta_schema);
static DATA_SCHEMA: SchemaCache = SchemaCache::new(declare_data_schema);

/// Loads station metadata or daily data from ACIS.
///
/// ```
/// use climata::services::acis::Acis;
/// use climata::services::Webservice;
/// use climata::raw_values;
///
/// let acis = Acis::station_data();
/// let request = acis.request(raw_values! {
///     "basin" => "07010206",
///     "start_date" => "2014-07-01",
///     "end_date" => "2014-07-02",
///     "parameter" => ["pcpn", "maxt"],
/// })?;
/// let params = acis.params(&request)?;
/// assert_eq!(params.get("elems"), Some("pcpn,maxt"));
/// assert_eq!(params.get("sdate"), Some("2014-07-01"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Acis {
    endpoint: AcisEndpoint,
    base_url: String,
}

impl Acis {
    pub fn new(endpoint: AcisEndpoint) -> Self {
        Self {
            endpoint,
            base_url: ACIS_BASE_URL.to_string(),
        }
    }

    pub fn station_meta() -> Self {
        Self::new(AcisEndpoint::StationMeta)
    }

    pub fn station_data() -> Self {
        Self::new(AcisEndpoint::StationData)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn endpoint(&self) -> AcisEndpoint {
        self.endpoint
    }

    /// Element names in request order, whether given as codes or as element objects.
    fn element_names(request: &RequestBuilder<'_>) -> Vec<String> {
        request
            .value(PARAMETER)
            .map(|value| {
                value
                    .as_list()
                    .into_iter()
                    .map(|element| match element {
                        Scalar::Map(map) => map
                            .get("name")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        other => other.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn normalize_meta(record: &mut Record, elements: &[String]) {
        if let Some(Value::Array(sids)) = record.get("sids") {
            let ids: Map<String, Value> = sids
                .iter()
                .filter_map(Value::as_str)
                .filter_map(|sid| sid.split_once(' '))
                .map(|(id, code)| {
                    let authority = AUTHORITIES
                        .iter()
                        .find(|(number, _)| *number == code)
                        .map_or(code, |(_, name)| *name);
                    (authority.to_string(), Value::String(id.to_string()))
                })
                .collect();
            record.insert("sids".to_string(), Value::Object(ids));
        }
        if let Some(Value::Array(ranges)) = record.get("valid_daterange") {
            let ranges: Map<String, Value> = elements
                .iter()
                .zip(ranges.iter())
                .map(|(element, range)| {
                    let range = match range.as_array().map(Vec::as_slice) {
                        Some([start, end]) => Value::Array(vec![start.clone(), end.clone()]),
                        _ => Value::Array(vec![Value::Null, Value::Null]),
                    };
                    (element.clone(), range)
                })
                .collect();
            record.insert("valid_daterange".to_string(), Value::Object(ranges));
        }
    }

    /// Expands one `{meta, data}` station into one record per day.
    ///
    /// `data` rows carry no dates; row `n` is `n` days after the start date.
    fn expand_station(
        mut station: Record,
        elements: &[String],
        request: &RequestBuilder<'_>,
    ) -> Result<Vec<Record>, DecodeError> {
        let mut meta = match station.remove("meta") {
            Some(Value::Object(meta)) => meta,
            _ => return Err(DecodeError::UnexpectedShape("station without meta".to_string())),
        };
        Self::normalize_meta(&mut meta, elements);
        let rows = match station.remove("data") {
            Some(Value::Array(rows)) => rows,
            _ => return Ok(Vec::new()),
        };

        let (Some(start), Some(end)) = (request.date(START_DATE), request.date(END_DATE)) else {
            return Err(DecodeError::UnexpectedShape(
                "daily data without a date range".to_string(),
            ));
        };

        Ok(date_range(start, end)
            .into_iter()
            .zip(rows)
            .map(|(date, row)| {
                let mut record = meta.clone();
                record.insert(
                    "date".to_string(),
                    Value::String(date.format("%Y-%m-%d").to_string()),
                );
                if let Value::Array(values) = row {
                    for (element, value) in elements.iter().zip(values) {
                        record.insert(element.clone(), value);
                    }
                }
                record
            })
            .collect())
    }
}

impl Webservice for Acis {
    fn name(&self) -> &str {
        match self.endpoint {
            AcisEndpoint::StationMeta => "acis-meta",
            AcisEndpoint::StationData => "acis-data",
        }
    }

    fn schema(&self) -> &'static Schema {
        match self.endpoint {
            AcisEndpoint::StationMeta => META_SCHEMA.resolve(),
            AcisEndpoint::StationData => DATA_SCHEMA.resolve(),
        }
    }

    fn url(&self, _request: &RequestBuilder<'_>) -> Result<String, SerializeError> {
        Ok(format!("{}{}", self.base_url, self.endpoint.path()))
    }

    /// Adds the metadata field list and folds `add` flags into each element.
    fn serialize(&self, request: &RequestBuilder<'_>) -> Result<SerializedParams, SerializeError> {
        let mut params = request.build_params();
        if REGION_PARAMS.iter().all(|key| params.get(key).is_none()) {
            return Err(SerializeError::MissingValue {
                service: self.name().to_string(),
                name: "region (state, county, basin or station)".to_string(),
            });
        }

        let mut meta: Vec<ParamValue> =
            DEFAULT_META_FIELDS.iter().map(|&field| field.into()).collect();
        if params.get("elems").is_some() {
            meta.push("valid_daterange".into());
        }
        params.insert("meta", meta);

        if let Some(add) = params.remove(ADD) {
            let flags: Vec<&str> = add.iter().filter_map(ParamValue::as_text).collect();
            let flags = flags.join(",");
            let elements = params
                .remove("elems")
                .unwrap_or_default()
                .into_iter()
                .map(|element| {
                    let mut object = match element {
                        ParamValue::Structured(object) => object,
                        ParamValue::Text(name) => {
                            let mut object = Map::new();
                            object.insert("name".to_string(), Value::String(name));
                            object
                        }
                    };
                    object.insert("add".to_string(), Value::String(flags.clone()));
                    ParamValue::Structured(object)
                })
                .collect();
            params.insert("elems", elements);
            params.mark_complex();
        }

        JsonParamsSerializer::default().serialize(&params)
    }

    fn format(&self, _request: &RequestBuilder<'_>) -> Format {
        Format::Json {
            namespace: Some(self.endpoint.namespace()),
        }
    }

    fn normalize(
        &self,
        records: Vec<Record>,
        request: &RequestBuilder<'_>,
    ) -> Result<Vec<Record>, DecodeError> {
        let elements = Self::element_names(request);
        match self.endpoint {
            AcisEndpoint::StationMeta => Ok(records
                .into_iter()
                .map(|mut record| {
                    Self::normalize_meta(&mut record, &elements);
                    record
                })
                .collect()),
            AcisEndpoint::StationData => {
                let mut rows = Vec::new();
                for station in records {
                    rows.extend(Self::expand_station(station, &elements, request)?);
                }
                Ok(rows)
            }
        }
    }
}
