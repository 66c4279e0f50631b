//! USGS National Water Information System (NWIS) REST services.

use crate::decode::Format;
use crate::options::filter_option::FilterOption;
use crate::options::schema::{
    Schema, SchemaCache, BASE_OPTIONS, BASIN, COUNTY, END_DATE, PARAMETER, START_DATE, STATE,
    STATION,
};
use crate::request::builder::RequestBuilder;
use crate::request::error::SerializeError;
use crate::request::params::SerializedParams;
use crate::services::Webservice;

pub const NWIS_BASE_URL: &str = "http://waterservices.usgs.gov/nwis/";
pub const CODE_BASE_URL: &str = "http://help.waterdata.usgs.gov/code/";

pub const SITE_TYPE: &str = "sitetype";

/// NWIS site type codes accepted by the `siteType` filter.
pub const SITE_TYPES: [&str; 41] = [
    "AG", "AS", "AT", "AW", "ES", "FA", "FA-CI", "FA-CS", "FA-DV", "FA-FON", "FA-GC", "FA-HP",
    "FA-LF", "FA-OF", "FA-PV", "FA-QC", "FA-SEW", "FA-SPS", "FA-STS", "FA-TEP", "FA-WDS",
    "FA-WIW", "FA-WTP", "FA-WU", "FA-WWD", "FA-WWTP", "GL", "GW", "GW-CR", "GW-EX", "GW-HZ",
    "GW-IW", "GW-MW", "GW-TH", "LA", "LK", "OC", "SB", "SP", "ST", "WE",
];

/// The NWIS service paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NwisService {
    /// Site metadata, as RDB.
    Sites,
    /// Daily values, as WaterML 1.1.
    DailyValues,
    /// Instantaneous values, as WaterML 1.1.
    InstantValues,
}

impl NwisService {
    pub fn path(&self) -> &'static str {
        match self {
            NwisService::Sites => "site",
            NwisService::DailyValues => "dv",
            NwisService::InstantValues => "iv",
        }
    }
}

fn declare_schema() -> Schema {
    Schema::base()
        .with(START_DATE, FilterOption::date().wire_name("startDT").build())
        .with(END_DATE, FilterOption::date().wire_name("endDT").build())
        .with(STATE, FilterOption::text().wire_name("stateCd").build())
        .with(
            COUNTY,
            FilterOption::text().wire_name("countyCd").multi(true).build(),
        )
        .with(BASIN, FilterOption::text().wire_name("huc").multi(true).build())
        .with(STATION, FilterOption::text().wire_name("site").multi(true).build())
        .with(
            PARAMETER,
            FilterOption::text()
                .wire_name("parameterCd")
                .multi(true)
                .build(),
        )
        .with(
            SITE_TYPE,
            FilterOption::choice(SITE_TYPES)
                .wire_name("siteType")
                .multi(true)
                .build(),
        )
}

static SCHEMA: SchemaCache = SchemaCache::new(declare_schema);

fn declare_code_schema() -> Schema {
    Schema::base().ignore(BASE_OPTIONS)
}

static CODE_SCHEMA: SchemaCache = SchemaCache::new(declare_code_schema);

/// Loads site metadata or time series from NWIS.
///
/// ```
/// use climata::services::usgs::{Nwis, NwisService};
/// use climata::services::Webservice;
/// use climata::raw_values;
///
/// let nwis = Nwis::new(NwisService::DailyValues);
/// let request = nwis.request(raw_values! {
///     "station" => "05331000",
///     "parameter" => "00060",
///     "start_date" => "2014-07-01",
/// })?;
/// assert_eq!(nwis.url(&request)?, "http://waterservices.usgs.gov/nwis/dv/");
/// assert_eq!(nwis.params(&request)?.get("startDT"), Some("2014-07-01"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Nwis {
    service: NwisService,
    base_url: String,
}

impl Nwis {
    pub fn new(service: NwisService) -> Self {
        Self {
            service,
            base_url: NWIS_BASE_URL.to_string(),
        }
    }

    /// Points the adapter at another host; `base_url` must end with a slash.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn sites() -> Self {
        Self::new(NwisService::Sites)
    }

    pub fn daily_values() -> Self {
        Self::new(NwisService::DailyValues)
    }

    pub fn instant_values() -> Self {
        Self::new(NwisService::InstantValues)
    }

    pub fn service(&self) -> NwisService {
        self.service
    }
}

impl Webservice for Nwis {
    fn name(&self) -> &str {
        match self.service {
            NwisService::Sites => "nwis-sites",
            NwisService::DailyValues => "nwis-dv",
            NwisService::InstantValues => "nwis-iv",
        }
    }

    fn schema(&self) -> &'static Schema {
        SCHEMA.resolve()
    }

    fn url(&self, _request: &RequestBuilder<'_>) -> Result<String, SerializeError> {
        Ok(format!("{}{}/", self.base_url, self.service.path()))
    }

    fn default_params(&self) -> &'static [(&'static str, &'static str)] {
        match self.service {
            NwisService::Sites => &[
                ("format", "rdb,1.0"),
                ("outputDataTypeCd", "all"),
                ("siteStatus", "active"),
            ],
            NwisService::DailyValues | NwisService::InstantValues => {
                &[("format", "waterml,1.1")]
            }
        }
    }

    fn format(&self, _request: &RequestBuilder<'_>) -> Format {
        match self.service {
            NwisService::Sites => Format::Rdb,
            NwisService::DailyValues | NwisService::InstantValues => Format::WaterMl,
        }
    }
}

/// The USGS parameter code tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterTable {
    /// Codes with a fixed list of values, e.g. sample medium or analysis status.
    Fixed,
    /// Numeric parameter codes (`00060` discharge, ...) across every parameter group.
    Numeric,
}

impl ParameterTable {
    pub fn query(&self) -> &'static str {
        match self {
            ParameterTable::Fixed => "fixed_parms_query",
            ParameterTable::Numeric => "parameter_cd_query",
        }
    }
}

/// Downloads a USGS parameter code table as RDB rows.
///
/// Takes no options; every row of the table is returned.
#[derive(Debug, Clone)]
pub struct ParameterCodes {
    table: ParameterTable,
    base_url: String,
}

impl ParameterCodes {
    pub fn new(table: ParameterTable) -> Self {
        Self {
            table,
            base_url: CODE_BASE_URL.to_string(),
        }
    }

    pub fn fixed() -> Self {
        Self::new(ParameterTable::Fixed)
    }

    pub fn numeric() -> Self {
        Self::new(ParameterTable::Numeric)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Webservice for ParameterCodes {
    fn name(&self) -> &str {
        match self.table {
            ParameterTable::Fixed => "usgs-fixed-codes",
            ParameterTable::Numeric => "usgs-parameter-codes",
        }
    }

    fn schema(&self) -> &'static Schema {
        CODE_SCHEMA.resolve()
    }

    fn url(&self, _request: &RequestBuilder<'_>) -> Result<String, SerializeError> {
        Ok(format!("{}{}", self.base_url, self.table.query()))
    }

    fn default_params(&self) -> &'static [(&'static str, &'static str)] {
        match self.table {
            ParameterTable::Fixed => &[("fmt", "rdb")],
            ParameterTable::Numeric => &[("fmt", "rdb"), ("group_cd", "%")],
        }
    }

    fn serialize(&self, _request: &RequestBuilder<'_>) -> Result<SerializedParams, SerializeError> {
        Ok(SerializedParams::new())
    }

    fn format(&self, _request: &RequestBuilder<'_>) -> Format {
        Format::Rdb
    }
}
