//! Community Collaborative Rain, Hail and Snow Network (CoCoRaHS) report exports.

use crate::decode::error::DecodeError;
use crate::decode::{Format, Record};
use crate::options::filter_option::FilterOption;
use crate::options::schema::{
    Schema, SchemaCache, BASIN, COUNTY, END_DATE, PARAMETER, START_DATE, STATE, STATION,
};
use crate::request::builder::RequestBuilder;
use crate::request::error::SerializeError;
use crate::request::params::SerializedParams;
use crate::services::{required_text, Webservice};
use chrono::{Days, Local};
use serde_json::Value;

pub const COCORAHS_URL: &str = "http://data.cocorahs.org/cocorahs/export/exportreports.aspx";

pub const REPORT_TYPE: &str = "report_type";
pub const DATE_TYPE: &str = "date_type";

const DAILY_ITEMS: &[&str] = &["DailyPrecipReports", "DailyPrecipReport"];
const MULTI_DAY_ITEMS: &[&str] = &["MultiDayPrecipReports", "MultiDayPrecipReport"];

/// Query dates are US-style.
const QUERY_DATE_FORMAT: &str = "%m/%d/%Y";

fn declare_schema() -> Schema {
    Schema::base()
        .ignore([BASIN, STATION, PARAMETER])
        .with(STATE, FilterOption::text().required(true).build())
        .with(COUNTY, FilterOption::text().build())
        .with(START_DATE, FilterOption::date().build())
        .with(END_DATE, FilterOption::date().build())
        .with(
            REPORT_TYPE,
            FilterOption::choice(["Daily", "MultiDay"])
                .default_value("Daily")
                .build(),
        )
        .with(
            DATE_TYPE,
            FilterOption::choice(["reportdate", "timestamp"])
                .default_value("reportdate")
                .build(),
        )
}

static SCHEMA: SchemaCache = SchemaCache::new(declare_schema);

/// Loads daily or multi-day precipitation reports for a state or county.
#[derive(Debug, Clone)]
pub struct CocorahsReports {
    url: String,
}

impl Default for CocorahsReports {
    fn default() -> Self {
        Self {
            url: COCORAHS_URL.to_string(),
        }
    }
}

impl CocorahsReports {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

impl Webservice for CocorahsReports {
    fn name(&self) -> &str {
        "cocorahs"
    }

    fn schema(&self) -> &'static Schema {
        SCHEMA.resolve()
    }

    fn url(&self, _request: &RequestBuilder<'_>) -> Result<String, SerializeError> {
        Ok(self.url.clone())
    }

    fn default_params(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("dtf", "1"),
            ("Format", "XML"),
            ("TimesInGMT", "False"),
            ("responsefields", "all"),
        ]
    }

    fn serialize(&self, request: &RequestBuilder<'_>) -> Result<SerializedParams, SerializeError> {
        let today = Local::now().date_naive();
        let start = request
            .date(START_DATE)
            .unwrap_or_else(|| today.checked_sub_days(Days::new(30)).unwrap_or(today));
        let end = request.date(END_DATE).unwrap_or(today);
        let date_type = required_text(self.name(), request, DATE_TYPE)?;

        let mut params = SerializedParams::new();
        params.push("ReportType", required_text(self.name(), request, REPORT_TYPE)?);
        params.push("State", required_text(self.name(), request, STATE)?);
        if let Some(county) = request.text(COUNTY) {
            params.push("County", county);
        }
        params.push("ReportDateType", date_type.as_str());
        if date_type == "timestamp" {
            params.push(
                "Date",
                format!("{} 12:00 AM", start.format(QUERY_DATE_FORMAT)),
            );
        } else {
            params.push("StartDate", start.format(QUERY_DATE_FORMAT).to_string());
            params.push("EndDate", end.format(QUERY_DATE_FORMAT).to_string());
        }
        Ok(params)
    }

    fn format(&self, request: &RequestBuilder<'_>) -> Format {
        let item_path = match request.text(REPORT_TYPE).as_deref() {
            Some("MultiDay") => MULTI_DAY_ITEMS,
            _ => DAILY_ITEMS,
        };
        Format::Xml { item_path }
    }

    /// Blanks out the `0001-01-01` placeholder the export uses for missing times.
    fn normalize(
        &self,
        records: Vec<Record>,
        _request: &RequestBuilder<'_>,
    ) -> Result<Vec<Record>, DecodeError> {
        Ok(records
            .into_iter()
            .map(|mut record| {
                for value in record.values_mut() {
                    if value.as_str().is_some_and(|text| text.starts_with("0001-01-01")) {
                        *value = Value::Null;
                    }
                }
                record
            })
            .collect())
    }
}
