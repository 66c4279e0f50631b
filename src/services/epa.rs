//! EPA Water Quality Exchange (WQX) domain value downloads.

use crate::decode::{ColumnRows, Format};
use crate::options::filter_option::FilterOption;
use crate::options::schema::{Schema, SchemaCache, BASE_OPTIONS};
use crate::request::builder::RequestBuilder;
use crate::request::error::SerializeError;
use crate::request::params::SerializedParams;
use crate::services::{required_text, Webservice};

pub const WQX_BASE_URL: &str = "http://cdx.epa.gov/wqx/download/DomainValues/";

pub const DOMAIN: &str = "domain";

/// WQX domain lists that can be downloaded.
pub const DOMAINS: [&str; 24] = [
    "ActivityGroupType",
    "ActivityMedia",
    "ActivityMediaSubdivision",
    "ActivityRelativeDepth",
    "ActivityType",
    "AnalyticalMethod",
    "AssemblageSampled",
    "Characteristic",
    "CharacteristicWithPickList",
    "CountyCode",
    "DetectionQuantitationLimitType",
    "HorizontalCollectionMethod",
    "HorizontalCoordinateReferenceSystemDatum",
    "MeasureUnit",
    "MethodSpeciation",
    "MonitoringLocationType",
    "Organization",
    "ResultDetectionCondition",
    "ResultSampleFraction",
    "ResultStatus",
    "ResultValueType",
    "SampleCollectionEquipment",
    "StateCode",
    "Taxon",
];

fn declare_schema() -> Schema {
    Schema::base().ignore(BASE_OPTIONS).with(
        DOMAIN,
        FilterOption::choice(DOMAINS).required(true).build(),
    )
}

static SCHEMA: SchemaCache = SchemaCache::new(declare_schema);

/// Domain value files hold `<WQXElementRow>` rows of `<WQXElementRowColumn colname value>`.
const DOMAIN_ROWS: Format = Format::XmlColumns(ColumnRows {
    row_tag: "WQXElementRow",
    column_tag: "WQXElementRowColumn",
    name_attribute: "colname",
    value_attribute: "value",
});

/// Loads one WQX domain value list.
///
/// The list is published as a zipped XML file whose name is derived from the domain,
/// so every option is encoded in the URL. Each `WQXElementRow` becomes one record.
#[derive(Debug, Clone)]
pub struct WqxDomain {
    base_url: String,
}

impl Default for WqxDomain {
    fn default() -> Self {
        Self {
            base_url: WQX_BASE_URL.to_string(),
        }
    }
}

impl WqxDomain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Webservice for WqxDomain {
    fn name(&self) -> &str {
        "wqx-domain"
    }

    fn schema(&self) -> &'static Schema {
        SCHEMA.resolve()
    }

    fn url(&self, request: &RequestBuilder<'_>) -> Result<String, SerializeError> {
        let domain = required_text(self.name(), request, DOMAIN)?;
        let file = match domain.as_str() {
            "CharacteristicWithPickList" => "ResultMeasureValuePickList",
            other => other,
        };
        Ok(format!("{}{}.zip", self.base_url, file))
    }

    fn serialize(&self, _request: &RequestBuilder<'_>) -> Result<SerializedParams, SerializeError> {
        Ok(SerializedParams::new())
    }

    fn format(&self, _request: &RequestBuilder<'_>) -> Format {
        Format::Zip {
            member: &DOMAIN_ROWS,
        }
    }
}
