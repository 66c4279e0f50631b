//! Adapters for the supported climate and hydrology web services.
//!
//! Each adapter declares its option schema once, and knows how to build the request URL,
//! which fixed parameters to send, how its response body is encoded, and how to clean up
//! the decoded records.

pub mod acis;
pub mod cdec;
pub mod cocorahs;
pub mod epa;
pub mod huc8;
pub mod hydromet;
pub mod nws;
pub mod owrd;
pub mod snotel;
pub mod usgs;

use crate::decode::error::DecodeError;
use crate::decode::{Format, Record};
use crate::options::error::ValidationError;
use crate::options::schema::Schema;
use crate::options::value::RawValues;
use crate::request::builder::RequestBuilder;
use crate::request::error::SerializeError;
use crate::request::params::SerializedParams;

/// How a service is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// Plain HTTP GET with query parameters.
    Http,
    /// A SOAP operation; requests can be built but not sent by this crate.
    Soap,
}

/// A remote data source described by its option schema.
pub trait Webservice: Send + Sync {
    /// Short identifier, used in log messages and cache file names.
    fn name(&self) -> &str;

    fn schema(&self) -> &'static Schema;

    /// Request URL without query parameters.
    fn url(&self, request: &RequestBuilder<'_>) -> Result<String, SerializeError>;

    /// Fixed parameters sent with every request.
    fn default_params(&self) -> &'static [(&'static str, &'static str)] {
        &[]
    }

    /// Serializes the validated options. Services with unusual parameter shapes override this.
    fn serialize(&self, request: &RequestBuilder<'_>) -> Result<SerializedParams, SerializeError> {
        request.serialize()
    }

    fn format(&self, request: &RequestBuilder<'_>) -> Format;

    /// Post-processes decoded records.
    fn normalize(
        &self,
        records: Vec<Record>,
        _request: &RequestBuilder<'_>,
    ) -> Result<Vec<Record>, DecodeError> {
        Ok(records)
    }

    fn transport(&self) -> Transport {
        Transport::Http
    }

    /// Validates `values` against this service's schema.
    fn request(&self, values: RawValues) -> Result<RequestBuilder<'static>, ValidationError> {
        RequestBuilder::construct(self.schema(), values)
    }

    /// Default parameters followed by the serialized options.
    ///
    /// A default is dropped when the serialized options carry the same key.
    fn params(&self, request: &RequestBuilder<'_>) -> Result<SerializedParams, SerializeError> {
        let serialized = self.serialize(request)?;
        let mut params: SerializedParams = self
            .default_params()
            .iter()
            .filter(|(key, _)| serialized.get(key).is_none())
            .map(|&(key, value)| (key, value))
            .collect();
        for (key, value) in serialized {
            params.push(key, value);
        }
        Ok(params)
    }
}

/// Value of a required option that has already passed validation.
pub(crate) fn required_text(
    service: &str,
    request: &RequestBuilder<'_>,
    name: &str,
) -> Result<String, SerializeError> {
    request.text(name).ok_or_else(|| SerializeError::MissingValue {
        service: service.to_string(),
        name: name.to_string(),
    })
}

pub(crate) fn required_date(
    service: &str,
    request: &RequestBuilder<'_>,
    name: &str,
) -> Result<chrono::NaiveDate, SerializeError> {
    request.date(name).ok_or_else(|| SerializeError::MissingValue {
        service: service.to_string(),
        name: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::filter_option::FilterOption;
    use crate::options::schema::SchemaCache;
    use crate::raw_values;

    fn declare() -> Schema {
        Schema::new()
            .with("station", FilterOption::text().required(true).build())
            .with("format", FilterOption::text().build())
    }

    static SCHEMA: SchemaCache = SchemaCache::new(declare);

    struct Dummy;

    impl Webservice for Dummy {
        fn name(&self) -> &str {
            "dummy"
        }

        fn schema(&self) -> &'static Schema {
            SCHEMA.resolve()
        }

        fn url(&self, _request: &RequestBuilder<'_>) -> Result<String, SerializeError> {
            Ok("http://localhost/dummy".to_string())
        }

        fn default_params(&self) -> &'static [(&'static str, &'static str)] {
            &[("format", "json"), ("verbose", "1")]
        }

        fn format(&self, _request: &RequestBuilder<'_>) -> Format {
            Format::Json { namespace: None }
        }
    }

    #[test]
    fn test_defaults_come_first() {
        let request = Dummy.request(raw_values! { "station" => "HPD" }).unwrap();
        let params = Dummy.params(&request).unwrap().into_inner();
        assert_eq!(
            params,
            vec![
                ("format".to_string(), "json".to_string()),
                ("verbose".to_string(), "1".to_string()),
                ("station".to_string(), "HPD".to_string()),
            ]
        );
    }

    #[test]
    fn test_serialized_values_replace_defaults() {
        let request = Dummy
            .request(raw_values! { "station" => "HPD", "format" => "xml" })
            .unwrap();
        let params = Dummy.params(&request).unwrap();
        assert_eq!(params.len(), 3);
        assert_eq!(params.get("format"), Some("xml"));
    }

    #[test]
    fn test_request_validates() {
        assert!(Dummy.request(RawValues::new()).is_err());
    }
}
