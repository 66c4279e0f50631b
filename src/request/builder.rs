//! Validated request parameters for one web service call.

use crate::options::error::{OptionError, OptionWarning, ValidationError};
use crate::options::schema::Schema;
use crate::options::value::{OptionValue, RawValues, Scalar};
use crate::request::error::SerializeError;
use crate::request::params::{ParamSet, ParamValue, SerializedParams};
use crate::request::serializer::{ParamSerializer, SimpleSerializer};
use chrono::NaiveDate;
use log::debug;
use std::collections::BTreeMap;

/// Parsed option values for a single request.
///
/// Built with [`RequestBuilder::construct`], which validates every option in the schema
/// and reports all failures at once. The values cannot change afterwards.
///
/// # Examples
///
/// ```
/// use climata::{raw_values, FilterOption, RequestBuilder, Schema};
///
/// let schema = Schema::new()
///     .with("station", FilterOption::text().required(true).build())
///     .with("parameter", FilterOption::text().required(true).multi(true).build());
///
/// let request = RequestBuilder::construct(
///     &schema,
///     raw_values! { "station" => "HPD", "parameter" => ["AF", "GH"] },
/// )?;
///
/// let params = request.serialize()?;
/// assert_eq!(params.get("station"), Some("HPD"));
/// assert_eq!(params.get("parameter"), Some("AF,GH"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct RequestBuilder<'s> {
    schema: &'s Schema,
    values: BTreeMap<String, Option<OptionValue>>,
    warnings: Vec<OptionWarning>,
}

impl<'s> RequestBuilder<'s> {
    /// Validates `raw` against `schema`.
    ///
    /// Each option takes the caller's value or its default. Keys that do not name an
    /// option are reported as [`OptionError::UnknownOption`].
    pub fn construct(schema: &'s Schema, mut raw: RawValues) -> Result<Self, ValidationError> {
        let mut values = BTreeMap::new();
        let mut warnings = Vec::new();
        let mut errors = Vec::new();

        for (name, option) in schema {
            let supplied = raw
                .remove(name)
                .or_else(|| option.default_value().cloned());
            match option.parse(supplied) {
                Ok(value) => {
                    if option.is_ignored() && value.is_some() {
                        warnings.push(OptionWarning::Ignored { name: name.clone() });
                    }
                    values.insert(name.clone(), value);
                }
                Err(error) => errors.push(error),
            }
        }

        errors.extend(
            raw.into_keys()
                .map(|name| OptionError::UnknownOption { name }),
        );

        if !errors.is_empty() {
            return Err(ValidationError::new(errors));
        }

        Ok(Self {
            schema,
            values,
            warnings,
        })
    }

    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    /// The parsed value of `name`, or `None` when it was not supplied.
    pub fn get(&self, name: &str) -> Result<Option<&OptionValue>, OptionError> {
        self.values
            .get(name)
            .map(Option::as_ref)
            .ok_or_else(|| OptionError::UnknownOption {
                name: name.to_string(),
            })
    }

    /// Like [`RequestBuilder::get`], treating unknown names as absent.
    pub fn value(&self, name: &str) -> Option<&OptionValue> {
        self.values.get(name).and_then(Option::as_ref)
    }

    /// First value of `name` as a date.
    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        self.value(name)
            .and_then(OptionValue::first)
            .and_then(Scalar::as_date)
    }

    /// First value of `name` in its text form.
    pub fn text(&self, name: &str) -> Option<String> {
        self.value(name)
            .and_then(OptionValue::first)
            .map(ToString::to_string)
    }

    /// Every value of `name` in text form; empty when absent.
    pub fn texts(&self, name: &str) -> Vec<String> {
        self.value(name)
            .map(|value| value.as_list().into_iter().map(ToString::to_string).collect())
            .unwrap_or_default()
    }

    pub fn warnings(&self) -> &[OptionWarning] {
        &self.warnings
    }

    /// Collects every non-ignored, supplied option keyed by wire name.
    pub fn build_params(&self) -> ParamSet {
        let mut params = ParamSet::new();
        for (name, option) in self.schema {
            if option.is_ignored() {
                continue;
            }
            let Some(Some(value)) = self.values.get(name) else {
                continue;
            };
            let wire_values = value
                .as_list()
                .into_iter()
                .map(|element| match element {
                    Scalar::Map(map) => ParamValue::Structured(map.clone()),
                    other => ParamValue::Text(other.to_string()),
                })
                .collect();
            params.insert(option.wire_name(), wire_values);
        }
        debug!(
            "Built {} parameter(s), complex: {}",
            params.len(),
            params.is_complex()
        );
        params
    }

    /// Serializes with [`SimpleSerializer`].
    pub fn serialize(&self) -> Result<SerializedParams, SerializeError> {
        self.serialize_with(&SimpleSerializer)
    }

    pub fn serialize_with(
        &self,
        serializer: &dyn ParamSerializer,
    ) -> Result<SerializedParams, SerializeError> {
        serializer.serialize(&self.build_params())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::filter_option::FilterOption;
    use crate::options::schema::{BASIN, END_DATE, PARAMETER, START_DATE, STATION};
    use crate::raw_values;
    use serde_json::{Map, Value};

    fn station_schema() -> Schema {
        Schema::new()
            .with(STATION, FilterOption::text().required(true).build())
            .with(PARAMETER, FilterOption::text().required(true).multi(true).build())
    }

    #[test]
    fn test_defaults_are_used() {
        let schema = Schema::new().with(
            "region",
            FilterOption::choice(["cnrfc"]).default_value("cnrfc").build(),
        );
        let request = RequestBuilder::construct(&schema, RawValues::new()).unwrap();
        assert_eq!(request.text("region"), Some("cnrfc".to_string()));
    }

    #[test]
    fn test_get_unknown_option() {
        let schema = station_schema();
        let request =
            RequestBuilder::construct(&schema, raw_values! { "station" => "HPD", "parameter" => "AF" })
                .unwrap();
        assert!(matches!(
            request.get("county"),
            Err(OptionError::UnknownOption { .. })
        ));
        assert_eq!(request.value("county"), None);
    }

    #[test]
    fn test_unknown_keys_are_reported() {
        let schema = station_schema();
        let error = RequestBuilder::construct(
            &schema,
            raw_values! { "station" => "HPD", "parameter" => "AF", "stat" => "x" },
        )
        .unwrap_err();
        assert_eq!(
            error.errors(),
            &[OptionError::UnknownOption {
                name: "stat".to_string()
            }]
        );
    }

    #[test]
    fn test_errors_are_aggregated() {
        let schema = Schema::base();
        let error = RequestBuilder::construct(
            &schema,
            raw_values! { "station" => "HPD", "start_date" => "yesterday" },
        )
        .unwrap_err();
        assert_eq!(error.errors().len(), 2);
        assert!(matches!(
            error.for_option(START_DATE).next(),
            Some(OptionError::DateParse { .. })
        ));
        assert!(matches!(
            error.for_option(END_DATE).next(),
            Some(OptionError::MissingRequiredValue { .. })
        ));
    }

    #[test]
    fn test_ignored_options_are_dropped() {
        let schema = Schema::base().ignore([BASIN]);
        let request = RequestBuilder::construct(
            &schema,
            raw_values! {
                "start_date" => "2014-07-01",
                "end_date" => "2014-07-31",
                "basin" => "18010201",
            },
        )
        .unwrap();
        assert_eq!(
            request.warnings(),
            &[OptionWarning::Ignored {
                name: BASIN.to_string()
            }]
        );
        let params = request.build_params();
        assert!(params.get(BASIN).is_none());
        assert_eq!(
            params.get(START_DATE),
            Some(&[ParamValue::from("2014-07-01")][..])
        );
    }

    #[test]
    fn test_structured_values_flag_complex() {
        let schema = Schema::new().with("elems", FilterOption::text().multi(true).build());
        let mut elem = Map::new();
        elem.insert("name".to_string(), Value::from("pcpn"));
        let request =
            RequestBuilder::construct(&schema, raw_values! { "elems" => vec![elem] }).unwrap();

        let params = request.build_params();
        assert!(params.is_complex());
        assert!(matches!(
            request.serialize(),
            Err(SerializeError::UnsupportedComplexParams { .. })
        ));
    }

    #[test]
    fn test_wire_names_are_used() {
        let schema = Schema::new().with(
            STATION,
            FilterOption::text().wire_name("site").multi(true).build(),
        );
        let request = RequestBuilder::construct(&schema, raw_values! { "station" => "05331000" })
            .unwrap();
        let params = request.serialize().unwrap();
        assert_eq!(params.get("site"), Some("05331000"));
        assert_eq!(params.get(STATION), None);
    }
}
