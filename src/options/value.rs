//! Value types flowing through filter options.
//!
//! Callers hand in [`RawValue`]s (a scalar or a list of scalars); options normalize
//! them into an [`OptionValue`]. Absence is modelled with `Option::None` on both sides,
//! which keeps "not supplied" distinct from "supplied an empty list".

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::fmt::{Display, Formatter};

/// A single request value.
///
/// `Map` is the only structured variant. A parameter set containing one is
/// "complex" and cannot be comma-joined into a plain query string.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Map(Map<String, Value>),
}

impl Scalar {
    /// Returns `true` for nested structured values.
    pub fn is_structured(&self) -> bool {
        matches!(self, Scalar::Map(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Scalar::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Scalar::Date(date) => Some(*date),
            Scalar::DateTime(datetime) => Some(datetime.date()),
            _ => None,
        }
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(text) => f.write_str(text),
            Scalar::Integer(value) => write!(f, "{}", value),
            Scalar::Float(value) => write!(f, "{}", value),
            Scalar::Bool(value) => write!(f, "{}", value),
            Scalar::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Scalar::DateTime(datetime) => write!(f, "{}", datetime.format("%Y-%m-%d %H:%M:%S")),
            Scalar::Map(map) => write!(f, "{}", Value::Object(map.clone())),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<&String> for Scalar {
    fn from(value: &String) -> Self {
        Scalar::Text(value.clone())
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Integer(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Integer(value.into())
    }
}

impl From<u32> for Scalar {
    fn from(value: u32) -> Self {
        Scalar::Integer(value.into())
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<NaiveDate> for Scalar {
    fn from(value: NaiveDate) -> Self {
        Scalar::Date(value)
    }
}

impl From<NaiveDateTime> for Scalar {
    fn from(value: NaiveDateTime) -> Self {
        Scalar::DateTime(value)
    }
}

impl From<Map<String, Value>> for Scalar {
    fn from(value: Map<String, Value>) -> Self {
        Scalar::Map(value)
    }
}

/// A value as supplied by the caller, before any option rules are applied.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Scalar(Scalar),
    List(Vec<Scalar>),
}

impl RawValue {
    pub fn list<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Scalar>,
    {
        RawValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl From<Scalar> for RawValue {
    fn from(value: Scalar) -> Self {
        RawValue::Scalar(value)
    }
}

macro_rules! raw_value_from {
    ($($ty:ty),+) => {$(
        impl From<$ty> for RawValue {
            fn from(value: $ty) -> Self {
                RawValue::Scalar(value.into())
            }
        }

        impl From<Vec<$ty>> for RawValue {
            fn from(values: Vec<$ty>) -> Self {
                RawValue::list(values)
            }
        }

        impl<const N: usize> From<[$ty; N]> for RawValue {
            fn from(values: [$ty; N]) -> Self {
                RawValue::list(values)
            }
        }
    )+};
}

raw_value_from!(
    &str,
    String,
    i64,
    i32,
    u32,
    f64,
    bool,
    NaiveDate,
    NaiveDateTime,
    Map<String, Value>
);

impl From<Vec<Scalar>> for RawValue {
    fn from(values: Vec<Scalar>) -> Self {
        RawValue::List(values)
    }
}

/// Keyword-style values handed to [`crate::RequestBuilder::construct`].
pub type RawValues = BTreeMap<String, RawValue>;

/// Builds a [`RawValues`] map from `name => value` pairs.
///
/// ```
/// use climata::raw_values;
///
/// let values = raw_values! {
///     "station" => "HPD",
///     "parameter" => ["AF", "GH"],
/// };
/// assert_eq!(values.len(), 2);
/// ```
#[macro_export]
macro_rules! raw_values {
    () => { $crate::RawValues::new() };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut values = $crate::RawValues::new();
        $(values.insert(::std::string::String::from($name), $crate::RawValue::from($value));)+
        values
    }};
}

/// A value after an option has validated and normalized it.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Single(Scalar),
    Many(Vec<Scalar>),
}

impl OptionValue {
    /// Every element as a list, wrapping a single value.
    pub fn as_list(&self) -> Vec<&Scalar> {
        match self {
            OptionValue::Single(value) => vec![value],
            OptionValue::Many(values) => values.iter().collect(),
        }
    }

    pub fn single(&self) -> Option<&Scalar> {
        match self {
            OptionValue::Single(value) => Some(value),
            OptionValue::Many(_) => None,
        }
    }

    /// The first element, whichever shape the value has.
    pub fn first(&self) -> Option<&Scalar> {
        match self {
            OptionValue::Single(value) => Some(value),
            OptionValue::Many(values) => values.first(),
        }
    }

    pub fn contains_structured(&self) -> bool {
        self.as_list().iter().any(|value| value.is_structured())
    }
}

impl Display for OptionValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Single(value) => write!(f, "{}", value),
            OptionValue::Many(values) => {
                let joined: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", joined.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_display() {
        let date = NaiveDate::from_ymd_opt(2014, 7, 1).unwrap();
        assert_eq!(Scalar::from(date).to_string(), "2014-07-01");
        assert_eq!(Scalar::from(27053).to_string(), "27053");
        assert_eq!(Scalar::from("pcpn").to_string(), "pcpn");
    }

    #[test]
    fn test_raw_value_conversions() {
        assert_eq!(
            RawValue::from("HPD"),
            RawValue::Scalar(Scalar::Text("HPD".to_string()))
        );
        assert_eq!(
            RawValue::from(["a", "b"]),
            RawValue::List(vec![Scalar::from("a"), Scalar::from("b")])
        );
    }

    #[test]
    fn test_as_list_wraps_single() {
        let single = OptionValue::Single(Scalar::from("AF"));
        assert_eq!(single.as_list(), vec![&Scalar::from("AF")]);

        let many = OptionValue::Many(vec![Scalar::from("AF"), Scalar::from("GH")]);
        assert_eq!(many.as_list().len(), 2);
        assert_eq!(many.first(), Some(&Scalar::from("AF")));
    }

    #[test]
    fn test_structured_detection() {
        let mut elem = Map::new();
        elem.insert("name".to_string(), Value::from("pcpn"));
        let value = OptionValue::Many(vec![Scalar::from("maxt"), Scalar::Map(elem)]);
        assert!(value.contains_structured());
        assert!(!OptionValue::Single(Scalar::from("maxt")).contains_structured());
    }
}
