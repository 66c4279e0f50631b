mod climata;
mod error;
mod utils;

pub mod decode;
pub mod loader;
pub mod options;
pub mod request;
pub mod services;

pub use climata::*;
pub use error::ClimataError;

pub use options::error::{OptionError, OptionWarning, ValidationError};
pub use options::filter_option::{
    DateFormat, FilterOption, FilterOptionBuilder, OptionKind, DEFAULT_DATE_FORMAT,
};
pub use options::schema::{Schema, SchemaCache};
pub use options::value::{OptionValue, RawValue, RawValues, Scalar};

pub use request::builder::RequestBuilder;
pub use request::error::SerializeError;
pub use request::params::{ParamSet, ParamValue, SerializedParams};
pub use request::serializer::{JsonParamsSerializer, ParamSerializer, SimpleSerializer};

pub use decode::error::DecodeError;
pub use decode::{Format, Record};
pub use loader::data_loader::WebserviceLoader;
pub use loader::error::LoadError;
pub use services::{Transport, Webservice};

pub use utils::{date_range, fill_date_range, parse_date};
