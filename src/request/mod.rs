pub mod builder;
pub mod error;
pub mod params;
pub mod serializer;
