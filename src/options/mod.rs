pub mod error;
pub mod filter_option;
pub mod schema;
pub mod value;
