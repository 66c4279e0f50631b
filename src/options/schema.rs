//! Explicit option registries.
//!
//! A service declares its options once as a [`Schema`], usually by starting from
//! [`Schema::base`] and overriding individual entries. [`SchemaCache`] keeps the
//! resolved schema for the lifetime of the process.

use crate::options::filter_option::FilterOption;
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::sync::OnceLock;

pub const START_DATE: &str = "start_date";
pub const END_DATE: &str = "end_date";
pub const STATE: &str = "state";
pub const COUNTY: &str = "county";
pub const BASIN: &str = "basin";
pub const STATION: &str = "station";
pub const PARAMETER: &str = "parameter";

/// Names of the options every service inherits from [`Schema::base`].
pub const BASE_OPTIONS: [&str; 7] = [START_DATE, END_DATE, STATE, COUNTY, BASIN, STATION, PARAMETER];

/// Ordered mapping from option name to [`FilterOption`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    options: BTreeMap<String, FilterOption>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// The conventional options shared by the climate web services.
    ///
    /// Time period filters are required dates; region, station and parameter filters
    /// are optional and multi-valued. Services mark the ones that do not apply as ignored.
    pub fn base() -> Self {
        Schema::new()
            .with(START_DATE, FilterOption::date().required(true).build())
            .with(END_DATE, FilterOption::date().required(true).build())
            .with(STATE, FilterOption::text().multi(true).build())
            .with(COUNTY, FilterOption::text().multi(true).build())
            .with(BASIN, FilterOption::text().multi(true).build())
            .with(STATION, FilterOption::text().multi(true).build())
            .with(PARAMETER, FilterOption::text().multi(true).build())
    }

    /// Registers `option` under `name`, replacing any option of the same name.
    pub fn with(mut self, name: &str, mut option: FilterOption) -> Self {
        option.bind_name(name);
        self.options.insert(name.to_string(), option);
        self
    }

    /// Overrides options by name with every entry of `overrides`.
    pub fn merge(mut self, overrides: Schema) -> Self {
        self.options.extend(overrides.options);
        self
    }

    /// Marks the named options as ignored. Unknown names are skipped.
    pub fn ignore<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        for name in names {
            if let Some(option) = self.options.remove(name) {
                self.options.insert(name.to_string(), option.into_ignored());
            }
        }
        self
    }

    /// Drops the named options entirely.
    pub fn without<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        for name in names {
            self.options.remove(name);
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&FilterOption> {
        self.options.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, FilterOption> {
        self.options.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.options.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = (&'a String, &'a FilterOption);
    type IntoIter = btree_map::Iter<'a, String, FilterOption>;

    fn into_iter(self) -> Self::IntoIter {
        self.options.iter()
    }
}

/// Lazily resolved schema for one service type.
///
/// Intended to live in a `static`; the declaration function runs on first use.
///
/// ```
/// use climata::{FilterOption, Schema, SchemaCache};
///
/// fn declare() -> Schema {
///     Schema::base().with("station", FilterOption::text().required(true).build())
/// }
///
/// static SCHEMA: SchemaCache = SchemaCache::new(declare);
///
/// assert!(SCHEMA.resolve().get("station").unwrap().is_required());
/// ```
pub struct SchemaCache {
    cell: OnceLock<Schema>,
    declare: fn() -> Schema,
}

impl SchemaCache {
    pub const fn new(declare: fn() -> Schema) -> Self {
        Self {
            cell: OnceLock::new(),
            declare,
        }
    }

    pub fn resolve(&self) -> &Schema {
        self.cell.get_or_init(self.declare)
    }
}
