//! This module provides the main entry point for loading data from the supported
//! climate and hydrology web services.
//!
//! A request runs through the same steps for every service: the caller's values are
//! validated against the service's option schema, serialized into query parameters,
//! downloaded (or read from the cache), decoded and finally normalized into records.

use crate::decode::Record;
use crate::error::ClimataError;
use crate::loader::data_loader::WebserviceLoader;
use crate::options::value::RawValues;
use crate::services::Webservice;
use crate::utils::{ensure_cache_dir_exists, get_cache_dir};
use bon::bon;
use log::debug;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The main client struct for loading web service data.
///
/// Downloaded responses are cached on disk, keyed by service and request URL, so
/// repeating a request does not hit the remote service again.
///
/// Create an instance using [`Climata::new()`] for the default cache directory,
/// [`Climata::with_cache_folder()`] for a custom location, or
/// [`Climata::without_cache()`] to always download.
///
/// # Examples
///
/// ```rust
/// # use climata::Climata;
/// # use climata::ClimataError;
/// # async fn run() -> Result<(), ClimataError> {
/// // Create a client using the default cache directory
/// let client = Climata::new().await?;
/// # Ok(())
/// # }
/// ```
pub struct Climata {
    loader: WebserviceLoader,
}

#[bon]
impl Climata {
    /// Creates a new `Climata` client with a specified cache directory.
    ///
    /// # Arguments
    ///
    /// * `cache_folder` - A `PathBuf` pointing to the directory to use for caching.
    ///                    The directory will be created if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns [`ClimataError::CacheDirCreation`] if the directory cannot be created.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use climata::Climata;
    /// # use climata::ClimataError;
    /// # use std::path::Path;
    /// # async fn run() -> Result<(), ClimataError> {
    /// let cache_path = Path::new("/home/user/.cache/climata").to_path_buf();
    /// let client = Climata::with_cache_folder(cache_path).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn with_cache_folder(cache_folder: PathBuf) -> Result<Self, ClimataError> {
        ensure_cache_dir_exists(&cache_folder)
            .await
            .map_err(|e| ClimataError::CacheDirCreation(cache_folder.clone(), e))?;
        Ok(Self {
            loader: WebserviceLoader::new(&cache_folder),
        })
    }

    /// Creates a new `Climata` client using the default cache directory.
    ///
    /// The default cache directory is determined using the `dirs` crate, typically
    /// `~/.cache/climata_rs_cache` on Linux.
    ///
    /// # Errors
    ///
    /// Returns [`ClimataError::CacheDirResolution`] if the default cache directory cannot be found.
    /// Returns [`ClimataError::CacheDirCreation`] if it cannot be created.
    pub async fn new() -> Result<Self, ClimataError> {
        let cache_folder = get_cache_dir().map_err(ClimataError::CacheDirResolution)?;
        Self::with_cache_folder(cache_folder).await
    }

    /// Creates a client that downloads every request and writes nothing to disk.
    pub fn without_cache() -> Self {
        Self {
            loader: WebserviceLoader::without_cache(),
        }
    }

    /// Re-downloads cached responses older than `max_age`.
    ///
    /// Without a max age, cached responses never expire.
    pub fn with_cache_max_age(mut self, max_age: Duration) -> Self {
        self.loader = self.loader.with_max_age(max_age);
        self
    }

    pub fn cache_dir(&self) -> Option<&Path> {
        self.loader.cache_dir()
    }

    /// Deletes the cache directory and everything in it.
    pub async fn clear_cache(&self) -> Result<(), ClimataError> {
        Ok(self.loader.clear_cache().await?)
    }

    /// Validates and serializes a request without sending it.
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.service(&dyn Webservice)`: **Required.** The service to build the request for.
    /// * `.values(RawValues)`: Optional. Option values by name; use [`crate::raw_values!`].
    ///
    /// # Returns
    ///
    /// The full request URL, query string included.
    ///
    /// # Errors
    ///
    /// Returns [`ClimataError::Validation`] listing every invalid option, or
    /// [`ClimataError::Serialize`] if the parameters cannot be encoded.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use climata::{raw_values, Climata, ClimataError};
    /// # use climata::services::usgs::Nwis;
    /// # fn main() -> Result<(), ClimataError> {
    /// let client = Climata::without_cache();
    /// let url = client
    ///     .request_url()
    ///     .service(&Nwis::sites())
    ///     .values(raw_values! { "station" => "05331000" })
    ///     .call()?;
    /// assert!(url.starts_with("http://waterservices.usgs.gov/nwis/site/?format=rdb%2C1.0"));
    /// assert!(url.ends_with("&site=05331000"));
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub fn request_url(
        &self,
        service: &dyn Webservice,
        values: Option<RawValues>,
    ) -> Result<String, ClimataError> {
        let request = service.request(values.unwrap_or_default())?;
        let url = service.url(&request)?;
        let params = service.params(&request)?;
        Ok(self.loader.request_url(&url, &params)?)
    }

    /// Downloads the raw response body for a request.
    ///
    /// Use this for services whose responses cannot be decoded into records, such as
    /// the zipped EPA and CNRFC downloads.
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.service(&dyn Webservice)`: **Required.** The service to call.
    /// * `.values(RawValues)`: Optional. Option values by name.
    /// * `.refresh(bool)`: Optional. Skip the cache lookup. Defaults to `false`.
    ///
    /// # Errors
    ///
    /// Returns [`ClimataError::Validation`] or [`ClimataError::Serialize`] before any
    /// network access, and [`ClimataError::Load`] for cache, network and HTTP failures.
    #[builder]
    pub async fn fetch(
        &self,
        service: &dyn Webservice,
        values: Option<RawValues>,
        refresh: Option<bool>,
    ) -> Result<Vec<u8>, ClimataError> {
        let request = service.request(values.unwrap_or_default())?;
        let url = service.url(&request)?;
        let params = service.params(&request)?;
        Ok(self
            .loader
            .fetch(service, &url, &params, refresh.unwrap_or(false))
            .await?)
    }

    /// Loads, decodes and normalizes the records for a request.
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.service(&dyn Webservice)`: **Required.** The service to call.
    /// * `.values(RawValues)`: Optional. Option values by name.
    /// * `.refresh(bool)`: Optional. Skip the cache lookup. Defaults to `false`.
    ///
    /// # Returns
    ///
    /// One [`Record`] per row, with field names as the service reports them after
    /// the adapter's clean-up.
    ///
    /// # Errors
    ///
    /// Everything [`Climata::fetch`] returns, plus [`ClimataError::Decode`] when the
    /// body does not have the expected shape.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use climata::{raw_values, Climata, ClimataError};
    /// # use climata::services::acis::Acis;
    /// #
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), ClimataError> {
    /// let client = Climata::new().await?;
    ///
    /// let rows = client
    ///     .load()
    ///     .service(&Acis::station_data())
    ///     .values(raw_values! {
    ///         "basin" => "07010206",
    ///         "start_date" => "2014-07-01",
    ///         "end_date" => "2014-07-31",
    ///         "parameter" => ["pcpn", "maxt"],
    ///     })
    ///     .call()
    ///     .await?;
    ///
    /// for row in rows.iter().take(5) {
    ///     println!("{} {} {}", row["name"], row["date"], row["pcpn"]);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn load(
        &self,
        service: &dyn Webservice,
        values: Option<RawValues>,
        refresh: Option<bool>,
    ) -> Result<Vec<Record>, ClimataError> {
        let request = service.request(values.unwrap_or_default())?;
        let url = service.url(&request)?;
        let params = service.params(&request)?;
        let body = self
            .loader
            .fetch(service, &url, &params, refresh.unwrap_or(false))
            .await?;

        let format = service.format(&request);
        let records = format.decode(&body)?;
        debug!(
            "Decoded {} {} record(s) from {}",
            records.len(),
            format.name(),
            service.name()
        );
        Ok(service.normalize(records, &request)?)
    }
}
