use crate::loader::error::LoadError;
use crate::request::params::SerializedParams;
use crate::services::{Transport, Webservice};
use log::{debug, info, warn};
use reqwest::Client;
use sha2::{Digest, Sha256};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::fs;

/// Downloads web service responses, keeping raw bodies in an optional disk cache.
///
/// Cached bodies are keyed by service name and the full request URL, so two requests
/// with the same parameters share one file.
pub struct WebserviceLoader {
    cache_dir: Option<PathBuf>,
    max_age: Option<Duration>,
    download_client: Client,
}

impl WebserviceLoader {
    pub fn new(cache_dir: &Path) -> WebserviceLoader {
        WebserviceLoader {
            cache_dir: Some(cache_dir.to_path_buf()),
            max_age: None,
            download_client: Client::new(),
        }
    }

    /// A loader that always downloads.
    pub fn without_cache() -> WebserviceLoader {
        WebserviceLoader {
            cache_dir: None,
            max_age: None,
            download_client: Client::new(),
        }
    }

    /// Cached responses older than `max_age` are downloaded again.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    pub fn cache_dir(&self) -> Option<&Path> {
        self.cache_dir.as_deref()
    }

    /// `url` with `params` appended as the query string.
    pub fn request_url(&self, url: &str, params: &SerializedParams) -> Result<String, LoadError> {
        Ok(self.build_request(url, params)?.url().to_string())
    }

    fn build_request(
        &self,
        url: &str,
        params: &SerializedParams,
    ) -> Result<reqwest::Request, LoadError> {
        self.download_client
            .get(url)
            .query(params)
            .build()
            .map_err(|e| LoadError::InvalidUrl(url.to_string(), e))
    }

    /// Returns the response body for `url` with `params`, from cache when possible.
    ///
    /// `refresh` skips the cache lookup; the new body still replaces the cached one.
    pub async fn fetch(
        &self,
        service: &dyn Webservice,
        url: &str,
        params: &SerializedParams,
        refresh: bool,
    ) -> Result<Vec<u8>, LoadError> {
        if service.transport() == Transport::Soap {
            return Err(LoadError::UnsupportedTransport {
                service: service.name().to_string(),
            });
        }

        let request = self.build_request(url, params)?;
        let full_url = request.url().to_string();
        let cache_path = self
            .cache_dir
            .as_ref()
            .map(|dir| dir.join(Self::cache_file_name(service.name(), &full_url)));

        if let Some(path) = &cache_path {
            if !refresh && self.is_fresh(path).await? {
                info!("Cache hit for {} at {:?}", service.name(), path);
                return fs::read(path)
                    .await
                    .map_err(|e| LoadError::CacheRead(path.clone(), e));
            }
            warn!("Cache miss for {}. Downloading {}", service.name(), full_url);
        }

        let body = self.download(request, full_url).await?;

        if let (Some(path), Some(dir)) = (&cache_path, &self.cache_dir) {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| LoadError::CacheDirCreation(dir.clone(), e))?;
            fs::write(path, &body)
                .await
                .map_err(|e| LoadError::CacheWrite(path.clone(), e))?;
            info!("Cached {} response to {:?}", service.name(), path);
        }
        Ok(body)
    }

    async fn download(&self, request: reqwest::Request, url: String) -> Result<Vec<u8>, LoadError> {
        info!("Downloading data from {}", url);

        let response = self
            .download_client
            .execute(request)
            .await
            .map_err(|e| LoadError::NetworkRequest(url.clone(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(if let Some(status) = e.status() {
                    LoadError::HttpStatus {
                        url,
                        status,
                        source: e,
                    }
                } else {
                    LoadError::NetworkRequest(url, e)
                });
            }
        };

        let body = response
            .bytes()
            .await
            .map_err(|e| LoadError::NetworkRequest(url.clone(), e))?;
        debug!("Downloaded {} bytes from {}", body.len(), url);
        Ok(body.to_vec())
    }

    async fn is_fresh(&self, path: &Path) -> Result<bool, LoadError> {
        let metadata = match fs::metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(LoadError::CacheMetadataRead(path.to_path_buf(), e)),
        };
        let Some(max_age) = self.max_age else {
            return Ok(true);
        };
        let modified = metadata
            .modified()
            .map_err(|e| LoadError::CacheMetadataRead(path.to_path_buf(), e))?;
        let age = SystemTime::now()
            .duration_since(modified)
            .map_err(|e| LoadError::SystemTimeCalculation(path.to_path_buf(), e))?;
        Ok(age <= max_age)
    }

    /// Removes every cached response.
    pub async fn clear_cache(&self) -> Result<(), LoadError> {
        let Some(dir) = &self.cache_dir else {
            return Ok(());
        };
        match fs::remove_dir_all(dir).await {
            Ok(()) => {
                info!("Cleared cache at {:?}", dir);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LoadError::CacheDeletionError(dir.clone(), e)),
        }
    }

    /// `{service}-{first 16 hex chars of the URL's SHA-256}.cache`
    fn cache_file_name(service: &str, url: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        format!("{}-{}.cache", service, &digest[..16])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::snotel::Snotel;

    #[test]
    fn test_cache_file_name_depends_on_url() {
        let first = WebserviceLoader::cache_file_name("nwis-dv", "http://a/?site=1");
        let second = WebserviceLoader::cache_file_name("nwis-dv", "http://a/?site=2");
        assert_ne!(first, second);
        assert!(first.starts_with("nwis-dv-"));
        assert_eq!(
            first,
            WebserviceLoader::cache_file_name("nwis-dv", "http://a/?site=1")
        );
    }

    #[test]
    fn test_cache_file_name_is_stable() {
        assert_eq!(
            WebserviceLoader::cache_file_name("nwis-dv", "http://a/?site=1"),
            "nwis-dv-7fa6b20d973926a9.cache"
        );
    }

    #[test]
    fn test_request_url_encodes_params() {
        let loader = WebserviceLoader::without_cache();
        let params: SerializedParams = [("sdate", "2014-07-01"), ("elems", "pcpn,maxt")]
            .into_iter()
            .collect();
        let url = loader
            .request_url("http://data.rcc-acis.org/MultiStnData", &params)
            .unwrap();
        assert_eq!(
            url,
            "http://data.rcc-acis.org/MultiStnData?sdate=2014-07-01&elems=pcpn%2Cmaxt"
        );
    }

    #[tokio::test]
    async fn test_soap_services_are_rejected() {
        let loader = WebserviceLoader::without_cache();
        let result = loader
            .fetch(
                &Snotel::stations(),
                "http://localhost/",
                &SerializedParams::new(),
                false,
            )
            .await;
        assert!(matches!(
            result,
            Err(LoadError::UnsupportedTransport { .. })
        ));
    }

    #[tokio::test]
    async fn test_clear_missing_cache() {
        let root = tempfile::tempdir().unwrap();
        let loader = WebserviceLoader::new(&root.path().join("never-created"));
        loader.clear_cache().await.unwrap();
    }
}
