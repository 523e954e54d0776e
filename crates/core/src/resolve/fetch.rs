//! Fetching of referenced documents by location.

use std::collections::HashMap;
use std::future::Future;

use tracing::debug;
use url::Url;

use crate::error::FetchError;

/// Retrieves the text of a document by location.
pub trait Fetch: Send + Sync {
    /// Returns the document text at `location`.
    fn fetch(&self, location: &Url) -> impl Future<Output = Result<String, FetchError>> + Send;
}

impl<T: Fetch + ?Sized> Fetch for &T {
    fn fetch(&self, location: &Url) -> impl Future<Output = Result<String, FetchError>> + Send {
        (**self).fetch(location)
    }
}

/// Reads `file:` locations from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsFetcher;

impl Fetch for FsFetcher {
    async fn fetch(&self, location: &Url) -> Result<String, FetchError> {
        if location.scheme() != "file" {
            return Err(FetchError::UnsupportedScheme {
                scheme: location.scheme().to_string(),
                location: location.to_string(),
            });
        }
        let path = location
            .to_file_path()
            .map_err(|()| FetchError::NotFound(location.to_string()))?;
        debug!(path = %path.display(), "Reading referenced document.");
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| FetchError::Io {
                location: location.to_string(),
                source,
            })
    }
}

/// Fetches `http:` and `https:` locations. Any non-success status is an error.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Fetches with `client`.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, location: &Url) -> Result<String, FetchError> {
        let http_error = |source| FetchError::Http {
            location: location.to_string(),
            source,
        };
        debug!(url = %location, "Fetching referenced document.");
        let response = self
            .client
            .get(location.clone())
            .send()
            .await
            .map_err(http_error)?;
        let status = response.status();
        debug!(url = %location, %status, "Received referenced document response.");
        if !status.is_success() {
            return Err(FetchError::Status {
                location: location.to_string(),
                status: status.as_u16(),
            });
        }
        response.text().await.map_err(http_error)
    }
}

/// Dispatches to [`FsFetcher`] or [`HttpFetcher`] by URL scheme.
#[derive(Debug, Clone, Default)]
pub struct DefaultFetcher {
    fs: FsFetcher,
    http: HttpFetcher,
}

impl DefaultFetcher {
    /// Fetcher for `file:`, `http:` and `https:` locations.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Fetch for DefaultFetcher {
    async fn fetch(&self, location: &Url) -> Result<String, FetchError> {
        match location.scheme() {
            "file" => self.fs.fetch(location).await,
            "http" | "https" => self.http.fetch(location).await,
            scheme => Err(FetchError::UnsupportedScheme {
                scheme: scheme.to_string(),
                location: location.to_string(),
            }),
        }
    }
}

/// Serves documents from an in-memory map keyed by URL.
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    documents: HashMap<String, String>,
}

impl MemoryFetcher {
    /// Empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `text` under `location`.
    pub fn insert(&mut self, location: &Url, text: impl Into<String>) {
        self.documents.insert(location.to_string(), text.into());
    }

    /// Builder-style [`MemoryFetcher::insert`].
    pub fn with(mut self, location: &Url, text: impl Into<String>) -> Self {
        self.insert(location, text);
        self
    }
}

impl Fetch for MemoryFetcher {
    async fn fetch(&self, location: &Url) -> Result<String, FetchError> {
        self.documents
            .get(location.as_str())
            .cloned()
            .ok_or_else(|| FetchError::NotFound(location.to_string()))
    }
}
