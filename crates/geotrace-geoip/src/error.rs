use std::net::IpAddr;
use thiserror::Error;

/// A geolocation resolver error result.
pub type Result<T> = std::result::Result<T, Error>;

/// A geolocation resolver error.
#[derive(Error, Debug)]
pub enum Error {
    #[error("no location data for private or reserved address {0}")]
    NoLocationData(IpAddr),
    #[error("all providers failed to locate {0}")]
    AllProvidersFailed(IpAddr),
    #[error("all providers failed to locate the origin")]
    OriginUnavailable,
    #[error("failed to create http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// A failure of a single provider.
///
/// Provider failures are never returned to callers of the resolver, they
/// cause the next provider in the chain to be tried.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Request(Box<dyn std::error::Error + Send + Sync + 'static>),
    #[error("unexpected http status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("response is missing coordinates")]
    MissingCoordinates,
    #[error("provider rejected lookup: {0}")]
    Rejected(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        Self::Request(Box::new(err))
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}
