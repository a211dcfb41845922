use crate::error::{Error, ProviderError};
use crate::location::Location;
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use std::fmt::{Display, Formatter};
use std::net::IpAddr;
use std::time::Duration;
use tracing::instrument;

/// The placeholder in a provider URL template which is replaced by the address.
pub const ADDR_PLACEHOLDER: &str = "{addr}";

/// An external geolocation service.
#[cfg_attr(test, mockall::automock)]
pub trait Provider: Send + Sync {
    /// The name of the provider.
    fn name(&self) -> &'static str;

    /// Locate `addr`.
    fn locate(&self, addr: IpAddr) -> Result<Location, ProviderError>;

    /// Locate the host making the request.
    fn locate_origin(&self) -> Result<Location, ProviderError>;
}

/// The built-in geolocation providers.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ProviderKind {
    /// The `ip-api.com` service.
    IpApi,
    /// The `ipinfo.io` service.
    IpInfo,
    /// The `ipapi.co` service.
    IpApiCo,
}

impl ProviderKind {
    /// The name of the provider.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::IpApi => "ip-api",
            Self::IpInfo => "ipinfo",
            Self::IpApiCo => "ipapi",
        }
    }

    /// The default URL template of the provider.
    #[must_use]
    pub const fn default_url(self) -> &'static str {
        match self {
            Self::IpApi => "http://ip-api.com/json/{addr}",
            Self::IpInfo => "https://ipinfo.io/{addr}/json",
            Self::IpApiCo => "https://ipapi.co/{addr}/json/",
        }
    }

    /// Parse a response body from the provider.
    pub fn parse(self, body: &str) -> Result<Location, ProviderError> {
        let provider = String::from(self.name());
        match self {
            Self::IpApi => serde_json::from_str::<ipapi::Response>(body)?.into_location(provider),
            Self::IpInfo => serde_json::from_str::<ipinfo::Response>(body)?.into_location(provider),
            Self::IpApiCo => {
                serde_json::from_str::<ipapico::Response>(body)?.into_location(provider)
            }
        }
    }
}

impl Display for ProviderKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A provider which queries a JSON service over HTTP.
#[derive(Debug)]
pub struct HttpProvider {
    kind: ProviderKind,
    url_template: String,
    client: Client,
}

impl HttpProvider {
    /// Create an `HttpProvider` with a per-request `timeout`.
    ///
    /// The `url_template` must contain the `{addr}` placeholder.
    pub fn new(
        kind: ProviderKind,
        url_template: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("geotrace/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            kind,
            url_template: url_template.into(),
            client,
        })
    }

    fn lookup_url(&self, addr: IpAddr) -> String {
        self.url_template
            .replace(ADDR_PLACEHOLDER, &addr.to_string())
    }

    fn origin_url(&self) -> String {
        self.url_template
            .replace(&format!("{ADDR_PLACEHOLDER}/"), "")
            .replace(ADDR_PLACEHOLDER, "")
    }

    #[instrument(skip(self), level = "trace")]
    fn fetch(&self, url: &str) -> Result<Location, ProviderError> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }
        let body = response.text()?;
        self.kind.parse(&body)
    }
}

impl Provider for HttpProvider {
    fn name(&self) -> &'static str {
        self.kind.name()
    }

    fn locate(&self, addr: IpAddr) -> Result<Location, ProviderError> {
        self.fetch(&self.lookup_url(addr))
    }

    fn locate_origin(&self) -> Result<Location, ProviderError> {
        self.fetch(&self.origin_url())
    }
}

fn location(
    provider: String,
    city: Option<String>,
    region: Option<String>,
    country: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<Location, ProviderError> {
    match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Ok(Location {
            city,
            region,
            country,
            latitude,
            longitude,
            provider,
        }),
        _ => Err(ProviderError::MissingCoordinates),
    }
}

/// The `ip-api.com` response format.
///
/// See <https://ip-api.com/docs/api:json>
mod ipapi {
    use crate::error::ProviderError;
    use crate::location::Location;
    use serde::Deserialize;
    use serde_with::serde_as;

    const STATUS_SUCCESS: &str = "success";

    #[serde_as]
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Response {
        /// "success" or "fail"
        pub status: String,
        /// "private range"
        #[serde(default)]
        pub message: Option<String>,
        /// "Philadelphia"
        #[serde(default)]
        #[serde_as(as = "serde_with::NoneAsEmptyString")]
        pub city: Option<String>,
        /// "Pennsylvania"
        #[serde(default)]
        #[serde_as(as = "serde_with::NoneAsEmptyString")]
        pub region_name: Option<String>,
        /// "United States"
        #[serde(default)]
        #[serde_as(as = "serde_with::NoneAsEmptyString")]
        pub country: Option<String>,
        /// 39.9526
        #[serde(default)]
        pub lat: Option<f64>,
        /// -75.1652
        #[serde(default)]
        pub lon: Option<f64>,
    }

    impl Response {
        pub fn into_location(self, provider: String) -> Result<Location, ProviderError> {
            if self.status != STATUS_SUCCESS {
                return Err(ProviderError::Rejected(
                    self.message.unwrap_or(self.status),
                ));
            }
            super::location(
                provider,
                self.city,
                self.region_name,
                self.country,
                self.lat,
                self.lon,
            )
        }
    }
}

/// The `ipinfo.io` response format.
///
/// See <https://ipinfo.io/developers/responses>
mod ipinfo {
    use crate::error::ProviderError;
    use crate::location::Location;
    use serde::Deserialize;
    use serde_with::serde_as;

    #[serde_as]
    #[derive(Debug, Deserialize)]
    pub struct Response {
        /// "Mountain View"
        #[serde(default)]
        #[serde_as(as = "serde_with::NoneAsEmptyString")]
        pub city: Option<String>,
        /// "California"
        #[serde(default)]
        #[serde_as(as = "serde_with::NoneAsEmptyString")]
        pub region: Option<String>,
        /// "US"
        #[serde(default)]
        #[serde_as(as = "serde_with::NoneAsEmptyString")]
        pub country: Option<String>,
        /// "37.4056,-122.0775"
        #[serde(default)]
        #[serde_as(as = "serde_with::NoneAsEmptyString")]
        pub loc: Option<String>,
        /// Set for private and reserved addresses.
        #[serde(default)]
        pub bogon: bool,
    }

    impl Response {
        pub fn into_location(self, provider: String) -> Result<Location, ProviderError> {
            if self.bogon {
                return Err(ProviderError::Rejected(String::from("bogon address")));
            }
            let (latitude, longitude) = match self.loc.as_deref() {
                Some(loc) => parse_loc(loc)?,
                None => (None, None),
            };
            super::location(
                provider,
                self.city,
                self.region,
                self.country,
                latitude,
                longitude,
            )
        }
    }

    fn parse_loc(loc: &str) -> Result<(Option<f64>, Option<f64>), ProviderError> {
        let (lat, lon) = loc
            .split_once(',')
            .ok_or_else(|| ProviderError::Malformed(format!("invalid loc: {loc}")))?;
        let parse = |val: &str| {
            val.trim()
                .parse::<f64>()
                .map_err(|_| ProviderError::Malformed(format!("invalid loc: {loc}")))
        };
        Ok((Some(parse(lat)?), Some(parse(lon)?)))
    }
}

/// The `ipapi.co` response format.
///
/// See <https://ipapi.co/api/#complete-location>
mod ipapico {
    use crate::error::ProviderError;
    use crate::location::Location;
    use serde::Deserialize;
    use serde_with::serde_as;

    #[serde_as]
    #[derive(Debug, Deserialize)]
    pub struct Response {
        /// Set when the lookup failed.
        #[serde(default)]
        pub error: bool,
        /// "Reserved IP Address"
        #[serde(default)]
        pub reason: Option<String>,
        /// "Sunnyvale"
        #[serde(default)]
        #[serde_as(as = "serde_with::NoneAsEmptyString")]
        pub city: Option<String>,
        /// "California"
        #[serde(default)]
        #[serde_as(as = "serde_with::NoneAsEmptyString")]
        pub region: Option<String>,
        /// "United States"
        #[serde(default)]
        #[serde_as(as = "serde_with::NoneAsEmptyString")]
        pub country_name: Option<String>,
        /// 37.3688
        #[serde(default)]
        pub latitude: Option<f64>,
        /// -122.0363
        #[serde(default)]
        pub longitude: Option<f64>,
    }

    impl Response {
        pub fn into_location(self, provider: String) -> Result<Location, ProviderError> {
            if self.error {
                return Err(ProviderError::Rejected(
                    self.reason.unwrap_or_else(|| String::from("error")),
                ));
            }
            super::location(
                provider,
                self.city,
                self.region,
                self.country_name,
                self.latitude,
                self.longitude,
            )
        }
    }
}
