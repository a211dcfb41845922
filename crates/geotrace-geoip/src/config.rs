use crate::provider::ProviderKind;
use std::time::Duration;

/// Default values for configuration.
pub mod defaults {
    use crate::provider::ProviderKind;
    use std::time::Duration;

    /// The default value for `providers`.
    pub const DEFAULT_PROVIDERS: [ProviderKind; 3] = [
        ProviderKind::IpApi,
        ProviderKind::IpInfo,
        ProviderKind::IpApiCo,
    ];

    /// The default value for `provider-timeout`.
    pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(5);

    /// The default value for `rate-limit-delay`.
    pub const DEFAULT_RATE_LIMIT_DELAY: Duration = Duration::from_millis(100);
}

/// A single provider in the resolution chain.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    /// The URL template, containing an `{addr}` placeholder.
    pub url: String,
}

impl ProviderConfig {
    #[must_use]
    pub fn new(kind: ProviderKind, url: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
        }
    }
}

impl From<ProviderKind> for ProviderConfig {
    fn from(kind: ProviderKind) -> Self {
        Self::new(kind, kind.default_url())
    }
}

/// Geolocation resolver configuration.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Config {
    /// The providers to query, in priority order.
    pub providers: Vec<ProviderConfig>,
    /// The timeout of each provider request.
    pub provider_timeout: Duration,
    /// The minimum delay between provider requests.
    pub rate_limit_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            providers: defaults::DEFAULT_PROVIDERS
                .into_iter()
                .map(ProviderConfig::from)
                .collect(),
            provider_timeout: defaults::DEFAULT_PROVIDER_TIMEOUT,
            rate_limit_delay: defaults::DEFAULT_RATE_LIMIT_DELAY,
        }
    }
}

/// A builder for geolocation `Config`.
///
/// # Example
///
/// Build a `Config` which only queries `ipinfo.io`.
///
/// ```
/// use geotrace_geoip::{Builder, ProviderKind};
///
/// let config = Builder::new().providers([ProviderKind::IpInfo]).build();
/// assert_eq!(1, config.providers.len());
/// ```
#[derive(Debug)]
pub struct Builder {
    config: Config,
}

impl Builder {
    /// Create a new `Builder`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Set the providers to query with their default URLs.
    #[must_use]
    pub fn providers(self, providers: impl IntoIterator<Item = ProviderKind>) -> Self {
        self.provider_configs(providers.into_iter().map(ProviderConfig::from))
    }

    /// Set the providers to query.
    #[must_use]
    pub fn provider_configs(self, providers: impl IntoIterator<Item = ProviderConfig>) -> Self {
        Self {
            config: Config {
                providers: providers.into_iter().collect(),
                ..self.config
            },
        }
    }

    /// Set the timeout of each provider request.
    #[must_use]
    pub fn provider_timeout(self, provider_timeout: Duration) -> Self {
        Self {
            config: Config {
                provider_timeout,
                ..self.config
            },
        }
    }

    /// Set the minimum delay between provider requests.
    #[must_use]
    pub fn rate_limit_delay(self, rate_limit_delay: Duration) -> Self {
        Self {
            config: Config {
                rate_limit_delay,
                ..self.config
            },
        }
    }

    /// Build the `Config`.
    #[must_use]
    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}
