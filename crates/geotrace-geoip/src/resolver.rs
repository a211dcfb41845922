use crate::config::Config;
use crate::error::{Error, Result};
use crate::limiter::RateLimiter;
use crate::location::Location;
use crate::provider::{HttpProvider, Provider};
use std::net::IpAddr;
use std::sync::Arc;

/// A geolocation resolver.
pub trait Resolver {
    /// Resolve the `Location` of `addr`.
    ///
    /// Returns `Error::NoLocationData` for private and reserved addresses
    /// and `Error::AllProvidersFailed` if no provider could locate `addr`.
    fn resolve(&self, addr: IpAddr) -> Result<Location>;
}

/// A cheaply cloneable, thread safe, caching geolocation resolver.
///
/// Each address is resolved by trying a chain of providers in priority
/// order, stopping at the first provider which returns a usable location.
/// Every provider request passes through a single shared `RateLimiter`.
///
/// Successful resolutions are cached for the lifetime of the resolver, a
/// cache hit makes no provider request and does not wait on the limiter.
#[derive(Clone)]
pub struct GeoResolver {
    inner: Arc<inner::GeoResolver>,
}

impl GeoResolver {
    /// Create a `GeoResolver` which queries the configured HTTP providers.
    pub fn start(config: &Config) -> Result<Self> {
        let providers = config
            .providers
            .iter()
            .map(|provider| {
                HttpProvider::new(provider.kind, &provider.url, config.provider_timeout)
                    .map(|provider| Box::new(provider) as Box<dyn Provider>)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::with_providers(
            providers,
            RateLimiter::new(config.rate_limit_delay),
        ))
    }

    /// Create a `GeoResolver` from a chain of `providers`.
    #[must_use]
    pub fn with_providers(providers: Vec<Box<dyn Provider>>, limiter: RateLimiter) -> Self {
        Self {
            inner: Arc::new(inner::GeoResolver::new(providers, limiter)),
        }
    }

    /// Locate the host running the resolver.
    ///
    /// The result is not cached.
    pub fn locate_origin(&self) -> Result<Location> {
        self.inner.locate_origin()
    }

    /// The cached `Location` of `addr`, if any.
    #[must_use]
    pub fn cached(&self, addr: IpAddr) -> Option<Location> {
        self.inner.cached(addr)
    }

    /// The number of cached locations.
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.inner.cache_len()
    }
}

impl Resolver for GeoResolver {
    fn resolve(&self, addr: IpAddr) -> Result<Location> {
        self.inner.resolve(addr)
    }
}

/// Private impl of resolver.
mod inner {
    use super::{Error, Location, Provider, RateLimiter, Result};
    use crate::error::ProviderError;
    use crate::reserved::is_reserved;
    use parking_lot::{Mutex, RwLock};
    use std::collections::HashMap;
    use std::net::IpAddr;
    use std::sync::Arc;
    use tracing::instrument;

    /// A per-address cache slot.
    ///
    /// The slot is locked for the duration of a resolution so that
    /// concurrent resolutions of the same address query providers once.
    type Slot = Arc<Mutex<Option<Location>>>;

    /// Alias for a cache of resolved locations.
    type Cache = RwLock<HashMap<IpAddr, Slot>>;

    pub(super) struct GeoResolver {
        providers: Vec<Box<dyn Provider>>,
        limiter: RateLimiter,
        cache: Cache,
    }

    impl GeoResolver {
        pub(super) fn new(providers: Vec<Box<dyn Provider>>, limiter: RateLimiter) -> Self {
            Self {
                providers,
                limiter,
                cache: RwLock::new(HashMap::new()),
            }
        }

        #[instrument(skip(self), level = "debug")]
        pub(super) fn resolve(&self, addr: IpAddr) -> Result<Location> {
            if is_reserved(addr) {
                tracing::debug!(%addr, "reserved address, skipping providers");
                return Err(Error::NoLocationData(addr));
            }
            let slot = self.slot(addr);
            let mut entry = slot.lock();
            if let Some(location) = entry.as_ref() {
                tracing::trace!(%addr, "cache hit");
                return Ok(location.clone());
            }
            let location = self
                .query_chain(|provider| provider.locate(addr))
                .ok_or(Error::AllProvidersFailed(addr))?;
            *entry = Some(location.clone());
            Ok(location)
        }

        #[instrument(skip(self), level = "debug")]
        pub(super) fn locate_origin(&self) -> Result<Location> {
            self.query_chain(|provider| provider.locate_origin())
                .ok_or(Error::OriginUnavailable)
        }

        pub(super) fn cached(&self, addr: IpAddr) -> Option<Location> {
            let slot = self.cache.read().get(&addr).cloned()?;
            let location = slot.lock().clone();
            location
        }

        pub(super) fn cache_len(&self) -> usize {
            self.cache
                .read()
                .values()
                .filter(|slot| slot.lock().is_some())
                .count()
        }

        fn slot(&self, addr: IpAddr) -> Slot {
            if let Some(slot) = self.cache.read().get(&addr) {
                return slot.clone();
            }
            self.cache.write().entry(addr).or_default().clone()
        }

        /// Query each provider in turn until one succeeds.
        fn query_chain<F>(&self, query: F) -> Option<Location>
        where
            F: Fn(&dyn Provider) -> std::result::Result<Location, ProviderError>,
        {
            for provider in &self.providers {
                self.limiter.acquire();
                match query(provider.as_ref()) {
                    Ok(location) => {
                        tracing::debug!(provider = provider.name(), %location, "located");
                        return Some(location);
                    }
                    Err(err) => {
                        tracing::debug!(provider = provider.name(), %err, "provider failed");
                    }
                }
            }
            None
        }
    }
}
