//! This crate provides a cheaply cloneable, thread safe, caching IP
//! geolocation resolver backed by a chain of external providers.
//!
//! Providers are queried in priority order and the first usable response
//! wins.  All provider requests pass through a single shared rate limiter
//! and successful resolutions are cached for the lifetime of the resolver.
//!
//! Private, loopback, link-local and other reserved addresses are never sent
//! to a provider.
//!
//! # Example
//!
//! Resolve the location of the Google public DNS service:
//!
//! ```no_run
//! # fn main() -> anyhow::Result<()> {
//! use geotrace_geoip::{Builder, GeoResolver, ProviderKind, Resolver};
//! use std::net::IpAddr;
//! use std::str::FromStr;
//! use std::time::Duration;
//!
//! let config = Builder::new()
//!     .providers([ProviderKind::IpApi, ProviderKind::IpInfo])
//!     .rate_limit_delay(Duration::from_millis(250))
//!     .build();
//! let resolver = GeoResolver::start(&config)?;
//! let location = resolver.resolve(IpAddr::from_str("8.8.8.8")?)?;
//! println!("{location} ({})", location.coordinates());
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]

mod config;
mod error;
mod limiter;
mod location;
mod provider;
mod reserved;
mod resolver;

pub use config::{defaults, Builder, Config, ProviderConfig};
pub use error::{Error, ProviderError, Result};
pub use limiter::RateLimiter;
pub use location::Location;
pub use provider::{HttpProvider, Provider, ProviderKind, ADDR_PLACEHOLDER};
pub use reserved::is_reserved;
pub use resolver::{GeoResolver, Resolver};
