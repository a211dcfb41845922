//! Trace the network route to a host and geolocate every hop.
//!
//! The route is discovered by running the system trace command
//! (`traceroute` or `tracert`) and parsing its output.  Each hop address is
//! then geolocated with a [`geotrace_geoip::Resolver`], either one hop at a
//! time or on a bounded pool of worker threads.  The resulting
//! [`RouteResult`] is always in route order.
//!
//! # Example
//!
//! ```no_run
//! # fn main() -> anyhow::Result<()> {
//! use geotrace_core::Builder;
//! use geotrace_geoip::GeoResolver;
//!
//! let resolver = GeoResolver::start(&geotrace_geoip::Config::default())?;
//! let route = Builder::new().build(resolver).run("example.com")?;
//! for hop in route.hops() {
//!     println!("{} {:?} {}", hop.hop().index(), hop.hop().addr(), hop.status());
//! }
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]

mod config;
mod error;
mod hop;
mod parse;
mod pipeline;
mod route;
mod runner;

pub use config::{defaults, Builder};
pub use error::{Error, Result};
pub use hop::{Hop, TraceOutput};
pub use parse::{parse_hop, parse_output};
pub use pipeline::{Pipeline, ResolveMode};
pub use route::{ResolutionStatus, ResolvedHop, RouteResult, Summary};
pub use runner::{TraceCommand, TraceRunner};
