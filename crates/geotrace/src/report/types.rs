use chrono::Utc;
use geotrace_core::{ResolvedHop, RouteResult};
use geotrace_geoip::Location;
use serde::Serialize;
use std::net::IpAddr;

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Report {
    pub info: Info,
    pub origin: Option<Location>,
    pub hops: Vec<Hop>,
    pub summary: Summary,
}

impl Report {
    pub fn new(route: &RouteResult, origin: Option<&Location>) -> Self {
        Self {
            info: Info::from(route),
            origin: origin.cloned(),
            hops: route.hops().iter().map(Hop::from).collect(),
            summary: Summary::from(route),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Info {
    pub target: String,
    pub target_addr: Option<IpAddr>,
    pub start_timestamp: chrono::DateTime<Utc>,
    pub end_timestamp: chrono::DateTime<Utc>,
}

impl From<&RouteResult> for Info {
    fn from(value: &RouteResult) -> Self {
        Self {
            target: value.target().to_string(),
            target_addr: value.target_addr(),
            start_timestamp: chrono::DateTime::<Utc>::from(value.start_timestamp()),
            end_timestamp: chrono::DateTime::<Utc>::from(value.end_timestamp()),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Hop {
    pub hop: u8,
    pub addr: Option<IpAddr>,
    pub hostname: Option<String>,
    pub status: String,
    pub avg_rtt_ms: Option<String>,
    pub location: Option<Location>,
}

impl From<&ResolvedHop> for Hop {
    fn from(value: &ResolvedHop) -> Self {
        Self {
            hop: value.hop().index(),
            addr: value.hop().addr(),
            hostname: value.hop().hostname().map(String::from),
            status: value.status().to_string(),
            avg_rtt_ms: value.hop().avg_ms().map(fixed_width),
            location: value.location().cloned(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Summary {
    pub total_hops: usize,
    pub distinct_locations: usize,
    pub start_point: Option<String>,
    pub end_point: Option<String>,
}

impl From<&RouteResult> for Summary {
    fn from(value: &RouteResult) -> Self {
        let summary = value.summary();
        Self {
            total_hops: summary.hop_count,
            distinct_locations: summary.distinct_locations,
            start_point: summary.first.as_ref().map(Location::long_name),
            end_point: summary.last.as_ref().map(Location::long_name),
        }
    }
}

/// Format a round trip time in milliseconds to two decimal places.
pub fn fixed_width(val: f64) -> String {
    format!("{val:.2}")
}
