use crate::hop::Hop;
use geotrace_geoip::Location;
use itertools::Itertools;
use std::fmt::{Display, Formatter};
use std::net::IpAddr;
use std::time::SystemTime;

/// The outcome of geolocating a hop.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ResolutionStatus {
    /// The hop was located.
    Resolved,
    /// The hop did not respond or no provider could locate it.
    Unresolved,
    /// The hop address is private or reserved and has no location.
    PrivateOrUnroutable,
}

impl Display for ResolutionStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resolved => write!(f, "resolved"),
            Self::Unresolved => write!(f, "unresolved"),
            Self::PrivateOrUnroutable => write!(f, "private-or-unroutable"),
        }
    }
}

/// A hop annotated with its location.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedHop {
    hop: Hop,
    location: Option<Location>,
    status: ResolutionStatus,
}

impl ResolvedHop {
    #[must_use]
    pub const fn resolved(hop: Hop, location: Location) -> Self {
        Self {
            hop,
            location: Some(location),
            status: ResolutionStatus::Resolved,
        }
    }

    #[must_use]
    pub const fn unresolved(hop: Hop) -> Self {
        Self {
            hop,
            location: None,
            status: ResolutionStatus::Unresolved,
        }
    }

    #[must_use]
    pub const fn private_or_unroutable(hop: Hop) -> Self {
        Self {
            hop,
            location: None,
            status: ResolutionStatus::PrivateOrUnroutable,
        }
    }

    #[must_use]
    pub const fn hop(&self) -> &Hop {
        &self.hop
    }

    #[must_use]
    pub const fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    #[must_use]
    pub const fn status(&self) -> ResolutionStatus {
        self.status
    }
}

/// Summary statistics of a route.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// The number of hops in the route.
    pub hop_count: usize,
    /// The number of distinct places among the located hops.
    pub distinct_locations: usize,
    /// The location of the first located hop.
    pub first: Option<Location>,
    /// The location of the last located hop.
    pub last: Option<Location>,
}

impl Summary {
    #[must_use]
    pub fn new(hops: &[ResolvedHop]) -> Self {
        let located = || hops.iter().filter_map(ResolvedHop::location);
        Self {
            hop_count: hops.len(),
            distinct_locations: located()
                .unique_by(|location| PlaceKey::new(*location))
                .count(),
            first: located().next().cloned(),
            last: located().last().cloned(),
        }
    }
}

/// Identifies a place, by name when any is known, else by coordinates.
#[derive(Debug, Hash, Eq, PartialEq)]
enum PlaceKey<'a> {
    Named(Option<&'a str>, Option<&'a str>, Option<&'a str>),
    Coordinates(u64, u64),
}

impl<'a> PlaceKey<'a> {
    fn new(location: &'a Location) -> Self {
        match (
            location.city.as_deref(),
            location.region.as_deref(),
            location.country.as_deref(),
        ) {
            (None, None, None) => Self::Coordinates(
                location.latitude.to_bits(),
                location.longitude.to_bits(),
            ),
            (city, region, country) => Self::Named(city, region, country),
        }
    }
}

/// The geolocated route to a target.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteResult {
    target: String,
    target_addr: Option<IpAddr>,
    hops: Vec<ResolvedHop>,
    summary: Summary,
    start_timestamp: SystemTime,
    end_timestamp: SystemTime,
}

impl RouteResult {
    #[must_use]
    pub fn new(
        target: String,
        target_addr: Option<IpAddr>,
        hops: Vec<ResolvedHop>,
        start_timestamp: SystemTime,
        end_timestamp: SystemTime,
    ) -> Self {
        let summary = Summary::new(&hops);
        Self {
            target,
            target_addr,
            hops,
            summary,
            start_timestamp,
            end_timestamp,
        }
    }

    /// The target as given to the trace command.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The target address reported by the trace command, if any.
    #[must_use]
    pub const fn target_addr(&self) -> Option<IpAddr> {
        self.target_addr
    }

    /// The hops in route order.
    #[must_use]
    pub fn hops(&self) -> &[ResolvedHop] {
        &self.hops
    }

    #[must_use]
    pub const fn summary(&self) -> &Summary {
        &self.summary
    }

    #[must_use]
    pub const fn start_timestamp(&self) -> SystemTime {
        self.start_timestamp
    }

    #[must_use]
    pub const fn end_timestamp(&self) -> SystemTime {
        self.end_timestamp
    }
}
