use itertools::Itertools;
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// The geographic location of an address.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Location {
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    /// The name of the provider which supplied the location.
    pub provider: String,
}

impl Location {
    /// A short name for the location, the city if known.
    ///
    /// Falls back to the region and then the country.
    #[must_use]
    pub fn short_name(&self) -> String {
        self.city
            .as_deref()
            .or(self.region.as_deref())
            .or(self.country.as_deref())
            .map_or_else(|| String::from("Unknown"), String::from)
    }

    /// The full name of the location.
    ///
    /// For example `Philadelphia, Pennsylvania, United States`.
    #[must_use]
    pub fn long_name(&self) -> String {
        [
            self.city.as_ref(),
            self.region.as_ref(),
            self.country.as_ref(),
        ]
        .into_iter()
        .flatten()
        .join(", ")
    }

    /// The `latitude, longitude` pair formatted to four decimal places.
    #[must_use]
    pub fn coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = self.long_name();
        if name.is_empty() {
            write!(f, "{}", self.coordinates())
        } else {
            write!(f, "{name}")
        }
    }
}
