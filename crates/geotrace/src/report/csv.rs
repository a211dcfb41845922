use geotrace_core::{ResolvedHop, RouteResult};
use serde::Serialize;
use std::io::Write;
use std::net::IpAddr;
use tracing::instrument;

/// Generate a CSV report of a geolocated route.
#[instrument(skip_all, level = "trace")]
pub fn report<W: Write>(route: &RouteResult, writer: W) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for hop in route.hops() {
        writer.serialize(CsvRow::from(hop))?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Serialize)]
pub struct CsvRow {
    #[serde(rename = "Hop")]
    pub hop: u8,
    #[serde(rename = "IP")]
    pub ip: Option<IpAddr>,
    #[serde(rename = "Host")]
    pub host: Option<String>,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "City")]
    pub city: Option<String>,
    #[serde(rename = "Region")]
    pub region: Option<String>,
    #[serde(rename = "Country")]
    pub country: Option<String>,
    #[serde(rename = "Latitude")]
    pub latitude: Option<f64>,
    #[serde(rename = "Longitude")]
    pub longitude: Option<f64>,
    #[serde(rename = "Provider")]
    pub provider: Option<String>,
}

impl From<&ResolvedHop> for CsvRow {
    fn from(value: &ResolvedHop) -> Self {
        let location = value.location();
        Self {
            hop: value.hop().index(),
            ip: value.hop().addr(),
            host: value.hop().hostname().map(String::from),
            status: value.status().to_string(),
            city: location.and_then(|l| l.city.clone()),
            region: location.and_then(|l| l.region.clone()),
            country: location.and_then(|l| l.country.clone()),
            latitude: location.map(|l| l.latitude),
            longitude: location.map(|l| l.longitude),
            provider: location.map(|l| l.provider.clone()),
        }
    }
}
