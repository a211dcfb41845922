use crate::report::types::Report;
use geotrace_core::RouteResult;
use geotrace_geoip::Location;
use std::io::Write;
use tracing::instrument;

/// Generate a json report of a geolocated route.
#[instrument(skip_all, level = "trace")]
pub fn report<W: Write>(
    route: &RouteResult,
    origin: Option<&Location>,
    writer: W,
) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(writer, &Report::new(route, origin))?;
    Ok(())
}
