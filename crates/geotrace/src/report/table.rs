use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use geotrace_core::{ResolutionStatus, RouteResult};
use geotrace_geoip::Location;
use tracing::instrument;

/// Print a table of a geolocated route followed by a summary.
#[instrument(skip_all, level = "trace")]
pub fn report(route: &RouteResult, origin: Option<&Location>) {
    println!("{}", render(route, origin));
}

fn render(route: &RouteResult, origin: Option<&Location>) -> String {
    let columns = vec![
        "Hop",
        "IP",
        "Host",
        "Location",
        "Coordinates",
        "Provider",
        "RTT",
    ];
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(columns);
    for resolved in route.hops() {
        let hop = resolved.hop();
        let index = hop.index().to_string();
        let ip = hop
            .addr()
            .map_or_else(|| String::from("???"), |addr| addr.to_string());
        let host = hop.hostname().unwrap_or("???").to_string();
        let (location, coordinates, provider) = match resolved.location() {
            Some(location) => (
                location.to_string(),
                location.coordinates(),
                location.provider.clone(),
            ),
            None => (
                status_label(resolved.status()).to_string(),
                String::new(),
                String::new(),
            ),
        };
        let rtt = hop
            .avg_ms()
            .map_or_else(|| String::from("???"), |avg| format!("{avg:.1}"));
        table.add_row(vec![
            &index,
            &ip,
            &host,
            &location,
            &coordinates,
            &provider,
            &rtt,
        ]);
    }
    let summary = route.summary();
    let mut lines = vec![table.to_string()];
    if let Some(origin) = origin {
        lines.push(format!("Origin: {origin}"));
    }
    if let Some(last) = &summary.last {
        lines.push(format!("Final destination: {}", last.short_name()));
    }
    lines.push(format!("Total hops: {}", summary.hop_count));
    lines.push(format!("Distinct locations: {}", summary.distinct_locations));
    lines.join("\n")
}

const fn status_label(status: ResolutionStatus) -> &'static str {
    match status {
        ResolutionStatus::Resolved => "",
        ResolutionStatus::Unresolved => "unknown",
        ResolutionStatus::PrivateOrUnroutable => "private",
    }
}
