use geotrace_core::RouteResult;
use geotrace_geoip::Location;
use serde::Serialize;
use std::io::Write;
use std::net::IpAddr;
use tracing::instrument;

const TEMPLATE: &str = include_str!("map.html");

/// The role of a point on the map.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PointKind {
    Start,
    Hop,
    End,
}

/// A located point on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPoint {
    pub label: String,
    pub ip: Option<IpAddr>,
    pub city: String,
    pub coordinates: String,
    pub latitude: f64,
    pub longitude: f64,
    pub kind: PointKind,
}

impl MapPoint {
    fn new(label: String, ip: Option<IpAddr>, location: &Location) -> Self {
        Self {
            label,
            ip,
            city: location.short_name(),
            coordinates: location.coordinates(),
            latitude: location.latitude,
            longitude: location.longitude,
            kind: PointKind::Hop,
        }
    }
}

/// The points to plot, the origin first if known and then every located hop.
///
/// The first point is the start of the route and the last is the end.
pub fn map_points(route: &RouteResult, origin: Option<&Location>) -> Vec<MapPoint> {
    let mut points = origin
        .map(|origin| MapPoint::new(String::from("Your Location"), None, origin))
        .into_iter()
        .chain(route.hops().iter().filter_map(|hop| {
            hop.location().map(|location| {
                MapPoint::new(
                    format!("Hop {}", hop.hop().index()),
                    hop.hop().addr(),
                    location,
                )
            })
        }))
        .collect::<Vec<_>>();
    let len = points.len();
    for (i, point) in points.iter_mut().enumerate() {
        point.kind = if i == 0 {
            PointKind::Start
        } else if i == len - 1 {
            PointKind::End
        } else {
            PointKind::Hop
        };
    }
    points
}

/// Generate an HTML map of a geolocated route.
///
/// Returns `false` without writing anything if there are no points to plot.
#[instrument(skip_all, level = "trace")]
pub fn report<W: Write>(
    route: &RouteResult,
    origin: Option<&Location>,
    mut writer: W,
) -> anyhow::Result<bool> {
    let points = map_points(route, origin);
    if points.is_empty() {
        return Ok(false);
    }
    writer.write_all(render(route.target(), &points)?.as_bytes())?;
    writer.flush()?;
    Ok(true)
}

fn render(target: &str, points: &[MapPoint]) -> anyhow::Result<String> {
    let points = serde_json::to_string(points)?.replace("</", "<\\/");
    Ok(TEMPLATE
        .replace("{{TITLE}}", &escape_html(target))
        .replace("{{POINTS}}", &points))
}

fn escape_html(text: &str) -> String {
    text.chars().fold(String::with_capacity(text.len()), |mut acc, c| {
        match c {
            '&' => acc.push_str("&amp;"),
            '<' => acc.push_str("&lt;"),
            '>' => acc.push_str("&gt;"),
            '"' => acc.push_str("&quot;"),
            '\'' => acc.push_str("&#39;"),
            _ => acc.push(c),
        }
        acc
    })
}
