use crate::hop::{Hop, TraceOutput};
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

/// The marker printed by the trace command for a probe which timed out.
const TIMEOUT_MARKER: &str = "*";

/// The header prefixes which announce the target of a trace.
const HEADER_PREFIXES: [&str; 3] = ["traceroute to ", "traceroute6 to ", "Tracing route to "];

/// Parse the textual output of a trace command.
///
/// Lines which are not recognized as a hop are skipped.
#[must_use]
pub fn parse_output(output: &str) -> TraceOutput {
    let mut target_addr = None;
    let mut hops = Vec::new();
    for line in output.lines() {
        if let Some(addr) = parse_header(line) {
            target_addr = Some(addr);
        } else if let Some(hop) = parse_hop(line) {
            hops.push(hop);
        } else if !line.trim().is_empty() {
            tracing::trace!(line, "skipping unrecognized line");
        }
    }
    TraceOutput { target_addr, hops }
}

/// Parse the target address from a trace header line.
///
/// For example `traceroute to google.com (142.250.80.46), 15 hops max`.
fn parse_header(line: &str) -> Option<IpAddr> {
    let line = line.trim_start();
    HEADER_PREFIXES
        .iter()
        .find_map(|prefix| line.strip_prefix(prefix))
        .and_then(|rest| rest.split_whitespace().find_map(parse_addr))
}

/// Parse a single hop line.
///
/// The line must start with the hop index and contain either an address or
/// at least one timeout marker.  The first address on the line is used.
///
/// Recognized layouts include:
///
/// `1  (192.168.0.1)  1.123 ms`
/// `2  host.example.com (96.120.27.17)  12.1 ms  11.9 ms`
/// `3  96.120.27.17  12ms`
/// `4  * * *`
/// `5    <1 ms    2 ms    1 ms  10.0.0.1`
pub fn parse_hop(line: &str) -> Option<Hop> {
    let mut tokens = line.split_whitespace();
    let index = tokens.next()?.parse::<u8>().ok().filter(|index| *index > 0)?;
    let tokens = tokens.collect::<Vec<_>>();
    let mut addr = None;
    let mut hostname = None;
    let mut candidate_hostname = None;
    let mut rtts = Vec::new();
    let mut timeouts = 0;
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i];
        if token == TIMEOUT_MARKER {
            timeouts += 1;
        } else if let Some(parsed) = parse_addr(token) {
            if addr.is_none() {
                addr = Some(parsed);
                if is_bracketed(token) {
                    hostname = candidate_hostname.take().map(String::from);
                }
            }
        } else if let Some((rtt, consumed)) = parse_rtt(token, tokens.get(i + 1).copied()) {
            rtts.push(rtt);
            if consumed {
                i += 1;
            }
        } else if addr.is_none() && candidate_hostname.is_none() && !token.starts_with('!') {
            candidate_hostname = Some(token);
        }
        i += 1;
    }
    if addr.is_some() || timeouts > 0 {
        Some(Hop::new(index, addr, hostname, rtts))
    } else {
        None
    }
}

/// Parse an IPv4 or IPv6 address, ignoring surrounding brackets and commas.
fn parse_addr(token: &str) -> Option<IpAddr> {
    IpAddr::from_str(token.trim_matches(|c| matches!(c, '(' | ')' | '[' | ']' | ','))).ok()
}

fn is_bracketed(token: &str) -> bool {
    token.starts_with('(') || token.starts_with('[')
}

/// Parse a round trip time such as `12ms`, `12.3 ms` or `<1 ms`.
///
/// Returns the time and whether the following `ms` token was consumed.
fn parse_rtt(token: &str, next: Option<&str>) -> Option<(Duration, bool)> {
    let token = token.trim_start_matches('<');
    let (value, consumed) = match token.strip_suffix("ms") {
        Some(value) => (value, false),
        None if next == Some("ms") => (token, true),
        None => return None,
    };
    let millis = value.parse::<f64>().ok().filter(|ms| ms.is_finite() && *ms >= 0_f64)?;
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let nanos = (millis * 1_000_000_f64).round() as u64;
    Some((Duration::from_nanos(nanos), consumed))
}
