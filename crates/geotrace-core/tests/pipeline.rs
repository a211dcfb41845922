#![cfg(unix)]

use geotrace_core::{Builder, Error, ResolutionStatus, ResolveMode, TraceCommand};
use geotrace_geoip::{GeoResolver, Location, Provider, ProviderError, RateLimiter};
use pretty_assertions::assert_eq;
use std::net::{IpAddr, Ipv4Addr};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use test_case::test_case;

/// A provider with a fixed table of locations.
struct TableProvider {
    name: &'static str,
    table: Vec<(IpAddr, &'static str)>,
    calls: Arc<AtomicUsize>,
}

impl Provider for TableProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn locate(&self, addr: IpAddr) -> Result<Location, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.table
            .iter()
            .find(|(a, _)| *a == addr)
            .map(|(_, city)| Location {
                city: Some(String::from(*city)),
                region: None,
                country: Some(String::from("United States")),
                latitude: 39.9526,
                longitude: -75.1652,
                provider: String::from(self.name),
            })
            .ok_or(ProviderError::Status(404))
    }

    fn locate_origin(&self) -> Result<Location, ProviderError> {
        Err(ProviderError::MissingCoordinates)
    }
}

fn shell(script: &str) -> TraceCommand {
    TraceCommand::new("sh", ["-c", script])
}

fn boxed(providers: Vec<TableProvider>) -> Vec<Box<dyn Provider>> {
    providers
        .into_iter()
        .map(|provider| Box::new(provider) as Box<dyn Provider>)
        .collect()
}

fn parallel(workers: usize) -> ResolveMode {
    ResolveMode::Parallel(NonZeroUsize::new(workers).unwrap())
}

const ISP_ROUTER: IpAddr = IpAddr::V4(Ipv4Addr::new(96, 120, 27, 17));

#[test_case(ResolveMode::Sequential; "sequential")]
#[test_case(parallel(5); "parallel")]
fn test_end_to_end(mode: ResolveMode) -> anyhow::Result<()> {
    let calls = Arc::new(AtomicUsize::new(0));
    let provider = TableProvider {
        name: "table",
        table: vec![(ISP_ROUTER, "Philadelphia")],
        calls: calls.clone(),
    };
    let resolver =
        GeoResolver::with_providers(boxed(vec![provider]), RateLimiter::new(Duration::ZERO));
    let pipeline = Builder::new()
        .trace_command(shell(
            "printf '1 (192.168.0.1) 1ms\\n2 (96.120.27.17) 12ms\\n3 * * *\\n'",
        ))
        .timeout(Duration::from_secs(10))
        .resolve_mode(mode)
        .build(resolver);
    let route = pipeline.run("example.com")?;
    let hops = route.hops();
    assert_eq!(3, hops.len());
    assert_eq!(
        vec![1, 2, 3],
        hops.iter().map(|h| h.hop().index()).collect::<Vec<_>>()
    );
    assert_eq!(ResolutionStatus::PrivateOrUnroutable, hops[0].status());
    assert_eq!(None, hops[0].location());
    assert_eq!(ResolutionStatus::Resolved, hops[1].status());
    assert_eq!(
        Some("Philadelphia"),
        hops[1].location().and_then(|l| l.city.as_deref())
    );
    assert_eq!(ResolutionStatus::Unresolved, hops[2].status());
    assert_eq!(None, hops[2].hop().addr());
    assert_eq!(1, calls.load(Ordering::SeqCst));
    assert_eq!(3, route.summary().hop_count);
    assert_eq!(1, route.summary().distinct_locations);
    assert_eq!("example.com", route.target());
    Ok(())
}

#[test]
fn test_fallback_provider() -> anyhow::Result<()> {
    let primary = TableProvider {
        name: "primary",
        table: vec![],
        calls: Arc::new(AtomicUsize::new(0)),
    };
    let fallback = TableProvider {
        name: "fallback",
        table: vec![(ISP_ROUTER, "Camden")],
        calls: Arc::new(AtomicUsize::new(0)),
    };
    let resolver = GeoResolver::with_providers(
        boxed(vec![primary, fallback]),
        RateLimiter::new(Duration::ZERO),
    );
    let route = Builder::new()
        .trace_command(shell("printf '1 (96.120.27.17) 12ms\\n2 (96.120.27.17) 14ms\\n'"))
        .build(resolver.clone())
        .run("example.com")?;
    for hop in route.hops() {
        assert_eq!(Some("fallback"), hop.location().map(|l| l.provider.as_str()));
    }
    assert_eq!(Some("fallback"), resolver.cached(ISP_ROUTER).map(|l| l.provider).as_deref());
    Ok(())
}

#[test]
fn test_timeout_yields_no_route() {
    let resolver = GeoResolver::with_providers(vec![], RateLimiter::new(Duration::ZERO));
    let start = Instant::now();
    let result = Builder::new()
        .trace_command(shell("printf '1 (10.0.0.1) 1ms\\n'; exec sleep 10"))
        .timeout(Duration::from_millis(300))
        .build(resolver)
        .run("example.com");
    assert!(matches!(result, Err(Error::TraceTimeout(_))));
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_unavailable_trace_command() {
    let resolver = GeoResolver::with_providers(vec![], RateLimiter::new(Duration::ZERO));
    let result = Builder::new()
        .trace_command(TraceCommand::new(
            "/nonexistent/geotrace/traceroute",
            ["-n"],
        ))
        .build(resolver)
        .run("example.com");
    assert!(matches!(result, Err(Error::TraceUnavailable(..))));
}

#[test]
fn test_parallel_rate_limited() -> anyhow::Result<()> {
    let delay = Duration::from_millis(40);
    let addrs = (1..=5)
        .map(|i| IpAddr::V4(Ipv4Addr::new(20, 0, 0, i)))
        .collect::<Vec<_>>();
    let provider = TableProvider {
        name: "table",
        table: addrs.iter().map(|addr| (*addr, "Seattle")).collect(),
        calls: Arc::new(AtomicUsize::new(0)),
    };
    let resolver = GeoResolver::with_providers(boxed(vec![provider]), RateLimiter::new(delay));
    let script = addrs
        .iter()
        .enumerate()
        .map(|(i, addr)| format!("{} ({addr}) 5ms\\n", i + 1))
        .collect::<String>();
    let start = Instant::now();
    let route = Builder::new()
        .trace_command(shell(&format!("printf '{script}'")))
        .resolve_mode(parallel(5))
        .build(resolver)
        .run("example.com")?;
    assert!(start.elapsed() >= delay * 4);
    assert_eq!(5, route.summary().hop_count);
    assert!(route
        .hops()
        .iter()
        .all(|hop| hop.status() == ResolutionStatus::Resolved));
    Ok(())
}
