use crate::config::{ExportFormat, GeotraceConfig, LogFormat, LogSpanEvents, ALTERNATIVE_TARGETS};
use crate::report;
use anyhow::{anyhow, Context};
use geotrace_core::{Builder, Pipeline, RouteResult};
use geotrace_geoip::{GeoResolver, Location};
use std::fs::File;
use std::io::BufWriter;
use std::num::NonZeroUsize;
use std::path::Path;
use tracing_chrome::{ChromeLayerBuilder, FlushGuard};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Run the geotrace application.
pub fn run_geotrace(cfg: &GeotraceConfig) -> anyhow::Result<()> {
    let _guard = configure_logging(cfg);
    let resolver = start_geo_resolver(cfg)?;
    let pipeline = make_pipeline(cfg, resolver.clone())?;
    println!("Tracing route to {}...", cfg.target);
    let route = match pipeline.run(&cfg.target) {
        Ok(route) => route,
        Err(err) => {
            eprintln!("{}", failure_hint(&cfg.target));
            return Err(err.into());
        }
    };
    let origin = locate_origin(cfg, &resolver);
    report::table::report(&route, origin.as_ref());
    write_reports(cfg, &route, origin.as_ref())
}

/// Configure the logging subscriber.
///
/// Logs are written to stderr, or to a Chrome trace file, and only when
/// verbose logging is enabled.
fn configure_logging(cfg: &GeotraceConfig) -> Option<FlushGuard> {
    if cfg.verbose {
        let fmt_span = match cfg.log_span_events {
            LogSpanEvents::Off => FmtSpan::NONE,
            LogSpanEvents::Active => FmtSpan::ACTIVE,
            LogSpanEvents::Full => FmtSpan::FULL,
        };
        match cfg.log_format {
            LogFormat::Compact => {
                tracing_subscriber::fmt()
                    .with_writer(std::io::stderr)
                    .with_span_events(fmt_span)
                    .with_env_filter(&cfg.log_filter)
                    .compact()
                    .init();
            }
            LogFormat::Pretty => {
                tracing_subscriber::fmt()
                    .with_writer(std::io::stderr)
                    .with_span_events(fmt_span)
                    .with_env_filter(&cfg.log_filter)
                    .pretty()
                    .init();
            }
            LogFormat::Json => {
                tracing_subscriber::fmt()
                    .with_writer(std::io::stderr)
                    .with_span_events(fmt_span)
                    .with_env_filter(&cfg.log_filter)
                    .json()
                    .init();
            }
            LogFormat::Chrome => {
                let (chrome_layer, guard) = ChromeLayerBuilder::new().include_args(true).build();
                tracing_subscriber::registry().with(chrome_layer).init();
                return Some(guard);
            }
        }
    }
    None
}

/// Start the geolocation resolver.
fn start_geo_resolver(cfg: &GeotraceConfig) -> anyhow::Result<GeoResolver> {
    let config = geotrace_geoip::Builder::new()
        .provider_configs(cfg.providers.iter().cloned())
        .provider_timeout(cfg.provider_timeout)
        .rate_limit_delay(cfg.rate_limit_delay)
        .build();
    Ok(GeoResolver::start(&config)?)
}

/// Make the trace and geolocation pipeline.
fn make_pipeline(
    cfg: &GeotraceConfig,
    resolver: GeoResolver,
) -> anyhow::Result<Pipeline<GeoResolver>> {
    let workers = NonZeroUsize::new(cfg.max_workers)
        .ok_or_else(|| anyhow!("max-workers must be greater than zero"))?;
    Ok(Builder::new()
        .trace_command(cfg.trace_command.clone())
        .timeout(cfg.trace_timeout)
        .parallel(cfg.parallel, workers)
        .build(resolver))
}

/// Locate this host, if enabled.
///
/// Failure is not fatal, the map is drawn without an origin.
fn locate_origin(cfg: &GeotraceConfig, resolver: &GeoResolver) -> Option<Location> {
    if !cfg.origin_lookup {
        return None;
    }
    match resolver.locate_origin() {
        Ok(origin) => Some(origin),
        Err(err) => {
            tracing::warn!(%err, "failed to locate origin");
            None
        }
    }
}

/// Write the map and any additional export.
fn write_reports(
    cfg: &GeotraceConfig,
    route: &RouteResult,
    origin: Option<&Location>,
) -> anyhow::Result<()> {
    let output = Path::new(&cfg.output_file);
    let mut html = Vec::new();
    if report::html::report(route, origin, &mut html)? {
        std::fs::write(output, html)
            .with_context(|| format!("failed to write map: {}", output.display()))?;
        println!("Map saved to {}", output.display());
    } else {
        println!("No coordinates found, map not generated");
    }
    if let Some(ext) = cfg.export_format.extension() {
        let path = output.with_extension(ext);
        let writer = BufWriter::new(create(&path)?);
        match cfg.export_format {
            ExportFormat::Json => report::json::report(route, origin, writer)?,
            ExportFormat::Csv => report::csv::report(route, writer)?,
            ExportFormat::Html => {}
        }
        println!("{} report saved to {}", ext.to_uppercase(), path.display());
    }
    Ok(())
}

fn create(path: &Path) -> anyhow::Result<File> {
    File::create(path).with_context(|| format!("failed to create report: {}", path.display()))
}

/// The hint shown when the trace fails.
fn failure_hint(target: &str) -> String {
    let alternatives = ALTERNATIVE_TARGETS
        .iter()
        .filter(|alternative| **alternative != target)
        .copied()
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "hint: the trace to {target} failed, try another target such as {alternatives} or increase the trace timeout with --timeout"
    )
}
