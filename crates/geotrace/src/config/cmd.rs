use crate::config::{ExportFormat, LogFormat, LogSpanEvents, ProviderKindConfig};
use clap::builder::Styles;
use clap::Parser;
use clap_complete::Shell;
use std::time::Duration;

/// Trace the route to a host and plot every hop on a map
#[derive(Parser, Debug)]
#[command(name = "geotrace", author, version, about, long_about = None, styles=Styles::styled())]
pub struct Args {
    /// The hostname or IP to trace [default: google.com]
    pub target: Option<String>,

    /// Config file
    #[arg(short = 'c', long, value_hint = clap::ValueHint::FilePath)]
    pub config_file: Option<String>,

    /// The maximum duration of the trace [default: 30s]
    #[arg(short = 'T', long, value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// The trace command to run, the target is appended to its arguments [default: traceroute]
    #[arg(long)]
    pub trace_command: Option<String>,

    /// The map output file [default: coordinates_map.html]
    #[arg(short = 'o', long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<String>,

    /// Additional export format [default: html]
    #[arg(value_enum, short = 'e', long)]
    pub export_format: Option<ExportFormat>,

    /// Geolocate hops in parallel [default: false]
    #[arg(short = 'p', long)]
    pub parallel: bool,

    /// The maximum number of parallel geolocation workers [default: 5]
    #[arg(short = 'w', long)]
    pub max_workers: Option<usize>,

    /// The minimum delay between geolocation requests [default: 100ms]
    #[arg(long, value_parser = parse_duration)]
    pub rate_limit_delay: Option<Duration>,

    /// The timeout of each geolocation request [default: 5s]
    #[arg(long, value_parser = parse_duration)]
    pub provider_timeout: Option<Duration>,

    /// A comma separated list of geolocation providers in priority order [default: ip-api,ipinfo,ipapi]
    #[arg(value_enum, long, value_delimiter = ',')]
    pub providers: Option<Vec<ProviderKindConfig>>,

    /// Do not lookup the location of this host [default: false]
    #[arg(long)]
    pub no_origin: bool,

    /// Generate shell completion
    #[arg(long)]
    pub generate: Option<Shell>,

    /// Generate ROFF man page
    #[arg(long)]
    pub generate_man: bool,

    /// Print a template toml config file and exit
    #[arg(long)]
    pub print_config_template: bool,

    /// The debug log format [default: pretty]
    #[arg(long)]
    pub log_format: Option<LogFormat>,

    /// The debug log filter [default: geotrace=debug]
    #[arg(long)]
    pub log_filter: Option<String>,

    /// The debug log format [default: off]
    #[arg(long)]
    pub log_span_events: Option<LogSpanEvents>,

    /// Enable verbose debug logging
    #[arg(short = 'v', long, default_value_t = false)]
    pub verbose: bool,
}

fn parse_duration(value: &str) -> anyhow::Result<Duration> {
    Ok(humantime::parse_duration(value)?)
}
