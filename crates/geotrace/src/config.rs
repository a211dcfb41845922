use anyhow::anyhow;
use clap::ValueEnum;
use clap_complete::Shell;
use file::ConfigFile;
use geotrace_core::{defaults, TraceCommand};
use geotrace_geoip::{ProviderConfig, ProviderKind, ADDR_PLACEHOLDER};
use itertools::Itertools;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

mod cmd;
mod constants;
mod file;

pub use cmd::Args;
pub use constants::ALTERNATIVE_TARGETS;

/// The additional report format.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportFormat {
    /// Generate the HTML map only.
    Html,
    /// Generate a JSON report alongside the HTML map.
    Json,
    /// Generate a CSV report alongside the HTML map.
    Csv,
}

impl ExportFormat {
    /// The file extension of the additional report, if any.
    #[must_use]
    pub const fn extension(self) -> Option<&'static str> {
        match self {
            Self::Html => None,
            Self::Json => Some("json"),
            Self::Csv => Some("csv"),
        }
    }
}

/// A geolocation provider.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKindConfig {
    /// The ip-api.com service.
    IpApi,
    /// The ipinfo.io service.
    #[value(name = "ipinfo")]
    #[serde(rename = "ipinfo")]
    IpInfo,
    /// The ipapi.co service.
    #[value(name = "ipapi")]
    #[serde(rename = "ipapi")]
    IpApiCo,
}

impl From<ProviderKind> for ProviderKindConfig {
    fn from(value: ProviderKind) -> Self {
        match value {
            ProviderKind::IpApi => Self::IpApi,
            ProviderKind::IpInfo => Self::IpInfo,
            ProviderKind::IpApiCo => Self::IpApiCo,
        }
    }
}

impl From<ProviderKindConfig> for ProviderKind {
    fn from(value: ProviderKindConfig) -> Self {
        match value {
            ProviderKindConfig::IpApi => Self::IpApi,
            ProviderKindConfig::IpInfo => Self::IpInfo,
            ProviderKindConfig::IpApiCo => Self::IpApiCo,
        }
    }
}

/// How to format log data.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
    /// Display log data in a compact format.
    Compact,
    /// Display log data in a pretty format.
    Pretty,
    /// Display log data in a json format.
    Json,
    /// Display log data in Chrome trace format.
    Chrome,
}

/// How to log event spans.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogSpanEvents {
    /// Do not display event spans.
    Off,
    /// Display enter and exit event spans.
    Active,
    /// Display all event spans.
    Full,
}

/// The action to perform.
#[derive(Debug, Eq, PartialEq)]
pub enum GeotraceAction {
    /// Run a geo-annotated trace.
    Run(GeotraceConfig),
    /// Print a template toml config file and exit.
    PrintConfigTemplate,
    /// Generate shell completion and exit.
    PrintShellCompletions(Shell),
    /// Generate a man page and exit.
    PrintManPage,
}

impl GeotraceAction {
    pub fn from(args: Args) -> anyhow::Result<Self> {
        Ok(if args.print_config_template {
            Self::PrintConfigTemplate
        } else if let Some(shell) = args.generate {
            Self::PrintShellCompletions(shell)
        } else if args.generate_man {
            Self::PrintManPage
        } else {
            Self::Run(GeotraceConfig::from(args)?)
        })
    }
}

/// Fully parsed and validated configuration.
#[derive(Debug, Eq, PartialEq)]
pub struct GeotraceConfig {
    pub target: String,
    pub trace_command: TraceCommand,
    pub trace_timeout: Duration,
    pub providers: Vec<ProviderConfig>,
    pub provider_timeout: Duration,
    pub rate_limit_delay: Duration,
    pub parallel: bool,
    pub max_workers: usize,
    pub origin_lookup: bool,
    pub export_format: ExportFormat,
    pub output_file: String,
    pub verbose: bool,
    pub log_format: LogFormat,
    pub log_filter: String,
    pub log_span_events: LogSpanEvents,
}

impl GeotraceConfig {
    pub fn from(args: Args) -> anyhow::Result<Self> {
        let cfg_file = if let Some(cfg) = &args.config_file {
            file::read_config_file(cfg)?
        } else {
            file::read_default_config_file()?.unwrap_or_default()
        };
        Self::build_config(args, cfg_file)
    }

    fn build_config(args: Args, cfg_file: ConfigFile) -> anyhow::Result<Self> {
        let cfg_file_geotrace = cfg_file.geotrace.unwrap_or_default();
        let cfg_file_trace = cfg_file.trace.unwrap_or_default();
        let cfg_file_geoip = cfg_file.geoip.unwrap_or_default();
        let target = cfg_layer(
            args.target,
            cfg_file_geotrace.target,
            String::from(defaults::DEFAULT_TARGET),
        );
        let trace_command = trace_command(
            cfg_layer_opt(args.trace_command, cfg_file_trace.trace_command),
            cfg_file_trace.trace_args,
        );
        let trace_timeout = cfg_layer(
            args.timeout,
            cfg_file_trace.timeout,
            defaults::DEFAULT_TRACE_TIMEOUT,
        );
        let provider_kinds = cfg_layer(
            args.providers,
            cfg_file_geoip.providers,
            geotrace_geoip::defaults::DEFAULT_PROVIDERS
                .into_iter()
                .map(ProviderKindConfig::from)
                .collect(),
        );
        let ip_api_url = cfg_layer(
            None,
            cfg_file_geoip.ip_api_url,
            String::from(ProviderKind::IpApi.default_url()),
        );
        let ipinfo_url = cfg_layer(
            None,
            cfg_file_geoip.ipinfo_url,
            String::from(ProviderKind::IpInfo.default_url()),
        );
        let ipapi_url = cfg_layer(
            None,
            cfg_file_geoip.ipapi_url,
            String::from(ProviderKind::IpApiCo.default_url()),
        );
        let provider_timeout = cfg_layer(
            args.provider_timeout,
            cfg_file_geoip.provider_timeout,
            geotrace_geoip::defaults::DEFAULT_PROVIDER_TIMEOUT,
        );
        let rate_limit_delay = cfg_layer(
            args.rate_limit_delay,
            cfg_file_geoip.rate_limit_delay,
            geotrace_geoip::defaults::DEFAULT_RATE_LIMIT_DELAY,
        );
        let parallel = cfg_layer_bool_flag(
            args.parallel,
            cfg_file_geoip.parallel,
            defaults::DEFAULT_PARALLEL,
        );
        let max_workers = cfg_layer(
            args.max_workers,
            cfg_file_geoip.max_workers,
            defaults::DEFAULT_MAX_WORKERS,
        );
        let origin_lookup = if args.no_origin {
            false
        } else {
            cfg_layer(
                None,
                cfg_file_geotrace.origin_lookup,
                constants::DEFAULT_ORIGIN_LOOKUP,
            )
        };
        let export_format = cfg_layer(
            args.export_format,
            cfg_file_geotrace.export_format,
            constants::DEFAULT_EXPORT_FORMAT,
        );
        let output_file = cfg_layer(
            args.output,
            cfg_file_geotrace.output_file,
            String::from(constants::DEFAULT_OUTPUT_FILE),
        );
        let verbose = args.verbose;
        let log_format = cfg_layer(
            args.log_format,
            cfg_file_geotrace.log_format,
            constants::DEFAULT_LOG_FORMAT,
        );
        let log_filter = cfg_layer(
            args.log_filter,
            cfg_file_geotrace.log_filter,
            String::from(constants::DEFAULT_LOG_FILTER),
        );
        let log_span_events = cfg_layer(
            args.log_span_events,
            cfg_file_geotrace.log_span_events,
            constants::DEFAULT_LOG_SPAN_EVENTS,
        );
        validate_target(&target)?;
        validate_trace_timeout(trace_timeout)?;
        validate_provider_timeout(provider_timeout)?;
        validate_max_workers(max_workers)?;
        validate_providers(&provider_kinds)?;
        validate_output_file(&output_file, export_format)?;
        let providers = provider_kinds
            .into_iter()
            .map(ProviderKind::from)
            .map(|kind| {
                let url = match kind {
                    ProviderKind::IpApi => &ip_api_url,
                    ProviderKind::IpInfo => &ipinfo_url,
                    ProviderKind::IpApiCo => &ipapi_url,
                };
                ProviderConfig::new(kind, url.as_str())
            })
            .collect::<Vec<_>>();
        validate_provider_urls(&providers)?;
        Ok(Self {
            target,
            trace_command,
            trace_timeout,
            providers,
            provider_timeout,
            rate_limit_delay,
            parallel,
            max_workers,
            origin_lookup,
            export_format,
            output_file,
            verbose,
            log_format,
            log_filter,
            log_span_events,
        })
    }
}

impl Default for GeotraceConfig {
    fn default() -> Self {
        Self {
            target: String::from(defaults::DEFAULT_TARGET),
            trace_command: TraceCommand::default(),
            trace_timeout: defaults::DEFAULT_TRACE_TIMEOUT,
            providers: geotrace_geoip::Config::default().providers,
            provider_timeout: geotrace_geoip::defaults::DEFAULT_PROVIDER_TIMEOUT,
            rate_limit_delay: geotrace_geoip::defaults::DEFAULT_RATE_LIMIT_DELAY,
            parallel: defaults::DEFAULT_PARALLEL,
            max_workers: defaults::DEFAULT_MAX_WORKERS,
            origin_lookup: constants::DEFAULT_ORIGIN_LOOKUP,
            export_format: constants::DEFAULT_EXPORT_FORMAT,
            output_file: String::from(constants::DEFAULT_OUTPUT_FILE),
            verbose: false,
            log_format: constants::DEFAULT_LOG_FORMAT,
            log_filter: String::from(constants::DEFAULT_LOG_FILTER),
            log_span_events: constants::DEFAULT_LOG_SPAN_EVENTS,
        }
    }
}

/// The trace command to run.
///
/// The platform default arguments only apply to the platform default command.
fn trace_command(program: Option<String>, args: Option<Vec<String>>) -> TraceCommand {
    match (program, args) {
        (Some(program), args) => TraceCommand::new(program, args.unwrap_or_default()),
        (None, Some(args)) => TraceCommand::new(defaults::DEFAULT_TRACE_COMMAND, args),
        (None, None) => TraceCommand::default(),
    }
}

fn cfg_layer<T>(fst: Option<T>, snd: Option<T>, def: T) -> T {
    match (fst, snd) {
        (Some(val), _) | (None, Some(val)) => val,
        (None, None) => def,
    }
}

fn cfg_layer_opt<T>(fst: Option<T>, snd: Option<T>) -> Option<T> {
    match (fst, snd) {
        (Some(val), _) | (None, Some(val)) => Some(val),
        (None, None) => None,
    }
}

const fn cfg_layer_bool_flag(fst: bool, snd: Option<bool>, default: bool) -> bool {
    match (fst, snd) {
        (true, _) => true,
        (false, Some(val)) => val,
        (false, None) => default,
    }
}

fn validate_target(target: &str) -> anyhow::Result<()> {
    if target.trim().is_empty() {
        Err(anyhow!("target must not be blank"))
    } else {
        Ok(())
    }
}

fn validate_trace_timeout(trace_timeout: Duration) -> anyhow::Result<()> {
    if trace_timeout.is_zero() {
        Err(anyhow!(
            "timeout ({}) must be greater than zero",
            humantime::format_duration(trace_timeout)
        ))
    } else if trace_timeout > constants::MAX_TRACE_TIMEOUT {
        Err(anyhow!(
            "timeout ({}) must not exceed {}",
            humantime::format_duration(trace_timeout),
            humantime::format_duration(constants::MAX_TRACE_TIMEOUT)
        ))
    } else {
        Ok(())
    }
}

fn validate_provider_timeout(provider_timeout: Duration) -> anyhow::Result<()> {
    if provider_timeout.is_zero() {
        Err(anyhow!(
            "provider-timeout ({}) must be greater than zero",
            humantime::format_duration(provider_timeout)
        ))
    } else {
        Ok(())
    }
}

fn validate_max_workers(max_workers: usize) -> anyhow::Result<()> {
    if (1..=constants::MAX_WORKERS).contains(&max_workers) {
        Ok(())
    } else {
        Err(anyhow!(
            "max-workers ({}) must be between 1 and {} inclusive",
            max_workers,
            constants::MAX_WORKERS
        ))
    }
}

fn validate_providers(providers: &[ProviderKindConfig]) -> anyhow::Result<()> {
    if providers.is_empty() {
        return Err(anyhow!("at least one geolocation provider is required"));
    }
    let duplicates = providers
        .iter()
        .duplicates()
        .map(|&kind| ProviderKind::from(kind).name())
        .join(", ");
    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(anyhow!("duplicate geolocation providers: {}", duplicates))
    }
}

fn validate_provider_urls(providers: &[ProviderConfig]) -> anyhow::Result<()> {
    match providers
        .iter()
        .find(|provider| !provider.url.contains(ADDR_PLACEHOLDER))
    {
        Some(provider) => Err(anyhow!(
            "{}-url ({}) must contain the {} placeholder",
            provider.kind,
            provider.url,
            ADDR_PLACEHOLDER
        )),
        None => Ok(()),
    }
}

/// Validate the map output file.
///
/// The additional report is written beside the map and must not replace it.
fn validate_output_file(output_file: &str, export_format: ExportFormat) -> anyhow::Result<()> {
    if output_file.trim().is_empty() {
        return Err(anyhow!("output file must not be blank"));
    }
    let path = Path::new(output_file);
    match export_format.extension() {
        Some(ext) if path.with_extension(ext) == path => Err(anyhow!(
            "output file ({output_file}) must not have the `.{ext}` extension of the {ext} export"
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_config_default() {
        let config = GeotraceConfig::build_config(parse("geotrace").unwrap(), ConfigFile::default());
        compare(config, Ok(GeotraceConfig::default()));
    }

    #[test]
    fn test_config_sample() {
        let cfg_file: ConfigFile =
            toml::from_str(include_str!("../geotrace-config-sample.toml")).unwrap();
        let config = GeotraceConfig::build_config(parse("geotrace example.com").unwrap(), cfg_file);
        compare(config, Ok(cfg().build()));
    }

    #[test]
    fn test_config_empty_file() {
        let cfg_file: ConfigFile = toml::from_str("").unwrap();
        let config = GeotraceConfig::build_config(parse("geotrace example.com").unwrap(), cfg_file);
        compare(config, Ok(cfg().build()));
    }

    #[test_case("geotrace --version", Err(anyhow!(format!("geotrace {}", env!("CARGO_PKG_VERSION")))); "show version")]
    #[test_case("geotrace -V", Err(anyhow!(format!("geotrace {}", env!("CARGO_PKG_VERSION")))); "show version short")]
    fn test_version(cmd: &str, expected: anyhow::Result<GeotraceConfig>) {
        compare(parse_config(cmd), expected);
    }

    #[test_case("geotrace example.com", Ok(cfg().build()); "target")]
    #[test_case("geotrace", Ok(cfg().target("google.com").build()); "default target")]
    #[test_case("geotrace 8.8.8.8", Ok(cfg().target("8.8.8.8").build()); "ip target")]
    fn test_target(cmd: &str, expected: anyhow::Result<GeotraceConfig>) {
        compare(parse_config(cmd), expected);
    }

    #[test_case("geotrace example.com --timeout 1m", Ok(cfg().trace_timeout(Duration::from_secs(60)).build()); "custom timeout")]
    #[test_case("geotrace example.com -T 500ms", Ok(cfg().trace_timeout(Duration::from_millis(500)).build()); "custom timeout short")]
    #[test_case("geotrace example.com -T 0s", Err(anyhow!("timeout (0s) must be greater than zero")); "zero timeout")]
    #[test_case("geotrace example.com -T 1day", Ok(cfg().trace_timeout(Duration::from_secs(86_400)).build()); "maximum timeout")]
    #[test_case("geotrace example.com -T 500000000000years", Err(anyhow!("timeout (500000000000years) must not exceed 1day")); "huge timeout")]
    fn test_trace_timeout(cmd: &str, expected: anyhow::Result<GeotraceConfig>) {
        compare(parse_config(cmd), expected);
    }

    #[test_case("geotrace example.com --trace-command mtr", Ok(cfg().trace_command(TraceCommand::new("mtr", Vec::<String>::new())).build()); "custom trace command")]
    fn test_trace_command(cmd: &str, expected: anyhow::Result<GeotraceConfig>) {
        compare(parse_config(cmd), expected);
    }

    #[test_case(None, None, TraceCommand::default(); "platform default")]
    #[test_case(Some("tracepath"), None, TraceCommand::new("tracepath", Vec::<String>::new()); "custom command without args")]
    #[test_case(Some("tracepath"), Some(vec!["-n"]), TraceCommand::new("tracepath", ["-n"]); "custom command with args")]
    #[test_case(None, Some(vec!["-n"]), TraceCommand::new(defaults::DEFAULT_TRACE_COMMAND, ["-n"]); "default command with custom args")]
    fn test_trace_command_layering(
        program: Option<&str>,
        args: Option<Vec<&str>>,
        expected: TraceCommand,
    ) {
        let actual = trace_command(
            program.map(String::from),
            args.map(|args| args.into_iter().map(String::from).collect()),
        );
        assert_eq!(expected, actual);
    }

    #[test_case("geotrace example.com --parallel", Ok(cfg().parallel(true).build()); "parallel")]
    #[test_case("geotrace example.com -p -w 8", Ok(cfg().parallel(true).max_workers(8).build()); "parallel with workers")]
    #[test_case("geotrace example.com -w 64", Ok(cfg().max_workers(64).build()); "maximum workers")]
    #[test_case("geotrace example.com -w 0", Err(anyhow!("max-workers (0) must be between 1 and 64 inclusive")); "zero workers")]
    #[test_case("geotrace example.com -w 65", Err(anyhow!("max-workers (65) must be between 1 and 64 inclusive")); "too many workers")]
    fn test_workers(cmd: &str, expected: anyhow::Result<GeotraceConfig>) {
        compare(parse_config(cmd), expected);
    }

    #[test_case("geotrace example.com --rate-limit-delay 1s", Ok(cfg().rate_limit_delay(Duration::from_secs(1)).build()); "custom rate limit delay")]
    #[test_case("geotrace example.com --rate-limit-delay 0ms", Ok(cfg().rate_limit_delay(Duration::ZERO).build()); "zero rate limit delay")]
    #[test_case("geotrace example.com --provider-timeout 2s", Ok(cfg().provider_timeout(Duration::from_secs(2)).build()); "custom provider timeout")]
    #[test_case("geotrace example.com --provider-timeout 0s", Err(anyhow!("provider-timeout (0s) must be greater than zero")); "zero provider timeout")]
    fn test_geoip_timing(cmd: &str, expected: anyhow::Result<GeotraceConfig>) {
        compare(parse_config(cmd), expected);
    }

    #[test_case("geotrace example.com --providers ipinfo", Ok(cfg().providers(&[ProviderKind::IpInfo]).build()); "single provider")]
    #[test_case("geotrace example.com --providers ipapi,ip-api", Ok(cfg().providers(&[ProviderKind::IpApiCo, ProviderKind::IpApi]).build()); "reordered providers")]
    #[test_case("geotrace example.com --providers ipinfo,ipinfo", Err(anyhow!("duplicate geolocation providers: ipinfo")); "duplicate providers")]
    fn test_providers(cmd: &str, expected: anyhow::Result<GeotraceConfig>) {
        compare(parse_config(cmd), expected);
    }

    #[test]
    fn test_unknown_provider() {
        assert!(parse("geotrace example.com --providers maxmind").is_err());
    }

    #[test]
    fn test_empty_providers_in_file() {
        let cfg_file: ConfigFile = toml::from_str("[geoip]\nproviders = []\n").unwrap();
        let config = GeotraceConfig::build_config(parse("geotrace example.com").unwrap(), cfg_file);
        compare(
            config,
            Err(anyhow!("at least one geolocation provider is required")),
        );
    }

    #[test]
    fn test_custom_provider_url() {
        let cfg_file: ConfigFile = toml::from_str(
            "[geoip]\nproviders = [\"ipinfo\"]\nipinfo-url = \"http://localhost:8080/{addr}\"\n",
        )
        .unwrap();
        let config = GeotraceConfig::build_config(parse("geotrace example.com").unwrap(), cfg_file);
        let expected = GeotraceConfig {
            providers: vec![ProviderConfig::new(
                ProviderKind::IpInfo,
                "http://localhost:8080/{addr}",
            )],
            ..cfg().build()
        };
        compare(config, Ok(expected));
    }

    #[test]
    fn test_provider_url_without_placeholder() {
        let cfg_file: ConfigFile =
            toml::from_str("[geoip]\nip-api-url = \"http://localhost:8080/json\"\n").unwrap();
        let config = GeotraceConfig::build_config(parse("geotrace example.com").unwrap(), cfg_file);
        compare(
            config,
            Err(anyhow!(
                "ip-api-url (http://localhost:8080/json) must contain the {{addr}} placeholder"
            )),
        );
    }

    #[test]
    fn test_unused_provider_url_is_not_validated() {
        let cfg_file: ConfigFile =
            toml::from_str("[geoip]\nip-api-url = \"http://localhost:8080/json\"\n").unwrap();
        let config = GeotraceConfig::build_config(
            parse("geotrace example.com --providers ipinfo").unwrap(),
            cfg_file,
        );
        compare(config, Ok(cfg().providers(&[ProviderKind::IpInfo]).build()));
    }

    #[test_case("geotrace example.com --no-origin", Ok(cfg().origin_lookup(false).build()); "no origin")]
    fn test_origin(cmd: &str, expected: anyhow::Result<GeotraceConfig>) {
        compare(parse_config(cmd), expected);
    }

    #[test]
    fn test_origin_from_file() {
        let cfg_file: ConfigFile = toml::from_str("[geotrace]\norigin-lookup = false\n").unwrap();
        let config = GeotraceConfig::build_config(parse("geotrace example.com").unwrap(), cfg_file);
        compare(config, Ok(cfg().origin_lookup(false).build()));
    }

    #[test_case("geotrace example.com -e json", Ok(cfg().export_format(ExportFormat::Json).build()); "json export")]
    #[test_case("geotrace example.com --export-format csv", Ok(cfg().export_format(ExportFormat::Csv).build()); "csv export")]
    #[test_case("geotrace example.com -o route.html", Ok(cfg().output_file("route.html").build()); "custom output")]
    #[test_case("geotrace example.com -o route.json", Ok(cfg().output_file("route.json").build()); "json output without json export")]
    #[test_case("geotrace example.com -e json -o route.json", Err(anyhow!("output file (route.json) must not have the `.json` extension of the json export")); "json export replacing map")]
    #[test_case("geotrace example.com -e csv -o out/route.csv", Err(anyhow!("output file (out/route.csv) must not have the `.csv` extension of the csv export")); "csv export replacing map")]
    #[test_case("geotrace example.com -e csv -o route.json", Ok(cfg().export_format(ExportFormat::Csv).output_file("route.json").build()); "csv export beside json named map")]
    fn test_export(cmd: &str, expected: anyhow::Result<GeotraceConfig>) {
        compare(parse_config(cmd), expected);
    }

    #[test]
    fn test_blank_target() {
        let cfg_file: ConfigFile = toml::from_str("[geotrace]\ntarget = \"  \"\n").unwrap();
        let config = GeotraceConfig::build_config(parse("geotrace").unwrap(), cfg_file);
        compare(config, Err(anyhow!("target must not be blank")));
    }

    #[test]
    fn test_blank_output_file() {
        let cfg_file: ConfigFile = toml::from_str("[geotrace]\noutput-file = \" \"\n").unwrap();
        let config = GeotraceConfig::build_config(parse("geotrace example.com").unwrap(), cfg_file);
        compare(config, Err(anyhow!("output file must not be blank")));
    }

    #[test_case("geotrace example.com -v", Ok(cfg().verbose(true).build()); "verbose")]
    #[test_case("geotrace example.com -v --log-format json", Ok(cfg().verbose(true).log_format(LogFormat::Json).build()); "json log format")]
    #[test_case("geotrace example.com --log-filter geotrace_geoip=trace", Ok(cfg().log_filter("geotrace_geoip=trace").build()); "custom log filter")]
    #[test_case("geotrace example.com --log-span-events full", Ok(cfg().log_span_events(LogSpanEvents::Full).build()); "full span events")]
    fn test_logging(cmd: &str, expected: anyhow::Result<GeotraceConfig>) {
        compare(parse_config(cmd), expected);
    }

    #[test]
    fn test_cli_overrides_file() {
        let cfg_file: ConfigFile = toml::from_str(
            "[geotrace]\ntarget = \"github.com\"\n[geoip]\nmax-workers = 3\nparallel = true\n",
        )
        .unwrap();
        let config =
            GeotraceConfig::build_config(parse("geotrace example.com -w 10").unwrap(), cfg_file);
        compare(config, Ok(cfg().parallel(true).max_workers(10).build()));
    }

    #[test_case("geotrace --print-config-template", GeotraceAction::PrintConfigTemplate; "config template")]
    #[test_case("geotrace --generate bash", GeotraceAction::PrintShellCompletions(Shell::Bash); "bash completions")]
    #[test_case("geotrace --generate-man", GeotraceAction::PrintManPage; "man page")]
    fn test_action(cmd: &str, expected: GeotraceAction) {
        let action = GeotraceAction::from(parse(cmd).unwrap()).unwrap();
        assert_eq!(expected, action);
    }

    fn parse_config(cmd: &str) -> anyhow::Result<GeotraceConfig> {
        GeotraceConfig::build_config(parse(cmd)?, ConfigFile::default())
    }

    fn parse(cmd: &str) -> anyhow::Result<Args> {
        use clap::Parser;
        Ok(Args::try_parse_from(
            cmd.split(' ').map(std::ffi::OsString::from),
        )?)
    }

    fn compare<T>(actual: anyhow::Result<T>, expected: anyhow::Result<T>)
    where
        T: PartialEq + Eq + std::fmt::Debug,
    {
        match (actual, expected) {
            (Ok(cfg), Ok(exp)) => {
                pretty_assertions::assert_eq!(cfg, exp);
            }
            (Err(err), Err(exp_err)) => {
                pretty_assertions::assert_eq!(
                    err.to_string().trim(),
                    exp_err.to_string().trim()
                );
            }
            (Ok(_), Err(exp_err)) => {
                panic!("expected err {}", exp_err.to_string().trim());
            }
            (Err(err), Ok(_)) => {
                panic!("unexpected err {}", err.to_string().trim());
            }
        }
    }

    fn cfg() -> GeotraceConfigBuilder {
        GeotraceConfigBuilder::new("example.com")
    }

    pub struct GeotraceConfigBuilder {
        config: GeotraceConfig,
    }

    impl GeotraceConfigBuilder {
        pub fn new(target: &str) -> Self {
            Self {
                config: GeotraceConfig {
                    target: String::from(target),
                    ..GeotraceConfig::default()
                },
            }
        }

        pub fn target(self, target: &str) -> Self {
            Self {
                config: GeotraceConfig {
                    target: String::from(target),
                    ..self.config
                },
            }
        }

        pub fn trace_command(self, trace_command: TraceCommand) -> Self {
            Self {
                config: GeotraceConfig {
                    trace_command,
                    ..self.config
                },
            }
        }

        pub fn trace_timeout(self, trace_timeout: Duration) -> Self {
            Self {
                config: GeotraceConfig {
                    trace_timeout,
                    ..self.config
                },
            }
        }

        pub fn providers(self, providers: &[ProviderKind]) -> Self {
            Self {
                config: GeotraceConfig {
                    providers: providers
                        .iter()
                        .copied()
                        .map(ProviderConfig::from)
                        .collect(),
                    ..self.config
                },
            }
        }

        pub fn provider_timeout(self, provider_timeout: Duration) -> Self {
            Self {
                config: GeotraceConfig {
                    provider_timeout,
                    ..self.config
                },
            }
        }

        pub fn rate_limit_delay(self, rate_limit_delay: Duration) -> Self {
            Self {
                config: GeotraceConfig {
                    rate_limit_delay,
                    ..self.config
                },
            }
        }

        pub fn parallel(self, parallel: bool) -> Self {
            Self {
                config: GeotraceConfig {
                    parallel,
                    ..self.config
                },
            }
        }

        pub fn max_workers(self, max_workers: usize) -> Self {
            Self {
                config: GeotraceConfig {
                    max_workers,
                    ..self.config
                },
            }
        }

        pub fn origin_lookup(self, origin_lookup: bool) -> Self {
            Self {
                config: GeotraceConfig {
                    origin_lookup,
                    ..self.config
                },
            }
        }

        pub fn export_format(self, export_format: ExportFormat) -> Self {
            Self {
                config: GeotraceConfig {
                    export_format,
                    ..self.config
                },
            }
        }

        pub fn output_file(self, output_file: &str) -> Self {
            Self {
                config: GeotraceConfig {
                    output_file: String::from(output_file),
                    ..self.config
                },
            }
        }

        pub fn verbose(self, verbose: bool) -> Self {
            Self {
                config: GeotraceConfig {
                    verbose,
                    ..self.config
                },
            }
        }

        pub fn log_format(self, log_format: LogFormat) -> Self {
            Self {
                config: GeotraceConfig {
                    log_format,
                    ..self.config
                },
            }
        }

        pub fn log_filter(self, log_filter: &str) -> Self {
            Self {
                config: GeotraceConfig {
                    log_filter: String::from(log_filter),
                    ..self.config
                },
            }
        }

        pub fn log_span_events(self, log_span_events: LogSpanEvents) -> Self {
            Self {
                config: GeotraceConfig {
                    log_span_events,
                    ..self.config
                },
            }
        }

        pub fn build(self) -> GeotraceConfig {
            self.config
        }
    }
}
