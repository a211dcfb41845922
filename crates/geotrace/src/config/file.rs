use crate::config::{ExportFormat, LogFormat, LogSpanEvents, ProviderKindConfig};
use anyhow::Context;
use encoding_rs_io::DecodeReaderBytes;
use etcetera::BaseStrategy;
use geotrace_core::defaults;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Duration;

const DEFAULT_CONFIG_FILE: &str = "geotrace.toml";
const DEFAULT_HIDDEN_CONFIG_FILE: &str = ".geotrace.toml";

/// Read the config from the default location of user config for the platform.
///
/// Returns the parsed `Some(ConfigFile)` if the config file exists, `None` otherwise.
///
/// Geotrace will attempt to locate a `geotrace.toml` or `.geotrace.toml`
/// config file in one of the following locations:
///     - the current directory
///     - the user home directory
///     - the XDG config directory (Unix only): `$XDG_CONFIG_HOME` or `~/.config`
///     - the XDG app config directory (Unix only): `$XDG_CONFIG_HOME/geotrace` or `~/.config/geotrace`
///     - the Windows data directory (Windows only): `%APPDATA%`
///
/// Note that only the first config file found is used.
pub fn read_default_config_file() -> anyhow::Result<Option<ConfigFile>> {
    use etcetera::base_strategy as base;
    if let Some(file) = read_files("")? {
        Ok(Some(file))
    } else {
        let basedirs = base::choose_base_strategy()?;
        if let Some(file) = read_files(basedirs.home_dir())? {
            Ok(Some(file))
        } else if let Some(file) = read_files(basedirs.config_dir())? {
            Ok(Some(file))
        } else if let Some(file) = read_files(basedirs.config_dir().join("geotrace"))? {
            Ok(Some(file))
        } else {
            Ok(None)
        }
    }
}

/// Read the config from the given path.
pub fn read_config_file<P: AsRef<Path>>(path: P) -> anyhow::Result<ConfigFile> {
    let file = File::open(path.as_ref())
        .with_context(|| format!("config file not found: {}", path.as_ref().display()))?;
    let mut decoder = DecodeReaderBytes::new(BufReader::new(file));
    let mut dest = String::new();
    decoder.read_to_string(&mut dest)?;
    Ok(toml::from_str(&dest)?)
}

fn read_files<P: AsRef<Path>>(dir: P) -> anyhow::Result<Option<ConfigFile>> {
    if let Some(file) = read_file(dir.as_ref(), DEFAULT_CONFIG_FILE)? {
        Ok(Some(file))
    } else if let Some(file) = read_file(dir.as_ref(), DEFAULT_HIDDEN_CONFIG_FILE)? {
        Ok(Some(file))
    } else {
        Ok(None)
    }
}

fn read_file<P: AsRef<Path>>(dir: P, file: &str) -> anyhow::Result<Option<ConfigFile>> {
    let path = dir.as_ref().join(file);
    if path.exists() {
        Ok(Some(read_config_file(path)?))
    } else {
        Ok(None)
    }
}

#[derive(Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigFile {
    pub geotrace: Option<ConfigGeotrace>,
    pub trace: Option<ConfigTrace>,
    pub geoip: Option<ConfigGeoip>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            geotrace: Some(ConfigGeotrace::default()),
            trace: Some(ConfigTrace::default()),
            geoip: Some(ConfigGeoip::default()),
        }
    }
}

#[derive(Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigGeotrace {
    pub target: Option<String>,
    pub export_format: Option<ExportFormat>,
    pub output_file: Option<String>,
    pub origin_lookup: Option<bool>,
    pub log_format: Option<LogFormat>,
    pub log_filter: Option<String>,
    pub log_span_events: Option<LogSpanEvents>,
}

impl Default for ConfigGeotrace {
    fn default() -> Self {
        Self {
            target: Some(String::from(defaults::DEFAULT_TARGET)),
            export_format: Some(super::constants::DEFAULT_EXPORT_FORMAT),
            output_file: Some(String::from(super::constants::DEFAULT_OUTPUT_FILE)),
            origin_lookup: Some(super::constants::DEFAULT_ORIGIN_LOOKUP),
            log_format: Some(super::constants::DEFAULT_LOG_FORMAT),
            log_filter: Some(String::from(super::constants::DEFAULT_LOG_FILTER)),
            log_span_events: Some(super::constants::DEFAULT_LOG_SPAN_EVENTS),
        }
    }
}

/// The `trace-command` and `trace-args` default per platform and so are
/// left unset.
#[derive(Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigTrace {
    pub trace_command: Option<String>,
    pub trace_args: Option<Vec<String>>,
    #[serde(default)]
    #[serde(deserialize_with = "humantime_deser")]
    pub timeout: Option<Duration>,
}

impl Default for ConfigTrace {
    fn default() -> Self {
        Self {
            trace_command: None,
            trace_args: None,
            timeout: Some(defaults::DEFAULT_TRACE_TIMEOUT),
        }
    }
}

#[derive(Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigGeoip {
    pub providers: Option<Vec<ProviderKindConfig>>,
    #[serde(default)]
    #[serde(deserialize_with = "humantime_deser")]
    pub provider_timeout: Option<Duration>,
    #[serde(default)]
    #[serde(deserialize_with = "humantime_deser")]
    pub rate_limit_delay: Option<Duration>,
    pub parallel: Option<bool>,
    pub max_workers: Option<usize>,
    pub ip_api_url: Option<String>,
    pub ipinfo_url: Option<String>,
    pub ipapi_url: Option<String>,
}

impl Default for ConfigGeoip {
    fn default() -> Self {
        use geotrace_geoip::{defaults as geoip, ProviderKind};
        Self {
            providers: Some(
                geoip::DEFAULT_PROVIDERS
                    .into_iter()
                    .map(ProviderKindConfig::from)
                    .collect(),
            ),
            provider_timeout: Some(geoip::DEFAULT_PROVIDER_TIMEOUT),
            rate_limit_delay: Some(geoip::DEFAULT_RATE_LIMIT_DELAY),
            parallel: Some(defaults::DEFAULT_PARALLEL),
            max_workers: Some(defaults::DEFAULT_MAX_WORKERS),
            ip_api_url: Some(String::from(ProviderKind::IpApi.default_url())),
            ipinfo_url: Some(String::from(ProviderKind::IpInfo.default_url())),
            ipapi_url: Some(String::from(ProviderKind::IpApiCo.default_url())),
        }
    }
}

fn humantime_deser<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    humantime::parse_duration(&String::deserialize(deserializer)?)
        .map_err(serde::de::Error::custom)
        .map(Some)
}
