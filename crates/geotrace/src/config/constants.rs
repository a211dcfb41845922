use crate::config::{ExportFormat, LogFormat, LogSpanEvents};
use std::time::Duration;

/// The default value for `export-format`.
pub const DEFAULT_EXPORT_FORMAT: ExportFormat = ExportFormat::Html;

/// The default value for `output-file`.
pub const DEFAULT_OUTPUT_FILE: &str = "coordinates_map.html";

/// The default value for `origin-lookup`.
pub const DEFAULT_ORIGIN_LOOKUP: bool = true;

/// The default value for `log-format`.
pub const DEFAULT_LOG_FORMAT: LogFormat = LogFormat::Pretty;

/// The default value for `log-span-events`.
pub const DEFAULT_LOG_SPAN_EVENTS: LogSpanEvents = LogSpanEvents::Off;

/// The default value for `log-filter`.
pub const DEFAULT_LOG_FILTER: &str = "geotrace=debug";

/// The maximum value for `timeout`.
pub const MAX_TRACE_TIMEOUT: Duration = Duration::from_secs(86_400);

/// The maximum value for `max-workers`.
pub const MAX_WORKERS: usize = 64;

/// Targets suggested when a trace fails.
pub const ALTERNATIVE_TARGETS: [&str; 5] = [
    "google.com",
    "github.com",
    "amazon.com",
    "microsoft.com",
    "apple.com",
];
