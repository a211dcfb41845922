use crate::pipeline::{Pipeline, ResolveMode};
use crate::runner::{TraceCommand, TraceRunner};
use geotrace_geoip::Resolver;
use std::num::NonZeroUsize;
use std::time::Duration;

/// Default values for configuration.
pub mod defaults {
    use std::time::Duration;

    /// The default value for `target`.
    pub const DEFAULT_TARGET: &str = "google.com";

    /// The default value for `timeout`.
    pub const DEFAULT_TRACE_TIMEOUT: Duration = Duration::from_secs(30);

    /// The default value for `parallel`.
    pub const DEFAULT_PARALLEL: bool = false;

    /// The default value for `max-workers`.
    pub const DEFAULT_MAX_WORKERS: usize = 5;

    /// The default value for `trace-command`.
    #[cfg(not(windows))]
    pub const DEFAULT_TRACE_COMMAND: &str = "traceroute";

    /// The default value for `trace-args`.
    #[cfg(not(windows))]
    pub const DEFAULT_TRACE_ARGS: [&str; 7] = ["-w", "1", "-q", "1", "-n", "-m", "15"];

    /// The default value for `trace-command`.
    #[cfg(windows)]
    pub const DEFAULT_TRACE_COMMAND: &str = "tracert";

    /// The default value for `trace-args`.
    #[cfg(windows)]
    pub const DEFAULT_TRACE_ARGS: [&str; 5] = ["-d", "-h", "15", "-w", "1000"];
}

impl Default for TraceCommand {
    fn default() -> Self {
        Self::new(defaults::DEFAULT_TRACE_COMMAND, defaults::DEFAULT_TRACE_ARGS)
    }
}

/// Build a pipeline.
///
/// # Examples
///
/// ```no_run
/// # fn main() -> anyhow::Result<()> {
/// use geotrace_core::{Builder, ResolveMode};
/// use geotrace_geoip::GeoResolver;
/// use std::num::NonZeroUsize;
/// use std::time::Duration;
///
/// let resolver = GeoResolver::start(&geotrace_geoip::Config::default())?;
/// let pipeline = Builder::new()
///     .timeout(Duration::from_secs(60))
///     .resolve_mode(ResolveMode::Parallel(NonZeroUsize::new(4).unwrap()))
///     .build(resolver);
/// let route = pipeline.run("example.com")?;
/// println!("{} hops", route.summary().hop_count);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Builder {
    command: TraceCommand,
    timeout: Duration,
    resolve_mode: ResolveMode,
}

impl Builder {
    /// Create a new `Builder` with the platform trace command.
    #[must_use]
    pub fn new() -> Self {
        Self {
            command: TraceCommand::default(),
            timeout: defaults::DEFAULT_TRACE_TIMEOUT,
            resolve_mode: ResolveMode::Sequential,
        }
    }

    /// Set the trace command.
    #[must_use]
    pub fn trace_command(self, command: TraceCommand) -> Self {
        Self { command, ..self }
    }

    /// Set the maximum duration of the trace.
    #[must_use]
    pub fn timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }

    /// Set how hops are geolocated.
    #[must_use]
    pub fn resolve_mode(self, resolve_mode: ResolveMode) -> Self {
        Self {
            resolve_mode,
            ..self
        }
    }

    /// Geolocate hops on a pool of `workers` threads if `parallel` is set.
    #[must_use]
    pub fn parallel(self, parallel: bool, workers: NonZeroUsize) -> Self {
        let resolve_mode = if parallel {
            ResolveMode::Parallel(workers)
        } else {
            ResolveMode::Sequential
        };
        self.resolve_mode(resolve_mode)
    }

    /// Build the `Pipeline`.
    #[must_use]
    pub fn build<R: Resolver + Sync>(self, resolver: R) -> Pipeline<R> {
        Pipeline::new(
            TraceRunner::new(self.command, self.timeout),
            resolver,
            self.resolve_mode,
        )
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}
