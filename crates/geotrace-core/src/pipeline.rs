use crate::error::Result;
use crate::hop::Hop;
use crate::route::{ResolvedHop, RouteResult};
use crate::runner::TraceRunner;
use crossbeam::channel::unbounded;
use geotrace_geoip::{Error as GeoError, Resolver};
use std::num::NonZeroUsize;
use std::thread;
use std::time::SystemTime;
use tracing::instrument;

/// How hops are geolocated.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ResolveMode {
    /// Geolocate one hop at a time in route order.
    Sequential,
    /// Geolocate hops on a fixed size pool of worker threads.
    Parallel(NonZeroUsize),
}

/// Traces a route and geolocates every hop.
///
/// A trace failure is fatal, a failure to locate an individual hop is
/// recorded against that hop and does not abort the run.
#[derive(Debug)]
pub struct Pipeline<R> {
    runner: TraceRunner,
    resolver: R,
    mode: ResolveMode,
}

impl<R: Resolver + Sync> Pipeline<R> {
    #[must_use]
    pub const fn new(runner: TraceRunner, resolver: R, mode: ResolveMode) -> Self {
        Self {
            runner,
            resolver,
            mode,
        }
    }

    #[must_use]
    pub const fn mode(&self) -> ResolveMode {
        self.mode
    }

    /// Trace the route to `target` and geolocate each hop.
    #[instrument(skip(self), level = "info")]
    pub fn run(&self, target: &str) -> Result<RouteResult> {
        let start_timestamp = SystemTime::now();
        let output = self.runner.run(target)?;
        tracing::info!(hops = output.hops.len(), mode = ?self.mode, "trace complete");
        let hops = self.resolve_hops(output.hops);
        Ok(RouteResult::new(
            target.to_string(),
            output.target_addr,
            hops,
            start_timestamp,
            SystemTime::now(),
        ))
    }

    /// Geolocate `hops`, returning them in the order given.
    #[must_use]
    pub fn resolve_hops(&self, hops: Vec<Hop>) -> Vec<ResolvedHop> {
        match self.mode {
            ResolveMode::Sequential => hops
                .into_iter()
                .map(|hop| resolve_hop(&self.resolver, hop))
                .collect(),
            ResolveMode::Parallel(workers) => self.resolve_parallel(hops, workers),
        }
    }

    /// Geolocate `hops` on a pool of `workers` threads.
    ///
    /// Each hop is tagged with its position so that the results can be
    /// restored to route order.  The pool never exceeds the number of hops.
    fn resolve_parallel(&self, hops: Vec<Hop>, workers: NonZeroUsize) -> Vec<ResolvedHop> {
        let hop_count = hops.len();
        let worker_count = workers.get().min(hop_count);
        let (job_tx, job_rx) = unbounded();
        let (result_tx, result_rx) = unbounded();
        for job in hops.into_iter().enumerate() {
            if job_tx.send(job).is_err() {
                break;
            }
        }
        drop(job_tx);
        tracing::debug!(worker_count, hop_count, "starting resolver workers");
        thread::scope(|scope| {
            for _ in 0..worker_count {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    for (position, hop) in job_rx {
                        let resolved = resolve_hop(&self.resolver, hop);
                        if result_tx.send((position, resolved)).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(result_tx);
        let mut resolved = result_rx.into_iter().collect::<Vec<_>>();
        resolved.sort_by_key(|(position, _)| *position);
        resolved.into_iter().map(|(_, hop)| hop).collect()
    }
}

fn resolve_hop<R: Resolver>(resolver: &R, hop: Hop) -> ResolvedHop {
    let Some(addr) = hop.addr() else {
        return ResolvedHop::unresolved(hop);
    };
    match resolver.resolve(addr) {
        Ok(location) => ResolvedHop::resolved(hop, location),
        Err(GeoError::NoLocationData(_)) => ResolvedHop::private_or_unroutable(hop),
        Err(err) => {
            tracing::debug!(index = hop.index(), %addr, %err, "hop unresolved");
            ResolvedHop::unresolved(hop)
        }
    }
}
