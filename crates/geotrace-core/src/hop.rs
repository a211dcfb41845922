use std::net::IpAddr;
use std::time::Duration;

/// A single hop reported by the trace command.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Hop {
    index: u8,
    addr: Option<IpAddr>,
    hostname: Option<String>,
    rtts: Vec<Duration>,
}

impl Hop {
    #[must_use]
    pub const fn new(
        index: u8,
        addr: Option<IpAddr>,
        hostname: Option<String>,
        rtts: Vec<Duration>,
    ) -> Self {
        Self {
            index,
            addr,
            hostname,
            rtts,
        }
    }

    /// A hop for which every probe timed out.
    #[must_use]
    pub const fn unresolved(index: u8) -> Self {
        Self::new(index, None, None, Vec::new())
    }

    /// The 1-based position of the hop in the route.
    #[must_use]
    pub const fn index(&self) -> u8 {
        self.index
    }

    /// The address which responded, `None` if every probe timed out.
    #[must_use]
    pub const fn addr(&self) -> Option<IpAddr> {
        self.addr
    }

    #[must_use]
    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    /// The round trip time of each probe which received a response.
    #[must_use]
    pub fn rtts(&self) -> &[Duration] {
        &self.rtts
    }

    /// The mean round trip time in milliseconds.
    #[must_use]
    pub fn avg_ms(&self) -> Option<f64> {
        if self.rtts.is_empty() {
            None
        } else {
            let total: f64 = self.rtts.iter().map(|rtt| rtt.as_secs_f64() * 1000_f64).sum();
            Some(total / self.rtts.len() as f64)
        }
    }
}

/// The parsed output of a trace.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TraceOutput {
    /// The target address, as reported by the trace header.
    pub target_addr: Option<IpAddr>,
    /// The hops in route order.
    pub hops: Vec<Hop>,
}
