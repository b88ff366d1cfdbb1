//! Packet accounting and end-to-end latency statistics.
//!
//! Every application payload is tagged with a run-unique id before
//! dispatch. The accountant records the dispatch instant per id, matches
//! it at reception time, and folds the elapsed delay into the latency
//! sample set. Matching is exactly-once: a second reception of the same
//! id, or a reception the accountant never saw dispatched, is counted as
//! an orphan rather than a sample.

use std::collections::HashMap;
use std::fmt;

use tracing::warn;

use crate::time::{SimDuration, SimTime};

/// Run-unique packet identifier. Zero marks an untrackable packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PacketId(u32);

impl PacketId {
    pub const INVALID: PacketId = PacketId(0);

    pub fn from_u32(raw: u32) -> Self {
        PacketId(raw)
    }

    pub fn to_u32(self) -> u32 {
        self.0
    }

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl fmt::Display for PacketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An application payload carrying its tracking tag.
#[derive(Debug, Clone, Copy)]
pub struct TaggedPacket {
    pub id: PacketId,
    pub payload_len: usize,
}

/// Send/receive ledger for one measurement run.
#[derive(Debug, Default)]
pub struct PacketAccounting {
    next_id: u32,
    pending: HashMap<PacketId, SimTime>,
    delays: Vec<SimDuration>,
    sent: u64,
    received: u64,
    orphans: u64,
    untagged: u64,
}

impl PacketAccounting {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id in sequence. Ids start at 1; zero stays reserved for
    /// packets that lost their tag.
    pub fn allocate_id(&mut self) -> PacketId {
        self.next_id += 1;
        PacketId(self.next_id)
    }

    /// Record a dispatch. Each id must be recorded at most once.
    pub fn record_send(&mut self, id: PacketId, at: SimTime) {
        let prior = self.pending.insert(id, at);
        debug_assert!(prior.is_none(), "packet id {id} dispatched twice");
        self.sent += 1;
    }

    /// Record a reception and return the end-to-end delay if the id was
    /// outstanding. A missing id is an orphan: counted, logged, and
    /// excluded from the latency samples.
    pub fn record_receive(&mut self, id: PacketId, at: SimTime) -> Option<SimDuration> {
        match self.pending.remove(&id) {
            Some(dispatched) => {
                let delay = at.since(dispatched);
                self.delays.push(delay);
                self.received += 1;
                Some(delay)
            }
            None => {
                self.orphans += 1;
                warn!(%id, "reception without a matching dispatch record");
                None
            }
        }
    }

    /// Record a reception whose tag did not survive transit.
    pub fn record_untagged(&mut self) {
        self.untagged += 1;
    }

    pub fn sent(&self) -> u64 {
        self.sent
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    /// Packets dispatched but not yet (or never) received.
    pub fn outstanding(&self) -> usize {
        self.pending.len()
    }

    /// Fold the ledger into a report. Degenerate runs yield `None`
    /// fields rather than zeros, so "no data" stays distinct from
    /// "measured zero".
    pub fn compute(&self) -> TrafficReport {
        let pdr = if self.sent > 0 {
            Some(self.received as f64 / self.sent as f64)
        } else {
            None
        };

        let (avg, min, max, jitter) = if self.delays.is_empty() {
            (None, None, None, None)
        } else {
            let n = self.delays.len() as f64;
            let secs: Vec<f64> = self.delays.iter().map(|d| d.as_secs_f64()).collect();
            let mean = secs.iter().sum::<f64>() / n;
            let variance = secs.iter().map(|s| (s - mean) * (s - mean)).sum::<f64>() / n;
            let min = self.delays.iter().min().copied();
            let max = self.delays.iter().max().copied();
            (Some(SimDuration::from_secs_f64(mean)), min, max, Some(variance.sqrt()))
        };

        TrafficReport {
            sent: self.sent,
            received: self.received,
            pdr,
            avg_delay: avg,
            min_delay: min,
            max_delay: max,
            jitter_secs: jitter,
            samples: self.delays.len(),
            orphans: self.orphans,
            untagged: self.untagged,
        }
    }
}

/// Aggregate delivery and latency statistics for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficReport {
    pub sent: u64,
    pub received: u64,
    /// Received / sent, absent when nothing was sent.
    pub pdr: Option<f64>,
    pub avg_delay: Option<SimDuration>,
    pub min_delay: Option<SimDuration>,
    pub max_delay: Option<SimDuration>,
    /// Population standard deviation of the delay samples, in seconds.
    pub jitter_secs: Option<f64>,
    /// Number of latency samples behind the aggregates.
    pub samples: usize,
    pub orphans: u64,
    pub untagged: u64,
}

fn write_delay(f: &mut fmt::Formatter<'_>, label: &str, value: Option<SimDuration>) -> fmt::Result {
    match value {
        Some(d) => writeln!(f, "{label} {:.6} s", d.as_secs_f64()),
        None => writeln!(f, "{label} N/A"),
    }
}

impl fmt::Display for TrafficReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "-----------------------------------------")?;
        writeln!(f, "---        Simulation Results         ---")?;
        writeln!(f, "-----------------------------------------")?;
        writeln!(f, "Total Packets Sent:     {}", self.sent)?;
        writeln!(f, "Total Packets Received: {}", self.received)?;
        match self.pdr {
            Some(pdr) => writeln!(f, "Packet Delivery Ratio (PDR): {:.2} %", pdr * 100.0)?,
            None => writeln!(f, "Packet Delivery Ratio (PDR): N/A (no packets sent)")?,
        }
        writeln!(f, "--- Latency Metrics (End-to-End) ---")?;
        write_delay(f, "Average Delay:", self.avg_delay)?;
        write_delay(f, "Minimum Delay:", self.min_delay)?;
        write_delay(f, "Maximum Delay:", self.max_delay)?;
        match self.jitter_secs {
            Some(j) => writeln!(f, "Jitter (StdDev): {j:.6} s")?,
            None => writeln!(f, "Jitter (StdDev): N/A")?,
        }
        writeln!(f, "(Based on {} successfully received packets)", self.samples)?;
        if self.orphans > 0 || self.untagged > 0 {
            writeln!(f, "Anomalies: {} orphan, {} untagged receptions", self.orphans, self.untagged)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> SimDuration {
        SimDuration::from_millis(v)
    }

    #[test]
    fn ids_are_unique_and_nonzero() {
        let mut acc = PacketAccounting::new();
        let a = acc.allocate_id();
        let b = acc.allocate_id();
        assert_ne!(a, b);
        assert!(a.is_valid());
        assert_eq!(a, PacketId::from_u32(1));
    }

    #[test]
    fn delay_matches_dispatch_to_reception_gap() {
        let mut acc = PacketAccounting::new();
        let id = acc.allocate_id();
        acc.record_send(id, SimTime::from_secs(12));
        let delay = acc.record_receive(id, SimTime::from_secs(12) + ms(23));
        assert_eq!(delay, Some(ms(23)));
        assert_eq!(acc.outstanding(), 0);
    }

    #[test]
    fn second_reception_is_an_orphan() {
        let mut acc = PacketAccounting::new();
        let id = acc.allocate_id();
        acc.record_send(id, SimTime::from_secs(1));
        assert!(acc.record_receive(id, SimTime::from_secs(2)).is_some());
        assert!(acc.record_receive(id, SimTime::from_secs(3)).is_none());
        let report = acc.compute();
        assert_eq!(report.received, 1);
        assert_eq!(report.orphans, 1);
    }

    #[test]
    fn untagged_receptions_never_count_as_deliveries() {
        let mut acc = PacketAccounting::new();
        acc.record_untagged();
        acc.record_untagged();
        let report = acc.compute();
        assert_eq!(report.untagged, 2);
        assert_eq!(report.received, 0);
        assert_eq!(report.orphans, 0);
        assert!(report.to_string().contains("2 untagged"));
    }

    #[test]
    fn unknown_id_is_an_orphan() {
        let mut acc = PacketAccounting::new();
        assert!(acc.record_receive(PacketId::from_u32(77), SimTime::from_secs(1)).is_none());
        assert_eq!(acc.compute().orphans, 1);
    }

    #[test]
    fn lost_packets_shrink_pdr_but_not_samples() {
        let mut acc = PacketAccounting::new();
        for i in 0..5u64 {
            let id = acc.allocate_id();
            acc.record_send(id, SimTime::from_secs(i));
            if id.to_u32() != 3 {
                acc.record_receive(id, SimTime::from_secs(i) + ms(10));
            }
        }
        let report = acc.compute();
        assert_eq!(report.sent, 5);
        assert_eq!(report.received, 4);
        assert_eq!(report.samples, 4);
        assert!((report.pdr.unwrap() - 0.8).abs() < 1e-12);
        assert_eq!(acc.outstanding(), 1);
    }

    #[test]
    fn empty_run_reports_absent_statistics() {
        let report = PacketAccounting::new().compute();
        assert_eq!(report.sent, 0);
        assert!(report.pdr.is_none());
        assert!(report.avg_delay.is_none());
        assert!(report.jitter_secs.is_none());
        assert!(report.to_string().contains("N/A"));
    }

    #[test]
    fn jitter_is_population_stddev() {
        let mut acc = PacketAccounting::new();
        for delay_ms in [10u64, 20, 30] {
            let id = acc.allocate_id();
            acc.record_send(id, SimTime::ZERO);
            acc.record_receive(id, SimTime::ZERO + ms(delay_ms));
        }
        let report = acc.compute();
        assert_eq!(report.avg_delay, Some(ms(20)));
        assert_eq!(report.min_delay, Some(ms(10)));
        assert_eq!(report.max_delay, Some(ms(30)));
        // Population std dev of {10, 20, 30} ms.
        let expected = (2.0f64 / 3.0).sqrt() * 0.01;
        assert!((report.jitter_secs.unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn uniform_delays_have_zero_jitter() {
        let mut acc = PacketAccounting::new();
        for _ in 0..4 {
            let id = acc.allocate_id();
            acc.record_send(id, SimTime::ZERO);
            acc.record_receive(id, SimTime::ZERO + ms(6));
        }
        assert_eq!(acc.compute().jitter_secs, Some(0.0));
    }
}
