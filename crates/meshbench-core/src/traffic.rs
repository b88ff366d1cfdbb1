//! Synthetic traffic stream.
//!
//! A stream is a fixed-rate unicast flow from one node to another: the
//! whole send schedule is computed up front and placed on the timeline,
//! and the final report is scheduled a safety margin after the last send
//! so in-flight packets can land before the ledger is folded.

use serde::{Deserialize, Serialize};

use crate::time::{SimDuration, SimTime};

/// Fixed-rate stream between two nodes, by population index.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StreamConfig {
    pub source: usize,
    pub destination: usize,
    /// First dispatch instant.
    pub start: SimTime,
    /// Gap between consecutive dispatches.
    pub interval: SimDuration,
    /// Total number of payloads.
    pub count: u32,
    pub payload_len: usize,
    /// How long after the last send the report waits for stragglers.
    pub report_margin: SimDuration,
}

impl StreamConfig {
    pub fn new(source: usize, destination: usize) -> Self {
        StreamConfig {
            source,
            destination,
            start: SimTime::from_secs(12),
            interval: SimDuration::from_millis(500),
            count: 200,
            payload_len: 5,
            report_margin: SimDuration::from_secs(10),
        }
    }

    /// Dispatch instant of payload `index` (zero-based).
    pub fn send_time(&self, index: u32) -> SimTime {
        self.start + self.interval * index
    }

    pub fn last_send(&self) -> SimTime {
        if self.count == 0 {
            self.start
        } else {
            self.send_time(self.count - 1)
        }
    }

    /// When the accounting ledger is folded into the report.
    pub fn report_time(&self) -> SimTime {
        self.start + self.interval * self.count + self.report_margin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_schedule_is_evenly_spaced() {
        let cfg = StreamConfig::new(4, 6);
        assert_eq!(cfg.send_time(0), SimTime::from_secs(12));
        assert_eq!(cfg.send_time(1), SimTime::from_millis(12_500));
        assert_eq!(cfg.last_send(), SimTime::from_millis(12_000 + 199 * 500));
    }

    #[test]
    fn report_waits_for_stragglers() {
        let cfg = StreamConfig::new(4, 6);
        // 12s start + 200 * 0.5s + 10s margin.
        assert_eq!(cfg.report_time(), SimTime::from_secs(122));
        assert!(cfg.report_time() > cfg.last_send());
    }

    #[test]
    fn empty_stream_still_reports() {
        let mut cfg = StreamConfig::new(0, 1);
        cfg.count = 0;
        assert_eq!(cfg.last_send(), cfg.start);
        assert_eq!(cfg.report_time(), cfg.start + cfg.report_margin);
    }
}
