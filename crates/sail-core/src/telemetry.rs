// SPDX-License-Identifier: Apache-2.0
//! Performance monitor and LOD governor (§4.9, §4.8).
//!
//! The tick loop records per-phase timings into [`PerfHistogram`] every
//! tick; [`LodGovernor`] watches the running budget and degrades
//! distribution fidelity — never physics fidelity — after sustained
//! overruns (§4.8, §4.3 "degradation only ever affects distribution").

use std::time::Duration;

/// Wall-clock cost of each phase of one tick, in microseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickTiming {
    pub drain_us: u32,
    pub sim_us: u32,
    pub aoi_us: u32,
    pub encode_us: u32,
    pub send_us: u32,
    pub total_us: u32,
}

impl TickTiming {
    #[must_use]
    pub fn from_durations(
        drain: Duration,
        sim: Duration,
        aoi: Duration,
        encode: Duration,
        send: Duration,
    ) -> Self {
        let total = drain + sim + aoi + encode + send;
        TickTiming {
            drain_us: drain.as_micros() as u32,
            sim_us: sim.as_micros() as u32,
            aoi_us: aoi.as_micros() as u32,
            encode_us: encode.as_micros() as u32,
            send_us: send.as_micros() as u32,
            total_us: total.as_micros() as u32,
        }
    }
}

/// Fixed-capacity ring buffer of recent [`TickTiming`] samples.
#[derive(Debug)]
pub struct PerfHistogram {
    samples: Vec<TickTiming>,
    capacity: usize,
    cursor: usize,
    filled: usize,
}

impl PerfHistogram {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        PerfHistogram {
            samples: vec![TickTiming::default(); capacity.max(1)],
            capacity: capacity.max(1),
            cursor: 0,
            filled: 0,
        }
    }

    pub fn record(&mut self, timing: TickTiming) {
        self.samples[self.cursor] = timing;
        self.cursor = (self.cursor + 1) % self.capacity;
        self.filled = (self.filled + 1).min(self.capacity);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.filled
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    /// Mean total tick duration over the currently-filled samples, in
    /// microseconds. Zero when empty.
    #[must_use]
    pub fn mean_total_us(&self) -> u32 {
        if self.filled == 0 {
            return 0;
        }
        let sum: u64 = self.samples[..self.filled]
            .iter()
            .map(|t| u64::from(t.total_us))
            .sum();
        (sum / self.filled as u64) as u32
    }

    /// The currently-filled samples, oldest-to-newest is not
    /// guaranteed once the buffer has wrapped — callers that only need
    /// a representative recent window (diagnostic dumps) don't care.
    #[must_use]
    pub fn recent(&self) -> &[TickTiming] {
        &self.samples[..self.filled]
    }

    #[must_use]
    pub fn max_total_us(&self) -> u32 {
        self.samples[..self.filled]
            .iter()
            .map(|t| t.total_us)
            .max()
            .unwrap_or(0)
    }
}

/// Distribution-fidelity degradation level (§4.8). Ordered from best to
/// worst so `level > Normal` is a meaningful comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DegradationLevel {
    Normal,
    CoarseAoi,
    SkipLowTier,
}

/// Tracks consecutive tick-budget overruns and escalates/recovers the
/// degradation level (§4.8: three consecutive overruns trigger
/// degradation; the governor never touches simulation fidelity).
#[derive(Debug)]
pub struct LodGovernor {
    level: DegradationLevel,
    consecutive_overruns: u32,
    consecutive_within_budget: u32,
    overrun_threshold: u32,
    recovery_threshold: u32,
}

impl LodGovernor {
    #[must_use]
    pub fn new() -> Self {
        LodGovernor {
            level: DegradationLevel::Normal,
            consecutive_overruns: 0,
            consecutive_within_budget: 0,
            overrun_threshold: 3,
            recovery_threshold: 30,
        }
    }

    #[must_use]
    pub fn level(&self) -> DegradationLevel {
        self.level
    }

    /// Feeds one tick's outcome against `budget_us`. Three consecutive
    /// overruns step the level down one notch; a sustained run of
    /// in-budget ticks steps it back up.
    pub fn observe(&mut self, total_us: u32, budget_us: u32) {
        if total_us > budget_us {
            self.consecutive_overruns += 1;
            self.consecutive_within_budget = 0;
            if self.consecutive_overruns >= self.overrun_threshold {
                self.escalate();
                self.consecutive_overruns = 0;
            }
        } else {
            self.consecutive_within_budget += 1;
            self.consecutive_overruns = 0;
            if self.consecutive_within_budget >= self.recovery_threshold {
                self.recover();
                self.consecutive_within_budget = 0;
            }
        }
    }

    fn escalate(&mut self) {
        let next = match self.level {
            DegradationLevel::Normal => DegradationLevel::CoarseAoi,
            DegradationLevel::CoarseAoi | DegradationLevel::SkipLowTier => {
                DegradationLevel::SkipLowTier
            }
        };
        if next != self.level {
            tracing::warn!(?next, "tick budget exceeded repeatedly, degrading distribution fidelity");
        }
        self.level = next;
    }

    fn recover(&mut self) {
        let next = match self.level {
            DegradationLevel::SkipLowTier => DegradationLevel::CoarseAoi,
            DegradationLevel::CoarseAoi | DegradationLevel::Normal => DegradationLevel::Normal,
        };
        if next != self.level {
            tracing::info!(?next, "tick budget recovered, restoring distribution fidelity");
        }
        self.level = next;
    }
}

impl Default for LodGovernor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histogram_tracks_mean_and_max() {
        let mut hist = PerfHistogram::new(4);
        hist.record(TickTiming {
            total_us: 10,
            ..Default::default()
        });
        hist.record(TickTiming {
            total_us: 20,
            ..Default::default()
        });
        assert_eq!(hist.mean_total_us(), 15);
        assert_eq!(hist.max_total_us(), 20);
    }

    #[test]
    fn histogram_wraps_at_capacity() {
        let mut hist = PerfHistogram::new(2);
        for us in [10, 20, 30] {
            hist.record(TickTiming {
                total_us: us,
                ..Default::default()
            });
        }
        assert_eq!(hist.len(), 2);
    }

    #[test]
    fn three_consecutive_overruns_escalate_degradation() {
        let mut gov = LodGovernor::new();
        for _ in 0..3 {
            gov.observe(100, 50);
        }
        assert_eq!(gov.level(), DegradationLevel::CoarseAoi);
    }

    #[test]
    fn single_overrun_does_not_escalate() {
        let mut gov = LodGovernor::new();
        gov.observe(100, 50);
        assert_eq!(gov.level(), DegradationLevel::Normal);
    }

    #[test]
    fn sustained_recovery_restores_normal() {
        let mut gov = LodGovernor::new();
        for _ in 0..3 {
            gov.observe(100, 50);
        }
        assert_eq!(gov.level(), DegradationLevel::CoarseAoi);
        for _ in 0..30 {
            gov.observe(10, 50);
        }
        assert_eq!(gov.level(), DegradationLevel::Normal);
    }
}
