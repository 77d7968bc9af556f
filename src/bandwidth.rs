//! Sliding-window upload throughput tracking.

/// Fixed-size circular buffer of per-tick throughput samples (bytes/second).
///
/// One slot is written per measurement tick; after the cursor wraps once the
/// tracker is "warmed up" and the average covers a full measurement period.
/// Exit decisions must not be made before warm-up completes.
#[derive(Debug)]
pub struct BandwidthTracker {
    slots: Vec<u64>,
    /// Index of the most recently written slot.
    cursor: usize,
    /// Slots written so far, capped at the window size.
    filled: usize,
    warmed_up: bool,
    prev_total: Option<u64>,
    interval_secs: u64,
}

impl BandwidthTracker {
    /// `period_secs` must be a non-zero multiple of `interval_secs`; config
    /// validation enforces that before a tracker is ever built.
    pub fn new(interval_secs: u64, period_secs: u64) -> Self {
        let window = (period_secs / interval_secs).max(1) as usize;
        Self {
            slots: vec![0; window],
            cursor: 0,
            filled: 0,
            warmed_up: false,
            prev_total: None,
            interval_secs,
        }
    }

    /// Record one tick's total contract size and return the throughput delta
    /// written to the buffer (bytes/second).
    ///
    /// The first-ever sample has no baseline and records 0. A sample lower
    /// than the previous one (the node momentarily reporting less data)
    /// clamps to 0 rather than going negative.
    pub fn record(&mut self, current_total: u64) -> u64 {
        if self.filled == 0 {
            self.cursor = 0;
        } else {
            self.cursor += 1;
            if self.cursor == self.slots.len() {
                self.cursor = 0;
                self.warmed_up = true;
            }
        }
        if self.filled < self.slots.len() {
            self.filled += 1;
        }

        let delta = match self.prev_total {
            Some(prev) => current_total.saturating_sub(prev) / self.interval_secs,
            None => 0,
        };
        self.slots[self.cursor] = delta;
        self.prev_total = Some(current_total);
        delta
    }

    /// Moving average over the filled portion of the window, or the whole
    /// window once warmed up.
    pub fn average(&self) -> u64 {
        if self.filled == 0 {
            return 0;
        }
        let sum: u64 = self.slots.iter().sum();
        if self.warmed_up {
            sum / self.slots.len() as u64
        } else {
            sum / self.filled as u64
        }
    }

    pub fn warmed_up(&self) -> bool {
        self.warmed_up
    }

    pub fn window_size(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_records_zero() {
        let mut tracker = BandwidthTracker::new(60, 7200);
        assert_eq!(tracker.record(5_000_000), 0);
        assert_eq!(tracker.average(), 0);
        assert!(!tracker.warmed_up());
    }

    #[test]
    fn deltas_never_go_negative() {
        let mut tracker = BandwidthTracker::new(10, 100);
        tracker.record(1_000_000);
        assert_eq!(tracker.record(400_000), 0);
        assert_eq!(tracker.record(500_000), 10_000);
    }

    #[test]
    fn warmup_average_divides_by_filled_slots() {
        // 4-slot window: samples grow by 600/tick over 60s -> 10 B/s each.
        let mut tracker = BandwidthTracker::new(60, 240);
        tracker.record(0);
        tracker.record(600);
        tracker.record(1200);
        // Slots: [0, 10, 10] with one slot still unwritten.
        assert_eq!(tracker.average(), 20 / 3);
        assert!(!tracker.warmed_up());
    }

    #[test]
    fn wrap_flips_warmed_up_and_divides_by_window() {
        let mut tracker = BandwidthTracker::new(1, 3);
        tracker.record(0);
        tracker.record(30);
        tracker.record(60);
        assert!(!tracker.warmed_up());
        // Fourth sample wraps back onto slot 0.
        tracker.record(90);
        assert!(tracker.warmed_up());
        assert_eq!(tracker.average(), (30 + 30 + 30) / 3);
    }

    #[test]
    fn window_of_one_wraps_on_second_sample() {
        let mut tracker = BandwidthTracker::new(60, 60);
        tracker.record(0);
        assert!(!tracker.warmed_up());
        tracker.record(6000);
        assert!(tracker.warmed_up());
        assert_eq!(tracker.average(), 100);
    }

    #[test]
    fn two_hour_window_scenario() {
        // interval=60s, period=7200s -> 120 slots.
        let mut tracker = BandwidthTracker::new(60, 7200);
        assert_eq!(tracker.window_size(), 120);

        // First tick: no baseline, slot 0 stays zero.
        assert_eq!(tracker.record(0), 0);
        // Second tick: 60 MB uploaded over 60s -> 1 MB/s.
        assert_eq!(tracker.record(60_000_000), 1_000_000);
        // Average over the 2 filled slots, not the whole window.
        assert_eq!(tracker.average(), 500_000);
    }
}
