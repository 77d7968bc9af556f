//! Terminal-condition evaluation.

/// How a benchmark run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The configured amount of data was uploaded.
    Success,
    /// Average throughput sustained below the configured floor.
    Failure,
}

/// Evaluates the two exit conditions against the latest snapshot.
///
/// Both checks are suppressed until the bandwidth window has filled once;
/// judging a run on a half-empty window would fail it before the node had a
/// chance to ramp up. The throughput check always runs first.
#[derive(Debug, Clone, Copy)]
pub struct ExitPolicy {
    /// Bytes/second the window average must stay at or above.
    pub min_upload_rate: u64,
    /// Finished-bytes target; 0 disables the success condition entirely.
    pub success_threshold: u64,
}

impl ExitPolicy {
    pub fn check(&self, warmed_up: bool, average: u64, finished_bytes: u64) -> Option<Outcome> {
        if !warmed_up {
            return None;
        }
        if average < self.min_upload_rate {
            return Some(Outcome::Failure);
        }
        if self.success_threshold > 0 && finished_bytes >= self.success_threshold {
            return Some(Outcome::Success);
        }
        None
    }
}
