//! Upload progress delivery.
//!
//! The transport reports raw byte counts; [`ProgressReporter`] turns them into
//! percentages and guarantees that what reaches the caller is bounded to
//! `[0, 100]`, never decreases, and stops once the submission is closed.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub percent_complete: u8,
}

/// Caller-supplied progress sink. Invoked from the transport's I/O path.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

#[derive(Default)]
struct ReporterState {
    last_percent: Option<u8>,
    closed: bool,
}

/// Per-request progress channel.
pub struct ProgressReporter {
    total_bytes: u64,
    callback: Option<ProgressCallback>,
    state: Mutex<ReporterState>,
}

impl Debug for ProgressReporter {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ProgressReporter")
            .field("total_bytes", &self.total_bytes)
            .finish()
    }
}

impl ProgressReporter {
    pub fn new(total_bytes: u64, callback: ProgressCallback) -> Self {
        Self {
            total_bytes,
            callback: Some(callback),
            state: Mutex::new(ReporterState::default()),
        }
    }

    /// Reporter that tracks state but delivers nothing.
    pub fn silent(total_bytes: u64) -> Self {
        Self {
            total_bytes,
            callback: None,
            state: Mutex::new(ReporterState::default()),
        }
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// `round(sent * 100 / total)` clamped to 100. An empty body counts as complete.
    pub fn percent_for(&self, bytes_sent: u64) -> u8 {
        if self.total_bytes == 0 {
            return 100;
        }
        let percent = (bytes_sent as f64 * 100.0 / self.total_bytes as f64).round();
        percent.clamp(0.0, 100.0) as u8
    }

    /// Record a byte-count update from the network layer.
    ///
    /// Emits only when the percentage moves forward (the first update always
    /// emits). Returns the percent delivered, if any.
    pub fn bytes_sent(&self, bytes_sent: u64) -> Option<u8> {
        let percent = self.percent_for(bytes_sent);

        let Ok(mut state) = self.state.lock() else {
            return None;
        };
        if state.closed {
            return None;
        }
        if matches!(state.last_percent, Some(last) if percent <= last) {
            return None;
        }
        state.last_percent = Some(percent);

        // Delivered under the lock so concurrent updates stay ordered.
        if let Some(callback) = &self.callback {
            callback(ProgressEvent {
                percent_complete: percent,
            });
        }
        Some(percent)
    }

    /// Stop delivering events. Called when the submission reaches a terminal state.
    pub fn close(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.closed = true;
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().map(|s| s.closed).unwrap_or(true)
    }

    pub fn last_percent(&self) -> Option<u8> {
        self.state.lock().ok().and_then(|s| s.last_percent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording_reporter(total: u64) -> (ProgressReporter, Arc<Mutex<Vec<u8>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let reporter = ProgressReporter::new(
            total,
            Arc::new(move |event: ProgressEvent| {
                sink.lock().unwrap().push(event.percent_complete);
            }),
        );
        (reporter, seen)
    }

    #[test]
    fn test_percent_rounding() {
        let reporter = ProgressReporter::silent(3);
        assert_eq!(reporter.percent_for(0), 0);
        assert_eq!(reporter.percent_for(1), 33);
        assert_eq!(reporter.percent_for(2), 67);
        assert_eq!(reporter.percent_for(3), 100);
    }

    #[test]
    fn test_percent_clamped() {
        let reporter = ProgressReporter::silent(10);
        assert_eq!(reporter.percent_for(25), 100);
        assert_eq!(ProgressReporter::silent(0).percent_for(0), 100);
    }

    #[test]
    fn test_sequence_is_monotonic_and_bounded() {
        let total = 10_000u64;
        let (reporter, seen) = recording_reporter(total);

        let mut sent = 0u64;
        let steps = [0u64, 13, 400, 400, 1, 999, 2500, 0, 3333, 2354, 5000];
        for step in steps {
            sent = (sent + step).min(total);
            reporter.bytes_sent(sent);
        }

        let seen = seen.lock().unwrap();
        assert_eq!(seen.first(), Some(&0));
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert!(seen.iter().all(|p| *p <= 100));
    }

    #[test]
    fn test_out_of_order_counts_never_go_backwards() {
        let (reporter, seen) = recording_reporter(100);
        reporter.bytes_sent(60);
        reporter.bytes_sent(40);
        reporter.bytes_sent(80);
        assert_eq!(*seen.lock().unwrap(), vec![60, 80]);
        assert_eq!(reporter.last_percent(), Some(80));
    }

    #[test]
    fn test_no_events_after_close() {
        let (reporter, seen) = recording_reporter(100);
        reporter.bytes_sent(10);
        reporter.close();
        assert!(reporter.is_closed());
        assert_eq!(reporter.bytes_sent(90), None);
        assert_eq!(*seen.lock().unwrap(), vec![10]);
    }

    #[test]
    fn test_silent_reporter_tracks_progress() {
        let reporter = ProgressReporter::silent(4);
        assert_eq!(reporter.bytes_sent(2), Some(50));
        assert_eq!(reporter.last_percent(), Some(50));
    }
}
