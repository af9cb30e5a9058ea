//! Request deadlines.
//!
//! Video analysis time grows with file size much faster than upload time, so
//! video requests get a size-dependent deadline: a base allowance plus one term
//! per GiB and one per estimated hour of footage, capped. Images use a fixed
//! deadline since they are at most 20 MiB.

use std::time::Duration;

const MINUTE_MS: f64 = 60.0 * 1000.0;
const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Base allowance for every video request (30 minutes).
pub const VIDEO_BASE_TIMEOUT: Duration = Duration::from_secs(30 * 60);
/// Added per GiB of video (60 minutes).
pub const VIDEO_TIMEOUT_PER_GIB: Duration = Duration::from_secs(60 * 60);
/// Added per estimated hour of footage (30 minutes).
pub const VIDEO_TIMEOUT_PER_ESTIMATED_HOUR: Duration = Duration::from_secs(30 * 60);
/// Upper bound for any video deadline (2 hours).
pub const VIDEO_TIMEOUT_CAP: Duration = Duration::from_secs(2 * 60 * 60);
/// Rough footage density: 100 MiB per minute of HD video.
pub const MIB_PER_VIDEO_MINUTE: f64 = 100.0;
/// Fixed deadline for image requests (2 minutes).
pub const IMAGE_TIMEOUT: Duration = Duration::from_secs(2 * 60);

/// Tunable deadline constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeoutPolicy {
    pub video_base: Duration,
    pub video_per_gib: Duration,
    pub video_per_estimated_hour: Duration,
    pub video_cap: Duration,
    /// Heuristic, not a physical law; tune with product input.
    pub mib_per_video_minute: f64,
    pub image: Duration,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            video_base: VIDEO_BASE_TIMEOUT,
            video_per_gib: VIDEO_TIMEOUT_PER_GIB,
            video_per_estimated_hour: VIDEO_TIMEOUT_PER_ESTIMATED_HOUR,
            video_cap: VIDEO_TIMEOUT_CAP,
            mib_per_video_minute: MIB_PER_VIDEO_MINUTE,
            image: IMAGE_TIMEOUT,
        }
    }
}

impl TimeoutPolicy {
    /// Deadline in milliseconds for a video of `size_bytes`.
    pub fn video_timeout_ms(&self, size_bytes: u64) -> u64 {
        let size_mib = size_bytes as f64 / BYTES_PER_MIB;
        let estimated_hours = if self.mib_per_video_minute > 0.0 {
            (size_mib / self.mib_per_video_minute) / 60.0
        } else {
            0.0
        };

        let timeout_ms = self.video_base.as_millis() as f64
            + (size_mib / 1024.0) * self.video_per_gib.as_millis() as f64
            + estimated_hours * self.video_per_estimated_hour.as_millis() as f64;

        let cap_ms = self.video_cap.as_millis() as f64;
        timeout_ms.clamp(0.0, cap_ms).round() as u64
    }

    pub fn video_timeout(&self, size_bytes: u64) -> Duration {
        Duration::from_millis(self.video_timeout_ms(size_bytes))
    }

    pub fn image_timeout(&self) -> Duration {
        self.image
    }
}

/// Deadline in milliseconds for a video of `size_bytes` under the default policy.
pub fn estimate_timeout(size_bytes: u64) -> u64 {
    TimeoutPolicy::default().video_timeout_ms(size_bytes)
}

/// Whole minutes (rounded) of a deadline, as shown to users.
pub fn timeout_minutes(timeout: Duration) -> u64 {
    (timeout.as_millis() as f64 / MINUTE_MS).round() as u64
}
