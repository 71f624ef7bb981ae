//! Row types for the feature dataset.
//!
//! A [`FeatureRecord`] is one sample of one gesture repetition: a timestamp,
//! a gesture label, and eight time-domain features per channel. The types
//! derive [`hdf5::H5Type`] so a session table is a single compound dataset
//! whose row layout is exactly one `u64`, one `u8`, and `8 * NUM_CHANNELS`
//! `f32` columns, matching what offline analysis tools expect.

use hdf5::H5Type;
use std::time::{SystemTime, UNIX_EPOCH};

/// Number of EMG channels in this deployment.
///
/// The column schema is process-wide and fixed per deployment; changing this
/// constant changes the row type of every table written afterwards.
pub const NUM_CHANNELS: usize = 2;

/// Feature values carried per channel per sample.
pub const FEATURES_PER_CHANNEL: usize = 8;

/// The eight time-domain features computed on-device for one channel.
///
/// Zero-crossing and Willison-amplitude counts are integral on the wire but
/// stored as `f32` alongside the other features.
#[derive(H5Type, Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct ChannelFeatures {
    /// Mean absolute value.
    pub mav: f32,
    /// Root mean square.
    pub rms: f32,
    /// Waveform length.
    pub wl: f32,
    /// Zero-crossing count.
    pub zc: f32,
    /// Willison-amplitude count.
    pub wa: f32,
    /// Hjorth activity.
    pub hj_activity: f32,
    /// Hjorth mobility.
    pub hj_mobility: f32,
    /// Hjorth complexity.
    pub hj_complexity: f32,
}

/// One complete multi-channel sample for one gesture repetition.
///
/// A record is only complete once every channel `0..NUM_CHANNELS` has
/// contributed its features under the same timestamp and label; the
/// assembler enforces that before a record is ever handed to the store.
#[derive(H5Type, Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct FeatureRecord {
    /// Wall-clock nanoseconds, captured when channel 0 of the record arrived.
    pub timestamp: u64,
    /// Gesture class, 0-indexed against the configured gesture name table.
    pub label: u8,
    /// Per-channel feature slots, index = channel.
    pub channels: [ChannelFeatures; NUM_CHANNELS],
}

/// Current wall-clock time as nanoseconds since the Unix epoch.
///
/// A clock before the epoch yields 0 rather than a panic; timestamps are
/// diagnostic, not load-bearing.
pub fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_row_width_matches_schema() {
        // 1 u64 + 1 u8 + 8 * NUM_CHANNELS f32, ignoring repr(C) padding.
        let payload = 8 + 1 + 4 * FEATURES_PER_CHANNEL * NUM_CHANNELS;
        assert!(std::mem::size_of::<FeatureRecord>() >= payload);
    }

    #[test]
    fn now_ns_is_monotone_enough() {
        let a = now_ns();
        let b = now_ns();
        assert!(b >= a);
    }
}
