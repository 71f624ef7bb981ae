//! Custom error types for the acquisition pipeline.
//!
//! This module defines the primary error type, `EmgError`, for the whole
//! crate. Every fault that can abort an acquisition run is an explicit
//! variant rather than a stringly-typed catch-all, so callers can match on
//! the failure and operators get an actionable message.
//!
//! None of these faults are retried: a fault unwinds the run, the store is
//! flushed and closed on the way out, and the error is reported. Records
//! already flushed for completed gestures remain valid.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias for results using the crate error type.
pub type AcqResult<T> = std::result::Result<T, EmgError>;

/// Fault taxonomy for the acquisition-and-storage pipeline.
#[derive(Error, Debug)]
pub enum EmgError {
    /// The dataset file exists but is not a readable HDF5 container.
    ///
    /// Remediation is operator deletion and re-creation; the store never
    /// attempts automatic repair.
    #[error("dataset '{}' exists but cannot be opened: {reason}. Delete the file and re-run to start a fresh dataset", path.display())]
    StoreUnreadable {
        /// Path of the unreadable dataset file.
        path: PathBuf,
        /// Underlying HDF5 failure.
        reason: String,
    },

    /// A table identifier collided during creation.
    ///
    /// `next_table_id` should make this impossible; hitting it indicates a
    /// logic error in identifier scanning and must not be renumbered away.
    #[error("table fset_{0} already exists in the dataset")]
    TableAlreadyExists(u32),

    /// The serial link could not be established.
    #[error("failed to open serial port '{port}': {source}")]
    LinkOpenFailed {
        /// Port identifier the open was attempted on.
        port: String,
        /// Driver-level open failure.
        #[source]
        source: serialport::Error,
    },

    /// A frame buffer did not match the frame size of the configured
    /// protocol variant.
    #[error("malformed frame: expected {expected} bytes, got {actual}")]
    MalformedFrame {
        /// Frame size of the active protocol variant.
        expected: usize,
        /// Length of the buffer handed to the codec.
        actual: usize,
    },

    /// The wire frame's channel index disagrees with the position expected
    /// by the assembler (Variant B only).
    #[error("channel misalignment: expected channel {expected}, device reported channel {received}")]
    ChannelMisalignment {
        /// Channel index the assembler expected next.
        expected: u16,
        /// Channel index carried by the decoded frame.
        received: u16,
    },

    /// The byte stream ended before a full frame was read.
    #[error("serial link closed mid-frame")]
    LinkClosed,

    /// Semantic configuration error (values parsed but are invalid).
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error from the link or filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other HDF5 failure (create, append, flush, read).
    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn misalignment_message_carries_both_indices() {
        let err = EmgError::ChannelMisalignment {
            expected: 0,
            received: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("expected channel 0"));
        assert!(msg.contains("reported channel 1"));
    }

    #[test]
    fn store_unreadable_names_the_file() {
        let err = EmgError::StoreUnreadable {
            path: PathBuf::from("Feature_Data.h5"),
            reason: "truncated superblock".into(),
        };
        assert!(err.to_string().contains("Feature_Data.h5"));
        assert!(err.to_string().contains("Delete the file"));
    }
}
