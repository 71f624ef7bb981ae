//! Multi-channel record assembly.
//!
//! The wire delivers one frame per channel; a [`RecordAssembler`] collects
//! the frames of one sample in channel order and emits a complete
//! [`FeatureRecord`] once every channel has contributed. There is no
//! resynchronization: the per-channel loop has no start-of-frame marker, so
//! a misaligned channel is fatal to the run rather than something to scan
//! past.

use crate::error::{AcqResult, EmgError};
use crate::protocol::{ChannelFrame, ProtocolVariant};
use crate::record::{now_ns, FeatureRecord, NUM_CHANNELS};

/// Progress of the in-flight record after accepting a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordState {
    /// More channels are still outstanding for the current sample.
    InProgress,
    /// The last channel arrived; the record is complete and the assembler
    /// has reset for the next sample.
    Complete(FeatureRecord),
}

/// Assembles per-channel frames into complete feature records.
#[derive(Debug)]
pub struct RecordAssembler {
    variant: ProtocolVariant,
    pending: FeatureRecord,
}

impl RecordAssembler {
    /// Create an assembler for the configured protocol variant.
    pub fn new(variant: ProtocolVariant) -> Self {
        Self {
            variant,
            pending: FeatureRecord::default(),
        }
    }

    /// Accept the frame for `expected_channel` of the current sample.
    ///
    /// On channel 0 a fresh record starts: the timestamp is captured at the
    /// moment of receipt and `label` (the current gesture index) is pinned.
    /// Under Variant B the frame's own channel index must match
    /// `expected_channel`; a mismatch is [`EmgError::ChannelMisalignment`]
    /// and the in-progress record is discarded. Variant A performs no such
    /// check. On the last channel the completed record is returned and the
    /// assembler resets.
    pub fn accept(
        &mut self,
        expected_channel: usize,
        label: u8,
        frame: &ChannelFrame,
    ) -> AcqResult<RecordState> {
        debug_assert!(expected_channel < NUM_CHANNELS);

        if self.variant.checks_channel_index() && usize::from(frame.channel_index) != expected_channel
        {
            self.pending = FeatureRecord::default();
            return Err(EmgError::ChannelMisalignment {
                expected: expected_channel as u16,
                received: frame.channel_index,
            });
        }

        if expected_channel == 0 {
            self.pending = FeatureRecord {
                timestamp: now_ns(),
                label,
                ..FeatureRecord::default()
            };
        }
        self.pending.channels[expected_channel] = frame.features();

        if expected_channel == NUM_CHANNELS - 1 {
            let record = self.pending;
            self.pending = FeatureRecord::default();
            Ok(RecordState::Complete(record))
        } else {
            Ok(RecordState::InProgress)
        }
    }
}
