//! Wire protocol framing and decoding.
//!
//! The device sends one fixed-size binary frame per channel per sample. Two
//! firmware revisions are in the field and they frame differently:
//!
//! - **Variant A** packs the nine fields back to back, little-endian,
//!   30 bytes on the wire.
//! - **Variant B** emits the same field sequence laid out under C alignment
//!   rules, which insert two padding bytes after the leading `u16` for a
//!   32-byte frame. The decoder skips that padding explicitly.
//!
//! The variant is selected by configuration, never auto-detected; there is
//! no start-of-frame marker to resynchronize on, so the caller must read
//! exactly [`ProtocolVariant::frame_size`] bytes before decoding.

use crate::error::{AcqResult, EmgError};
use crate::record::ChannelFeatures;
use bytes::{Buf, BufMut};
use serde::Deserialize;

/// Firmware revision of the connected device, fixed per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolVariant {
    /// Packed 30-byte frames, even parity, hardware flow control. The frame's
    /// channel index field is not trustworthy and is never validated.
    A,
    /// Aligned 32-byte frames, no parity. The frame's channel index is
    /// validated against the expected position.
    B,
}

impl ProtocolVariant {
    /// Exact number of bytes to read from the link per channel frame.
    pub fn frame_size(self) -> usize {
        match self {
            ProtocolVariant::A => 30,
            ProtocolVariant::B => 32,
        }
    }

    /// Whether the assembler validates the frame's embedded channel index.
    ///
    /// Revision A firmware writes an index the host cannot trust, so only
    /// Variant B checks. The divergence is a per-variant policy inherited
    /// from the two firmware revisions, not something to unify.
    pub fn checks_channel_index(self) -> bool {
        matches!(self, ProtocolVariant::B)
    }
}

/// One decoded channel frame: the typed fragment of a record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelFrame {
    /// Channel index as reported by the device (trustworthy under B only).
    pub channel_index: u16,
    /// Mean absolute value.
    pub mav: f32,
    /// Root mean square.
    pub rms: f32,
    /// Waveform length.
    pub wl: f32,
    /// Zero-crossing count.
    pub zc: u16,
    /// Willison-amplitude count.
    pub wa: u16,
    /// Hjorth activity.
    pub hj_activity: f32,
    /// Hjorth mobility.
    pub hj_mobility: f32,
    /// Hjorth complexity.
    pub hj_complexity: f32,
}

impl ChannelFrame {
    /// Decode a full frame buffer for the given protocol variant.
    ///
    /// The buffer length must equal the variant's frame size exactly; a
    /// short buffer is the caller's problem (stream closed mid-frame is
    /// [`EmgError::LinkClosed`] upstream, not a decode error here).
    pub fn decode(variant: ProtocolVariant, buf: &[u8]) -> AcqResult<Self> {
        if buf.len() != variant.frame_size() {
            return Err(EmgError::MalformedFrame {
                expected: variant.frame_size(),
                actual: buf.len(),
            });
        }

        let mut buf = buf;
        let channel_index = buf.get_u16_le();
        if variant == ProtocolVariant::B {
            // Alignment padding between the u16 and the first f32.
            buf.advance(2);
        }
        Ok(Self {
            channel_index,
            mav: buf.get_f32_le(),
            rms: buf.get_f32_le(),
            wl: buf.get_f32_le(),
            zc: buf.get_u16_le(),
            wa: buf.get_u16_le(),
            hj_activity: buf.get_f32_le(),
            hj_mobility: buf.get_f32_le(),
            hj_complexity: buf.get_f32_le(),
        })
    }

    /// Encode this frame as the given variant would put it on the wire.
    ///
    /// Inverse of [`decode`](Self::decode); Variant B padding is zeroed.
    pub fn encode(&self, variant: ProtocolVariant) -> Vec<u8> {
        let mut out = Vec::with_capacity(variant.frame_size());
        out.put_u16_le(self.channel_index);
        if variant == ProtocolVariant::B {
            out.put_bytes(0, 2);
        }
        out.put_f32_le(self.mav);
        out.put_f32_le(self.rms);
        out.put_f32_le(self.wl);
        out.put_u16_le(self.zc);
        out.put_u16_le(self.wa);
        out.put_f32_le(self.hj_activity);
        out.put_f32_le(self.hj_mobility);
        out.put_f32_le(self.hj_complexity);
        out
    }

    /// The frame's feature values widened to the storage representation.
    pub fn features(&self) -> ChannelFeatures {
        ChannelFeatures {
            mav: self.mav,
            rms: self.rms,
            wl: self.wl,
            zc: f32::from(self.zc),
            wa: f32::from(self.wa),
            hj_activity: self.hj_activity,
            hj_mobility: self.hj_mobility,
            hj_complexity: self.hj_complexity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame(channel: u16) -> ChannelFrame {
        ChannelFrame {
            channel_index: channel,
            mav: 0.125,
            rms: 1.5,
            wl: -3.25,
            zc: 17,
            wa: 9,
            hj_activity: 0.5,
            hj_mobility: 2.0,
            hj_complexity: 4.75,
        }
    }

    #[test]
    fn variant_a_round_trips_byte_for_byte() {
        for channel in [0u16, 1, 7, u16::MAX] {
            let frame = sample_frame(channel);
            let wire = frame.encode(ProtocolVariant::A);
            assert_eq!(wire.len(), 30);
            let decoded = ChannelFrame::decode(ProtocolVariant::A, &wire).unwrap();
            assert_eq!(decoded, frame);
            assert_eq!(decoded.encode(ProtocolVariant::A), wire);
        }
    }

    #[test]
    fn variant_b_skips_alignment_padding() {
        let frame = sample_frame(1);
        let wire = frame.encode(ProtocolVariant::B);
        assert_eq!(wire.len(), 32);
        // Padding sits right after the leading u16.
        assert_eq!(&wire[2..4], &[0, 0]);
        let decoded = ChannelFrame::decode(ProtocolVariant::B, &wire).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn variants_agree_on_logical_fields() {
        let frame = sample_frame(0);
        let a = ChannelFrame::decode(ProtocolVariant::A, &frame.encode(ProtocolVariant::A)).unwrap();
        let b = ChannelFrame::decode(ProtocolVariant::B, &frame.encode(ProtocolVariant::B)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn wrong_length_is_malformed() {
        let frame = sample_frame(0);
        let wire = frame.encode(ProtocolVariant::A);
        // A 30-byte buffer is malformed under B, and vice versa.
        match ChannelFrame::decode(ProtocolVariant::B, &wire) {
            Err(EmgError::MalformedFrame {
                expected: 32,
                actual: 30,
            }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        match ChannelFrame::decode(ProtocolVariant::A, &wire[..29]) {
            Err(EmgError::MalformedFrame {
                expected: 30,
                actual: 29,
            }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn counts_widen_to_f32_in_features() {
        let features = sample_frame(0).features();
        assert_eq!(features.zc, 17.0);
        assert_eq!(features.wa, 9.0);
    }
}
