//! Length-delimited frame reassembly over one observed byte stream.
//!
//! Capture is lossy and unordered; there is no sequence tracking and no
//! retransmission handling. When the length prefix at the current offset
//! is implausible the walk advances exactly one byte and tries again,
//! which relocks onto the next genuine frame boundary after truncated or
//! interleaved stretches.

use crate::protocols::envelope::layout::MIN_FRAME_LEN;

const SIZE_PREFIX_LEN: usize = 4;

/// Per-flow byte accumulator.
#[derive(Debug, Default)]
pub(crate) struct FrameBuffer {
    buf: Vec<u8>,
}

/// Result of one drain pass.
#[derive(Debug, Default)]
pub(crate) struct DrainOutcome {
    pub frames: Vec<Vec<u8>>,
    /// Bytes discarded by the one-byte resynchronization walk.
    pub skipped_bytes: u64,
}

impl FrameBuffer {
    pub(crate) fn push(&mut self, payload: &[u8]) {
        self.buf.extend_from_slice(payload);
    }

    pub(crate) fn len(&self) -> usize {
        self.buf.len()
    }

    /// Emits every complete frame currently in the buffer and retains the
    /// unconsumed tail. Consumed offset always equals the sum of emitted
    /// frame sizes plus skipped bytes; no byte lands in two frames.
    pub(crate) fn drain_frames(&mut self, max_frame: usize) -> DrainOutcome {
        let mut outcome = DrainOutcome::default();
        let mut offset = 0usize;

        loop {
            let remaining = self.buf.len() - offset;
            if remaining < SIZE_PREFIX_LEN {
                break;
            }
            let size = u32::from_be_bytes([
                self.buf[offset],
                self.buf[offset + 1],
                self.buf[offset + 2],
                self.buf[offset + 3],
            ]);
            if size < MIN_FRAME_LEN || size as usize > max_frame {
                offset += 1;
                outcome.skipped_bytes += 1;
                continue;
            }
            if size as usize > remaining {
                break;
            }
            outcome
                .frames
                .push(self.buf[offset..offset + size as usize].to_vec());
            offset += size as usize;
        }

        self.buf.drain(..offset);
        outcome
    }
}
