//! Per-frame Zstandard decompression.
//!
//! Frames are compressed independently, so this is plain block
//! decompression. Untrusted input: failures surface as errors to be
//! counted and dropped per frame, never panics, and the decompressed
//! size is capped so a hostile frame cannot balloon memory.

use super::error::EnvelopeError;

/// Decompresses one frame body, enforcing `cap` on the output size.
pub fn decompress(body: &[u8], cap: usize) -> Result<Vec<u8>, EnvelopeError> {
    let out = zstd::stream::decode_all(body).map_err(|err| EnvelopeError::Decompress {
        message: err.to_string(),
    })?;
    if out.len() > cap {
        return Err(EnvelopeError::DecompressedTooLarge {
            actual: out.len(),
            cap,
        });
    }
    Ok(out)
}
