//! Raw byte-level operators applied to a serialized transaction.
//!
//! Every operator works in place on the buffer and knows nothing about the
//! transaction layout, only its length.

use serde::Serialize;

use crate::rng::RandomSource;
use crate::FuzzError;

/// What a byte operator did to the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RawMutation {
    ToggleBit { offset: usize, bit: u8 },
    ChangeByte { offset: usize, delta: u8 },
    Insert { offset: usize, len: usize },
    Erase { offset: usize, len: usize },
}

/// Flip one bit of one byte.
pub fn toggle_bit(rng: &mut RandomSource, buf: &mut [u8]) -> Result<RawMutation, FuzzError> {
    if buf.is_empty() {
        return Err(FuzzError::EmptyBuffer);
    }
    let offset = rng.uniform(buf.len())?;
    let bit = rng.uniform(8)? as u8;
    buf[offset] ^= 1 << bit;
    Ok(RawMutation::ToggleBit { offset, bit })
}

/// XOR one byte with a non-zero delta, so it always changes.
pub fn change_byte(rng: &mut RandomSource, buf: &mut [u8]) -> Result<RawMutation, FuzzError> {
    if buf.is_empty() {
        return Err(FuzzError::EmptyBuffer);
    }
    let offset = rng.uniform(buf.len())?;
    let delta = (rng.uniform(255)? + 1) as u8;
    buf[offset] ^= delta;
    Ok(RawMutation::ChangeByte { offset, delta })
}

/// Splice `n` random bytes in before a random existing byte.
pub fn insert_bytes(
    rng: &mut RandomSource,
    buf: &mut Vec<u8>,
    n: usize,
) -> Result<RawMutation, FuzzError> {
    if buf.is_empty() {
        return Err(FuzzError::EmptyBuffer);
    }
    let bytes = rng.random_bytes(n);
    let offset = rng.uniform(buf.len())?;
    buf.splice(offset..offset, bytes);
    Ok(RawMutation::Insert { offset, len: n })
}

/// Remove `min(n, len)` contiguous bytes.
///
/// When the whole buffer is erased the offset is 0 and no draw is taken.
pub fn erase_bytes(
    rng: &mut RandomSource,
    buf: &mut Vec<u8>,
    n: usize,
) -> Result<RawMutation, FuzzError> {
    if buf.is_empty() {
        return Err(FuzzError::EmptyBuffer);
    }
    let len = n.min(buf.len());
    let span = buf.len() - len;
    let offset = if span == 0 { 0 } else { rng.uniform(span)? };
    buf.drain(offset..offset + len);
    Ok(RawMutation::Erase { offset, len })
}
