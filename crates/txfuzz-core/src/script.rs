use serde::Serialize;
use txfuzz_tx::Transaction;

use crate::rng::RandomSource;
use crate::FuzzError;

/// Upper bound (inclusive) on the number of bytes prepended by one tweak.
pub const MAX_SCRIPT_TWEAK_LEN: usize = 1000;
/// One tweak in this many uses raw bytes instead of opcode-range bytes.
pub const RAW_SCRIPT_ODDS: usize = 10;

/// What a single [`tweak_script`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScriptTweak {
    pub input: usize,
    pub len: usize,
    pub raw: bool,
}

/// Prepend a random byte run to the unlocking script of one input.
///
/// The run is 1..=1000 bytes, biased toward short. Nine times in ten the
/// bytes are drawn from the opcode range so the script still mostly parses
/// as instructions; otherwise they are unrestricted.
pub fn tweak_script(rng: &mut RandomSource, tx: &mut Transaction) -> Result<ScriptTweak, FuzzError> {
    if tx.vin.is_empty() {
        return Err(FuzzError::EmptyTransaction);
    }
    let input = rng.uniform(tx.vin.len())?;
    let len = rng.biased_small(MAX_SCRIPT_TWEAK_LEN)? + 1;
    let raw = rng.one_in(RAW_SCRIPT_ODDS)?;
    let bytes = if raw {
        rng.random_bytes(len)
    } else {
        rng.opcode_bytes(len)
    };
    tx.vin[input].prepend_script_sig(&bytes);
    Ok(ScriptTweak { input, len, raw })
}
