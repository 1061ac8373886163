//! One full mutation pass over a transaction.
//!
//! The pass is a pure function of (transaction, seed). The order of random
//! draws below is fixed: changing it changes the output for a given seed.

use txfuzz_tx::Transaction;

use crate::buffer::{change_byte, erase_bytes, insert_bytes, toggle_bit, RawMutation};
use crate::codec::{TxCodec, WireFormat};
use crate::rng::RandomSource;
use crate::script::{tweak_script, ScriptTweak};
use crate::FuzzError;

/// Odds (one in N) of a second script tweak.
pub const SECOND_TWEAK_ODDS: usize = 10;
/// Odds (one in N) of each raw byte operator firing.
pub const RAW_MUTATION_ODDS: usize = 10;
/// Exclusive bound for the biased length of a raw insertion.
pub const MAX_RAW_INSERT_LEN: usize = 500;

/// Result of a pass: the mutated bytes and what was done to produce them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationPass {
    pub seed: u64,
    pub script_tweaks: Vec<ScriptTweak>,
    pub raw_mutations: Vec<RawMutation>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct FuzzEngine<C = WireFormat> {
    codec: C,
}

impl<C: TxCodec> FuzzEngine<C> {
    pub fn new(codec: C) -> Self {
        Self { codec }
    }

    /// Mutated serialized bytes for `tx` under `seed`.
    pub fn fuzz(&self, tx: &Transaction, seed: u64) -> Result<Vec<u8>, FuzzError> {
        Ok(self.run(tx, seed)?.bytes)
    }

    /// Run one pass and keep the trace of applied mutations.
    pub fn run(&self, tx: &Transaction, seed: u64) -> Result<MutationPass, FuzzError> {
        let mut rng = RandomSource::new(seed);
        let mut tweaked = tx.clone();

        let mut script_tweaks = vec![tweak_script(&mut rng, &mut tweaked)?];
        if rng.one_in(SECOND_TWEAK_ODDS)? {
            script_tweaks.push(tweak_script(&mut rng, &mut tweaked)?);
        }

        let mut buf = self.codec.serialize(&tweaked)?;

        let mut raw_mutations = Vec::new();
        if rng.one_in(RAW_MUTATION_ODDS)? {
            raw_mutations.push(toggle_bit(&mut rng, &mut buf)?);
        }
        if rng.one_in(RAW_MUTATION_ODDS)? {
            raw_mutations.push(change_byte(&mut rng, &mut buf)?);
        }
        if rng.one_in(RAW_MUTATION_ODDS)? {
            let n = rng.biased_small(MAX_RAW_INSERT_LEN)?;
            raw_mutations.push(insert_bytes(&mut rng, &mut buf, n)?);
        }
        if rng.one_in(RAW_MUTATION_ODDS)? {
            let n = rng.uniform(buf.len())?;
            raw_mutations.push(erase_bytes(&mut rng, &mut buf, n)?);
        }

        log::trace!(
            "seed {seed}: {} script tweak(s), {} raw mutation(s), {} bytes",
            script_tweaks.len(),
            raw_mutations.len(),
            buf.len()
        );

        Ok(MutationPass {
            seed,
            script_tweaks,
            raw_mutations,
            bytes: buf,
        })
    }
}

/// Mutate `tx` with `seed` using the canonical binary encoding.
pub fn fuzz_transaction(tx: &Transaction, seed: u64) -> Result<Vec<u8>, FuzzError> {
    FuzzEngine::new(WireFormat::Canonical).fuzz(tx, seed)
}
