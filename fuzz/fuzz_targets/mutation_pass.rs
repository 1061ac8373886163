#![no_main]

use libfuzzer_sys::fuzz_target;
use txfuzz_core::{FuzzEngine, FuzzError, WireFormat};
use txfuzz_tx::Transaction;

// First 8 bytes are the seed, the rest a transaction in JSON.
fuzz_target!(|data: &[u8]| {
    if data.len() < 8 {
        return;
    }
    let (seed, json) = data.split_at(8);
    let seed = u64::from_le_bytes(seed.try_into().expect("8 bytes"));
    let Ok(tx) = Transaction::from_json_bytes(json) else {
        return;
    };
    let engine = FuzzEngine::new(WireFormat::Canonical);
    match engine.run(&tx, seed) {
        Ok(pass) => {
            assert_eq!(engine.fuzz(&tx, seed).ok(), Some(pass.bytes.clone()));
            let _ = Transaction::from_canonical_bytes_v2(&pass.bytes);
        }
        Err(FuzzError::EmptyTransaction) => assert!(tx.vin.is_empty()),
        Err(FuzzError::Codec(_)) => (),
        Err(e) => panic!("unexpected error: {e}"),
    }
});
