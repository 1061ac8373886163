#![no_main]

use libfuzzer_sys::fuzz_target;
use txfuzz_tx::Transaction;

fuzz_target!(|data: &[u8]| {
    if let Ok(tx) = Transaction::from_canonical_bytes_v2(data) {
        let bytes = tx.canonical_bytes_v2().expect("decoded tx re-encodes");
        assert_eq!(bytes, data);
    }
});
