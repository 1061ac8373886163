//! txfuzz transaction library
//!
//! Transaction types, JSON (serde_json) helpers and the canonical binary
//! codec that mutated transactions are serialized with.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub mod script;

/// Maximum allowed script size in bytes (DoS mitigation)
pub const MAX_SCRIPT_SIZE: usize = 10_000;
/// Maximum allowed number of inputs or outputs in a transaction (temporary cap)
pub const MAX_TX_INOUTS: usize = 10_000;

/// Basic OutPoint identifying an output in a transaction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub txid: [u8; 32],
    pub vout: u32,
}

/// Transaction input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxIn {
    pub prevout: OutPoint,
    pub script_sig: Vec<u8>,
    pub sequence: u32,
}

impl TxIn {
    /// Insert `prefix` in front of the unlocking script, keeping the old bytes after it.
    pub fn prepend_script_sig(&mut self, prefix: &[u8]) {
        self.script_sig.splice(0..0, prefix.iter().copied());
    }
}

/// Transaction output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOut {
    pub value: u64,
    pub script_pubkey: Vec<u8>,
}

/// Transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: i32,
    pub vin: Vec<TxIn>,
    pub vout: Vec<TxOut>,
    pub lock_time: u32,
}

/// Errors for the transaction crate
#[derive(thiserror::Error, Debug)]
pub enum TxError {
    #[error("script too large: {0} bytes (max {1})")]
    TooLargeScript(usize, usize),
    #[error("too many inputs or outputs: {0} (max {1})")]
    TooManyInOut(usize, usize),
    #[error("truncated at offset {0}")]
    Truncated(usize),
    #[error("{0} trailing bytes after transaction")]
    TrailingBytes(usize),
    #[error("serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

impl Transaction {
    /// Validate transaction fields for v0.1 policy
    pub fn validate(&self) -> Result<(), TxError> {
        if self.vin.len() > MAX_TX_INOUTS {
            return Err(TxError::TooManyInOut(self.vin.len(), MAX_TX_INOUTS));
        }
        if self.vout.len() > MAX_TX_INOUTS {
            return Err(TxError::TooManyInOut(self.vout.len(), MAX_TX_INOUTS));
        }
        for input in &self.vin {
            if input.script_sig.len() > MAX_SCRIPT_SIZE {
                return Err(TxError::TooLargeScript(
                    input.script_sig.len(),
                    MAX_SCRIPT_SIZE,
                ));
            }
        }
        for output in &self.vout {
            if output.script_pubkey.len() > MAX_SCRIPT_SIZE {
                return Err(TxError::TooLargeScript(
                    output.script_pubkey.len(),
                    MAX_SCRIPT_SIZE,
                ));
            }
        }
        Ok(())
    }

    /// Serialize to JSON bytes
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, TxError> {
        serde_json::to_vec(self).map_err(TxError::from)
    }

    /// Deserialize from JSON bytes and run validation
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, TxError> {
        let tx: Transaction = serde_json::from_slice(bytes)?;
        tx.validate()?;
        Ok(tx)
    }

    /// Canonical bytes v2 (binary deterministic encoding)
    /// Layout (all integers little-endian):
    /// - version: i32
    /// - vin_count: u64
    /// - for each vin:
    ///   - prevout.txid (32 bytes)
    ///   - prevout.vout u32
    ///   - script_sig_len u64, script_sig bytes
    ///   - sequence u32
    /// - vout_count: u64
    /// - for each vout:
    ///   - value u64
    ///   - script_pubkey_len u64, script_pubkey bytes
    /// - lock_time u32
    pub fn canonical_bytes_v2(&self) -> Result<Vec<u8>, TxError> {
        // validation ensures script lengths and counts are within bounds
        self.validate()?;
        let mut out: Vec<u8> = Vec::with_capacity(self.encoded_len());
        out.extend(&self.version.to_le_bytes());
        out.extend(&(self.vin.len() as u64).to_le_bytes());
        for vin in &self.vin {
            out.extend(&vin.prevout.txid);
            out.extend(&vin.prevout.vout.to_le_bytes());
            out.extend(&(vin.script_sig.len() as u64).to_le_bytes());
            out.extend(&vin.script_sig);
            out.extend(&vin.sequence.to_le_bytes());
        }
        out.extend(&(self.vout.len() as u64).to_le_bytes());
        for vout in &self.vout {
            out.extend(&vout.value.to_le_bytes());
            out.extend(&(vout.script_pubkey.len() as u64).to_le_bytes());
            out.extend(&vout.script_pubkey);
        }
        out.extend(&self.lock_time.to_le_bytes());
        Ok(out)
    }

    /// Strict decoder for canonical bytes v2. Rejects short input, trailing
    /// bytes and counts or lengths above the policy caps before allocating.
    pub fn from_canonical_bytes_v2(bytes: &[u8]) -> Result<Self, TxError> {
        let mut r = Reader { bytes, pos: 0 };
        let version = i32::from_le_bytes(r.array()?);
        let vin_count = r.count(MAX_TX_INOUTS, TxError::TooManyInOut)?;
        let mut vin = Vec::with_capacity(vin_count);
        for _ in 0..vin_count {
            let txid = r.array()?;
            let vout = u32::from_le_bytes(r.array()?);
            let script_len = r.count(MAX_SCRIPT_SIZE, TxError::TooLargeScript)?;
            let script_sig = r.take(script_len)?.to_vec();
            let sequence = u32::from_le_bytes(r.array()?);
            vin.push(TxIn {
                prevout: OutPoint { txid, vout },
                script_sig,
                sequence,
            });
        }
        let vout_count = r.count(MAX_TX_INOUTS, TxError::TooManyInOut)?;
        let mut vout = Vec::with_capacity(vout_count);
        for _ in 0..vout_count {
            let value = u64::from_le_bytes(r.array()?);
            let script_len = r.count(MAX_SCRIPT_SIZE, TxError::TooLargeScript)?;
            let script_pubkey = r.take(script_len)?.to_vec();
            vout.push(TxOut {
                value,
                script_pubkey,
            });
        }
        let lock_time = u32::from_le_bytes(r.array()?);
        let rest = bytes.len() - r.pos;
        if rest != 0 {
            return Err(TxError::TrailingBytes(rest));
        }
        Ok(Transaction {
            version,
            vin,
            vout,
            lock_time,
        })
    }

    /// Length of the canonical v2 encoding, without encoding
    pub fn encoded_len(&self) -> usize {
        let vin: usize = self
            .vin
            .iter()
            .map(|i| 32 + 4 + 8 + i.script_sig.len() + 4)
            .sum();
        let vout: usize = self
            .vout
            .iter()
            .map(|o| 8 + 8 + o.script_pubkey.len())
            .sum();
        4 + 8 + vin + 8 + vout + 4
    }

    /// Compute txid as double-SHA256 of canonical bytes v2
    pub fn txid(&self) -> Result<[u8; 32], TxError> {
        let bytes = self.canonical_bytes_v2()?;
        Ok(hash256(&bytes))
    }
}

/// Double-SHA256 of arbitrary bytes
pub fn hash256(bytes: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(bytes);
    let second = Sha256::digest(first);
    let mut out = [0u8; 32];
    out.copy_from_slice(&second);
    out
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], TxError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(TxError::Truncated(self.pos))?;
        let out = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], TxError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn count(&mut self, max: usize, err: fn(usize, usize) -> TxError) -> Result<usize, TxError> {
        let raw = u64::from_le_bytes(self.array()?);
        match usize::try_from(raw) {
            Ok(n) if n <= max => Ok(n),
            Ok(n) => Err(err(n, max)),
            Err(_) => Err(err(usize::MAX, max)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tx() -> Transaction {
        Transaction {
            version: 1,
            vin: vec![TxIn {
                prevout: OutPoint {
                    txid: [0u8; 32],
                    vout: 0,
                },
                script_sig: b"hello".to_vec(),
                sequence: 0xffffffff,
            }],
            vout: vec![TxOut {
                value: 50_000,
                script_pubkey: b"world".to_vec(),
            }],
            lock_time: 0,
        }
    }

    #[test]
    fn tx_serde_json_roundtrip() -> Result<(), TxError> {
        let tx = sample_tx();
        let bytes = tx.to_json_bytes()?;
        let tx2 = Transaction::from_json_bytes(&bytes)?;
        assert_eq!(tx, tx2);
        Ok(())
    }

    #[test]
    fn script_length_limit_errs() {
        let mut tx = sample_tx();
        tx.vin[0].script_sig = vec![0u8; MAX_SCRIPT_SIZE + 1];

        match tx.validate() {
            Err(TxError::TooLargeScript(len, max)) => {
                assert_eq!(len, MAX_SCRIPT_SIZE + 1);
                assert_eq!(max, MAX_SCRIPT_SIZE);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(tx.canonical_bytes_v2().is_err());
    }

    #[test]
    fn canonical_layout_matches_encoded_len() -> Result<(), TxError> {
        let tx = sample_tx();
        let bytes = tx.canonical_bytes_v2()?;
        assert_eq!(bytes.len(), tx.encoded_len());
        // version 1, then one input
        assert_eq!(hex::encode(&bytes[..12]), "010000000100000000000000");
        // script_sig length prefix follows txid + vout
        assert_eq!(&bytes[48..56], &5u64.to_le_bytes());
        assert_eq!(&bytes[56..61], b"hello");
        Ok(())
    }

    #[test]
    fn canonical_decode_restores_tx() -> Result<(), TxError> {
        let tx = sample_tx();
        let bytes = tx.canonical_bytes_v2()?;
        assert_eq!(Transaction::from_canonical_bytes_v2(&bytes)?, tx);
        Ok(())
    }

    #[test]
    fn canonical_decode_rejects_truncated_and_trailing() -> Result<(), TxError> {
        let bytes = sample_tx().canonical_bytes_v2()?;
        match Transaction::from_canonical_bytes_v2(&bytes[..bytes.len() - 1]) {
            Err(TxError::Truncated(_)) => (),
            other => panic!("expected Truncated, got {:?}", other),
        }
        let mut extended = bytes.clone();
        extended.extend_from_slice(&[0xaa, 0xbb]);
        match Transaction::from_canonical_bytes_v2(&extended) {
            Err(TxError::TrailingBytes(2)) => (),
            other => panic!("expected TrailingBytes, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn canonical_decode_caps_lengths_before_reading() -> Result<(), TxError> {
        let mut bytes = sample_tx().canonical_bytes_v2()?;
        // claim a script far larger than the buffer
        bytes[48..56].copy_from_slice(&u64::MAX.to_le_bytes());
        match Transaction::from_canonical_bytes_v2(&bytes) {
            Err(TxError::TooLargeScript(_, max)) => assert_eq!(max, MAX_SCRIPT_SIZE),
            other => panic!("expected TooLargeScript, got {:?}", other),
        }

        let mut bytes = sample_tx().canonical_bytes_v2()?;
        bytes[4..12].copy_from_slice(&((MAX_TX_INOUTS as u64) + 1).to_le_bytes());
        match Transaction::from_canonical_bytes_v2(&bytes) {
            Err(TxError::TooManyInOut(n, _)) => assert_eq!(n, MAX_TX_INOUTS + 1),
            other => panic!("expected TooManyInOut, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn prepend_keeps_original_script() {
        let mut tx = sample_tx();
        tx.vin[0].prepend_script_sig(&[0x51, 0x76]);
        assert_eq!(tx.vin[0].script_sig, b"\x51\x76hello".to_vec());
        tx.vin[0].prepend_script_sig(&[]);
        assert_eq!(tx.vin[0].script_sig.len(), 7);
    }

    #[test]
    fn txid_is_double_sha_of_canonical() -> Result<(), TxError> {
        let tx = sample_tx();
        let txid = tx.txid()?;
        assert_eq!(txid, hash256(&tx.canonical_bytes_v2()?));
        assert_eq!(
            hex::encode(hash256(b"")),
            "5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456"
        );
        Ok(())
    }
}
