use serde::{Deserialize, Serialize};
use txfuzz_tx::{Transaction, TxError};

/// Serializes a (possibly mutated) transaction for the wire.
pub trait TxCodec {
    fn serialize(&self, tx: &Transaction) -> Result<Vec<u8>, TxError>;
}

/// Wire formats a node understands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireFormat {
    /// Canonical binary v2 encoding
    #[default]
    Canonical,
    /// JSON encoding, as carried in P2P `Tx` messages
    Json,
}

impl TxCodec for WireFormat {
    fn serialize(&self, tx: &Transaction) -> Result<Vec<u8>, TxError> {
        match self {
            WireFormat::Canonical => tx.canonical_bytes_v2(),
            WireFormat::Json => tx.to_json_bytes(),
        }
    }
}

impl<C: TxCodec + ?Sized> TxCodec for &C {
    fn serialize(&self, tx: &Transaction) -> Result<Vec<u8>, TxError> {
        (**self).serialize(tx)
    }
}
