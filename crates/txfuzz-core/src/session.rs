//! Seed bookkeeping and relay hand-off across successive fuzzing calls.
//!
//! Hashes of the original and fuzzed transaction are logged together with
//! the seed, so a crash seen on a peer can be reproduced with
//! [`FuzzSession::replay`].

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use hex::encode as hex_encode;
use serde::{Deserialize, Serialize};
use txfuzz_tx::{hash256, Transaction};

use crate::codec::{TxCodec, WireFormat};
use crate::engine::{FuzzEngine, MutationPass};
use crate::FuzzError;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("fuzzing is only enabled on test networks")]
    MainnetDisabled,
    #[error("unknown network: {0}")]
    UnknownNetwork(String),
    #[error("fuzz error: {0}")]
    Fuzz(#[from] FuzzError),
    #[error("relay error: {0}")]
    Relay(#[source] BoxError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    #[default]
    Testnet,
    Devnet,
}

impl FromStr for Network {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "devnet" => Ok(Network::Devnet),
            other => Err(SessionError::UnknownNetwork(other.to_string())),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Devnet => "devnet",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub network: Network,
    /// First seed to use; the current unix time when unset.
    pub start_seed: Option<u64>,
    pub wire_format: WireFormat,
    /// Dump fuzzed bytes as hex at debug level
    pub hex_dump: bool,
}

impl SessionConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, SessionError> {
        let data = std::fs::read(path)?;
        Ok(serde_json::from_slice(&data)?)
    }
}

/// Destination for fuzzed transactions, typically a peer connection.
pub trait RelaySink {
    fn relay(&mut self, hash: &[u8; 32], bytes: &[u8]) -> Result<(), BoxError>;
}

/// A fuzzed transaction together with what is needed to reproduce it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuzzedTx {
    pub seed: u64,
    pub original_txid: [u8; 32],
    pub hash: [u8; 32],
    pub pass: MutationPass,
}

impl FuzzedTx {
    pub fn bytes(&self) -> &[u8] {
        &self.pass.bytes
    }
}

pub struct FuzzSession<C = WireFormat> {
    engine: FuzzEngine<C>,
    network: Network,
    next_seed: u64,
    hex_dump: bool,
}

impl FuzzSession<WireFormat> {
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        let start = config.start_seed.unwrap_or_else(now_secs);
        Self::with_codec(config.wire_format, config.network, start, config.hex_dump)
    }
}

impl<C: TxCodec> FuzzSession<C> {
    pub fn with_codec(
        codec: C,
        network: Network,
        start_seed: u64,
        hex_dump: bool,
    ) -> Result<Self, SessionError> {
        if network == Network::Mainnet {
            return Err(SessionError::MainnetDisabled);
        }
        Ok(Self {
            engine: FuzzEngine::new(codec),
            network,
            next_seed: start_seed,
            hex_dump,
        })
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Seed the next call to [`fuzz`](Self::fuzz) will use.
    pub fn peek_seed(&self) -> u64 {
        self.next_seed
    }

    fn advance(&mut self) -> u64 {
        let seed = self.next_seed;
        self.next_seed = seed.wrapping_add(1);
        seed
    }

    /// Fuzz `tx` with the next seed.
    pub fn fuzz(&mut self, tx: &Transaction) -> Result<FuzzedTx, SessionError> {
        let seed = self.advance();
        self.replay(tx, seed)
    }

    /// Fuzz `tx` with an explicit seed, leaving the counter alone.
    pub fn replay(&self, tx: &Transaction, seed: u64) -> Result<FuzzedTx, SessionError> {
        let original_txid = tx.txid().map_err(FuzzError::from)?;
        let pass = self.engine.run(tx, seed)?;
        let hash = hash256(&pass.bytes);
        Ok(FuzzedTx {
            seed,
            original_txid,
            hash,
            pass,
        })
    }

    /// Fuzz `tx` with the next seed and hand it to `sink`.
    pub fn relay<S: RelaySink + ?Sized>(
        &mut self,
        tx: &Transaction,
        sink: &mut S,
    ) -> Result<FuzzedTx, SessionError> {
        let fuzzed = self.fuzz(tx)?;
        log::info!("relaying fuzzed tx {}", hex_encode(fuzzed.hash));
        log::info!(
            " (original tx: {} seed: {})",
            hex_encode(fuzzed.original_txid),
            fuzzed.seed
        );
        if self.hex_dump {
            log::debug!("fuzzed hex:\n{}", hex_dump(fuzzed.bytes()));
        }
        sink.relay(&fuzzed.hash, fuzzed.bytes())
            .map_err(SessionError::Relay)?;
        Ok(fuzzed)
    }
}

const HEX_DUMP_WIDTH: usize = 32;

/// Hex rendering with one line per 32 bytes, prefixed by the offset.
pub fn hex_dump(bytes: &[u8]) -> String {
    bytes
        .chunks(HEX_DUMP_WIDTH)
        .enumerate()
        .map(|(i, chunk)| format!("{:06x}: {}", i * HEX_DUMP_WIDTH, hex_encode(chunk)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
