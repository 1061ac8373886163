//! Deterministic transaction mutation for exercising peers' message parsing.
//!
//! A pass takes a well-formed transaction and a seed, prepends
//! opcode-biased bytes to an input script, serializes the result and then
//! applies a few raw byte mutations. The same transaction and seed always
//! produce the same bytes.

pub mod buffer;
pub mod codec;
pub mod engine;
mod error;
pub mod rng;
pub mod script;
pub mod session;

pub use buffer::RawMutation;
pub use codec::{TxCodec, WireFormat};
pub use engine::{fuzz_transaction, FuzzEngine, MutationPass};
pub use error::FuzzError;
pub use rng::RandomSource;
pub use script::{tweak_script, ScriptTweak};
pub use session::{
    hex_dump, FuzzSession, FuzzedTx, Network, RelaySink, SessionConfig, SessionError,
};
