use txfuzz_tx::TxError;

/// Errors that abort a mutation pass
#[derive(Debug, thiserror::Error)]
pub enum FuzzError {
    #[error("invalid range: cannot draw from [0, {0})")]
    InvalidRange(usize),
    #[error("transaction has no inputs")]
    EmptyTransaction,
    #[error("buffer is empty")]
    EmptyBuffer,
    #[error("codec error: {0}")]
    Codec(#[from] TxError),
}
