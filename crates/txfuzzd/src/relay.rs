use hex::encode as hex_encode;
use std::io::Write;
use std::net::TcpStream;
use std::time::Duration;
use txfuzz_core::session::BoxError;
use txfuzz_core::{RelaySink, WireFormat};

const WRITE_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("frame too large: {0} bytes")]
    FrameTooLarge(usize),
}

/// How fuzzed bytes are presented to the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    /// Payload sent as is
    Raw,
    /// Payload spliced into a `{"type":"Tx","data":...}` P2P message
    JsonTx,
}

impl Envelope {
    pub fn for_format(format: WireFormat) -> Self {
        match format {
            WireFormat::Canonical => Envelope::Raw,
            WireFormat::Json => Envelope::JsonTx,
        }
    }

    fn wrap(self, payload: &[u8]) -> Vec<u8> {
        match self {
            Envelope::Raw => payload.to_vec(),
            Envelope::JsonTx => {
                let mut out = Vec::with_capacity(payload.len() + 24);
                out.extend_from_slice(br#"{"type":"Tx","data":"#);
                out.extend_from_slice(payload);
                out.push(b'}');
                out
            }
        }
    }
}

/// Length-prefixed frame: u32 big-endian length, then the wrapped payload.
pub fn encode_frame(envelope: Envelope, payload: &[u8]) -> Result<Vec<u8>, RelayError> {
    let body = envelope.wrap(payload);
    let len = u32::try_from(body.len()).map_err(|_| RelayError::FrameTooLarge(body.len()))?;
    let mut out = Vec::with_capacity(4 + body.len());
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}

pub struct TcpRelay {
    stream: TcpStream,
    envelope: Envelope,
    peer: String,
}

impl TcpRelay {
    pub fn connect(peer: &str, envelope: Envelope) -> Result<Self, RelayError> {
        let stream = TcpStream::connect(peer)?;
        stream.set_write_timeout(Some(Duration::from_secs(WRITE_TIMEOUT_SECS)))?;
        Ok(Self {
            stream,
            envelope,
            peer: peer.to_string(),
        })
    }

    fn send(&mut self, payload: &[u8]) -> Result<(), RelayError> {
        let frame = encode_frame(self.envelope, payload)?;
        self.stream.write_all(&frame)?;
        self.stream.flush()?;
        Ok(())
    }
}

impl RelaySink for TcpRelay {
    fn relay(&mut self, hash: &[u8; 32], bytes: &[u8]) -> Result<(), BoxError> {
        log::debug!("sending {} to {} ({} bytes)", hex_encode(hash), self.peer, bytes.len());
        self.send(bytes)?;
        Ok(())
    }
}
