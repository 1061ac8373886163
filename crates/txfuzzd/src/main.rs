use clap::{Parser, Subcommand, ValueEnum};
use hex::encode as hex_encode;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use txfuzz_core::{
    FuzzSession, FuzzedTx, Network, RawMutation, ScriptTweak, SessionConfig, SessionError,
    WireFormat,
};
use txfuzz_tx::{Transaction, TxError};
use txfuzzd::relay::{Envelope, RelayError, TcpRelay};
use txfuzzd::{init_logging, LogLevel};

#[derive(Debug, Parser)]
#[command(name = "txfuzzd", version, about = "Transaction fuzzing relay")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Mutate a transaction once with a given seed (replays a logged seed)
    Mutate {
        /// Transaction JSON path
        #[arg(long)]
        tx: PathBuf,
        /// Fuzz seed
        #[arg(long)]
        seed: u64,
        /// Wire format of the mutated bytes
        #[arg(long, value_enum, default_value_t = Format::Canonical)]
        format: Format,
        /// Output path. If omitted, prints to stdout.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Emit a JSON report instead of bare hex
        #[arg(long)]
        json: bool,
    },
    /// Fuzz a transaction and relay the variants to a peer
    Relay {
        /// Transaction JSON path
        #[arg(long)]
        tx: PathBuf,
        /// Peer address (host:port)
        #[arg(long)]
        peer: String,
        /// Optional session config (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Network id (testnet/devnet; mainnet is refused)
        #[arg(long)]
        network: Option<String>,
        /// First seed. If omitted, uses the config or the current time.
        #[arg(long)]
        seed: Option<u64>,
        /// Number of fuzzed variants to send
        #[arg(long, default_value_t = 1)]
        count: u64,
        /// Wire format of the mutated bytes
        #[arg(long, value_enum)]
        format: Option<Format>,
        /// Dump fuzzed bytes as hex (debug level)
        #[arg(long)]
        hex_dump: bool,
        /// Log level
        #[arg(long, value_enum, default_value_t = LogLevel::Info)]
        log_level: LogLevel,
        /// Optional log file path
        #[arg(long)]
        log_file: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Canonical,
    Json,
}

impl Format {
    fn wire(self) -> WireFormat {
        match self {
            Format::Canonical => WireFormat::Canonical,
            Format::Json => WireFormat::Json,
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("transaction error: {0}")]
    Tx(#[from] TxError),
    #[error("session error: {0}")]
    Session(#[from] SessionError),
    #[error("relay error: {0}")]
    Relay(#[from] RelayError),
}

#[derive(Debug, Serialize)]
struct MutateReport {
    seed: u64,
    hash: String,
    original_txid: String,
    len: usize,
    script_tweaks: Vec<ScriptTweak>,
    raw_mutations: Vec<RawMutation>,
    decodes: bool,
    decode_error: Option<String>,
    hex: String,
}

impl MutateReport {
    fn new(fuzzed: &FuzzedTx, format: WireFormat) -> Self {
        let decoded = match format {
            WireFormat::Canonical => Transaction::from_canonical_bytes_v2(fuzzed.bytes()),
            WireFormat::Json => Transaction::from_json_bytes(fuzzed.bytes()),
        };
        Self {
            seed: fuzzed.seed,
            hash: hex_encode(fuzzed.hash),
            original_txid: hex_encode(fuzzed.original_txid),
            len: fuzzed.bytes().len(),
            script_tweaks: fuzzed.pass.script_tweaks.clone(),
            raw_mutations: fuzzed.pass.raw_mutations.clone(),
            decodes: decoded.is_ok(),
            decode_error: decoded.err().map(|e| e.to_string()),
            hex: hex_encode(fuzzed.bytes()),
        }
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Mutate {
            tx,
            seed,
            format,
            out,
            json,
        } => {
            let output = mutate(&tx, seed, format.wire(), json)?;
            match out {
                Some(path) => fs::write(path, output)?,
                None => println!("{output}"),
            }
            Ok(())
        }
        Command::Relay {
            tx,
            peer,
            config,
            network,
            seed,
            count,
            format,
            hex_dump,
            log_level,
            log_file,
        } => {
            init_logging(log_level, log_file)?;
            let mut cfg = match config {
                Some(path) => SessionConfig::from_json_file(&path)?,
                None => SessionConfig::default(),
            };
            if let Some(network) = network {
                cfg.network = network.parse::<Network>()?;
            }
            if let Some(seed) = seed {
                cfg.start_seed = Some(seed);
            }
            if let Some(format) = format {
                cfg.wire_format = format.wire();
            }
            cfg.hex_dump |= hex_dump;
            relay(&tx, &peer, cfg, count)
        }
    }
}

fn load_tx(path: &Path) -> Result<Transaction, CliError> {
    let data = fs::read(path)?;
    Ok(Transaction::from_json_bytes(&data)?)
}

fn mutate(path: &Path, seed: u64, format: WireFormat, json: bool) -> Result<String, CliError> {
    let tx = load_tx(path)?;
    let session = FuzzSession::new(SessionConfig {
        start_seed: Some(seed),
        wire_format: format,
        ..SessionConfig::default()
    })?;
    let fuzzed = session.replay(&tx, seed)?;
    if json {
        Ok(serde_json::to_string_pretty(&MutateReport::new(
            &fuzzed, format,
        ))?)
    } else {
        Ok(hex_encode(fuzzed.bytes()))
    }
}

fn relay(path: &Path, peer: &str, cfg: SessionConfig, count: u64) -> Result<(), CliError> {
    let tx = load_tx(path)?;
    let envelope = Envelope::for_format(cfg.wire_format);
    let mut session = FuzzSession::new(cfg)?;
    log::info!(
        "fuzzing on {} starting at seed {}",
        session.network(),
        session.peek_seed()
    );
    let mut sink = TcpRelay::connect(peer, envelope)?;
    for _ in 0..count {
        session.relay(&tx, &mut sink)?;
    }
    log::info!(
        "relayed {count} fuzzed tx(s) to {peer}; next seed {}",
        session.peek_seed()
    );
    Ok(())
}
