//! # Cuadrado CLI
//!
//! Command-line interface for Data Matrix codeword encoding.
//!
//! ## Usage
//!
//! ```bash
//! # Encode text, print codewords as hex
//! cuadrado encode "Hello, World!"
//!
//! # GS1 element string with escapes, as JSON
//! cuadrado encode --gs1 --escape --json "0109501101530003\G10AB-123"
//!
//! # Force a size, use the ISO look-ahead encoder
//! cuadrado encode --iso --version 12 "ABCDEFGH"
//!
//! # List the 48 symbol sizes
//! cuadrado sizes
//!
//! # Compare minimal and ISO codeword counts
//! cuadrado compare "1234abcdABCD"
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cuadrado::{
    EncodeError, EncodeOptions, Encoded, Policy, Segment, Shape, StructuredAppend, encode_segments,
    symbol::SymbolSize,
};

/// Cuadrado - Data Matrix ECC200 codeword encoder
#[derive(Parser, Debug)]
#[command(name = "cuadrado")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encode data and print the symbol codewords
    Encode {
        /// Data to encode
        data: String,

        #[command(flatten)]
        flags: EncodeFlags,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the symbol sizes
    Sizes,

    /// Encode with both policies and compare codeword counts
    Compare {
        /// Data to encode
        data: String,

        #[command(flatten)]
        flags: EncodeFlags,
    },
}

#[derive(clap::Args, Debug)]
struct EncodeFlags {
    /// GS1 element string (GS separated)
    #[arg(long)]
    gs1: bool,

    /// In GS1 mode encode GS literally instead of as FNC1
    #[arg(long)]
    gs_separator: bool,

    /// Use the ISO look-ahead encoder
    #[arg(long)]
    iso: bool,

    /// Size family for automatic selection
    #[arg(long, value_enum)]
    shape: Option<ShapeArg>,

    /// Pin the symbol size (1 to 48)
    #[arg(long = "version", value_name = "N")]
    symbol_version: Option<u8>,

    /// Add the Reader Programming codeword
    #[arg(long)]
    reader_init: bool,

    /// Do not compress Macro 05/06 envelopes
    #[arg(long)]
    no_macro: bool,

    /// Structured Append position (1 to count)
    #[arg(long, requires = "sa_count")]
    sa_index: Option<u8>,

    /// Structured Append symbol count (2 to 16)
    #[arg(long, requires = "sa_index")]
    sa_count: Option<u8>,

    /// Structured Append file ID (up to 6 digits)
    #[arg(long, requires = "sa_count")]
    sa_id: Option<String>,

    /// ISO block order for 144x144
    #[arg(long)]
    iso_144: bool,

    /// ECI of the data
    #[arg(long, value_name = "N")]
    eci: Option<u32>,

    /// Interpret backslash escapes in the data
    #[arg(long)]
    escape: bool,

    /// Load options from a JSON file (flags override)
    #[arg(long, value_name = "FILE")]
    options: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ShapeArg {
    Auto,
    Square,
    Dmre,
}

impl From<ShapeArg> for Shape {
    fn from(shape: ShapeArg) -> Self {
        match shape {
            ShapeArg::Auto => Shape::Auto,
            ShapeArg::Square => Shape::Square,
            ShapeArg::Dmre => Shape::Dmre,
        }
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("Failed to read options: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Options(#[from] serde_json::Error),

    #[error("Invalid escape sequence: {0}")]
    Escape(String),

    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging() -> Result<(), CliError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .map_err(|e| CliError::LoggingInit(e.to_string()))
}

fn run() -> Result<(), CliError> {
    init_logging()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Encode { data, flags, json } => {
            let (segments, options) = flags.resolve(&data)?;
            let encoded = encode_segments(&segments, &options)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&encoded)?);
            } else {
                print_encoded(&encoded);
            }
        }
        Commands::Sizes => print_sizes(),
        Commands::Compare { data, flags } => {
            let (segments, options) = flags.resolve(&data)?;
            let minimal = encode_segments(&segments, &options.with_policy(Policy::Minimal))?;
            let iso = encode_segments(&segments, &options.with_policy(Policy::Iso))?;

            println!(
                "minimal: {} codewords ({}x{})",
                minimal.data_codewords, minimal.size.rows, minimal.size.columns
            );
            println!(
                "iso:     {} codewords ({}x{})",
                iso.data_codewords, iso.size.rows, iso.size.columns
            );
            println!(
                "delta:   {}",
                iso.data_codewords as i64 - minimal.data_codewords as i64
            );
        }
    }

    Ok(())
}

impl EncodeFlags {
    /// Options file first, then flags on top.
    fn resolve(&self, data: &str) -> Result<(Vec<Segment>, EncodeOptions), CliError> {
        let mut options = match &self.options {
            Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
            None => EncodeOptions::default(),
        };

        if self.gs1 {
            options.gs1 = true;
        }
        if self.gs_separator {
            options.gs1_gs_separator = true;
        }
        if self.iso {
            options.policy = Policy::Iso;
        }
        if let Some(shape) = self.shape {
            options.shape = shape.into();
        }
        if self.symbol_version.is_some() {
            options.version = self.symbol_version;
        }
        if self.reader_init {
            options.reader_init = true;
        }
        if self.no_macro {
            options.macro_header = false;
        }
        if let (Some(index), Some(count)) = (self.sa_index, self.sa_count) {
            options.structured_append = Some(StructuredAppend {
                index,
                count,
                id: self.sa_id.clone(),
            });
        }
        if self.iso_144 {
            options.iso_144 = true;
        }

        let bytes = if self.escape {
            unescape(data)?
        } else {
            data.as_bytes().to_vec()
        };
        let segment = Segment::with_eci(bytes, self.eci.unwrap_or(0));

        Ok((vec![segment], options))
    }
}

/// Expand `\xNN`, `\n`, `\r`, `\t`, `\0`, `\e` (ESC), `\E` (EOT), `\G`
/// (GS), `\R` (RS) and `\\`.
fn unescape(data: &str) -> Result<Vec<u8>, CliError> {
    let bytes = data.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'\\' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }
        let Some(&code) = bytes.get(i + 1) else {
            return Err(CliError::Escape("trailing backslash".to_string()));
        };
        let byte = match code {
            b'n' => b'\n',
            b'r' => b'\r',
            b't' => b'\t',
            b'0' => 0x00,
            b'e' => 0x1B,
            b'E' => 0x04,
            b'G' => 0x1D,
            b'R' => 0x1E,
            b'\\' => b'\\',
            b'x' => {
                let hex = bytes
                    .get(i + 2..i + 4)
                    .and_then(|hex| std::str::from_utf8(hex).ok())
                    .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                    .ok_or_else(|| CliError::Escape(format!("\\x needs two hex digits at position {}", i + 1)))?;
                out.push(hex);
                i += 4;
                continue;
            }
            other => {
                return Err(CliError::Escape(format!(
                    "\\{} at position {}",
                    other as char,
                    i + 1
                )));
            }
        };
        out.push(byte);
        i += 2;
    }

    Ok(out)
}

fn print_encoded(encoded: &Encoded) {
    let size = &encoded.size;
    println!(
        "{}x{} (version {}), {} data codewords (capacity {})",
        size.rows,
        size.columns,
        size.version,
        encoded.data_codewords,
        size.data_codewords
    );
    let hex: Vec<String> = encoded.codewords.iter().map(|cw| format!("{:02X}", cw)).collect();
    println!("{}", hex.join(" "));
}

fn print_sizes() {
    println!("{:>7}  {:>9}  {:>6}  {:>5}  {:>6}  class", "version", "size", "data", "ecc", "blocks");
    for size in SymbolSize::iter() {
        println!(
            "{:>7}  {:>9}  {:>6}  {:>5}  {:>6}  {:?}",
            size.version,
            format!("{}x{}", size.rows, size.columns),
            size.data_codewords,
            size.ecc_codewords,
            size.blocks,
            size.class
        );
    }
}
