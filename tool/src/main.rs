//! A command line tool for building and inspecting CTE transactions.
use clap::{Parser, Subcommand};
use cte_core::header::PeekType;
use cte_core::sizing::{CryptoScheme, EntrySizing, SizeClass};
use cte_encoding::Encoder;
use cte_parser::Decoder;
use snafu::{prelude::*, Report, Whatever};
use std::convert::TryFrom;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::Level;

/// Build and inspect CTE transaction buffers
#[derive(Debug, Parser)]
#[command(version)]
struct App {
    /// verbose mode
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,
    /// resolve vector entry sizes through the generic size class table
    /// instead of the crypto scheme table
    #[arg(long = "size-class", global = true)]
    size_class: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a CTE transaction from a sequence of type:value fields
    ///
    /// Supported fields: uint8/uint16/uint32/uint64/int8/int16/int32/int64
    /// (decimal or 0x-prefixed hex), uleb:<val>, sleb:<val>, float:<val>,
    /// double:<val>, bool:<true|false>, index:<0-15>, vec:<hex>,
    /// pk-vec-<item size>:<hex>, sig-vec-<item size>:<hex>
    Write {
        /// the encoder buffer capacity in bytes
        #[arg(short = 'b', long = "buffer-size", default_value = "1232")]
        buffer_size: usize,
        /// write the encoded transaction to this file
        /// instead of hex-dumping it to stdout
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
        /// the fields to encode, in order
        #[arg(required = true)]
        fields: Vec<String>,
    },
    /// Read a CTE transaction file and print its contents
    Read {
        /// the file holding the encoded transaction
        #[arg(short = 'i', long = "input")]
        input: PathBuf,
    },
}

fn main() {
    run().unwrap_or_else(|e| {
        tracing::error!("{}", Report::from_error(e));
        std::process::exit(-2);
    });
}

fn run() -> Result<(), Whatever> {
    let app = App::parse();

    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(if app.verbose {
                Level::DEBUG
            } else {
                Level::INFO
            })
            .finish(),
    )
    .whatever_context("Could not set up global logging subscriber")
    .unwrap_or_else(|e: Whatever| {
        eprintln!("[ERROR] {}", Report::from_error(e));
    });

    match app.command {
        Command::Write {
            buffer_size,
            output,
            fields,
        } => {
            if app.size_class {
                let mut enc = Encoder::with_capacity_and_sizing(buffer_size, SizeClass)
                    .whatever_context("Could not create the encoder")?;
                write_fields(&mut enc, SizeClass, &fields)?;
                emit(enc.data(), output.as_deref())
            } else {
                let mut enc = Encoder::with_capacity(buffer_size)
                    .whatever_context("Could not create the encoder")?;
                write_fields(&mut enc, CryptoScheme, &fields)?;
                emit(enc.data(), output.as_deref())
            }
        }
        Command::Read { input } => {
            let bytes = fs::read(&input)
                .with_whatever_context(|_| format!("Could not read {}", input.display()))?;
            println!("Reading from {} ({} bytes)", input.display(), bytes.len());
            if app.size_class {
                read_transaction(&bytes, SizeClass)
            } else {
                read_transaction(&bytes, CryptoScheme)
            }
        }
    }
}

/// Parse an unsigned integer in decimal or `0x`-prefixed hexadecimal.
fn parse_u64(text: &str) -> Result<u64, Whatever> {
    let text = text.trim();
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
            .with_whatever_context(|_| format!("Invalid hexadecimal value `{}`", text))
    } else {
        text.parse()
            .with_whatever_context(|_| format!("Invalid numeric value `{}`", text))
    }
}

/// Parse a signed integer in decimal or (optionally negated)
/// `0x`-prefixed hexadecimal.
fn parse_i64(text: &str) -> Result<i64, Whatever> {
    let text = text.trim();
    if let Some(rest) = text.strip_prefix('-') {
        let magnitude = parse_u64(rest)?;
        ensure_whatever!(
            magnitude <= (i64::MAX as u64) + 1,
            "Value `{}` is out of range",
            text
        );
        Ok((magnitude as i64).wrapping_neg())
    } else {
        let magnitude = parse_u64(text)?;
        i64::try_from(magnitude).with_whatever_context(|_| format!("Value `{}` is out of range", text))
    }
}

/// Convert a string of hexadecimal digits into bytes.
fn parse_hex(text: &str) -> Result<Vec<u8>, Whatever> {
    let digits: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    ensure_whatever!(
        digits.len() % 2 == 0,
        "Hex payload `{}` must have an even number of digits",
        text
    );
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .with_whatever_context(|_| format!("Invalid hex payload `{}`", text))
        })
        .collect()
}

/// Resolve a raw item byte width to the first entry size code with that
/// width in the active dialect, and split a hex payload into items.
fn vector_parts<S>(
    sizing: S,
    public: bool,
    item_size: usize,
    payload: &[u8],
) -> Result<(u8, u8), Whatever>
where
    S: EntrySizing,
{
    let code = (0u8..=3)
        .find(|&code| {
            let size = if public {
                sizing.public_key_size(code)
            } else {
                sizing.signature_size(code)
            };
            size == Some(item_size)
        })
        .with_whatever_context(|| {
            format!("No entry size code for {}-byte items in this dialect", item_size)
        })?;
    ensure_whatever!(
        !payload.is_empty() && payload.len() % item_size == 0,
        "Vector payload of {} bytes is not a multiple of the {}-byte item size",
        payload.len(),
        item_size
    );
    let count = u8::try_from(payload.len() / item_size)
        .whatever_context("Vector item count is out of range")?;
    Ok((count, code))
}

fn write_fields<S>(enc: &mut Encoder<S>, sizing: S, fields: &[String]) -> Result<(), Whatever>
where
    S: EntrySizing + Copy,
{
    for field in fields {
        let (kind, value) = field
            .split_once(':')
            .with_whatever_context(|| format!("Field `{}` is not in type:value syntax", field))?;
        tracing::debug!(kind, value, "writing field");
        match kind {
            "uint8" => {
                let v = parse_u64(value)?;
                let v = u8::try_from(v)
                    .with_whatever_context(|_| format!("Value {} out of range for uint8", v))?;
                enc.write_u8(v).whatever_context("Could not write uint8 field")?;
            }
            "uint16" => {
                let v = parse_u64(value)?;
                let v = u16::try_from(v)
                    .with_whatever_context(|_| format!("Value {} out of range for uint16", v))?;
                enc.write_u16(v).whatever_context("Could not write uint16 field")?;
            }
            "uint32" => {
                let v = parse_u64(value)?;
                let v = u32::try_from(v)
                    .with_whatever_context(|_| format!("Value {} out of range for uint32", v))?;
                enc.write_u32(v).whatever_context("Could not write uint32 field")?;
            }
            "uint64" => {
                let v = parse_u64(value)?;
                enc.write_u64(v).whatever_context("Could not write uint64 field")?;
            }
            "int8" => {
                let v = parse_i64(value)?;
                let v = i8::try_from(v)
                    .with_whatever_context(|_| format!("Value {} out of range for int8", v))?;
                enc.write_i8(v).whatever_context("Could not write int8 field")?;
            }
            "int16" => {
                let v = parse_i64(value)?;
                let v = i16::try_from(v)
                    .with_whatever_context(|_| format!("Value {} out of range for int16", v))?;
                enc.write_i16(v).whatever_context("Could not write int16 field")?;
            }
            "int32" => {
                let v = parse_i64(value)?;
                let v = i32::try_from(v)
                    .with_whatever_context(|_| format!("Value {} out of range for int32", v))?;
                enc.write_i32(v).whatever_context("Could not write int32 field")?;
            }
            "int64" => {
                let v = parse_i64(value)?;
                enc.write_i64(v).whatever_context("Could not write int64 field")?;
            }
            "uleb" => {
                let v = parse_u64(value)?;
                enc.write_uleb128(v)
                    .whatever_context("Could not write uleb field")?;
            }
            "sleb" => {
                let v = parse_i64(value)?;
                enc.write_sleb128(v)
                    .whatever_context("Could not write sleb field")?;
            }
            "float" => {
                let v: f32 = value
                    .trim()
                    .parse()
                    .with_whatever_context(|_| format!("Invalid float value `{}`", value))?;
                enc.write_f32(v).whatever_context("Could not write float field")?;
            }
            "double" => {
                let v: f64 = value
                    .trim()
                    .parse()
                    .with_whatever_context(|_| format!("Invalid double value `{}`", value))?;
                enc.write_f64(v).whatever_context("Could not write double field")?;
            }
            "bool" => {
                let v = match value {
                    "true" => true,
                    "false" => false,
                    _ => whatever!("Boolean value must be `true` or `false`, got `{}`", value),
                };
                enc.write_boolean(v)
                    .whatever_context("Could not write bool field")?;
            }
            "index" => {
                let v = parse_u64(value)?;
                let v = u8::try_from(v)
                    .with_whatever_context(|_| format!("Value {} out of range for index", v))?;
                enc.write_index(v).whatever_context("Could not write index field")?;
            }
            "vec" => {
                let payload = parse_hex(value)?;
                enc.put_vector_data(&payload)
                    .whatever_context("Could not write vec field")?;
            }
            _ => {
                if let Some(size) = kind.strip_prefix("pk-vec-") {
                    let item_size: usize = size
                        .parse()
                        .with_whatever_context(|_| format!("Invalid item size in `{}`", kind))?;
                    let payload = parse_hex(value)?;
                    let (count, code) = vector_parts(sizing, true, item_size, &payload)?;
                    enc.put_public_key_vector(count, code, &payload)
                        .whatever_context("Could not write public key vector field")?;
                } else if let Some(size) = kind.strip_prefix("sig-vec-") {
                    let item_size: usize = size
                        .parse()
                        .with_whatever_context(|_| format!("Invalid item size in `{}`", kind))?;
                    let payload = parse_hex(value)?;
                    let (count, code) = vector_parts(sizing, false, item_size, &payload)?;
                    enc.put_signature_vector(count, code, &payload)
                        .whatever_context("Could not write signature vector field")?;
                } else {
                    whatever!("Unknown field type `{}`", kind);
                }
            }
        }
    }
    Ok(())
}

fn emit(data: &[u8], output: Option<&Path>) -> Result<(), Whatever> {
    match output {
        Some(path) => {
            fs::write(path, data)
                .with_whatever_context(|_| format!("Could not write {}", path.display()))?;
            println!("Wrote {} bytes to {}", data.len(), path.display());
        }
        None => print_hex("Encoded transaction", data),
    }
    Ok(())
}

fn print_hex(label: &str, data: &[u8]) {
    print!("{} ({} bytes):", label, data.len());
    for byte in data {
        print!(" {:02X}", byte);
    }
    println!();
}

fn read_transaction<S>(bytes: &[u8], sizing: S) -> Result<(), Whatever>
where
    S: EntrySizing,
{
    let mut dec = Decoder::from_bytes_and_sizing(bytes, sizing)
        .whatever_context("Could not load the transaction")?;
    println!("--------------------------------------");
    loop {
        let kind = dec
            .peek_type()
            .whatever_context("Could not classify the next field")?;
        match kind {
            PeekType::Eof => break,
            PeekType::PkVector0
            | PeekType::PkVector1
            | PeekType::PkVector2
            | PeekType::PkVector3 => {
                let payload = dec
                    .read_public_key_vector()
                    .whatever_context("Could not read public key vector")?
                    .to_vec();
                println!("Public Key Vector, Count: {}", dec.last_vector_count());
                print_hex("  Keys", &payload);
            }
            PeekType::SigVector0
            | PeekType::SigVector1
            | PeekType::SigVector2
            | PeekType::SigVector3 => {
                let payload = dec
                    .read_signature_vector()
                    .whatever_context("Could not read signature vector")?
                    .to_vec();
                println!("Signature Vector, Count: {}", dec.last_vector_count());
                print_hex("  Signatures", &payload);
            }
            PeekType::VectorShort | PeekType::VectorExtended => {
                let payload = dec
                    .read_vector_data()
                    .whatever_context("Could not read vector data")?
                    .to_vec();
                println!("Vector Data, Length: {}", payload.len());
                print_hex("  Payload", &payload);
            }
            PeekType::IxIndex => {
                let value = dec.read_index().whatever_context("Could not read index")?;
                println!("IxData Index, Value: {}", value);
            }
            PeekType::IxVarintZero => {
                dec.read_varint_zero()
                    .whatever_context("Could not read varint zero")?;
                println!("IxData Varint Zero");
            }
            PeekType::IxUleb128 => {
                let value = dec.read_uleb128().whatever_context("Could not read uleb")?;
                println!("IxData ULEB128, Value: {}", value);
            }
            PeekType::IxSleb128 => {
                let value = dec.read_sleb128().whatever_context("Could not read sleb")?;
                println!("IxData SLEB128, Value: {}", value);
            }
            PeekType::IxInt8 => {
                let value = dec.read_i8().whatever_context("Could not read int8")?;
                println!("IxData int8, Value: {}", value);
            }
            PeekType::IxInt16 => {
                let value = dec.read_i16().whatever_context("Could not read int16")?;
                println!("IxData int16, Value: {}", value);
            }
            PeekType::IxInt32 => {
                let value = dec.read_i32().whatever_context("Could not read int32")?;
                println!("IxData int32, Value: {}", value);
            }
            PeekType::IxInt64 => {
                let value = dec.read_i64().whatever_context("Could not read int64")?;
                println!("IxData int64, Value: {}", value);
            }
            PeekType::IxUint8 => {
                let value = dec.read_u8().whatever_context("Could not read uint8")?;
                println!("IxData uint8, Value: {}", value);
            }
            PeekType::IxUint16 => {
                let value = dec.read_u16().whatever_context("Could not read uint16")?;
                println!("IxData uint16, Value: {}", value);
            }
            PeekType::IxUint32 => {
                let value = dec.read_u32().whatever_context("Could not read uint32")?;
                println!("IxData uint32, Value: {}", value);
            }
            PeekType::IxUint64 => {
                let value = dec.read_u64().whatever_context("Could not read uint64")?;
                println!("IxData uint64, Value: {}", value);
            }
            PeekType::IxFloat32 => {
                let value = dec.read_f32().whatever_context("Could not read float32")?;
                println!("IxData float32, Value: {}", value);
            }
            PeekType::IxFloat64 => {
                let value = dec.read_f64().whatever_context("Could not read float64")?;
                println!("IxData float64, Value: {}", value);
            }
            PeekType::IxConstFalse | PeekType::IxConstTrue => {
                let value = dec
                    .read_boolean()
                    .whatever_context("Could not read boolean")?;
                println!("IxData boolean, Value: {}", value);
            }
        }
    }
    println!("--------------------------------------");
    println!("Successfully decoded all fields.");
    Ok(())
}
