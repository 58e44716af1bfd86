//! Command line access to calibration databases.
//!
//! ```text
//! calibdb L.vdc --date 2019-06-01 --prefix L.vdc.u1. --search -1 nw:uint wire_pos:double:v
//! ```
//!
//! prints the resolved values as a JSON object. Without keys, the logical
//! lines of the selected scope are printed instead.

use std::error::Error as StdError;

use calibdb::database::Database;
use calibdb::datatype::Arithmetic;
use calibdb::locate::FileResolver;
use calibdb::request::{Destination, Request, Target};
use calibdb::seek::CONFIG_LABEL;
use calibdb::settings::Settings;
use calibdb::timestamp::parse_reference_date;
use chrono::Local;
use clap::Parser;
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "calibdb")]
#[command(about = "Look up date-dependent values in calibration database files")]
struct Cli {
    /// Database name (e.g. L.vdc) or path of a database file
    name: String,

    /// Keys to resolve, as KEY[:TYPE[:SHAPE]]. TYPE is one of string, double,
    /// float, long, ulong, int, uint, short, ushort, char, byte (default
    /// string). SHAPE is `v` for a vector of any length, a number for a
    /// vector of exactly that length, or `mN` for a matrix with N columns.
    keys: Vec<String>,

    /// Reference date (YYYY-MM-DD or YYYY-MM-DD HH:MM:SS, default now)
    #[arg(long)]
    date: Option<String>,

    /// Prefix prepended to every key (e.g. L.vdc.u1.)
    #[arg(long, default_value = "")]
    prefix: String,

    /// Search depth up the key namespace (default from settings)
    #[arg(long, allow_hyphen_values = true)]
    search: Option<i32>,

    /// Only look inside the configuration block with this tag
    #[arg(long)]
    config: Option<String>,

    /// Label of configuration markers
    #[arg(long, default_value = CONFIG_LABEL)]
    label: String,

    /// Only look after the latest date tag not after the reference date
    #[arg(long)]
    seek_date: bool,

    /// Missing keys are left out instead of failing
    #[arg(long)]
    optional: bool,
}

#[derive(Debug, Clone, Copy)]
enum ShapeSpec {
    Scalar,
    Vector(usize),
    Matrix(usize),
}

#[derive(Default)]
struct Values<T> {
    scalar: T,
    vector: Vec<T>,
    matrix: Vec<Vec<T>>,
}

impl<T: Destination + Default + Serialize> Values<T> {
    fn target(&mut self, shape: ShapeSpec) -> Target<'_> {
        match shape {
            ShapeSpec::Scalar => Target::scalar(&mut self.scalar),
            ShapeSpec::Vector(n) => Target::vector(&mut self.vector, n),
            ShapeSpec::Matrix(ncols) => Target::matrix(&mut self.matrix, ncols),
        }
    }
    fn to_json(&self, shape: ShapeSpec) -> Value {
        match shape {
            ShapeSpec::Scalar => json!(self.scalar),
            ShapeSpec::Vector(_) => json!(self.vector),
            ShapeSpec::Matrix(_) => json!(self.matrix),
        }
    }
}

enum Slot {
    Double(Values<f64>),
    Float(Values<f32>),
    Long(Values<i64>),
    ULong(Values<u64>),
    Int(Values<i32>),
    UInt(Values<u32>),
    Short(Values<i16>),
    UShort(Values<u16>),
    Char(Values<i8>),
    Byte(Values<u8>),
    Text(String),
}

// runs $body with $v bound to the typed values of any arithmetic slot
macro_rules! with_values {
    ($slot:expr, $v:ident => $body:expr, $s:ident => $text:expr) => {
        match $slot {
            Slot::Double($v) => $body,
            Slot::Float($v) => $body,
            Slot::Long($v) => $body,
            Slot::ULong($v) => $body,
            Slot::Int($v) => $body,
            Slot::UInt($v) => $body,
            Slot::Short($v) => $body,
            Slot::UShort($v) => $body,
            Slot::Char($v) => $body,
            Slot::Byte($v) => $body,
            Slot::Text($s) => $text,
        }
    };
}

impl Slot {
    fn new(type_name: &str) -> Option<Self> {
        let lower = type_name.to_ascii_lowercase();
        let slot = match lower.as_str() {
            "string" | "text" => Slot::Text(String::new()),
            t if t == f64::DATA_TYPE.to_ascii_lowercase() || t == "f64" => Slot::Double(Values::default()),
            t if t == f32::DATA_TYPE.to_ascii_lowercase() || t == "f32" => Slot::Float(Values::default()),
            t if t == i64::DATA_TYPE.to_ascii_lowercase() || t == "i64" => Slot::Long(Values::default()),
            t if t == u64::DATA_TYPE.to_ascii_lowercase() || t == "u64" => Slot::ULong(Values::default()),
            t if t == i32::DATA_TYPE.to_ascii_lowercase() || t == "i32" => Slot::Int(Values::default()),
            t if t == u32::DATA_TYPE.to_ascii_lowercase() || t == "u32" => Slot::UInt(Values::default()),
            t if t == i16::DATA_TYPE.to_ascii_lowercase() || t == "i16" => Slot::Short(Values::default()),
            t if t == u16::DATA_TYPE.to_ascii_lowercase() || t == "u16" => Slot::UShort(Values::default()),
            t if t == i8::DATA_TYPE.to_ascii_lowercase() || t == "i8" => Slot::Char(Values::default()),
            t if t == u8::DATA_TYPE.to_ascii_lowercase() || t == "u8" => Slot::Byte(Values::default()),
            _ => return None,
        };
        Some(slot)
    }
    fn target(&mut self, shape: ShapeSpec) -> Target<'_> {
        with_values!(self, v => v.target(shape), s => Target::text(s))
    }
    fn to_json(&self, shape: ShapeSpec) -> Value {
        with_values!(self, v => v.to_json(shape), s => json!(s))
    }
}

struct KeySpec {
    name: String,
    slot: Slot,
    shape: ShapeSpec,
}

fn parse_key_spec(spec: &str) -> Result<KeySpec, String> {
    let mut parts = spec.splitn(3, ':');
    let name = parts.next().unwrap_or_default();
    if name.is_empty() {
        return Err(format!("empty key in \"{}\"", spec));
    }
    let type_name = parts.next().unwrap_or("string");
    let slot = Slot::new(type_name).ok_or_else(|| format!("unknown type \"{}\" in \"{}\"", type_name, spec))?;
    let shape = match parts.next() {
        None => ShapeSpec::Scalar,
        Some("v") => ShapeSpec::Vector(0),
        Some(m) if m.starts_with('m') => ShapeSpec::Matrix(
            m[1..]
                .parse()
                .map_err(|_| format!("bad matrix columns in \"{}\"", spec))?,
        ),
        Some(n) => ShapeSpec::Vector(n.parse().map_err(|_| format!("bad shape in \"{}\"", spec))?),
    };
    if matches!(slot, Slot::Text(_)) && !matches!(shape, ShapeSpec::Scalar) {
        return Err(format!("string values have no shape, in \"{}\"", spec));
    }
    Ok(KeySpec {
        name: name.to_owned(),
        slot,
        shape,
    })
}

fn main() -> Result<(), Box<dyn StdError>> {
    // logs go to stderr, stdout carries the values
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let date = match &cli.date {
        Some(text) => parse_reference_date(text).ok_or_else(|| format!("invalid date \"{}\"", text))?,
        None => Local::now().naive_local(),
    };
    let settings = Settings::load()?;
    let search = cli.search.unwrap_or(settings.search);
    let resolver = FileResolver::configured(&settings);

    let mut db = Database::open_with(&resolver, &cli.name, date)?;
    info!(
        name = %cli.name,
        path = ?db.path(),
        date = %date,
        "Database opened"
    );

    if let Some(tag) = &cli.config {
        if !db.seek_config(tag, &cli.label, false)? {
            return Err(format!("no configuration block [ {}={} ]", cli.label, tag).into());
        }
    }
    if cli.seek_date && !db.seek_date(false)? {
        debug!("no date tag before the reference date, using the whole scope");
    }

    if cli.keys.is_empty() {
        db.file_mut().rewind()?;
        while let Some(line) = db.next_line()? {
            println!("{}", line);
        }
        return Ok(());
    }

    let mut specs = cli
        .keys
        .iter()
        .map(|k| parse_key_spec(k))
        .collect::<Result<Vec<_>, _>>()?;
    let mut found = vec![true; specs.len()];
    {
        let mut requests: Vec<Request> = specs
            .iter_mut()
            .map(|spec| Request::new(&spec.name, spec.slot.target(spec.shape)))
            .collect();
        if cli.optional {
            // resolve one by one so that missing keys can be told apart
            for (i, request) in requests.iter_mut().enumerate() {
                let single = std::slice::from_mut(request);
                match db.load(single, &cli.prefix, search, "calibdb") {
                    Ok(()) => (),
                    Err(e) if e.is_missing() => found[i] = false,
                    Err(e) => return Err(e.into()),
                }
            }
        } else {
            db.load(&mut requests, &cli.prefix, search, "calibdb")?;
        }
    }

    let mut values = Map::new();
    for (spec, found) in specs.iter().zip(found) {
        if found {
            values.insert(spec.name.clone(), spec.slot.to_json(spec.shape));
        }
    }
    println!("{}", serde_json::to_string_pretty(&Value::Object(values))?);
    Ok(())
}
