//! Calibdb – a date-aware, file-based key/value store for calibration data.
//!
//! Calibration and configuration parameters of a detector setup live in
//! plain text files, one per subsystem. Each file is an append-only history
//! of `key = value` assignments, split into blocks by date tags:
//!
//! ```text
//! # wire chamber geometry
//! L.vdc.nw       = 368
//! L.vdc.wire_pos = 0.0 0.004 0.008 \
//!                  0.012 0.016
//!
//! [ 2019-02-01 00:00:00 ]
//! L.vdc.u1.nw = 400
//! ```
//!
//! Asking for a key at a reference date gives the value of the last
//! assignment in a block whose date is not after the reference date.
//!
//! ## Modules
//! * [`stream`] – Seekable line cursor over a database file, with segments.
//! * [`line`] – Assembly of logical lines (comments, continuations).
//! * [`timestamp`] – Date tags, markers and `key = value` recognition.
//! * [`scan`] – The date-aware lookup of a single key.
//! * [`datatype`] – Conversion of value text into the arithmetic types.
//! * [`request`] – Typed requests that borrow the caller's variables.
//! * [`resolve`] – Batch resolution with search up the key namespace.
//! * [`locate`] – Finding the database file for a name and a date.
//! * [`seek`] – Positioning at configuration blocks and date segments.
//! * [`textvars`] – `${name}` substitution in database lines.
//! * [`settings`] – Settings from an optional config file and `DB_*` variables.
//! * [`database`] – A [`database::Database`] tying the pieces together.
//!
//! ## Quick Start
//! ```
//! use calibdb::database::Database;
//! use calibdb::request::{Request, Target};
//! use calibdb::timestamp::parse_reference_date;
//!
//! let text = "L.vdc.nw = 368\nL.vdc.u1.wire_pos = 1.5 2.5\n";
//! let date = parse_reference_date("2020-01-01").unwrap();
//! let mut db = Database::from_text(text, date);
//!
//! let mut nw = 0u32;
//! let mut pos: Vec<f64> = Vec::new();
//! let mut requests = vec![
//!     Request::new("nw", Target::scalar(&mut nw)),
//!     Request::new("wire_pos", Target::vector(&mut pos, 0)),
//! ];
//! db.load(&mut requests, "L.vdc.u1.", -1, "Vdc::Init").unwrap();
//! drop(requests);
//! assert_eq!(nw, 368);
//! assert_eq!(pos, vec![1.5, 2.5]);
//! ```
//!
//! ## Errors
//! Everything fallible returns [`error::Result`]. For callers that speak in
//! integer status codes, [`error::Error::code`] maps each error to one.

pub mod database;
pub mod datatype;
pub mod error;
pub mod line;
pub mod locate;
pub mod request;
pub mod resolve;
pub mod scan;
pub mod seek;
pub mod settings;
pub mod stream;
pub mod textvars;
pub mod timestamp;

pub use database::Database;
pub use error::{Error, Result};
pub use request::{Request, Target};
