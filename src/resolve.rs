//! Resolution of request batches against a namespace prefix.
//!
//! Keys are namespaced with dots: a detector `L.vdc` with a plane `u1` looks
//! up its parameters with the prefix `"L.vdc.u1."`. When a key is missing at
//! that level, the lookup may retry higher up the name tree, so parameters
//! shared by all planes can be given once as `L.vdc.nw` instead of per plane.
//!
//! The search depth decides how far up the retry goes:
//! * `0`: no retry.
//! * negative `-n`: at most `n` levels up from the prefix.
//! * positive `n`: up to and including level `n`, where the top level (empty
//!   prefix) is 1, `"L."` is 2 and so on. With prefix `"L.vdc.u1."` and
//!   search 1 the keys tried are `L.vdc.u1.nw`, `L.vdc.nw`, `L.nw`, `nw`.

use std::io::{BufRead, Seek};

use chrono::NaiveDateTime;
use tracing::{debug, error};

use crate::datatype::{parse_array, parse_matrix, parse_scalar, Arithmetic, ConvertError};
use crate::error::{Error, Result};
use crate::request::{Request, Shape, Target};
use crate::scan::{conversion_error, load_value, Substitute};
use crate::stream::DatabaseFile;

/// Removes the last level from a prefix: `"L.vdc."` becomes `"L."`, and
/// `"L."` becomes empty. Returns the number of dots left, which is zero
/// for an empty or malformed prefix (which is then cleared).
pub fn chop_prefix(prefix: &mut String) -> usize {
    let parent = prefix.strip_suffix('.').unwrap_or(prefix.as_str()).rfind('.');
    if let Some(pos) = parent {
        prefix.truncate(pos + 1);
        return prefix.matches('.').count();
    }
    prefix.clear();
    0
}

/// Label used in diagnostics, combining a method name and an object prefix:
/// `scope_label("Init", "L.vdc.")` is `("L.vdc")::Init`, and
/// `scope_label("Vdc::Init", "L.vdc.")` is `Vdc("L.vdc")::Init`.
pub fn scope_label(method: &str, prefix: &str) -> String {
    if prefix.is_empty() {
        return method.to_owned();
    }
    let full = format!("(\"{}\")", prefix.strip_suffix('.').unwrap_or(prefix));
    match method.find("::") {
        Some(pos) => format!("{}{}{}", &method[..pos], full, &method[pos..]),
        None => format!("{}::{}", full, method),
    }
}

/// Per-call state of a resolution: where the call came from, the prefix of
/// the outermost batch, and the text substitution to apply.
pub struct ResolutionContext<'v> {
    here: String,
    scope: Option<String>,
    depth: u32,
    vars: Option<&'v dyn Substitute>,
}

impl<'v> ResolutionContext<'v> {
    pub fn new(here: &str) -> Self {
        Self {
            here: here.to_owned(),
            scope: None,
            depth: 0,
            vars: None,
        }
    }
    pub fn with_substitution(mut self, vars: &'v dyn Substitute) -> Self {
        self.vars = Some(vars);
        self
    }
    pub fn here(&self) -> &str {
        &self.here
    }
    pub fn vars(&self) -> Option<&'v dyn Substitute> {
        self.vars
    }
    /// Label for diagnostics, see [`scope_label`].
    pub fn label(&self) -> String {
        scope_label(&self.here, self.scope.as_deref().unwrap_or(""))
    }
    fn enter(&mut self, prefix: &str) {
        if self.depth == 0 {
            self.scope = Some(prefix.to_owned());
        }
        self.depth += 1;
    }
    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 {
            self.scope = None;
        }
    }
}

fn length_error(key: &str, expected: usize, found: usize) -> Error {
    Error::ArityMismatch {
        key: key.to_owned(),
        source: ConvertError::Length { expected, found },
    }
}

fn unsupported(key: &str, target: &Target<'_>) -> Error {
    Error::UnsupportedType {
        key: key.to_owned(),
        data_type: target.data_type(),
    }
}

// Converts `text` into the shape's destination. Nothing is written unless
// the whole value converts and has the right number of elements.
fn assign<T: Arithmetic>(key: &str, text: &str, shape: &mut Shape<'_, T>) -> Result<()> {
    let convert = |e| conversion_error(key, text, e);
    match shape {
        Shape::Scalar(value) => **value = parse_scalar(text).map_err(convert)?,
        Shape::Array(values) if values.is_empty() => {
            return Err(Error::InvalidRequest(format!("empty destination array for key = {}", key)));
        }
        Shape::Array(values) if values.len() == 1 => values[0] = parse_scalar(text).map_err(convert)?,
        Shape::Array(values) => {
            let parsed = parse_array::<T>(text).map_err(convert)?;
            if parsed.len() != values.len() {
                return Err(length_error(key, values.len(), parsed.len()));
            }
            values.copy_from_slice(&parsed);
        }
        Shape::Vector(values, expected) => {
            let parsed = parse_array::<T>(text).map_err(convert)?;
            if *expected > 0 && parsed.len() != *expected {
                return Err(length_error(key, *expected, parsed.len()));
            }
            **values = parsed;
        }
        Shape::Matrix(values, ncols) => **values = parse_matrix(text, *ncols).map_err(convert)?,
    }
    Ok(())
}

/// Looks up `key` and stores its value in `target`. Returns false if the
/// key has no value at `date`; the target is then untouched.
pub fn load_target<R: BufRead + Seek>(
    file: &mut DatabaseFile<R>,
    date: &NaiveDateTime,
    key: &str,
    target: &mut Target<'_>,
    vars: Option<&dyn Substitute>,
) -> Result<bool> {
    if let Target::Text(shape) = &*target {
        if !matches!(shape, Shape::Scalar(_)) {
            return Err(unsupported(key, target));
        }
    }
    let Some(text) = load_value(file, date, key, vars)? else {
        return Ok(false);
    };
    match target {
        Target::Double(shape) => assign(key, &text, shape)?,
        Target::Float(shape) => assign(key, &text, shape)?,
        Target::Long(shape) => assign(key, &text, shape)?,
        Target::ULong(shape) => assign(key, &text, shape)?,
        Target::Int(shape) => assign(key, &text, shape)?,
        Target::UInt(shape) => assign(key, &text, shape)?,
        Target::Short(shape) => assign(key, &text, shape)?,
        Target::UShort(shape) => assign(key, &text, shape)?,
        Target::Char(shape) => assign(key, &text, shape)?,
        Target::Byte(shape) => assign(key, &text, shape)?,
        Target::Text(Shape::Scalar(value)) => **value = text,
        Target::Text(_) => return Err(unsupported(key, target)),
    }
    Ok(true)
}

// Resolves a single request, walking up the name tree while the key is
// missing and the search depth allows it.
fn resolve_one<R: BufRead + Seek>(
    file: &mut DatabaseFile<R>,
    date: &NaiveDateTime,
    request: &mut Request<'_>,
    index: usize,
    prefix: &str,
    search: i32,
    ctx: &ResolutionContext<'_>,
) -> Result<()> {
    // per-item search level overrides the batch one
    let mut search = if request.search_depth() != 0 {
        request.search_depth()
    } else {
        search
    };
    let mut level_prefix = prefix.to_owned();
    let first_key = format!("{}{}", prefix, request.name());
    loop {
        let key = format!("{}{}", level_prefix, request.name());
        if load_target(file, date, &key, request.target_mut(), ctx.vars())? {
            debug!(scope = %ctx.label(), key = %key, "loaded database key");
            return Ok(());
        }
        if search == 0 || level_prefix.is_empty() {
            break;
        }
        let level = chop_prefix(&mut level_prefix) + 1;
        if search < 0 {
            search += 1;
        } else if level < search as usize {
            break;
        }
    }
    if request.is_optional() {
        return Ok(());
    }
    Err(Error::MissingRequired {
        index,
        key: first_key,
        description: request.description().map(str::to_owned),
    })
}

/// Loads every request in `requests` from `file`, with keys formed as
/// `prefix + name`. Missing keys are retried higher up the name tree as far
/// as `search` (or a request's own search depth) allows.
///
/// Stops at the first failure: a missing required key reports its 1-based
/// position in `requests`; conversion, arity and type errors are returned
/// as they are. Every failure is also logged with the scope label of `ctx`.
pub fn load_database<R: BufRead + Seek>(
    file: &mut DatabaseFile<R>,
    date: &NaiveDateTime,
    requests: &mut [Request<'_>],
    prefix: &str,
    search: i32,
    ctx: &mut ResolutionContext<'_>,
) -> Result<()> {
    ctx.enter(prefix);
    let mut outcome = Ok(());
    for (i, request) in requests.iter_mut().enumerate() {
        if let Err(e) = resolve_one(file, date, request, i + 1, prefix, search, ctx) {
            error!(scope = %ctx.label(), request = %request, "{}", e);
            outcome = Err(e);
            break;
        }
    }
    ctx.leave();
    outcome
}
