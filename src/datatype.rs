// used to print out readable forms of a data type
use std::fmt;
// used to classify integer parse failures
use std::num::IntErrorKind;

use thiserror::Error;

/// Why a piece of value text could not be turned into the requested values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    #[error("no value")]
    Empty,
    #[error("\"{token}\" is not a valid {data_type}")]
    Syntax {
        token: String,
        data_type: &'static str,
    },
    #[error("\"{token}\" is out of range for {data_type}")]
    OutOfRange {
        token: String,
        data_type: &'static str,
    },
    #[error("{expected} requested, {found} found")]
    Length { expected: usize, found: usize },
    #[error("number of matrix elements ({found}) not evenly divisible by requested number of columns ({ncols})")]
    Ragged { found: usize, ncols: usize },
    #[error("matrix requested with zero columns")]
    NoColumns,
}

impl ConvertError {
    /// True for errors about the number of values rather than their text.
    pub fn is_arity(&self) -> bool {
        matches!(
            self,
            ConvertError::Length { .. } | ConvertError::Ragged { .. } | ConvertError::NoColumns
        )
    }
}

pub trait Arithmetic: fmt::Display + fmt::Debug + Copy + PartialEq + Send + Sync + 'static {
    // static stuff which needs to be implemented downstream
    const UID: u8;
    const DATA_TYPE: &'static str;
    /// Converts one whitespace-free token, rejecting anything that is not
    /// consumed entirely or does not fit the type.
    fn convert(token: &str) -> Result<Self, ConvertError>;
    // instance callable with pre-made implementation
    fn data_type(&self) -> &'static str {
        Self::DATA_TYPE
    }
    fn identifier(&self) -> u8 {
        Self::UID
    }
}

fn integer_error(token: &str, kind: &IntErrorKind, data_type: &'static str) -> ConvertError {
    let token = token.to_owned();
    match kind {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            ConvertError::OutOfRange { token, data_type }
        }
        // A well-formed integer that the destination cannot hold, like -1 for
        // u8, is a range error and not a syntax error. std reports it as
        // InvalidDigit, so the token is tried again as the widest integer.
        _ if token.parse::<i128>().is_ok() => ConvertError::OutOfRange { token, data_type },
        _ => ConvertError::Syntax { token, data_type },
    }
}

// Non-zero digits before the exponent: the text does not denote zero
fn has_nonzero_mantissa(token: &str) -> bool {
    token
        .split(['e', 'E'])
        .next()
        .is_some_and(|m| m.bytes().any(|b| matches!(b, b'1'..=b'9')))
}

// Rust float parsing saturates to infinity instead of reporting overflow
fn is_infinity_literal(token: &str) -> bool {
    let digits = token.trim_start_matches(['+', '-']);
    digits.eq_ignore_ascii_case("inf") || digits.eq_ignore_ascii_case("infinity")
}

macro_rules! integer_type {
    ($($t:ty => ($uid:expr, $name:expr)),+ $(,)?) => {
        $(
            impl Arithmetic for $t {
                const UID: u8 = $uid;
                const DATA_TYPE: &'static str = $name;
                fn convert(token: &str) -> Result<$t, ConvertError> {
                    token
                        .parse::<$t>()
                        .map_err(|e| integer_error(token, e.kind(), Self::DATA_TYPE))
                }
            }
        )+
    };
}

macro_rules! float_type {
    ($($t:ty => ($uid:expr, $name:expr)),+ $(,)?) => {
        $(
            impl Arithmetic for $t {
                const UID: u8 = $uid;
                const DATA_TYPE: &'static str = $name;
                fn convert(token: &str) -> Result<$t, ConvertError> {
                    let value = token.parse::<$t>().map_err(|_| ConvertError::Syntax {
                        token: token.to_owned(),
                        data_type: Self::DATA_TYPE,
                    })?;
                    let overflow = value.is_infinite() && !is_infinity_literal(token);
                    // underflow to zero or into the subnormal range loses precision
                    let underflow = value.is_subnormal() || (value == 0.0 && has_nonzero_mantissa(token));
                    if overflow || underflow {
                        return Err(ConvertError::OutOfRange {
                            token: token.to_owned(),
                            data_type: Self::DATA_TYPE,
                        });
                    }
                    Ok(value)
                }
            }
        )+
    };
}

// ------------- Data Types --------------
float_type! {
    f64 => (1, "Double"),
    f32 => (2, "Float"),
}
integer_type! {
    i64 => (3, "Long"),
    u64 => (4, "ULong"),
    i32 => (5, "Int"),
    u32 => (6, "UInt"),
    i16 => (7, "Short"),
    u16 => (8, "UShort"),
    i8 => (9, "Char"),
    u8 => (10, "Byte"),
}

/// Parses the first whitespace-delimited token of `text`. Anything after
/// that token is not looked at.
pub fn parse_scalar<T: Arithmetic>(text: &str) -> Result<T, ConvertError> {
    let token = text.split_whitespace().next().ok_or(ConvertError::Empty)?;
    T::convert(token)
}

/// Parses every whitespace-delimited token of `text`, in order. Fails as a
/// whole if any single token fails.
pub fn parse_array<T: Arithmetic>(text: &str) -> Result<Vec<T>, ConvertError> {
    let values = text
        .split_whitespace()
        .map(T::convert)
        .collect::<Result<Vec<T>, ConvertError>>()?;
    if values.is_empty() {
        return Err(ConvertError::Empty);
    }
    Ok(values)
}

/// Parses `text` as an array and reshapes it row-major into rows of `ncols`.
pub fn parse_matrix<T: Arithmetic>(text: &str, ncols: usize) -> Result<Vec<Vec<T>>, ConvertError> {
    if ncols == 0 {
        return Err(ConvertError::NoColumns);
    }
    let values = parse_array::<T>(text)?;
    if values.len() % ncols != 0 {
        return Err(ConvertError::Ragged {
            found: values.len(),
            ncols,
        });
    }
    Ok(values.chunks(ncols).map(|row| row.to_vec()).collect())
}
