//! Typed requests for database values.
//!
//! A [`Request`] names a key (relative to the prefix of the batch it is
//! resolved in) and borrows the caller's variable that receives the value.
//! The kind and shape of that variable decide how the value text is
//! converted:
//!
//! ```
//! use calibdb::request::{Request, Target};
//! let mut nw = 0u32;
//! let mut wire_pos = [0f64; 3];
//! let mut ttd: Vec<Vec<f64>> = Vec::new();
//! let requests = vec![
//!     Request::new("nw", Target::scalar(&mut nw)).describe("number of wires"),
//!     Request::new("wire_pos", Target::array(&mut wire_pos[..])),
//!     Request::new("ttd", Target::matrix(&mut ttd, 4)).optional(),
//! ];
//! assert_eq!(requests.len(), 3);
//! ```

use std::fmt;

use crate::datatype::Arithmetic;

/// How many values a destination holds.
#[derive(Debug)]
pub enum Shape<'a, T> {
    /// Exactly one value.
    Scalar(&'a mut T),
    /// Exactly as many values as the slice is long. A one-element slice is
    /// read like a scalar.
    Array(&'a mut [T]),
    /// Any number of values, unless the expected length is non-zero.
    Vector(&'a mut Vec<T>, usize),
    /// A rectangular matrix with the given number of columns, row-major.
    Matrix(&'a mut Vec<Vec<T>>, usize),
}

impl<T> Shape<'_, T> {
    fn suffix(&self) -> String {
        match self {
            Shape::Scalar(_) => String::new(),
            Shape::Array(a) => format!("[{}]", a.len()),
            Shape::Vector(..) => "V".to_owned(),
            Shape::Matrix(..) => "M".to_owned(),
        }
    }
}

/// The caller's variable that receives a value, by arithmetic kind.
#[derive(Debug)]
pub enum Target<'a> {
    Double(Shape<'a, f64>),
    Float(Shape<'a, f32>),
    Long(Shape<'a, i64>),
    ULong(Shape<'a, u64>),
    Int(Shape<'a, i32>),
    UInt(Shape<'a, u32>),
    Short(Shape<'a, i16>),
    UShort(Shape<'a, u16>),
    Char(Shape<'a, i8>),
    Byte(Shape<'a, u8>),
    /// The raw value text. Only scalar text is supported.
    Text(Shape<'a, String>),
}

/// Arithmetic types that can be the destination of a [`Request`].
pub trait Destination: Arithmetic {
    fn target(shape: Shape<'_, Self>) -> Target<'_>;
}

macro_rules! destination {
    ($($t:ty => $variant:ident),+ $(,)?) => {
        $(
            impl Destination for $t {
                fn target(shape: Shape<'_, $t>) -> Target<'_> {
                    Target::$variant(shape)
                }
            }
        )+
    };
}

destination! {
    f64 => Double,
    f32 => Float,
    i64 => Long,
    u64 => ULong,
    i32 => Int,
    u32 => UInt,
    i16 => Short,
    u16 => UShort,
    i8 => Char,
    u8 => Byte,
}

impl<'a> Target<'a> {
    pub fn scalar<T: Destination>(value: &'a mut T) -> Self {
        T::target(Shape::Scalar(value))
    }
    pub fn array<T: Destination>(values: &'a mut [T]) -> Self {
        T::target(Shape::Array(values))
    }
    /// A vector of any length, or of exactly `expected` values if non-zero.
    pub fn vector<T: Destination>(values: &'a mut Vec<T>, expected: usize) -> Self {
        T::target(Shape::Vector(values, expected))
    }
    pub fn matrix<T: Destination>(values: &'a mut Vec<Vec<T>>, ncols: usize) -> Self {
        T::target(Shape::Matrix(values, ncols))
    }
    pub fn text(value: &'a mut String) -> Self {
        Target::Text(Shape::Scalar(value))
    }

    /// Name of the destination type, for diagnostics: `Double`, `IntV`,
    /// `FloatM`, `Short[4]` and so on.
    pub fn data_type(&self) -> String {
        let (name, suffix) = match self {
            Target::Double(s) => ("Double", s.suffix()),
            Target::Float(s) => ("Float", s.suffix()),
            Target::Long(s) => ("Long", s.suffix()),
            Target::ULong(s) => ("ULong", s.suffix()),
            Target::Int(s) => ("Int", s.suffix()),
            Target::UInt(s) => ("UInt", s.suffix()),
            Target::Short(s) => ("Short", s.suffix()),
            Target::UShort(s) => ("UShort", s.suffix()),
            Target::Char(s) => ("Char", s.suffix()),
            Target::Byte(s) => ("Byte", s.suffix()),
            Target::Text(s) => ("String", s.suffix()),
        };
        format!("{}{}", name, suffix)
    }
}

/// One named, typed database request.
#[derive(Debug)]
pub struct Request<'a> {
    name: String,
    target: Target<'a>,
    optional: bool,
    search: i32,
    description: Option<String>,
}

impl<'a> Request<'a> {
    pub fn new(name: &str, target: Target<'a>) -> Self {
        Self {
            name: name.to_owned(),
            target,
            optional: false,
            search: 0,
            description: None,
        }
    }
    /// A missing optional key is not an error; its destination is left as is.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
    /// Search depth for this request alone, overriding the batch default
    /// when non-zero.
    pub fn search(mut self, search: i32) -> Self {
        self.search = search;
        self
    }
    pub fn describe(mut self, description: &str) -> Self {
        self.description = Some(description.to_owned());
        self
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn target(&self) -> &Target<'a> {
        &self.target
    }
    pub(crate) fn target_mut(&mut self) -> &mut Target<'a> {
        &mut self.target
    }
    pub fn is_optional(&self) -> bool {
        self.optional
    }
    pub fn search_depth(&self) -> i32 {
        self.search
    }
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl fmt::Display for Request<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.target.data_type())?;
        if let Some(d) = &self.description {
            write!(f, ": {}", d)?;
        }
        Ok(())
    }
}
