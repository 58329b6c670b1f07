/***************************************************************************************************
 * Copyright (c) 2021-2023 Qualcomm Innovation Center, Inc. All rights reserved.
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy of this software
 * and associated documentation files (the “Software”), to deal in the Software without
 * restriction, including without limitation the rights to use, copy, modify, merge, publish,
 * distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the
 * Software is furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all copies or
 * substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING
 * BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
 * NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
 * DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
 **************************************************************************************************/
/***************************************************************************************************
 * Message-tree values
 *
 * The dynamic value type shared by the codec core and the expression evaluator, together with
 * the conversion ladders between `Value` and the Rust primitive types.
 **************************************************************************************************/
use std::convert::TryFrom;

use bitvec::prelude::{BitVec, Msb0};
use num_bigint::BigInt;
use thiserror::Error;

use crate::record::Record;

/// Errors converting `Value` to/from other types.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    /// Attempt to convert a value to an incompatible type.
    #[error("expected a {expected} value, found {found}")]
    IncompatibleType {
        expected: &'static str,
        found: &'static str,
    },
    /// A numeric conversion has overflowed or underflowed.
    #[error("numeric value does not fit the target type")]
    OutOfRange,
}

/// The data type for message-tree values.
///
/// Value representations are as follows:
///
/// - Integers decoded from windows of up to 64 bits are stored as `Int` (an `i128`, so the full
///   unsigned and signed 64-bit ranges fit without a sign split)
/// - Integers decoded from wider windows are stored as `Big` arbitrary-precision integers
/// - Text is held owned; the wire form is produced through the carrier's charset
/// - Bit-set fields are a most-significant-bit-first bit vector
/// - Nested carriers are `Record`s, collections are `List`s of any value kind
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i128),
    Big(BigInt),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Bits(BitVec<u8, Msb0>),
    Record(Record),
    List(Vec<Value>),
}

impl Value {
    /// Short name of the value kind, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Big(_) => "big int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Bits(_) => "bits",
            Value::Record(_) => "record",
            Value::List(_) => "list",
        }
    }

    /// `true` for `Value::Null`.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Coerce to an `i128` if the value is integral and fits.
    pub fn as_int(&self) -> Option<i128> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Big(b) => i128::try_from(b).ok(),
            _ => None,
        }
    }

    /// Coerce to an arbitrary-precision integer if the value is integral.
    pub fn as_big(&self) -> Option<BigInt> {
        match self {
            Value::Int(v) => Some(BigInt::from(*v)),
            Value::Big(b) => Some(b.clone()),
            _ => None,
        }
    }

    /// Coerce to a float. Integral values widen; anything else is `None`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Borrow the string payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the record payload, if any.
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Borrow the list payload, if any.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(vs) => Some(vs),
            _ => None,
        }
    }
}

/***************************************************************************************************
 * Standard Trait Implementations: From value to Value. Always succeeds
 **************************************************************************************************/

/// Convert a bool into Value
impl From<bool> for Value {
    #[inline(always)]
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

/// Convert a u8 into Value
impl From<u8> for Value {
    #[inline(always)]
    fn from(v: u8) -> Self {
        Value::Int(v as i128)
    }
}

/// Convert a u16 into Value
impl From<u16> for Value {
    #[inline(always)]
    fn from(v: u16) -> Self {
        Value::Int(v as i128)
    }
}

/// Convert a u32 into Value
impl From<u32> for Value {
    #[inline(always)]
    fn from(v: u32) -> Self {
        Value::Int(v as i128)
    }
}

/// Convert a u64 into Value
impl From<u64> for Value {
    #[inline(always)]
    fn from(v: u64) -> Self {
        Value::Int(v as i128)
    }
}

/// Convert an i8 into Value
impl From<i8> for Value {
    #[inline(always)]
    fn from(v: i8) -> Self {
        Value::Int(v as i128)
    }
}

/// Convert an i16 into Value
impl From<i16> for Value {
    #[inline(always)]
    fn from(v: i16) -> Self {
        Value::Int(v as i128)
    }
}

/// Convert an i32 into Value
impl From<i32> for Value {
    #[inline(always)]
    fn from(v: i32) -> Self {
        Value::Int(v as i128)
    }
}

/// Convert an i64 into Value
impl From<i64> for Value {
    #[inline(always)]
    fn from(v: i64) -> Self {
        Value::Int(v as i128)
    }
}

/// Convert an i128 into Value
impl From<i128> for Value {
    #[inline(always)]
    fn from(v: i128) -> Self {
        Value::Int(v)
    }
}

/// Convert an f32 into Value
impl From<f32> for Value {
    #[inline(always)]
    fn from(v: f32) -> Self {
        Value::Float(v as f64)
    }
}

/// Convert an f64 into Value
impl From<f64> for Value {
    #[inline(always)]
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

/// Convert an &str into Value. The text is copied.
impl From<&str> for Value {
    #[inline]
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

/// Convert a String into Value
impl From<String> for Value {
    #[inline]
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

/// Convert an &[u8] into Value. The bytes are copied.
impl From<&[u8]> for Value {
    #[inline]
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

/// Convert a Vec<u8> into Value
impl From<Vec<u8>> for Value {
    #[inline]
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

/// Convert a BigInt into Value
impl From<BigInt> for Value {
    #[inline]
    fn from(v: BigInt) -> Self {
        Value::Big(v)
    }
}

/// Convert a bit vector into Value
impl From<BitVec<u8, Msb0>> for Value {
    #[inline]
    fn from(v: BitVec<u8, Msb0>) -> Self {
        Value::Bits(v)
    }
}

/// Convert a Record into Value
impl From<Record> for Value {
    #[inline]
    fn from(v: Record) -> Self {
        Value::Record(v)
    }
}

/// Convert a Vec<Value> into Value
impl From<Vec<Value>> for Value {
    #[inline]
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

/***************************************************************************************************
 * Standard Trait Implementations: Try to convert Value into a value. Always fallible
 **************************************************************************************************/

macro_rules! try_from_int {
    ($ty:ty) => {
        impl TryFrom<&Value> for $ty {
            type Error = ValueError;

            fn try_from(v: &Value) -> Result<Self, Self::Error> {
                match v {
                    Value::Int(i) => <$ty>::try_from(*i).map_err(|_| ValueError::OutOfRange),
                    Value::Big(b) => <$ty>::try_from(b).map_err(|_| ValueError::OutOfRange),
                    other => Err(ValueError::IncompatibleType {
                        expected: "int",
                        found: other.kind(),
                    }),
                }
            }
        }
    };
}

try_from_int!(u8);
try_from_int!(u16);
try_from_int!(u32);
try_from_int!(u64);
try_from_int!(i8);
try_from_int!(i16);
try_from_int!(i32);
try_from_int!(i64);
try_from_int!(i128);

impl TryFrom<&Value> for bool {
    type Error = ValueError;

    fn try_from(v: &Value) -> Result<Self, Self::Error> {
        match v {
            Value::Bool(b) => Ok(*b),
            other => Err(ValueError::IncompatibleType {
                expected: "bool",
                found: other.kind(),
            }),
        }
    }
}

impl TryFrom<&Value> for f64 {
    type Error = ValueError;

    fn try_from(v: &Value) -> Result<Self, Self::Error> {
        v.as_float().ok_or(ValueError::IncompatibleType {
            expected: "float",
            found: v.kind(),
        })
    }
}

impl TryFrom<&Value> for String {
    type Error = ValueError;

    fn try_from(v: &Value) -> Result<Self, Self::Error> {
        match v {
            Value::Str(s) => Ok(s.clone()),
            other => Err(ValueError::IncompatibleType {
                expected: "string",
                found: other.kind(),
            }),
        }
    }
}

impl TryFrom<&Value> for BigInt {
    type Error = ValueError;

    fn try_from(v: &Value) -> Result<Self, Self::Error> {
        v.as_big().ok_or(ValueError::IncompatibleType {
            expected: "int",
            found: v.kind(),
        })
    }
}
