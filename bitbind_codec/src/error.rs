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
 * bitbind codec Error API
 **************************************************************************************************/
use thiserror::Error;

use bitbind_eval::EvaluationError;
use bitbind_model::TypeTag;

use crate::registry::BindingKind;

/// An alias for Result<T, CodecError> used throughout this crate.
pub type Result<T> = std::result::Result<T, CodecError>;

/// Top-level error taxonomy. Every decode/encode failure bubbles one of these; errors raised
/// while working on a specific field are wrapped in [`CodecError::Field`] so the carrier type
/// and field name travel with the cause.
#[derive(Error, Debug)]
pub enum CodecError {
    /// Carrier metadata is inconsistent. Raised at template compile time, never during a
    /// later decode of the same template.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// No object-choice alternative matched.
    #[error(transparent)]
    Choice(#[from] ChoiceError),
    /// The input bytes cannot be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// A value cannot be written under its declared binding.
    #[error(transparent)]
    Encode(#[from] EncodeError),
    /// A validator rejected a decoded value.
    #[error(transparent)]
    Data(#[from] DataError),
    /// The computed checksum differs from the stored one.
    #[error(transparent)]
    Checksum(#[from] ChecksumError),
    /// The expression evaluator failed.
    #[error("expression evaluation failed: {0}")]
    Evaluation(#[from] EvaluationError),
    /// Context wrapper naming the carrier and field where the inner error was raised.
    #[error("in carrier `{carrier}`, field `{field}`: {source}")]
    Field {
        carrier: TypeTag,
        field: String,
        #[source]
        source: Box<CodecError>,
    },
}

impl CodecError {
    /// Wrap an error with the carrier/field it was raised in. Errors already carrying field
    /// context (from a nested carrier) are kept as-is.
    pub fn in_field(self, carrier: &TypeTag, field: &str) -> CodecError {
        match self {
            already @ CodecError::Field { .. } => already,
            other => CodecError::Field {
                carrier: carrier.clone(),
                field: field.to_string(),
                source: Box::new(other),
            },
        }
    }
}

/// Carrier metadata is inconsistent: bad annotation order, duplicate checksum, empty field
/// schedule, unresolved codec, invalid charset, bad size expression.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("carrier `{0}` is not registered")]
    UnknownCarrier(TypeTag),
    #[error("carrier `{carrier}`, field `{field}`: {reason}")]
    AnnotationOrder {
        carrier: TypeTag,
        field: String,
        reason: &'static str,
    },
    #[error("carrier `{0}` declares more than one checksum field")]
    DuplicateChecksum(TypeTag),
    #[error("carrier `{0}` has no wire-bearing fields")]
    EmptySchedule(TypeTag),
    #[error("no codec registered for binding kind {0:?}")]
    UnresolvedCodec(BindingKind),
    #[error("codec invoked with a mismatched binding kind {0:?}")]
    BindingMismatch(BindingKind),
    #[error("unknown charset label `{0}`")]
    UnknownCharset(String),
    #[error("size {size} is outside 1..={max}")]
    SizeBounds { size: u64, max: u64 },
    #[error("carrier `{carrier}`: header start marker `{marker}` does not encode under the header charset")]
    BadStartMarker { carrier: TypeTag, marker: String },
    #[error("carrier `{0}` has no header and cannot be decoded standalone")]
    MissingHeader(TypeTag),
    #[error("size expression evaluated to an invalid size: {0}")]
    InvalidSize(#[source] EvaluationError),
}

/// No matching alternative and no default, or an encode-time type not mappable to a prefix.
#[derive(Error, Debug)]
pub enum ChoiceError {
    #[error("no object-choice alternative matched and no default type is declared")]
    NoAlternative,
    #[error("no object-choice alternative declares runtime type `{0}`")]
    NoPrefixForType(TypeTag),
}

/// Reader underflow, size mismatch, charset decode failure.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("input underflow: needed {needed} more bit(s) at byte {at}")]
    Underflow { needed: usize, at: usize },
    #[error("input does not begin with any declared start marker")]
    HeaderMismatch,
    #[error("input does not end with the declared end marker")]
    TrailerMismatch,
    #[error("terminator byte {0:#04x} not found before end of input")]
    TerminatorNotFound(u8),
    #[error("byte sequence is not valid under charset `{0}`")]
    Charset(&'static str),
}

/// Size mismatch (array length vs declared size), writer invariants broken.
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("value {value} does not fit in a {bits}-bit {signedness} window")]
    ValueOutOfRange {
        value: String,
        bits: u64,
        signedness: &'static str,
    },
    #[error("declared size is {expected} but the value has size {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("field `{0}` is missing from the carrier")]
    MissingField(String),
    #[error("a {expected} value is required here, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("operation requires a byte-aligned writer position")]
    NotByteAligned,
    #[error("text cannot be encoded under charset `{0}`")]
    Charset(&'static str),
}

/// A value failed user-facing data checks: a validator rejected it, or it cannot cross the
/// cast step into a converter's declared physical kind.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("validator rejected the {kind} value of field `{field}`")]
    Rejected { field: String, kind: &'static str },
    #[error("cannot cast a {found} value to the converter's {expected} side")]
    Cast {
        expected: &'static str,
        found: &'static str,
    },
}

/// Computed checksum differs from the stored checksum.
#[derive(Error, Debug)]
pub enum ChecksumError {
    #[error("checksum mismatch: computed {computed:#x}, stored {stored:#x}")]
    Mismatch { computed: u64, stored: u64 },
}
