/***************************************************************************************************
 * Copyright (c) 2021-2023 Qualcomm Innovation Center, Inc. All rights reserved.
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy of this software
 * and associated documentation files (the “Software”), to deal in the Software without
 * restriction, including without limitation the rights to use, copy, modify, merge, publish,
 * distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the
 * Software is furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice (including the next
 * paragraph) shall be included in all copies or substantial portions of the
 * Software.
 *
 * THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING
 * BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
 * NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
 * DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
 **************************************************************************************************/
/***************************************************************************************************
 * bitbind_codec crate definition
 *
 * A declarative, schema-driven binary message codec. Carrier schemas describe, per field, the
 * bits to read or write and how to interpret them; the core composes those descriptions into a
 * fully bidirectional parser/writer between byte streams and in-memory message trees.
 **************************************************************************************************/

//! # BITBIND_CODEC
//!
//! The `bitbind_codec` crate parses and emits byte- and bit-level wire formats described by
//! per-field metadata on carrier schemas. A schema declares, per field, a *binding* (what bits
//! to read/write and how to interpret them) plus optional modifiers: skip directives, object
//! choices for runtime polymorphism, condition-gated converters, validators, array/list
//! wrappers, evaluated (synthetic) fields, post-processing rewrites and a whole-message
//! checksum. The same template drives both directions, bit-exactly.
//!
//! ## Example
//!
//! A one-byte prefix selecting between two concrete record types:
//!
//! ```
//! use bitbind_codec::runtime::MessageCodec;
//! use bitbind_codec::schema::{Binding, FieldDef, Header, MessageSchema, ObjectChoices};
//! use bitbind_codec::codec::ByteOrder;
//! use bitbind_codec::{TypeTag, Value};
//!
//! let mut codec = MessageCodec::new();
//! codec.register(
//!     MessageSchema::new("Short").field(FieldDef::new("value").bind(Binding::integer("16", ByteOrder::Big))),
//! );
//! codec.register(
//!     MessageSchema::new("Long").field(FieldDef::new("value").bind(Binding::integer("32", ByteOrder::Big))),
//! );
//! codec.register(
//!     MessageSchema::new("Frame")
//!         .header(Header::new(&["tc1"]))
//!         .field(FieldDef::new("payload").bind(Binding::object_with(
//!             "Short",
//!             ObjectChoices::prefix(8, ByteOrder::Big)
//!                 .alternative("#prefix == 1", 1, "Short")
//!                 .alternative("#prefix == 2", 2, "Long"),
//!         ))),
//! );
//!
//! let decoded = codec.decode("Frame", &[0x74, 0x63, 0x31, 0x01, 0x12, 0x34]).unwrap();
//! let payload = decoded.get("payload").unwrap().as_record().unwrap();
//! assert_eq!(payload.tag(), &TypeTag::from("Short"));
//! assert_eq!(payload.get("value"), Some(&Value::Int(0x1234)));
//!
//! let bytes = codec.encode(&decoded).unwrap();
//! assert_eq!(bytes, vec![0x74, 0x63, 0x31, 0x01, 0x12, 0x34]);
//! ```

pub(crate) mod binding;
pub(crate) mod charset;
pub(crate) mod checksum;
pub(crate) mod choice;
pub(crate) mod codecs;
pub(crate) mod compose;
pub(crate) mod convert;
mod diag;
pub(crate) mod numeric;
pub(crate) mod parse;
pub(crate) mod reader;
pub(crate) mod registry;
pub(crate) mod schema_def;
pub(crate) mod session;
pub(crate) mod template;
pub(crate) mod utils;
pub(crate) mod writer;

/// The `error` module contains error definitions used throughout `bitbind_codec`.
pub mod error;

pub use bitbind_eval::Context;
pub use bitbind_model::{Record, TypeTag, Value};

use std::sync::Arc;

use crate::error::Result;
use crate::registry::{BindingKind, CodecRegistry, FieldCodec};
use crate::schema_def::{MessageSchema, SchemaRegistry};
use crate::session::Session;
use crate::template::TemplateCache;

/// The `schema` module exports everything needed to declare carriers: bindings, skips,
/// collection wrappers, object choices, headers, checksum specs and the schema builders.
pub mod schema {
    pub use super::binding::{
        Binding, Collection, Evaluated, ObjectChoices, PostProcess, PrefixAlternative, Skip,
        TerminatedAlternative,
    };
    pub use super::charset::Charset;
    pub use super::checksum::{ChecksumAlgorithm, ChecksumSpec};
    pub use super::schema_def::{FieldAnnotation, FieldDef, Header, MessageSchema, SchemaRegistry};
}

/// The `codec` module exports the bit-level reader/writer, the numeric window primitives and
/// the codec dispatch surface used to plug in user codecs.
pub mod codec {
    pub use super::codecs::{
        BitSetCodec, IntegerCodec, ObjectCodec, StringFixedCodec, StringTerminatedCodec,
    };
    pub use super::numeric::{
        big_bit, float_from_bits, float_to_bits, low_mask_u128, sign_extend, sign_extend_big,
        window_pattern, window_pattern_big, ByteOrder,
    };
    pub use super::reader::{BitReader, Snapshot};
    pub use super::registry::{BindingKind, CodecRegistry, FieldCodec};
    pub use super::session::Session;
    pub use super::writer::BitWriter;
}

/// The `runtime` module exports the compiled-template surface and the top-level
/// [`runtime::MessageCodec`] entry point.
pub mod runtime {
    pub use super::choice::{release_prefix, resolve_decode, resolve_encode, PrefixGuard, Resolution};
    pub use super::convert::{
        cast_to, Converter, ConverterChoice, ConverterChoiceSet, FloatConverter, PhysicalKind,
        Validator,
    };
    pub use super::template::{compile, FieldPlan, FieldRole, Template, TemplateCache};
    pub use super::MessageCodec;
}

/// The `debug` module exports hex-dump helpers for wire buffers.
pub mod debug {
    pub use super::diag::{hex_line, print_hex};
}

/// The top-level codec: a schema registry, a codec dispatch table and the compile-once
/// template cache, bundled behind `decode`/`encode` entry points.
///
/// Registration happens in a one-time build phase before parse traffic; the decode and encode
/// calls take `&self` and create a fresh evaluator context per invocation (or borrow one via
/// the `_with` variants when the caller wants to preload variables and functions).
pub struct MessageCodec {
    schemas: SchemaRegistry,
    codecs: CodecRegistry,
    templates: TemplateCache,
}

impl Default for MessageCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageCodec {
    /// A codec with the built-in binding kinds installed.
    pub fn new() -> MessageCodec {
        MessageCodec {
            schemas: SchemaRegistry::new(),
            codecs: CodecRegistry::with_defaults(),
            templates: TemplateCache::new(),
        }
    }

    /// Register a carrier schema.
    pub fn register(&mut self, schema: MessageSchema) -> &mut MessageCodec {
        self.schemas.register(schema);
        self
    }

    /// Register (or override) the codec for a binding kind.
    pub fn register_codec(&mut self, kind: BindingKind, codec: Arc<dyn FieldCodec>) -> &mut MessageCodec {
        self.codecs.register(kind, codec);
        self
    }

    /// Decode a framed message of carrier type `tag` from `input`.
    pub fn decode(&self, tag: impl Into<TypeTag>, input: &[u8]) -> Result<Record> {
        let mut ctx = Context::new();
        self.decode_with(tag, input, &mut ctx)
    }

    /// Decode with a caller-supplied evaluator context (user variables and functions).
    pub fn decode_with(
        &self,
        tag: impl Into<TypeTag>,
        input: &[u8],
        ctx: &mut Context,
    ) -> Result<Record> {
        let tag = tag.into();
        let template = self.templates.get_or_compile(&self.schemas, &self.codecs, &tag)?;
        let mut sess = Session {
            schemas: &self.schemas,
            codecs: &self.codecs,
            templates: &self.templates,
            ctx,
        };
        parse::decode_message(&mut sess, input, &template)
    }

    /// Encode `record` into a framed byte buffer.
    pub fn encode(&self, record: &Record) -> Result<Vec<u8>> {
        let mut ctx = Context::new();
        self.encode_with(record, &mut ctx)
    }

    /// Encode with a caller-supplied evaluator context.
    pub fn encode_with(&self, record: &Record, ctx: &mut Context) -> Result<Vec<u8>> {
        let template =
            self.templates
                .get_or_compile(&self.schemas, &self.codecs, record.tag())?;
        let mut sess = Session {
            schemas: &self.schemas,
            codecs: &self.codecs,
            templates: &self.templates,
            ctx,
        };
        compose::encode_message(&mut sess, &template, record)
    }
}
