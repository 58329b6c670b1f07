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
 * Built-in codecs
 *
 * One codec per built-in binding kind. Each handles exactly one element; collection wrappers
 * are unrolled by the template parser/composer.
 **************************************************************************************************/
use bitbind_model::Value;

use crate::binding::Binding;
use crate::choice::{self, Resolution};
use crate::error::{ChoiceError, EncodeError, Result, SchemaError};
use crate::parse;
use crate::compose;
use crate::reader::BitReader;
use crate::registry::FieldCodec;
use crate::session::Session;
use crate::writer::BitWriter;

fn mismatch(binding: &Binding) -> crate::error::CodecError {
    SchemaError::BindingMismatch(binding.kind()).into()
}

/// Codec for integer windows of 1..=128 bits. Windows up to 64 bits decode to `Value::Int`;
/// wider windows decode to `Value::Big`.
pub struct IntegerCodec;

impl FieldCodec for IntegerCodec {
    fn decode(
        &self,
        sess: &mut Session<'_>,
        reader: &mut BitReader<'_>,
        binding: &Binding,
        root: &Value,
    ) -> Result<Value> {
        let Binding::Integer { size, order, signed } = binding else {
            return Err(mismatch(binding));
        };
        let bits = sess.eval_size(size, root)?;
        if bits > 128 {
            return Err(SchemaError::SizeBounds { size: bits, max: 128 }.into());
        }
        if bits <= 64 {
            Ok(Value::Int(reader.read_int(bits as u32, *order, *signed)?))
        } else {
            Ok(Value::Big(reader.read_big_int(bits, *order, *signed)?))
        }
    }

    fn encode(
        &self,
        sess: &mut Session<'_>,
        writer: &mut BitWriter,
        binding: &Binding,
        root: &Value,
        value: &Value,
    ) -> Result<()> {
        let Binding::Integer { size, order, signed } = binding else {
            return Err(mismatch(binding));
        };
        let bits = sess.eval_size(size, root)?;
        if bits > 128 {
            return Err(SchemaError::SizeBounds { size: bits, max: 128 }.into());
        }
        if bits <= 64 {
            let v = value.as_int().ok_or(EncodeError::TypeMismatch {
                expected: "int",
                found: value.kind(),
            })?;
            writer.write_int(v, bits as u32, *order, *signed)
        } else {
            let v = value.as_big().ok_or(EncodeError::TypeMismatch {
                expected: "int",
                found: value.kind(),
            })?;
            writer.write_big_int(&v, bits, *order, *signed)
        }
    }
}

/// Codec for raw bit vectors.
pub struct BitSetCodec;

impl FieldCodec for BitSetCodec {
    fn decode(
        &self,
        sess: &mut Session<'_>,
        reader: &mut BitReader<'_>,
        binding: &Binding,
        root: &Value,
    ) -> Result<Value> {
        let Binding::BitSet { size } = binding else {
            return Err(mismatch(binding));
        };
        let bits = sess.eval_size(size, root)?;
        Ok(Value::Bits(reader.read_bitset(bits as usize)?))
    }

    fn encode(
        &self,
        sess: &mut Session<'_>,
        writer: &mut BitWriter,
        binding: &Binding,
        root: &Value,
        value: &Value,
    ) -> Result<()> {
        let Binding::BitSet { size } = binding else {
            return Err(mismatch(binding));
        };
        let bits = sess.eval_size(size, root)? as usize;
        let Value::Bits(bv) = value else {
            return Err(EncodeError::TypeMismatch {
                expected: "bits",
                found: value.kind(),
            }
            .into());
        };
        if bv.len() != bits {
            return Err(EncodeError::SizeMismatch {
                expected: bits,
                actual: bv.len(),
            }
            .into());
        }
        writer.write_bitset(bv);
        Ok(())
    }
}

/// Codec for fixed-size text runs.
pub struct StringFixedCodec;

impl FieldCodec for StringFixedCodec {
    fn decode(
        &self,
        sess: &mut Session<'_>,
        reader: &mut BitReader<'_>,
        binding: &Binding,
        root: &Value,
    ) -> Result<Value> {
        let Binding::StringFixed { size, charset } = binding else {
            return Err(mismatch(binding));
        };
        let n = sess.eval_count(size, root)?;
        Ok(Value::Str(reader.read_text(n as usize, *charset)?))
    }

    fn encode(
        &self,
        sess: &mut Session<'_>,
        writer: &mut BitWriter,
        binding: &Binding,
        root: &Value,
        value: &Value,
    ) -> Result<()> {
        let Binding::StringFixed { size, charset } = binding else {
            return Err(mismatch(binding));
        };
        let n = sess.eval_count(size, root)? as usize;
        let text = value.as_str().ok_or(EncodeError::TypeMismatch {
            expected: "string",
            found: value.kind(),
        })?;
        let bytes = charset.encode(text)?;
        if bytes.len() != n {
            return Err(EncodeError::SizeMismatch {
                expected: n,
                actual: bytes.len(),
            }
            .into());
        }
        writer.write_bytes(&bytes);
        Ok(())
    }
}

/// Codec for terminated text runs.
pub struct StringTerminatedCodec;

impl FieldCodec for StringTerminatedCodec {
    fn decode(
        &self,
        _sess: &mut Session<'_>,
        reader: &mut BitReader<'_>,
        binding: &Binding,
        _root: &Value,
    ) -> Result<Value> {
        let Binding::StringTerminated {
            terminator,
            consume,
            charset,
        } = binding
        else {
            return Err(mismatch(binding));
        };
        Ok(Value::Str(reader.read_text_until(
            *terminator,
            *charset,
            *consume,
        )?))
    }

    fn encode(
        &self,
        _sess: &mut Session<'_>,
        writer: &mut BitWriter,
        binding: &Binding,
        _root: &Value,
        value: &Value,
    ) -> Result<()> {
        let Binding::StringTerminated {
            terminator,
            consume,
            charset,
        } = binding
        else {
            return Err(mismatch(binding));
        };
        let text = value.as_str().ok_or(EncodeError::TypeMismatch {
            expected: "string",
            found: value.kind(),
        })?;
        writer.write_bytes(&charset.encode(text)?);
        // a terminator left unconsumed on decode belongs to the next field on encode too
        if *consume {
            writer.write_byte(*terminator);
        }
        Ok(())
    }
}

/// Codec for nested carriers, monomorphic or resolved through an object-choice set.
pub struct ObjectCodec;

impl FieldCodec for ObjectCodec {
    fn decode(
        &self,
        sess: &mut Session<'_>,
        reader: &mut BitReader<'_>,
        binding: &Binding,
        root: &Value,
    ) -> Result<Value> {
        let Binding::Object { declared, choices } = binding else {
            return Err(mismatch(binding));
        };
        match choices {
            None => {
                let template = sess.template(declared)?;
                Ok(Value::Record(parse::decode_record(sess, reader, &template)?))
            }
            Some(ch) => {
                let (resolution, guard) = choice::resolve_decode(sess, reader, ch, root)?;
                let tag = match resolution {
                    Resolution::Type(t) => t,
                    Resolution::EndOfList => {
                        choice::release_prefix(sess, guard);
                        return Err(ChoiceError::NoAlternative.into());
                    }
                };
                // #prefix stays bound while the selected carrier decodes
                let result = parse::decode_object_of(sess, reader, &tag);
                choice::release_prefix(sess, guard);
                result
            }
        }
    }

    fn encode(
        &self,
        sess: &mut Session<'_>,
        writer: &mut BitWriter,
        binding: &Binding,
        _root: &Value,
        value: &Value,
    ) -> Result<()> {
        let Binding::Object { declared, choices } = binding else {
            return Err(mismatch(binding));
        };
        let rec = value.as_record().ok_or(EncodeError::TypeMismatch {
            expected: "record",
            found: value.kind(),
        })?;
        match choices {
            None => {
                let template = sess.template(declared)?;
                compose::encode_record(sess, writer, &template, rec)
            }
            Some(ch) => {
                if let Some((prefix, bits, order)) = choice::resolve_encode(ch, rec.tag())? {
                    writer.write_unsigned(prefix as u128, bits, order);
                }
                let template = sess.template(rec.tag())?;
                compose::encode_record(sess, writer, &template, rec)
            }
        }
    }
}
