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
 * Field modifiers end to end: skips, evaluated fields, post-processing, converters, bit sets,
 * expression-driven sizes, headers and user-registered codecs.
 **************************************************************************************************/

use std::sync::Arc;

use assert_matches::assert_matches;
use bitvec::prelude::{BitVec, Msb0};

use bitbind_codec::codec::{BindingKind, BitReader, BitWriter, ByteOrder, FieldCodec, Session};
use bitbind_codec::error::{CodecError, DataError, Result, SchemaError};
use bitbind_codec::runtime::{Converter, FloatConverter, MessageCodec};
use bitbind_codec::schema::{Binding, FieldDef, Header, MessageSchema};
use bitbind_codec::{Context, Record, Value};

#[test]
fn skips_discard_on_decode_and_pad_on_encode() {
    let mut codec = MessageCodec::new();
    codec.register(
        MessageSchema::new("S")
            .header(Header::new(&["s"]))
            .field(
                FieldDef::new("v")
                    .skip_bits("8")
                    .bind(Binding::unsigned("8", ByteOrder::Big)),
            )
            .field(
                FieldDef::new("w")
                    .skip_until(b':', true)
                    .bind(Binding::unsigned("8", ByteOrder::Big)),
            ),
    );
    let input = [b's', 0xff, 0x2a, b'x', b'y', b':', 0x07];
    let rec = codec.decode("S", &input).unwrap();
    assert_eq!(rec.get("v"), Some(&Value::Int(0x2a)));
    assert_eq!(rec.get("w"), Some(&Value::Int(0x07)));

    // skipped regions re-encode as zero padding and the bare terminator
    let out = codec.encode(&rec).unwrap();
    assert_eq!(out, vec![b's', 0x00, 0x2a, b':', 0x07]);
}

#[test]
fn evaluated_fields_observe_all_wire_fields() {
    let mut codec = MessageCodec::new();
    codec.register(
        MessageSchema::new("E")
            .header(Header::new(&["e"]))
            .field(FieldDef::new("a").bind(Binding::unsigned("8", ByteOrder::Big)))
            .field(FieldDef::new("b").bind(Binding::unsigned("8", ByteOrder::Big)))
            .field(FieldDef::new("sum").evaluated("a + b"))
            .field(FieldDef::new("label").evaluated("'v' + name")),
    );
    let mut ctx = Context::new();
    ctx.put("name", Value::Str("1".to_string()));
    let rec = codec.decode_with("E", &[b'e', 2, 3], &mut ctx).unwrap();
    assert_eq!(rec.get("sum"), Some(&Value::Int(5)));
    assert_eq!(rec.get("label"), Some(&Value::Str("v1".to_string())));

    // synthetic fields produce no bytes
    assert_eq!(codec.encode(&rec).unwrap(), vec![b'e', 2, 3]);
}

#[test]
fn expression_sizes_read_earlier_fields() {
    let mut codec = MessageCodec::new();
    codec.register(
        MessageSchema::new("L")
            .header(Header::new(&["l"]))
            .field(FieldDef::new("len").bind(Binding::unsigned("8", ByteOrder::Big)))
            .field(FieldDef::new("data").bind(Binding::string("len - 1"))),
    );
    let rec = codec.decode("L", &[b'l', 4, b'a', b'b', b'c']).unwrap();
    assert_eq!(rec.get("data"), Some(&Value::Str("abc".to_string())));
}

#[test]
fn post_process_rewrites_in_both_directions() {
    let mut codec = MessageCodec::new();
    codec.register(
        MessageSchema::new("P")
            .header(Header::new(&["p"]))
            .field(FieldDef::new("flag").bind(Binding::unsigned("8", ByteOrder::Big)))
            .field(
                FieldDef::new("v")
                    .bind(Binding::unsigned("8", ByteOrder::Big))
                    .post_process("flag == 1", "v + 100", "v - 100"),
            ),
    );
    let rec = codec.decode("P", &[b'p', 1, 5]).unwrap();
    assert_eq!(rec.get("v"), Some(&Value::Int(105)));
    assert_eq!(codec.encode(&rec).unwrap(), vec![b'p', 1, 5]);

    // condition false: the value passes through untouched
    let rec = codec.decode("P", &[b'p', 0, 5]).unwrap();
    assert_eq!(rec.get("v"), Some(&Value::Int(5)));
    assert_eq!(codec.encode(&rec).unwrap(), vec![b'p', 0, 5]);
}

struct TimesTen;
impl Converter for TimesTen {
    fn decode(&self, physical: Value) -> Result<Value> {
        Ok(Value::Int(physical.as_int().unwrap_or(0) * 10))
    }
    fn encode(&self, logical: Value) -> Result<Value> {
        Ok(Value::Int(logical.as_int().unwrap_or(0) / 10))
    }
}

struct Negate;
impl Converter for Negate {
    fn decode(&self, physical: Value) -> Result<Value> {
        Ok(Value::Int(-physical.as_int().unwrap_or(0)))
    }
    fn encode(&self, logical: Value) -> Result<Value> {
        Ok(Value::Int(-logical.as_int().unwrap_or(0)))
    }
}

#[test]
fn converter_choices_gate_on_conditions() {
    let mut codec = MessageCodec::new();
    codec.register(
        MessageSchema::new("C")
            .header(Header::new(&["c"]))
            .field(FieldDef::new("mode").bind(Binding::unsigned("8", ByteOrder::Big)))
            .field(
                FieldDef::new("v")
                    .bind(Binding::unsigned("8", ByteOrder::Big))
                    .convert_if("mode == 1", Arc::new(Negate))
                    .convert(Arc::new(TimesTen)),
            ),
    );
    // mode 1 picks the gated converter
    let rec = codec.decode("C", &[b'c', 1, 5]).unwrap();
    assert_eq!(rec.get("v"), Some(&Value::Int(-5)));
    assert_eq!(codec.encode(&rec).unwrap(), vec![b'c', 1, 5]);

    // any other mode falls back to the default
    let rec = codec.decode("C", &[b'c', 0, 5]).unwrap();
    assert_eq!(rec.get("v"), Some(&Value::Int(50)));
    assert_eq!(codec.encode(&rec).unwrap(), vec![b'c', 0, 5]);
}

#[test]
fn float_converters_map_integer_windows_end_to_end() {
    let mut codec = MessageCodec::new();
    codec.register(
        MessageSchema::new("Fl")
            .header(Header::new(&["fl"]))
            .field(
                FieldDef::new("temp")
                    .bind(Binding::unsigned("32", ByteOrder::Big))
                    .convert(Arc::new(FloatConverter::f32())),
            )
            .field(
                FieldDef::new("battery")
                    .bind(Binding::unsigned("16", ByteOrder::Big))
                    .convert(Arc::new(FloatConverter::f16())),
            ),
    );
    // 12.5 is 0x41480000 in single precision; 1.5 is 0x3e00 in half precision
    let input = [b'f', b'l', 0x41, 0x48, 0x00, 0x00, 0x3e, 0x00];
    let rec = codec.decode("Fl", &input).unwrap();
    assert_eq!(rec.get("temp"), Some(&Value::Float(12.5)));
    assert_eq!(rec.get("battery"), Some(&Value::Float(1.5)));
    assert_eq!(codec.encode(&rec).unwrap(), input);

    // the logical side stays a float when the record is built by hand
    let mut out = Record::new("Fl".into());
    out.set("temp", Value::Float(12.5));
    out.set("battery", Value::Float(1.5));
    assert_eq!(codec.encode(&out).unwrap(), input);
}

#[test]
fn mismatched_converter_kind_is_a_data_error() {
    let mut codec = MessageCodec::new();
    codec.register(
        MessageSchema::new("Bad")
            .header(Header::new(&["bd"]))
            .field(
                FieldDef::new("s")
                    .bind(Binding::string_terminated(b',', true))
                    .convert(Arc::new(FloatConverter::f32())),
            ),
    );
    // the string codec's value cannot cross the cast step into the converter's int side
    let err = codec.decode("Bad", b"bdxy,").unwrap_err();
    let CodecError::Field { source, .. } = err else {
        panic!("expected field context");
    };
    assert_matches!(
        *source,
        CodecError::Data(DataError::Cast {
            expected: "int",
            found: "string"
        })
    );
}

#[test]
fn bitset_fields_round_trip() {
    let mut codec = MessageCodec::new();
    codec.register(
        MessageSchema::new("B")
            .header(Header::new(&["b"]))
            .field(FieldDef::new("flags").bind(Binding::bits("12")))
            .field(FieldDef::new("tail").bind(Binding::unsigned("4", ByteOrder::Big))),
    );
    let input = [b'b', 0b1010_0110, 0b1111_0101];
    let rec = codec.decode("B", &input).unwrap();
    let Value::Bits(flags) = rec.get("flags").unwrap() else {
        panic!("expected a bit vector");
    };
    assert_eq!(flags.len(), 12);
    let mut expected = BitVec::<u8, Msb0>::new();
    let mut r = BitReader::new(&input[1..]);
    for _ in 0..12 {
        expected.push(r.read_bit().unwrap());
    }
    assert_eq!(flags, &expected);
    assert_eq!(codec.encode(&rec).unwrap(), input);
}

#[test]
fn multiple_start_markers_match_longest_first() {
    let mut codec = MessageCodec::new();
    codec.register(
        MessageSchema::new("H")
            .header(Header::new(&["aa", "aab"]))
            .field(FieldDef::new("v").bind(Binding::unsigned("8", ByteOrder::Big))),
    );
    // "aab" prefixes the input, so the longer marker wins and 0x07 is the field byte
    let rec = codec.decode("H", &[b'a', b'a', b'b', 0x07]).unwrap();
    assert_eq!(rec.get("v"), Some(&Value::Int(0x07)));
    // the shorter marker still frames other messages
    let rec = codec.decode("H", &[b'a', b'a', 0x63]).unwrap();
    assert_eq!(rec.get("v"), Some(&Value::Int(0x63)));
    // encode always uses the first declared marker
    assert_eq!(codec.encode(&rec).unwrap(), vec![b'a', b'a', 0x63]);
}

#[test]
fn end_markers_are_verified_and_emitted() {
    let mut codec = MessageCodec::new();
    codec.register(
        MessageSchema::new("H")
            .header(Header::new(&["h"]).with_end("$"))
            .field(FieldDef::new("v").bind(Binding::unsigned("8", ByteOrder::Big))),
    );
    let rec = codec.decode("H", &[b'h', 0x07, b'$']).unwrap();
    assert_eq!(codec.encode(&rec).unwrap(), vec![b'h', 0x07, b'$']);
    assert_matches!(
        codec.decode("H", &[b'h', 0x07, b'!']),
        Err(CodecError::Decode(_))
    );
}

#[test]
fn headerless_carriers_cannot_be_decoded_standalone() {
    let mut codec = MessageCodec::new();
    codec.register(
        MessageSchema::new("Bare")
            .field(FieldDef::new("v").bind(Binding::unsigned("8", ByteOrder::Big))),
    );
    assert_matches!(
        codec.decode("Bare", &[1]),
        Err(CodecError::Schema(SchemaError::MissingHeader(_)))
    );
    assert_matches!(
        codec.decode("Nope", &[1]),
        Err(CodecError::Schema(SchemaError::UnknownCarrier(_)))
    );
}

#[test]
fn nested_objects_decode_in_place() {
    let mut codec = MessageCodec::new();
    codec.register(
        MessageSchema::new("Point")
            .field(FieldDef::new("x").bind(Binding::integer("16", ByteOrder::Big)))
            .field(FieldDef::new("y").bind(Binding::integer("16", ByteOrder::Big))),
    );
    codec.register(
        MessageSchema::new("Shape")
            .header(Header::new(&["sh"]))
            .field(FieldDef::new("origin").bind(Binding::object("Point")))
            .field(FieldDef::new("size").bind(Binding::unsigned("8", ByteOrder::Big))),
    );
    let input = [b's', b'h', 0x00, 0x10, 0xff, 0xf0, 3];
    let rec = codec.decode("Shape", &input).unwrap();
    let origin = rec.get("origin").unwrap().as_record().unwrap();
    assert_eq!(origin.get("x"), Some(&Value::Int(0x10)));
    assert_eq!(origin.get("y"), Some(&Value::Int(-16)));
    assert_eq!(codec.encode(&rec).unwrap(), input);
}

/// Three little-endian bytes exposed as one unsigned value.
struct U24Codec;
impl FieldCodec for U24Codec {
    fn decode(
        &self,
        _sess: &mut Session<'_>,
        reader: &mut BitReader<'_>,
        _binding: &Binding,
        _root: &Value,
    ) -> Result<Value> {
        Ok(Value::Int(reader.read_int(24, ByteOrder::Little, false)?))
    }
    fn encode(
        &self,
        _sess: &mut Session<'_>,
        writer: &mut BitWriter,
        _binding: &Binding,
        _root: &Value,
        value: &Value,
    ) -> Result<()> {
        writer.write_int(value.as_int().unwrap_or(0), 24, ByteOrder::Little, false)
    }
}

#[test]
fn user_codecs_register_under_custom_kinds() {
    let mut codec = MessageCodec::new();
    codec.register_codec(BindingKind::Custom("u24".to_string()), Arc::new(U24Codec));
    codec.register(
        MessageSchema::new("M")
            .header(Header::new(&["m"]))
            .field(FieldDef::new("v").bind(Binding::custom("u24", Value::Null))),
    );
    let rec = codec.decode("M", &[b'm', 0x01, 0x02, 0x03]).unwrap();
    assert_eq!(rec.get("v"), Some(&Value::Int(0x030201)));
    assert_eq!(codec.encode(&rec).unwrap(), vec![b'm', 0x01, 0x02, 0x03]);
}

#[test]
fn user_context_variables_parameterize_sizes() {
    let mut codec = MessageCodec::new();
    codec.register(
        MessageSchema::new("V")
            .header(Header::new(&["v"]))
            .field(
                FieldDef::new("items")
                    .bind(Binding::unsigned("8", ByteOrder::Big))
                    .array("limit"),
            ),
    );
    let mut ctx = Context::new();
    ctx.put("limit", Value::Int(3));
    let rec = codec.decode_with("V", &[b'v', 1, 2, 3], &mut ctx).unwrap();
    assert_eq!(
        rec.get("items"),
        Some(&Value::List(vec![
            Value::Int(1),
            Value::Int(2),
            Value::Int(3)
        ]))
    );
}

#[test]
fn failed_decode_never_leaks_a_partial_carrier() {
    let mut codec = MessageCodec::new();
    codec.register(
        MessageSchema::new("F")
            .header(Header::new(&["f"]))
            .field(FieldDef::new("a").bind(Binding::unsigned("8", ByteOrder::Big)))
            .field(FieldDef::new("b").bind(Binding::unsigned("32", ByteOrder::Big))),
    );
    let result: std::result::Result<Record, _> = codec.decode("F", &[b'f', 1, 2]);
    assert!(result.is_err());
}
