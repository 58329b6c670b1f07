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
 * Whole-message checksum fields: literal check values, record-frame round trips and mismatch
 * detection.
 **************************************************************************************************/

use assert_matches::assert_matches;

use bitbind_codec::codec::ByteOrder;
use bitbind_codec::error::{ChecksumError, CodecError, DataError};
use bitbind_codec::runtime::{MessageCodec, Validator};
use bitbind_codec::schema::{
    Binding, ChecksumAlgorithm, ChecksumSpec, FieldDef, Header, MessageSchema,
};
use bitbind_codec::{Record, Value};

#[test]
fn stored_crc16_arc_verifies_against_the_standard_check_value() {
    let mut codec = MessageCodec::new();
    codec.register(
        MessageSchema::new("CrcMsg")
            .header(Header::new(&["mg"]))
            .field(FieldDef::new("body").bind(Binding::string("9")))
            .field(FieldDef::new("crc").checksum(ChecksumSpec::new(ChecksumAlgorithm::Crc16Arc))),
    );

    // CRC-16/ARC("123456789") == 0xbb3d
    let mut input = b"mg123456789".to_vec();
    input.extend_from_slice(&[0xbb, 0x3d]);
    let rec = codec.decode("CrcMsg", &input).unwrap();
    assert_eq!(rec.get("body"), Some(&Value::Str("123456789".to_string())));
    assert_eq!(rec.get("crc"), Some(&Value::Int(0xbb3d)));

    // encode recomputes and patches the same bytes
    let mut out = Record::new("CrcMsg".into());
    out.set("body", Value::Str("123456789".to_string()));
    assert_eq!(codec.encode(&out).unwrap(), input);
}

#[test]
fn little_endian_checksum_storage() {
    let mut codec = MessageCodec::new();
    codec.register(
        MessageSchema::new("CrcLe")
            .header(Header::new(&["le"]))
            .field(FieldDef::new("body").bind(Binding::string("9")))
            .field(FieldDef::new("crc").checksum(
                ChecksumSpec::new(ChecksumAlgorithm::Crc16Arc).with_order(ByteOrder::Little),
            )),
    );
    let mut input = b"le123456789".to_vec();
    input.extend_from_slice(&[0x3d, 0xbb]);
    let rec = codec.decode("CrcLe", &input).unwrap();
    assert_eq!(rec.get("crc"), Some(&Value::Int(0xbb3d)));

    let mut out = Record::new("CrcLe".into());
    out.set("body", Value::Str("123456789".to_string()));
    assert_eq!(codec.encode(&out).unwrap(), input);
}

struct IsZero;
impl Validator for IsZero {
    fn is_valid(&self, value: &Value) -> bool {
        value.as_int() == Some(0)
    }
}

/// A telematics-style frame: four preamble zero bytes and a length, both outside the
/// checksummed span, then codec id, record count, records and a trailing count, all covered
/// by a CRC-16/ARC.
fn frame_codec() -> MessageCodec {
    let mut codec = MessageCodec::new();
    codec.register(
        MessageSchema::new("AvlRecord")
            .field(FieldDef::new("timestamp").bind(Binding::unsigned("32", ByteOrder::Big)))
            .field(FieldDef::new("priority").bind(Binding::unsigned("8", ByteOrder::Big)))
            .field(FieldDef::new("value").bind(Binding::integer("16", ByteOrder::Big))),
    );
    codec.register(
        MessageSchema::new("RecordFrame")
            .header(Header::new(&["frm"]))
            .field(
                FieldDef::new("preamble")
                    .bind(Binding::unsigned("32", ByteOrder::Big))
                    .validate(std::sync::Arc::new(IsZero)),
            )
            .field(FieldDef::new("length").bind(Binding::unsigned("32", ByteOrder::Big)))
            .field(FieldDef::new("codec_id").bind(Binding::unsigned("8", ByteOrder::Big)))
            .field(FieldDef::new("count").bind(Binding::unsigned("8", ByteOrder::Big)))
            .field(
                FieldDef::new("records")
                    .bind(Binding::object("AvlRecord"))
                    .array("count"),
            )
            .field(FieldDef::new("count2").bind(Binding::unsigned("8", ByteOrder::Big)))
            .field(FieldDef::new("crc").checksum(
                // preamble and length sit outside the span
                ChecksumSpec::new(ChecksumAlgorithm::Crc16Arc).with_skips(8, 0),
            )),
    );
    codec
}

fn sample_frame() -> Record {
    let mut r1 = Record::new("AvlRecord".into());
    r1.set("timestamp", Value::Int(0x1122_3344));
    r1.set("priority", Value::Int(1));
    r1.set("value", Value::Int(-17));
    let mut r2 = Record::new("AvlRecord".into());
    r2.set("timestamp", Value::Int(0x1122_3355));
    r2.set("priority", Value::Int(0));
    r2.set("value", Value::Int(2600));

    let mut frame = Record::new("RecordFrame".into());
    frame.set("preamble", Value::Int(0));
    frame.set("length", Value::Int(17));
    frame.set("codec_id", Value::Int(8));
    frame.set("count", Value::Int(2));
    frame.set("records", Value::List(vec![Value::Record(r1), Value::Record(r2)]));
    frame.set("count2", Value::Int(2));
    frame
}

#[test]
fn frame_round_trips_bit_identically() {
    let codec = frame_codec();
    let frame = sample_frame();

    let bytes = codec.encode(&frame).unwrap();
    // header + preamble + length + codec id + count + 2*(4+1+2) records + count + crc
    assert_eq!(bytes.len(), 3 + 4 + 4 + 1 + 1 + 14 + 1 + 2);

    let decoded = codec.decode("RecordFrame", &bytes).unwrap();
    for field in ["preamble", "length", "codec_id", "count", "records", "count2"] {
        assert_eq!(decoded.get(field), frame.get(field), "field {field}");
    }

    // decode-then-encode reproduces the original buffer, checksum included
    let again = codec.encode(&decoded).unwrap();
    assert_eq!(again, bytes);
}

#[test]
fn flipping_a_covered_byte_is_a_checksum_error() {
    let codec = frame_codec();
    let bytes = codec.encode(&sample_frame()).unwrap();

    // every byte of the covered span must be load-bearing
    let count_at = 3 + 8 + 1;
    let span = 3 + 8..bytes.len() - 2;
    for i in span {
        let mut corrupted = bytes.clone();
        corrupted[i] ^= 0x01;
        let err = codec.decode("RecordFrame", &corrupted).unwrap_err();
        if i == count_at {
            // flipping the record count breaks the structure before verification
            continue;
        }
        let CodecError::Field { source, .. } = err else {
            panic!("expected field context at byte {i}");
        };
        assert_matches!(
            *source,
            CodecError::Checksum(ChecksumError::Mismatch { .. }),
            "byte {}",
            i
        );
    }
}

#[test]
fn validator_rejection_is_a_data_error() {
    let codec = frame_codec();
    let mut bytes = codec.encode(&sample_frame()).unwrap();
    // corrupt the preamble, which the validator pins to zero (outside the crc span)
    bytes[3] = 0xff;
    let err = codec.decode("RecordFrame", &bytes).unwrap_err();
    let CodecError::Field { source, .. } = err else {
        panic!("expected field context");
    };
    assert_matches!(*source, CodecError::Data(DataError::Rejected { .. }));
}

#[test]
fn stored_checksum_mismatch_reports_both_values() {
    let mut codec = MessageCodec::new();
    codec.register(
        MessageSchema::new("CrcMsg")
            .header(Header::new(&["mg"]))
            .field(FieldDef::new("body").bind(Binding::string("9")))
            .field(FieldDef::new("crc").checksum(ChecksumSpec::new(ChecksumAlgorithm::Crc16Arc))),
    );
    let mut input = b"mg123456789".to_vec();
    input.extend_from_slice(&[0xbb, 0x3e]);
    let err = codec.decode("CrcMsg", &input).unwrap_err();
    let CodecError::Field { source, .. } = err else {
        panic!("expected field context");
    };
    assert_matches!(
        *source,
        CodecError::Checksum(ChecksumError::Mismatch {
            computed: 0xbb3d,
            stored: 0xbb3e
        })
    );
}
