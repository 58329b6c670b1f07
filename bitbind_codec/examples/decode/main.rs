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
 * Decode example
 *
 * Declares a small telemetry frame schema, decodes a wire buffer into a message tree and
 * re-encodes it bit-identically, checksum included.
 **************************************************************************************************/
use std::sync::Arc;

use bitbind_codec::codec::ByteOrder;
use bitbind_codec::debug::print_hex;
use bitbind_codec::error::CodecError;
use bitbind_codec::runtime::{FloatConverter, MessageCodec};
use bitbind_codec::schema::{
    Binding, ChecksumAlgorithm, ChecksumSpec, FieldDef, Header, MessageSchema,
};
use bitbind_codec::{Record, Value};

fn build_codec() -> MessageCodec {
    let mut codec = MessageCodec::new();
    codec.register(
        MessageSchema::new("Sample")
            .field(FieldDef::new("sensor").bind(Binding::unsigned("8", ByteOrder::Big)))
            .field(FieldDef::new("reading").bind(Binding::integer("16", ByteOrder::Big))),
    );
    codec.register(
        MessageSchema::new("Telemetry")
            .header(Header::new(&["tlm"]))
            .field(FieldDef::new("count").bind(Binding::unsigned("8", ByteOrder::Big)))
            .field(
                FieldDef::new("samples")
                    .bind(Binding::object("Sample"))
                    .array("count"),
            )
            // a half-precision battery voltage carried as a 16-bit window
            .field(
                FieldDef::new("battery")
                    .bind(Binding::unsigned("16", ByteOrder::Big))
                    .convert(Arc::new(FloatConverter::f16())),
            )
            .field(FieldDef::new("mean").evaluated("(samples[0].reading + samples[1].reading) / 2"))
            .field(FieldDef::new("crc").checksum(ChecksumSpec::new(ChecksumAlgorithm::Crc16Arc))),
    );
    codec
}

fn main() -> Result<(), CodecError> {
    let codec = build_codec();

    let mut s1 = Record::new("Sample".into());
    s1.set("sensor", Value::Int(1));
    s1.set("reading", Value::Int(-40));
    let mut s2 = Record::new("Sample".into());
    s2.set("sensor", Value::Int(2));
    s2.set("reading", Value::Int(250));

    let mut frame = Record::new("Telemetry".into());
    frame.set("count", Value::Int(2));
    frame.set("samples", Value::List(vec![Value::Record(s1), Value::Record(s2)]));
    frame.set("battery", Value::Float(3.5));

    let bytes = codec.encode(&frame)?;
    println!("encoded frame:");
    print_hex(&bytes);

    let decoded = codec.decode("Telemetry", &bytes)?;
    println!("battery voltage: {:?}", decoded.get("battery"));
    println!("mean reading: {:?}", decoded.get("mean"));

    let again = codec.encode(&decoded)?;
    assert_eq!(bytes, again);
    println!("round trip is bit-identical");
    Ok(())
}
