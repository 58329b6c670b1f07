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
 * Property tests: bit-cache equivalence, window round trips, snapshot idempotence and choice
 * determinism over randomized inputs.
 **************************************************************************************************/

use proptest::prelude::*;

use bitbind_codec::codec::{
    low_mask_u128, sign_extend, BitReader, BitWriter, ByteOrder, CodecRegistry, Session,
};
use bitbind_codec::runtime::{release_prefix, resolve_decode, Resolution, TemplateCache};
use bitbind_codec::schema::{ObjectChoices, SchemaRegistry};
use bitbind_codec::{Context, TypeTag, Value};

proptest! {
    #[test]
    fn writing_then_reading_any_bit_sequence_is_lossless(
        bits in proptest::collection::vec(any::<bool>(), 0..1024usize)
    ) {
        let mut w = BitWriter::new();
        for b in &bits {
            w.write_bit(*b);
        }
        let bytes = w.into_bytes();
        let mut r = BitReader::new(&bytes);
        for (i, b) in bits.iter().enumerate() {
            prop_assert_eq!(r.read_bit().unwrap(), *b, "bit {}", i);
        }
    }

    #[test]
    fn any_window_round_trips(
        raw in any::<u64>(),
        bits in 1u32..=64,
        signed in any::<bool>(),
        big_endian in any::<bool>(),
        lead in 0usize..8
    ) {
        let order = if big_endian { ByteOrder::Big } else { ByteOrder::Little };
        let pattern = (raw as u128) & low_mask_u128(bits);
        let value = if signed { sign_extend(pattern, bits) } else { pattern as i128 };

        // a misaligned leader makes the window straddle byte boundaries
        let mut w = BitWriter::new();
        w.write_bits(0b1010_1010, lead);
        w.write_int(value, bits, order, signed).unwrap();
        let bytes = w.into_bytes();

        let mut r = BitReader::new(&bytes);
        r.read_bits(lead).unwrap();
        prop_assert_eq!(r.read_int(bits, order, signed).unwrap(), value);
    }

    #[test]
    fn snapshot_then_restore_is_invisible(
        data in proptest::collection::vec(any::<u8>(), 1..64usize),
        pre in 0usize..512,
        n in 0usize..64
    ) {
        let total = data.len() * 8;
        let pre = pre.min(total).min(64);
        let n = n.min(total - pre);

        let mut r = BitReader::new(&data);
        r.read_bits(pre).unwrap();
        let position = r.position();
        let snap = r.snapshot();
        let first = r.read_bits(n).unwrap();
        r.restore(snap);
        prop_assert_eq!(r.position(), position);
        let second = r.read_bits(n).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn first_true_alternative_is_selected(
        flags in proptest::collection::vec(any::<bool>(), 1..8usize)
    ) {
        let schemas = SchemaRegistry::new();
        let codecs = CodecRegistry::with_defaults();
        let templates = TemplateCache::new();
        let mut ctx = Context::new();
        let mut sess = Session {
            schemas: &schemas,
            codecs: &codecs,
            templates: &templates,
            ctx: &mut ctx,
        };

        let mut choices = ObjectChoices::prefix(0, ByteOrder::Big);
        for (i, flag) in flags.iter().enumerate() {
            let cond = if *flag { "true" } else { "false" };
            choices = choices.alternative(cond, i as u64, format!("T{}", i));
        }

        let mut reader = BitReader::new(&[]);
        let expected = flags.iter().position(|f| *f);
        match resolve_decode(&mut sess, &mut reader, &choices, &Value::Null) {
            Ok((Resolution::Type(tag), guard)) => {
                release_prefix(&mut sess, guard);
                let want = expected.expect("a type resolved, so some condition must hold");
                prop_assert_eq!(tag, TypeTag::from(format!("T{}", want).as_str()));
            }
            Ok((Resolution::EndOfList, _)) => prop_assert!(false, "prefix sets never end lists"),
            Err(_) => prop_assert!(expected.is_none(), "resolution failed with a true condition"),
        }
    }
}
