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
 * Bit-granular writer
 *
 * Mirror of the reader: a growing byte buffer plus a partial-byte cache, with byte-aligned
 * back-patching for checksum fixups.
 **************************************************************************************************/
use bitvec::order::Msb0;
use bitvec::slice::BitSlice;
use num_bigint::BigInt;

use crate::charset::Charset;
use crate::error::{EncodeError, Result};
use crate::numeric::{window_pattern, window_pattern_big, big_bit, ByteOrder};
use crate::utils::within;

#[cfg(feature = "trace")]
use func_trace::trace;

#[cfg(feature = "trace")]
func_trace::init_depth_var!();

/// Bit-granular writer into a growing byte buffer.
///
/// The bit stream produced is the exact mirror of what [`crate::reader::BitReader`] consumes:
/// the first bit written to a fresh byte occupies its least significant position, so writing a
/// sequence of bit fields and reading them back yields the original sequence. `flush` zero-pads
/// the open byte.
#[derive(Debug, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    cache: u8,
    cache_bits: usize,
}

impl BitWriter {
    /// Construct an empty writer.
    pub fn new() -> BitWriter {
        BitWriter::default()
    }

    /// Number of fully flushed bytes so far. A partially filled cache byte is not counted.
    #[inline]
    pub fn position(&self) -> usize {
        self.bytes.len()
    }

    /// `true` when no partial byte is pending.
    #[inline]
    pub fn is_aligned(&self) -> bool {
        self.cache_bits == 0
    }

    /// The flushed part of the output.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Write the low `n` bits of `value` (`n <= 64`), least significant first.
    #[cfg_attr(feature = "trace", trace)]
    pub fn write_bits(&mut self, value: u64, n: usize) {
        debug_assert!(n <= 64);
        let mut taken = 0;
        while taken < n {
            let space = 8 - self.cache_bits;
            let step = (n - taken).min(space);
            let chunk = ((value >> taken) as u8) & low_mask(step);
            self.cache |= chunk << self.cache_bits;
            self.cache_bits += step;
            taken += step;
            if self.cache_bits == 8 {
                self.bytes.push(self.cache);
                self.cache = 0;
                self.cache_bits = 0;
            }
        }
    }

    /// Write a single bit.
    #[inline]
    pub fn write_bit(&mut self, bit: bool) {
        self.write_bits(bit as u64, 1);
    }

    /// Write a bit sequence in order.
    pub fn write_bitset(&mut self, bits: &BitSlice<u8, Msb0>) {
        for b in bits.iter() {
            self.write_bit(*b);
        }
    }

    /// Write one byte.
    #[inline]
    pub fn write_byte(&mut self, b: u8) {
        self.write_bits(b as u64, 8);
    }

    /// Write a run of bytes. Aligned writes append directly; mid-byte writes are bit-packed.
    pub fn write_bytes(&mut self, src: &[u8]) {
        if self.cache_bits == 0 {
            self.bytes.extend_from_slice(src);
        } else {
            for b in src {
                self.write_byte(*b);
            }
        }
    }

    /// Write a `bits`-wide unsigned window under `order`; the exact inverse of the reader's
    /// window assembly.
    pub fn write_unsigned(&mut self, value: u128, bits: u32, order: ByteOrder) {
        debug_assert!((1..=64).contains(&bits));
        match order {
            ByteOrder::Big => {
                let mut left = bits;
                while left > 0 {
                    let w = left.min(8);
                    left -= w;
                    let g = ((value >> left) as u64) & low_mask(w as usize) as u64;
                    self.write_bits(g, w as usize);
                }
            }
            ByteOrder::Little => {
                let mut shift = 0;
                while shift < bits {
                    let w = (bits - shift).min(8);
                    let g = ((value >> shift) as u64) & low_mask(w as usize) as u64;
                    self.write_bits(g, w as usize);
                    shift += w;
                }
            }
        }
    }

    /// Write an integer into a `bits`-wide window (`1..=64`). Values outside the window's
    /// signed or unsigned range are an encode error.
    pub fn write_int(&mut self, value: i128, bits: u32, order: ByteOrder, signed: bool) -> Result<()> {
        let pattern = window_pattern(value, bits, signed)?;
        self.write_unsigned(pattern, bits, order);
        Ok(())
    }

    /// Write an arbitrary-precision integer into a `bits`-wide window (`bits >= 1`).
    pub fn write_big_int(
        &mut self,
        value: &BigInt,
        bits: u64,
        order: ByteOrder,
        signed: bool,
    ) -> Result<()> {
        let pattern = window_pattern_big(value, bits, signed)?;
        let le = pattern.to_bytes_le();
        match order {
            ByteOrder::Big => {
                let mut left = bits;
                while left > 0 {
                    let w = left.min(8);
                    left -= w;
                    let mut g = 0u64;
                    for t in 0..w {
                        g |= big_bit(&le, left + t) << t;
                    }
                    self.write_bits(g, w as usize);
                }
            }
            ByteOrder::Little => {
                let mut shift = 0;
                while shift < bits {
                    let w = (bits - shift).min(8);
                    let mut g = 0u64;
                    for t in 0..w {
                        g |= big_bit(&le, shift + t) << t;
                    }
                    self.write_bits(g, w as usize);
                    shift += w;
                }
            }
        }
        Ok(())
    }

    /// Encode `text` under `charset` and write the bytes.
    pub fn write_text(&mut self, text: &str, charset: Charset) -> Result<()> {
        let bytes = charset.encode(text)?;
        self.write_bytes(&bytes);
        Ok(())
    }

    /// Flush the pending partial byte, zero-padding its unwritten high bits.
    pub fn flush(&mut self) {
        if self.cache_bits > 0 {
            self.bytes.push(self.cache);
            self.cache = 0;
            self.cache_bits = 0;
        }
    }

    /// Overwrite already flushed bytes at `offset`. Used to patch checksum placeholders after
    /// the body is complete.
    #[cfg_attr(feature = "trace", trace)]
    pub fn patch_bytes(&mut self, offset: usize, src: &[u8]) -> Result<()> {
        if !within(&self.bytes, offset, src.len()) {
            return Err(EncodeError::SizeMismatch {
                expected: offset + src.len(),
                actual: self.bytes.len(),
            }
            .into());
        }
        self.bytes[offset..offset + src.len()].copy_from_slice(src);
        Ok(())
    }

    /// Flush and take the finished buffer.
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.flush();
        self.bytes
    }
}

#[inline]
fn low_mask(bits: usize) -> u8 {
    if bits >= 8 {
        0xff
    } else {
        (1u8 << bits) - 1
    }
}

//*************************************************************************************************
// Unit Tests
//*************************************************************************************************
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;
    use crate::reader::BitReader;
    use assert_matches::assert_matches;

    #[test]
    fn bits_round_trip_through_reader() {
        let mut w = BitWriter::new();
        w.write_bits(0b101, 3);
        w.write_bits(0x5a, 8);
        w.write_bits(0b01, 2);
        let bytes = w.into_bytes();
        let mut r = BitReader::new(&bytes);
        assert_eq!(r.read_bits(3).unwrap(), 0b101);
        assert_eq!(r.read_bits(8).unwrap(), 0x5a);
        assert_eq!(r.read_bits(2).unwrap(), 0b01);
    }

    #[test]
    fn aligned_bytes_append_directly() {
        let mut w = BitWriter::new();
        w.write_bytes(&[1, 2, 3]);
        assert_eq!(w.as_bytes(), &[1, 2, 3]);
    }

    #[test]
    fn windows_round_trip_both_orders() {
        for order in [ByteOrder::Big, ByteOrder::Little] {
            for (value, bits) in [(0i128, 1), (1, 1), (-5, 7), (0x1234, 16), (-2, 33), (i64::MIN as i128, 64)] {
                let mut w = BitWriter::new();
                w.write_int(value, bits, order, true).unwrap();
                let bytes = w.into_bytes();
                let mut r = BitReader::new(&bytes);
                assert_eq!(r.read_int(bits, order, true).unwrap(), value, "bits={bits}");
            }
        }
    }

    #[test]
    fn big_endian_multibyte_layout() {
        let mut w = BitWriter::new();
        w.write_int(0x1234, 16, ByteOrder::Big, false).unwrap();
        assert_eq!(w.into_bytes(), vec![0x12, 0x34]);
        let mut w = BitWriter::new();
        w.write_int(0x1234, 16, ByteOrder::Little, false).unwrap();
        assert_eq!(w.into_bytes(), vec![0x34, 0x12]);
    }

    #[test]
    fn out_of_range_is_an_encode_error() {
        let mut w = BitWriter::new();
        assert_matches!(
            w.write_int(128, 8, ByteOrder::Big, true),
            Err(CodecError::Encode(EncodeError::ValueOutOfRange { .. }))
        );
        assert_matches!(
            w.write_int(256, 8, ByteOrder::Big, false),
            Err(CodecError::Encode(EncodeError::ValueOutOfRange { .. }))
        );
        w.write_int(255, 8, ByteOrder::Big, false).unwrap();
    }

    #[test]
    fn big_int_round_trip() {
        let v = (BigInt::from(0x0102030405060708i64) << 64) | BigInt::from(0x1112131415161718i64);
        for order in [ByteOrder::Big, ByteOrder::Little] {
            let mut w = BitWriter::new();
            w.write_big_int(&v, 128, order, false).unwrap();
            let bytes = w.into_bytes();
            assert_eq!(bytes.len(), 16);
            let mut r = BitReader::new(&bytes);
            assert_eq!(r.read_big_int(128, order, false).unwrap(), v);
        }
    }

    #[test]
    fn negative_big_int_round_trip() {
        let v = -(BigInt::from(1) << 70u32);
        let mut w = BitWriter::new();
        w.write_big_int(&v, 72, ByteOrder::Big, true).unwrap();
        let bytes = w.into_bytes();
        let mut r = BitReader::new(&bytes);
        assert_eq!(r.read_big_int(72, ByteOrder::Big, true).unwrap(), v);
    }

    #[test]
    fn patching_rewrites_flushed_bytes() {
        let mut w = BitWriter::new();
        w.write_bytes(&[0, 0, 0, 0]);
        w.patch_bytes(1, &[0xab, 0xcd]).unwrap();
        assert_eq!(w.as_bytes(), &[0, 0xab, 0xcd, 0]);
        assert!(w.patch_bytes(3, &[1, 2]).is_err());
    }

    #[test]
    fn bitset_round_trip() {
        let mut w = BitWriter::new();
        let mut bits = bitvec::vec::BitVec::<u8, Msb0>::new();
        for i in 0..11 {
            bits.push(i % 3 == 0);
        }
        w.write_bitset(&bits);
        let bytes = w.into_bytes();
        let mut r = BitReader::new(&bytes);
        assert_eq!(r.read_bitset(11).unwrap(), bits);
    }
}
