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
 * Bit-granular reader
 *
 * Primitive bit-level input over a contiguous byte region. Owns the read cursor, the
 * partial-byte cache and snapshot state.
 **************************************************************************************************/
use std::borrow::Cow;

use num_bigint::{BigInt, BigUint};

use crate::charset::Charset;
use crate::error::{DecodeError, Result};
use crate::numeric::{sign_extend, sign_extend_big, ByteOrder};
use crate::utils::div_ceil;

#[cfg(feature = "trace")]
use func_trace::trace;

#[cfg(feature = "trace")]
func_trace::init_depth_var!();

/// An opaque reader marker capturing cursor and cache, for restoration.
///
/// Snapshots are plain copies, so any number may be held and restored in any order; the
/// terminator-peek protocol only ever needs one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pos: usize,
    cache: u8,
    cache_bits: usize,
}

/// Bit-granular reader over a byte slice.
///
/// The reader maintains a partial-byte cache `(cache, cache_bits)` with `cache_bits` in `0..=8`.
/// Bit requests are served from the least significant end of the cache; a freshly loaded byte is
/// consumed least-significant-bit first. Reading whole bytes with an empty cache bypasses the
/// cache and yields raw stream bytes.
#[derive(Debug)]
pub struct BitReader<'buf> {
    bytes: &'buf [u8],
    pos: usize,
    cache: u8,
    cache_bits: usize,
}

impl<'buf> BitReader<'buf> {
    /// Construct a reader over `bytes` with the cursor at the start.
    pub fn new(bytes: &'buf [u8]) -> BitReader<'buf> {
        BitReader {
            bytes,
            pos: 0,
            cache: 0,
            cache_bits: 0,
        }
    }

    /// The full underlying byte region, independent of the cursor.
    #[inline]
    pub fn source(&self) -> &'buf [u8] {
        self.bytes
    }

    /// Number of unread bits left in the stream, cache included.
    #[inline]
    pub fn remaining_bits(&self) -> usize {
        (self.bytes.len() - self.pos) * 8 + self.cache_bits
    }

    /// Byte-aligned cursor offset (lower bound: a partially consumed byte still counts as
    /// unread).
    #[inline]
    pub fn position(&self) -> usize {
        self.pos - div_ceil(self.cache_bits, 8)
    }

    /// Move the cursor to the byte offset `to`, discarding any cached bits.
    pub fn seek(&mut self, to: usize) -> Result<()> {
        if to > self.bytes.len() {
            return Err(DecodeError::Underflow {
                needed: (to - self.bytes.len()) * 8,
                at: self.bytes.len(),
            }
            .into());
        }
        self.pos = to;
        self.cache = 0;
        self.cache_bits = 0;
        Ok(())
    }

    /// Capture the cursor and cache for later restoration.
    #[inline]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            pos: self.pos,
            cache: self.cache,
            cache_bits: self.cache_bits,
        }
    }

    /// Restore a previously captured snapshot.
    #[inline]
    pub fn restore(&mut self, snap: Snapshot) {
        self.pos = snap.pos;
        self.cache = snap.cache;
        self.cache_bits = snap.cache_bits;
    }

    fn underflow(&self, requested: usize) -> DecodeError {
        DecodeError::Underflow {
            needed: requested - self.remaining_bits(),
            at: self.position(),
        }
    }

    /// Read `n` bits (`0..=64`), accumulated least-significant-bit first: the first bit off the
    /// stream lands in bit 0 of the result.
    #[cfg_attr(feature = "trace", trace)]
    pub fn read_bits(&mut self, n: usize) -> Result<u64> {
        debug_assert!(n <= 64);
        if n > self.remaining_bits() {
            return Err(self.underflow(n).into());
        }
        let mut out: u64 = 0;
        let mut taken = 0;
        while taken < n {
            if self.cache_bits == 0 {
                self.cache = self.bytes[self.pos];
                self.pos += 1;
                self.cache_bits = 8;
            }
            let step = (n - taken).min(self.cache_bits);
            let chunk = (self.cache & low_mask(step)) as u64;
            out |= chunk << taken;
            // cache >>= step would shift by 8 on a full-byte take
            self.cache = (self.cache as u16 >> step) as u8;
            self.cache_bits -= step;
            taken += step;
        }
        Ok(out)
    }

    /// Read a single bit.
    #[inline]
    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? != 0)
    }

    /// Read `n` bits into a bit vector, in stream order.
    pub fn read_bitset(&mut self, n: usize) -> Result<bitvec::vec::BitVec<u8, bitvec::order::Msb0>> {
        if n > self.remaining_bits() {
            return Err(self.underflow(n).into());
        }
        let mut out = bitvec::vec::BitVec::with_capacity(n);
        for _ in 0..n {
            out.push(self.read_bit()?);
        }
        Ok(out)
    }

    /// Read one byte.
    #[inline]
    pub fn read_byte(&mut self) -> Result<u8> {
        Ok(self.read_bits(8)? as u8)
    }

    /// Read `n` bytes. With an empty cache this borrows straight from the input; mid-byte it
    /// falls back to bit-packed reads.
    pub fn read_bytes(&mut self, n: usize) -> Result<Cow<'buf, [u8]>> {
        if n * 8 > self.remaining_bits() {
            return Err(self.underflow(n * 8).into());
        }
        if self.cache_bits == 0 {
            let out = &self.bytes[self.pos..self.pos + n];
            self.pos += n;
            return Ok(Cow::Borrowed(out));
        }
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(self.read_byte()?);
        }
        Ok(Cow::Owned(out))
    }

    /// Discard `n` bits.
    pub fn skip_bits(&mut self, n: u64) -> Result<()> {
        let n = n as usize;
        if n > self.remaining_bits() {
            return Err(self.underflow(n).into());
        }
        let from_cache = n.min(self.cache_bits);
        self.cache = (self.cache as u16 >> from_cache) as u8;
        self.cache_bits -= from_cache;
        let rest = n - from_cache;
        self.pos += rest / 8;
        if rest % 8 != 0 {
            self.read_bits(rest % 8)?;
        }
        Ok(())
    }

    /// Read an `bits`-wide unsigned window (`bits <= 64` after accounting for the accumulator)
    /// under `order`. Big-endian windows assemble the first-read byte group as the most
    /// significant; the trailing group holds `bits % 8` bits when the width is not a whole
    /// number of bytes. Little-endian windows assemble each group at its stream offset.
    pub fn read_unsigned(&mut self, bits: u32, order: ByteOrder) -> Result<u128> {
        debug_assert!((1..=64).contains(&bits));
        if bits as usize > self.remaining_bits() {
            return Err(self.underflow(bits as usize).into());
        }
        let mut acc: u128 = 0;
        match order {
            ByteOrder::Big => {
                let mut left = bits;
                while left > 0 {
                    let w = left.min(8);
                    let g = self.read_bits(w as usize)?;
                    acc = (acc << w) | g as u128;
                    left -= w;
                }
            }
            ByteOrder::Little => {
                let mut shift = 0;
                while shift < bits {
                    let w = (bits - shift).min(8);
                    let g = self.read_bits(w as usize)?;
                    acc |= (g as u128) << shift;
                    shift += w;
                }
            }
        }
        Ok(acc)
    }

    /// Read an integer from a `bits`-wide window (`1..=64`), sign-extended when `signed`.
    #[cfg_attr(feature = "trace", trace)]
    pub fn read_int(&mut self, bits: u32, order: ByteOrder, signed: bool) -> Result<i128> {
        let u = self.read_unsigned(bits, order)?;
        Ok(if signed {
            sign_extend(u, bits)
        } else {
            u as i128
        })
    }

    /// Read an arbitrary-precision integer from a `bits`-wide window (`bits >= 1`).
    pub fn read_big_int(&mut self, bits: u64, order: ByteOrder, signed: bool) -> Result<BigInt> {
        debug_assert!(bits >= 1);
        if bits as usize > self.remaining_bits() {
            return Err(self.underflow(bits as usize).into());
        }
        let mut acc = BigUint::default();
        match order {
            ByteOrder::Big => {
                let mut left = bits;
                while left > 0 {
                    let w = left.min(8);
                    let g = self.read_bits(w as usize)?;
                    acc = (acc << w) | BigUint::from(g);
                    left -= w;
                }
            }
            ByteOrder::Little => {
                let mut shift = 0;
                while shift < bits {
                    let w = (bits - shift).min(8);
                    let g = self.read_bits(w as usize)?;
                    acc |= BigUint::from(g) << shift;
                    shift += w;
                }
            }
        }
        Ok(sign_extend_big(acc, bits, signed))
    }

    /// Read `n` bytes and decode them as text under `charset`.
    pub fn read_text(&mut self, n: usize, charset: Charset) -> Result<String> {
        let bytes = self.read_bytes(n)?;
        charset.decode(&bytes)
    }

    /// Read and decode text up to the terminator byte. The terminator is never part of the
    /// text; `consume` controls whether the cursor moves past it.
    pub fn read_text_until(&mut self, term: u8, charset: Charset, consume: bool) -> Result<String> {
        let mut out = Vec::new();
        loop {
            if self.remaining_bits() < 8 {
                return Err(DecodeError::TerminatorNotFound(term).into());
            }
            let snap = self.snapshot();
            let b = self.read_byte()?;
            if b == term {
                if !consume {
                    self.restore(snap);
                }
                break;
            }
            out.push(b);
        }
        charset.decode(&out)
    }

    /// Peek text up to (but not including) the terminator byte; the cursor does not move. An
    /// exhausted stream peeks as the empty string.
    pub fn read_text_until_no_consume(&mut self, term: u8, charset: Charset) -> Result<String> {
        let snap = self.snapshot();
        let scanned = self.scan_until(term);
        self.restore(snap);
        charset.decode(&scanned?)
    }

    fn scan_until(&mut self, term: u8) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        loop {
            if self.remaining_bits() < 8 {
                if out.is_empty() {
                    return Ok(out);
                }
                return Err(DecodeError::TerminatorNotFound(term).into());
            }
            let b = self.read_byte()?;
            if b == term {
                return Ok(out);
            }
            out.push(b);
        }
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
