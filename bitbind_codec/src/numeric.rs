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
 * Numeric codec primitives
 *
 * Value-level arithmetic shared by the bit reader and writer: sign reconstruction for bit
 * windows, window range checks, and IEEE float conversions including the half-precision lane.
 **************************************************************************************************/
use half::f16;
use num_bigint::{BigInt, BigUint};

use crate::error::{EncodeError, Result};

/// Byte order of a multi-byte integer window on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    Big,
    Little,
}

/// Mask with the low `bits` bits set.
#[inline]
pub fn low_mask_u128(bits: u32) -> u128 {
    if bits >= 128 {
        u128::MAX
    } else {
        (1u128 << bits) - 1
    }
}

/// Reinterpret an unsigned `bits`-wide window as a signed value: when the window's top bit is
/// set the result is the two's-complement negative, `u - 2^bits`.
#[inline]
pub fn sign_extend(u: u128, bits: u32) -> i128 {
    debug_assert!((1..=64).contains(&bits));
    if (u >> (bits - 1)) & 1 == 1 {
        u as i128 - (1i128 << bits)
    } else {
        u as i128
    }
}

/// Arbitrary-precision flavor of [`sign_extend`]; with `signed` false the magnitude passes
/// through unchanged.
pub fn sign_extend_big(u: BigUint, bits: u64, signed: bool) -> BigInt {
    if signed && u.bit(bits - 1) {
        BigInt::from(u) - (BigInt::from(1) << bits)
    } else {
        BigInt::from(u)
    }
}

/// Check that `value` fits a `bits`-wide window and return its two's-complement bit pattern.
///
/// Signed windows accept `[-2^(bits-1), 2^(bits-1) - 1]`; unsigned windows accept
/// `[0, 2^bits - 1]`.
pub fn window_pattern(value: i128, bits: u32, signed: bool) -> Result<u128> {
    debug_assert!((1..=64).contains(&bits));
    let ok = if signed {
        let half = 1i128 << (bits - 1);
        (-half..half).contains(&value)
    } else {
        value >= 0 && (value as u128) <= low_mask_u128(bits)
    };
    if !ok {
        return Err(EncodeError::ValueOutOfRange {
            value: value.to_string(),
            bits: bits as u64,
            signedness: signedness(signed),
        }
        .into());
    }
    Ok((value as u128) & low_mask_u128(bits))
}

/// Arbitrary-precision flavor of [`window_pattern`]. The result is the window's bit pattern as
/// an unsigned magnitude.
pub fn window_pattern_big(value: &BigInt, bits: u64, signed: bool) -> Result<BigUint> {
    let one = BigInt::from(1);
    let ok = if signed {
        let half = &one << (bits - 1);
        value >= &(-&half) && value < &half
    } else {
        value >= &BigInt::default() && value < &(&one << bits)
    };
    if !ok {
        return Err(EncodeError::ValueOutOfRange {
            value: value.to_string(),
            bits,
            signedness: signedness(signed),
        }
        .into());
    }
    let pattern = if value.sign() == num_bigint::Sign::Minus {
        (&one << bits) + value
    } else {
        value.clone()
    };
    // non-negative after wrapping
    Ok(pattern.to_biguint().unwrap_or_default())
}

fn signedness(signed: bool) -> &'static str {
    if signed {
        "signed"
    } else {
        "unsigned"
    }
}

/// Extract bit `i` of a little-endian byte rendering of a big unsigned magnitude.
#[inline]
pub fn big_bit(le_bytes: &[u8], i: u64) -> u64 {
    let byte = (i / 8) as usize;
    if byte >= le_bytes.len() {
        0
    } else {
        ((le_bytes[byte] >> (i % 8)) & 1) as u64
    }
}

/***************************************************************************************************
 * IEEE float windows
 **************************************************************************************************/

/// Interpret the low `width` bits of `pattern` as an IEEE float. Supported widths are 16, 32
/// and 64.
pub fn float_from_bits(pattern: u64, width: u32) -> Option<f64> {
    match width {
        16 => Some(f16::from_bits(pattern as u16).to_f64()),
        32 => Some(f32::from_bits(pattern as u32) as f64),
        64 => Some(f64::from_bits(pattern)),
        _ => None,
    }
}

/// Produce the IEEE bit pattern of `value` at `width` bits. Supported widths are 16, 32 and 64;
/// narrowing follows the usual rounding rules.
pub fn float_to_bits(value: f64, width: u32) -> Option<u64> {
    match width {
        16 => Some(f16::from_f64(value).to_bits() as u64),
        32 => Some((value as f32).to_bits() as u64),
        64 => Some(value.to_bits()),
        _ => None,
    }
}
