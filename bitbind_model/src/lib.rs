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
 * bitbind_model crate definition
 *
 * The message-tree value model shared by the bitbind expression evaluator and the bitbind codec
 * core. Decoded messages, evaluator results and converter inputs are all `Value` trees.
 **************************************************************************************************/

//! # BITBIND_MODEL
//!
//! The `bitbind_model` crate provides the dynamic value vocabulary used across the bitbind
//! workspace. A decoded message is a [`Record`]: an ordered set of named [`Value`]s stamped with
//! the [`TypeTag`] of the carrier schema that produced it. The expression evaluator consumes and
//! produces the same `Value` type, so converter, validator and choice-condition plumbing needs no
//! adaptation layers.
//!
//! Integers up to 64 wire bits are held in `Value::Int` (an `i128`, wide enough for any signed or
//! unsigned 64-bit window). Wider windows are held as `Value::Big` arbitrary-precision integers.
//! Bit-set fields are held as `Value::Bits` in most-significant-bit-first order.

pub mod record;
pub mod value;

pub use record::{Record, TypeTag};
pub use value::{Value, ValueError};
