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
 * bitbind_eval crate definition
 *
 * Pure expression evaluator used by the bitbind codec for choice conditions, size expressions
 * and synthetic field values. The grammar is parsed with the Nom parser combinator library.
 **************************************************************************************************/

//! # BITBIND_EVAL
//!
//! A small, side-effect-free expression dialect over [`bitbind_model::Value`] trees. The codec
//! core drives it through three operations on a [`Context`]:
//!
//! - [`Context::evaluate`] — any expression against a root value,
//! - [`Context::evaluate_bool`] — conditions (the empty source is `true`, the literal sources
//!   `true`/`false` short-circuit the engine),
//! - [`Context::evaluate_size`] — size expressions (pure unsigned integer literals bypass the
//!   engine; results must be strictly positive).
//!
//! The reserved variable `#self` names the carrier currently being decoded or encoded; the
//! reserved variable `#prefix` holds the most recent choice prefix. Bare identifiers resolve
//! against the fields of `#self` first and the named context variables second, so `length - 2`
//! and `#self.length - 2` are the same expression.
//!
//! ## Example
//!
//! ```
//! use bitbind_eval::Context;
//! use bitbind_model::{Record, TypeTag, Value};
//!
//! let mut rec = Record::new(TypeTag::from("Frame"));
//! rec.set("count", Value::Int(3));
//! let root = Value::Record(rec);
//!
//! let mut ctx = Context::new();
//! ctx.put("#prefix", Value::Int(1));
//! assert_eq!(ctx.evaluate("count * 2", &root).unwrap(), Value::Int(6));
//! assert!(ctx.evaluate_bool("#prefix == 1", &root).unwrap());
//! assert_eq!(ctx.evaluate_size("count + 1", &root).unwrap(), 4);
//! ```

pub mod ast;
pub mod error;
pub mod eval;
pub(crate) mod parse;

pub use ast::{BinOp, Expr, UnOp};
pub use error::EvaluationError;
pub use eval::Context;

/// Alias for `Result<T, EvaluationError>` used throughout this crate.
pub type Result<T> = std::result::Result<T, EvaluationError>;
