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
 * Expression evaluator error API
 **************************************************************************************************/
use thiserror::Error;

/// Errors raised while parsing or evaluating an expression.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    /// The expression source failed to parse.
    #[error("cannot parse expression `{src}`: {detail}")]
    Parse { src: String, detail: String },
    /// A `#name` reference has no binding in the context.
    #[error("unknown context variable `{0}`")]
    UnknownVariable(String),
    /// A field path stepped into a record that has no such field.
    #[error("record has no field `{0}`")]
    UnknownField(String),
    /// A call names a function absent from the function table.
    #[error("unknown function `{0}`")]
    UnknownFunction(String),
    /// An operator was applied to operands of the wrong kind.
    #[error("operator `{op}` cannot be applied to {found}")]
    TypeMismatch { op: &'static str, found: &'static str },
    /// Integer division or remainder by zero.
    #[error("division by zero")]
    DivisionByZero,
    /// A list, bit-set or byte-string index was out of bounds.
    #[error("index {0} out of bounds")]
    IndexOutOfBounds(i128),
    /// A condition expression did not produce a boolean.
    #[error("condition did not evaluate to a boolean, got {0}")]
    NotABoolean(&'static str),
    /// A size expression did not produce an integer.
    #[error("size expression did not evaluate to an integer, got {0}")]
    NotAnInteger(&'static str),
    /// A size expression produced a non-positive size.
    #[error("size expression evaluated to non-positive value {0}")]
    InvalidSize(i128),
}
