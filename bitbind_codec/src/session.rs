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
 * Decode/encode session state
 *
 * One `Session` spans one top-level decode or encode invocation: the registries, the template
 * cache and the evaluator context scope. Nested carriers share the session; reserved context
 * variables are layered with save/restore around each nesting level.
 **************************************************************************************************/
use std::sync::Arc;

use bitbind_eval::{Context, EvaluationError};
use bitbind_model::{TypeTag, Value};

use crate::error::{CodecError, Result, SchemaError};
use crate::registry::{BindingKind, CodecRegistry, FieldCodec};
use crate::schema_def::SchemaRegistry;
use crate::template::{Template, TemplateCache};

/// Borrowed state for one decode/encode invocation.
pub struct Session<'a> {
    pub schemas: &'a SchemaRegistry,
    pub codecs: &'a CodecRegistry,
    pub templates: &'a TemplateCache,
    pub ctx: &'a mut Context,
}

impl<'a> Session<'a> {
    /// Evaluate a strictly positive size expression (bit widths, skip sizes of bindings that
    /// cannot be empty). Non-positive results are schema errors.
    pub fn eval_size(&self, src: &str, root: &Value) -> Result<u64> {
        self.ctx.evaluate_size(src, root).map_err(|e| match e {
            EvaluationError::InvalidSize(_) => CodecError::Schema(SchemaError::InvalidSize(e)),
            other => CodecError::Evaluation(other),
        })
    }

    /// Evaluate a non-negative count expression (string byte sizes, array lengths, skip
    /// widths). Zero is a legal count; negative results are schema errors.
    pub fn eval_count(&self, src: &str, root: &Value) -> Result<u64> {
        let trimmed = src.trim();
        if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = trimmed.parse::<u64>() {
                return Ok(n);
            }
        }
        let v = self.ctx.evaluate(src, root)?;
        let n = match &v {
            Value::Int(_) | Value::Big(_) => v.as_int(),
            Value::Str(text) => text.trim().parse::<i128>().ok(),
            _ => None,
        }
        .ok_or(CodecError::Evaluation(EvaluationError::NotAnInteger(
            v.kind(),
        )))?;
        if n < 0 {
            return Err(SchemaError::InvalidSize(EvaluationError::InvalidSize(n)).into());
        }
        Ok(n as u64)
    }

    /// Fetch (compiling and caching on first use) the template of carrier `tag`.
    pub fn template(&self, tag: &TypeTag) -> Result<Arc<Template>> {
        self.templates.get_or_compile(self.schemas, self.codecs, tag)
    }

    /// Resolve the codec for a binding kind.
    pub fn codec_for(&self, kind: &BindingKind) -> Result<Arc<dyn FieldCodec>> {
        self.codecs.get(kind)
    }
}
