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
 * Template parser
 *
 * Drives field-by-field decode across a template's schedule: header match, skip directives,
 * collection loops, converter and validator application, evaluated fields, post-processing and
 * checksum verification. A failed decode never leaks a partial carrier.
 **************************************************************************************************/
use bitbind_model::{Record, TypeTag, Value};

use crate::binding::{Binding, Collection, Skip};
use crate::checksum::ChecksumSpec;
use crate::choice::{self, Resolution};
use crate::convert::cast_to;
use crate::error::{ChecksumError, CodecError, DataError, DecodeError, Result, SchemaError};
use crate::reader::BitReader;
use crate::session::Session;
use crate::template::{FieldPlan, FieldRole, Template};

/// Decode one framed message: header, body fields, optional end marker, checksum.
pub(crate) fn decode_message(
    sess: &mut Session<'_>,
    input: &[u8],
    template: &Template,
) -> Result<Record> {
    let header = template
        .header()
        .ok_or_else(|| SchemaError::MissingHeader(template.tag().clone()))?;

    // the longest declared start marker prefixing the input wins
    let mut consumed: Option<usize> = None;
    for start in &header.starts {
        let marker = header.charset.encode(start)?;
        if input.len() >= marker.len() && input[..marker.len()] == marker[..] {
            consumed = Some(consumed.map_or(marker.len(), |best| best.max(marker.len())));
        }
    }
    let consumed = consumed.ok_or(DecodeError::HeaderMismatch)?;

    let mut reader = BitReader::new(input);
    reader.seek(consumed)?;
    let body_start = reader.position();

    let record = decode_record_inner(sess, &mut reader, template, Some(body_start))?;

    if let Some(end) = &header.end {
        let marker = header.charset.encode(end)?;
        let got = reader.read_bytes(marker.len())?;
        if *got != marker[..] {
            return Err(DecodeError::TrailerMismatch.into());
        }
    }
    Ok(record)
}

/// Decode a nested (header-less) carrier at the current cursor.
pub(crate) fn decode_record(
    sess: &mut Session<'_>,
    reader: &mut BitReader<'_>,
    template: &Template,
) -> Result<Record> {
    decode_record_inner(sess, reader, template, None)
}

/// Decode an instance of the carrier `tag` at the current cursor.
pub(crate) fn decode_object_of(
    sess: &mut Session<'_>,
    reader: &mut BitReader<'_>,
    tag: &TypeTag,
) -> Result<Value> {
    let template = sess.template(tag)?;
    Ok(Value::Record(decode_record(sess, reader, &template)?))
}

fn decode_record_inner(
    sess: &mut Session<'_>,
    reader: &mut BitReader<'_>,
    template: &Template,
    body_start: Option<usize>,
) -> Result<Record> {
    let mut current = Value::Record(Record::new(template.tag().clone()));
    let mut checksum_seen: Option<(usize, u64)> = None;

    for plan in template.plans() {
        decode_field(sess, reader, plan, &mut current, &mut checksum_seen)
            .map_err(|e| e.in_field(template.tag(), &plan.name))?;
    }

    // synthetic fields observe all wire-bearing fields, in declaration order
    for &idx in template.evaluated() {
        let plan = &template.plans()[idx];
        let FieldRole::Evaluated(ev) = &plan.role else {
            continue;
        };
        let value = sess
            .ctx
            .evaluate(&ev.expression, &current)
            .map_err(|e| CodecError::from(e).in_field(template.tag(), &plan.name))?;
        set_field(&mut current, &plan.name, value);
    }

    for &idx in template.post_processed() {
        let plan = &template.plans()[idx];
        let Some(pp) = &plan.post_process else {
            continue;
        };
        let step = apply_post_decode(sess, &mut current, &plan.name, pp);
        step.map_err(|e| e.in_field(template.tag(), &plan.name))?;
    }

    // verification only applies to framed messages: a nested carrier has no body bounds
    if let (Some((offset, stored)), Some(cs_idx), Some(body_start)) =
        (checksum_seen, template.checksum(), body_start)
    {
        let plan = &template.plans()[cs_idx];
        let FieldRole::Checksum(spec) = &plan.role else {
            unreachable!("checksum index always points at a checksum plan");
        };
        verify_checksum(reader, spec, body_start, offset, stored)
            .map_err(|e| e.in_field(template.tag(), &plan.name))?;
    }

    match current {
        Value::Record(r) => Ok(r),
        _ => unreachable!("the working carrier is always a record"),
    }
}

fn apply_post_decode(
    sess: &mut Session<'_>,
    current: &mut Value,
    name: &str,
    pp: &crate::binding::PostProcess,
) -> Result<()> {
    if sess.ctx.evaluate_bool(&pp.condition, current)? {
        let value = sess.ctx.evaluate(&pp.value_decode, current)?;
        set_field(current, name, value);
    }
    Ok(())
}

fn verify_checksum(
    reader: &BitReader<'_>,
    spec: &ChecksumSpec,
    body_start: usize,
    checksum_offset: usize,
    stored: u64,
) -> Result<()> {
    let (lo, hi) = spec
        .span_bounds(body_start, checksum_offset)
        .ok_or(DecodeError::Underflow {
            needed: 0,
            at: checksum_offset,
        })?;
    let data = reader
        .source()
        .get(lo..hi)
        .ok_or(DecodeError::Underflow { needed: 0, at: lo })?;
    let computed = spec.algorithm.compute(data, spec.start);
    if computed != stored {
        return Err(ChecksumError::Mismatch { computed, stored }.into());
    }
    Ok(())
}

fn decode_field(
    sess: &mut Session<'_>,
    reader: &mut BitReader<'_>,
    plan: &FieldPlan,
    current: &mut Value,
    checksum_seen: &mut Option<(usize, u64)>,
) -> Result<()> {
    for skip in &plan.skips {
        apply_skip_decode(sess, reader, skip, current)?;
    }
    match &plan.role {
        FieldRole::Evaluated(_) => Ok(()),
        FieldRole::Checksum(spec) => {
            let offset = reader.position();
            let width = spec.algorithm.width_bytes();
            let stored = reader.read_unsigned((width * 8) as u32, spec.order)? as u64;
            *checksum_seen = Some((offset, stored));
            set_field(current, &plan.name, Value::Int(stored as i128));
            Ok(())
        }
        FieldRole::Bind(binding) => {
            let codec = sess.codec_for(&binding.kind())?;
            let value = match &plan.collection {
                None => codec.decode(sess, reader, binding, current)?,
                Some(Collection::Array { size }) => {
                    let count = sess.eval_count(size, current)?;
                    let mut items = Vec::with_capacity(count as usize);
                    for _ in 0..count {
                        items.push(codec.decode(sess, reader, binding, current)?);
                    }
                    Value::List(items)
                }
                Some(Collection::List) => Value::List(decode_list(sess, reader, binding, current)?),
            };
            let value = match plan.converters.select(sess.ctx, current)? {
                // the codec's natural value crosses the cast step before dispatch
                Some(converter) => converter.decode(cast_to(value, converter.physical())?)?,
                None => value,
            };
            if let Some(validator) = &plan.validator {
                if !validator.is_valid(&value) {
                    return Err(DataError::Rejected {
                        field: plan.name.clone(),
                        kind: value.kind(),
                    }
                    .into());
                }
            }
            set_field(current, &plan.name, value);
            Ok(())
        }
    }
}

/// Terminator-driven element loop; the resolver's empty-prefix sentinel ends the list.
fn decode_list(
    sess: &mut Session<'_>,
    reader: &mut BitReader<'_>,
    binding: &Binding,
    root: &Value,
) -> Result<Vec<Value>> {
    let Binding::Object {
        choices: Some(choices),
        ..
    } = binding
    else {
        return Err(SchemaError::BindingMismatch(binding.kind()).into());
    };
    let mut items = Vec::new();
    loop {
        let (resolution, guard) = choice::resolve_decode(sess, reader, choices, root)?;
        let tag = match resolution {
            Resolution::Type(t) => t,
            Resolution::EndOfList => {
                choice::release_prefix(sess, guard);
                break;
            }
        };
        let item = decode_object_of(sess, reader, &tag);
        choice::release_prefix(sess, guard);
        items.push(item?);
    }
    Ok(items)
}

fn apply_skip_decode(
    sess: &mut Session<'_>,
    reader: &mut BitReader<'_>,
    skip: &Skip,
    root: &Value,
) -> Result<()> {
    match skip {
        Skip::Bits { size } => {
            let n = sess.eval_count(size, root)?;
            reader.skip_bits(n)
        }
        Skip::UntilTerminator {
            terminator,
            consume,
        } => {
            loop {
                if reader.remaining_bits() < 8 {
                    return Err(DecodeError::TerminatorNotFound(*terminator).into());
                }
                let snap = reader.snapshot();
                let b = reader.read_byte()?;
                if b == *terminator {
                    if !consume {
                        reader.restore(snap);
                    }
                    break;
                }
            }
            Ok(())
        }
    }
}

fn set_field(current: &mut Value, name: &str, value: Value) {
    if let Value::Record(record) = current {
        record.set(name, value);
    }
}
