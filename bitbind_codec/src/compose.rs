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
 * Template composer
 *
 * Mirror of the parser: drives field-by-field encode across a template's schedule. The
 * checksum field is written as a zero placeholder and patched once the whole body is flushed.
 **************************************************************************************************/
use bitbind_model::{Record, Value};

use crate::binding::{Collection, Skip};
use crate::checksum::ChecksumSpec;
use crate::convert::cast_to;
use crate::error::{EncodeError, Result, SchemaError};
use crate::numeric::{low_mask_u128, ByteOrder};
use crate::session::Session;
use crate::template::{FieldPlan, FieldRole, Template};
use crate::writer::BitWriter;

struct ChecksumPatch {
    offset: usize,
    spec: ChecksumSpec,
}

/// Encode one framed message: header, body fields, optional end marker, checksum back-patch.
pub(crate) fn encode_message(
    sess: &mut Session<'_>,
    template: &Template,
    record: &Record,
) -> Result<Vec<u8>> {
    let header = template
        .header()
        .ok_or_else(|| SchemaError::MissingHeader(template.tag().clone()))?;

    let mut writer = BitWriter::new();
    // the first declared start marker frames outgoing messages
    let marker = header.charset.encode(&header.starts[0])?;
    writer.write_bytes(&marker);
    let body_start = writer.position();

    let mut patch: Option<ChecksumPatch> = None;
    encode_fields(sess, &mut writer, template, record, Some(&mut patch))?;

    if let Some(end) = &header.end {
        let marker = header.charset.encode(end)?;
        writer.write_bytes(&marker);
    }
    writer.flush();

    if let Some(ChecksumPatch { offset, spec }) = patch {
        let (lo, hi) = spec
            .span_bounds(body_start, offset)
            .ok_or(EncodeError::SizeMismatch {
                expected: offset,
                actual: body_start,
            })?;
        let computed = spec.algorithm.compute(&writer.as_bytes()[lo..hi], spec.start);
        let bytes = checksum_bytes(computed, spec.algorithm.width_bytes(), spec.order);
        writer.patch_bytes(offset, &bytes)?;
    }
    Ok(writer.into_bytes())
}

/// Encode a nested (header-less) carrier at the current writer position. A checksum field in a
/// nested carrier writes its stored value verbatim; only framed messages compute one.
pub(crate) fn encode_record(
    sess: &mut Session<'_>,
    writer: &mut BitWriter,
    template: &Template,
    record: &Record,
) -> Result<()> {
    encode_fields(sess, writer, template, record, None)
}

fn encode_fields(
    sess: &mut Session<'_>,
    writer: &mut BitWriter,
    template: &Template,
    record: &Record,
    mut patch: Option<&mut Option<ChecksumPatch>>,
) -> Result<()> {
    let root = Value::Record(record.clone());
    for plan in template.plans() {
        let slot = patch.as_mut().map(|p| &mut **p);
        encode_field(sess, writer, plan, record, &root, slot)
            .map_err(|e| e.in_field(template.tag(), &plan.name))?;
    }
    Ok(())
}

fn encode_field(
    sess: &mut Session<'_>,
    writer: &mut BitWriter,
    plan: &FieldPlan,
    record: &Record,
    root: &Value,
    patch: Option<&mut Option<ChecksumPatch>>,
) -> Result<()> {
    for skip in &plan.skips {
        apply_skip_encode(sess, writer, skip, root)?;
    }
    match &plan.role {
        FieldRole::Evaluated(_) => Ok(()),
        FieldRole::Checksum(spec) => {
            if !writer.is_aligned() {
                return Err(EncodeError::NotByteAligned.into());
            }
            let width = spec.algorithm.width_bytes();
            match patch {
                Some(slot) => {
                    // reserve the span now, patch after the body is complete
                    let offset = writer.position();
                    writer.write_bytes(&vec![0u8; width]);
                    *slot = Some(ChecksumPatch {
                        offset,
                        spec: spec.clone(),
                    });
                }
                None => {
                    let stored = record
                        .get(&plan.name)
                        .and_then(|v| v.as_int())
                        .unwrap_or(0) as u128;
                    writer.write_unsigned(
                        stored & low_mask_u128((width * 8) as u32),
                        (width * 8) as u32,
                        spec.order,
                    );
                }
            }
            Ok(())
        }
        FieldRole::Bind(binding) => {
            let mut value = record
                .get(&plan.name)
                .cloned()
                .ok_or_else(|| EncodeError::MissingField(plan.name.clone()))?;
            if let Some(pp) = &plan.post_process {
                if sess.ctx.evaluate_bool(&pp.condition, root)? {
                    value = sess.ctx.evaluate(&pp.value_encode, root)?;
                }
            }
            let value = match plan.converters.select(sess.ctx, root)? {
                // the encode output is normalized to the declared physical kind for the codec
                Some(converter) => cast_to(converter.encode(value)?, converter.physical())?,
                None => value,
            };
            let codec = sess.codec_for(&binding.kind())?;
            match &plan.collection {
                None => codec.encode(sess, writer, binding, root, &value),
                Some(Collection::Array { size }) => {
                    let declared = sess.eval_count(size, root)? as usize;
                    let items = value.as_list().ok_or(EncodeError::TypeMismatch {
                        expected: "list",
                        found: value.kind(),
                    })?;
                    if items.len() != declared {
                        return Err(EncodeError::SizeMismatch {
                            expected: declared,
                            actual: items.len(),
                        }
                        .into());
                    }
                    for item in items {
                        codec.encode(sess, writer, binding, root, item)?;
                    }
                    Ok(())
                }
                Some(Collection::List) => {
                    let items = value.as_list().ok_or(EncodeError::TypeMismatch {
                        expected: "list",
                        found: value.kind(),
                    })?;
                    for item in items {
                        codec.encode(sess, writer, binding, root, item)?;
                    }
                    Ok(())
                }
            }
        }
    }
}

fn apply_skip_encode(
    sess: &mut Session<'_>,
    writer: &mut BitWriter,
    skip: &Skip,
    root: &Value,
) -> Result<()> {
    match skip {
        Skip::Bits { size } => {
            let mut n = sess.eval_count(size, root)?;
            while n > 0 {
                let step = n.min(64);
                writer.write_bits(0, step as usize);
                n -= step;
            }
            Ok(())
        }
        Skip::UntilTerminator { terminator, .. } => {
            writer.write_byte(*terminator);
            Ok(())
        }
    }
}

fn checksum_bytes(value: u64, width: usize, order: ByteOrder) -> Vec<u8> {
    let mut out = vec![0u8; width];
    for (i, slot) in out.iter_mut().enumerate() {
        let shift = 8 * match order {
            ByteOrder::Big => width - 1 - i,
            ByteOrder::Little => i,
        };
        *slot = (value >> shift) as u8;
    }
    out
}
