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
 * Choice resolver
 *
 * Selects the concrete carrier type of a polymorphic object field: prefix-driven sets read the
 * leading bits into `#prefix`, terminator-driven sets peek the text before the terminator
 * without moving the cursor. The first alternative whose condition holds wins, in declaration
 * order.
 **************************************************************************************************/
use bitbind_model::{TypeTag, Value};

use crate::binding::ObjectChoices;
use crate::error::{ChoiceError, Result};
use crate::numeric::ByteOrder;
use crate::reader::BitReader;
use crate::session::Session;

/// Outcome of a decode-side resolution.
pub enum Resolution {
    /// Decode an instance of this carrier type next.
    Type(TypeTag),
    /// Terminated resolution peeked an empty prefix: the end-of-list sentinel.
    EndOfList,
}

/// The `#prefix` binding installed during resolution. The caller keeps it installed while the
/// selected carrier decodes and must hand it back to [`release_prefix`] afterwards, error paths
/// included.
pub struct PrefixGuard(Option<Option<Value>>);

/// Restore the `#prefix` binding captured by a resolution.
pub fn release_prefix(sess: &mut Session<'_>, guard: PrefixGuard) {
    if let Some(previous) = guard.0 {
        sess.ctx.restore("#prefix", previous);
    }
}

/// Resolve the concrete type on decode. On success the `#prefix` context variable stays
/// installed for the nested decode; the returned guard undoes it.
pub fn resolve_decode(
    sess: &mut Session<'_>,
    reader: &mut BitReader<'_>,
    choices: &ObjectChoices,
    root: &Value,
) -> Result<(Resolution, PrefixGuard)> {
    match choices {
        ObjectChoices::Prefix {
            prefix_bits,
            order,
            alternatives,
            default,
        } => {
            let mut guard = PrefixGuard(None);
            if *prefix_bits > 0 {
                let raw = reader.read_unsigned(*prefix_bits, *order)?;
                let prev = sess.ctx.put("#prefix", Value::Int(raw as i128));
                guard = PrefixGuard(Some(prev));
            }
            for alt in alternatives {
                match sess.ctx.evaluate_bool(&alt.condition, root) {
                    Ok(true) => return Ok((Resolution::Type(alt.target.clone()), guard)),
                    Ok(false) => {}
                    Err(e) => {
                        release_prefix(sess, guard);
                        return Err(e.into());
                    }
                }
            }
            if let Some(default) = default {
                return Ok((Resolution::Type(default.clone()), guard));
            }
            release_prefix(sess, guard);
            Err(ChoiceError::NoAlternative.into())
        }
        ObjectChoices::Terminated {
            terminator,
            charset,
            alternatives,
            default,
        } => {
            let peeked = reader.read_text_until_no_consume(*terminator, *charset)?;
            if peeked.is_empty() {
                return Ok((Resolution::EndOfList, PrefixGuard(None)));
            }
            let prev = sess.ctx.put("#prefix", Value::Str(peeked));
            let guard = PrefixGuard(Some(prev));
            for alt in alternatives {
                match sess.ctx.evaluate_bool(&alt.condition, root) {
                    Ok(true) => return Ok((Resolution::Type(alt.target.clone()), guard)),
                    Ok(false) => {}
                    Err(e) => {
                        release_prefix(sess, guard);
                        return Err(e.into());
                    }
                }
            }
            if let Some(default) = default {
                return Ok((Resolution::Type(default.clone()), guard));
            }
            release_prefix(sess, guard);
            Err(ChoiceError::NoAlternative.into())
        }
    }
}

/// Resolve the wire prefix on encode: the first alternative declaring the runtime type wins.
/// Prefix-driven sets return the bits to write ahead of the element; terminated sets write
/// nothing (the element's own fields carry the prefix text).
pub fn resolve_encode(
    choices: &ObjectChoices,
    tag: &TypeTag,
) -> Result<Option<(u64, u32, ByteOrder)>> {
    match choices {
        ObjectChoices::Prefix {
            prefix_bits,
            order,
            alternatives,
            ..
        } => alternatives
            .iter()
            .find(|alt| alt.target == *tag)
            .map(|alt| {
                if *prefix_bits > 0 {
                    Some((alt.prefix, *prefix_bits, *order))
                } else {
                    None
                }
            })
            .ok_or_else(|| ChoiceError::NoPrefixForType(tag.clone()).into()),
        ObjectChoices::Terminated { alternatives, .. } => {
            if alternatives.iter().any(|alt| alt.target == *tag) {
                Ok(None)
            } else {
                Err(ChoiceError::NoPrefixForType(tag.clone()).into())
            }
        }
    }
}
