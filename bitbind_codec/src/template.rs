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
 * Template compiler
 *
 * Turns a carrier schema's field metadata into an ordered, validated schedule of field plans.
 * Templates are compiled once per carrier type and cached by type tag; all annotation-order
 * violations are rejected here, never during a later decode of the same template.
 **************************************************************************************************/
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use bitbind_model::TypeTag;

use crate::binding::{Binding, Collection, Evaluated, ObjectChoices, PostProcess, Skip};
use crate::checksum::ChecksumSpec;
use crate::convert::{ConverterChoice, ConverterChoiceSet, Validator};
use crate::error::{Result, SchemaError};
use crate::registry::CodecRegistry;
use crate::schema_def::{FieldAnnotation, FieldDef, Header, MessageSchema, SchemaRegistry};

/// The terminal role of a field: it either carries wire data through a binding, stores the
/// message checksum, or is synthesized after decode.
pub enum FieldRole {
    Bind(Binding),
    Checksum(ChecksumSpec),
    Evaluated(Evaluated),
}

/// The compiled per-field schedule entry.
pub struct FieldPlan {
    pub name: String,
    pub skips: Vec<Skip>,
    pub role: FieldRole,
    pub collection: Option<Collection>,
    pub converters: ConverterChoiceSet,
    pub validator: Option<Arc<dyn Validator>>,
    pub post_process: Option<PostProcess>,
}

/// The compiled schedule of one carrier type.
pub struct Template {
    tag: TypeTag,
    header: Option<Header>,
    plans: Vec<FieldPlan>,
    evaluated: Vec<usize>,
    post_processed: Vec<usize>,
    checksum: Option<usize>,
}

impl std::fmt::Debug for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Template")
            .field("tag", &self.tag)
            .field("plans", &self.plans.len())
            .field("evaluated", &self.evaluated)
            .field("post_processed", &self.post_processed)
            .field("checksum", &self.checksum)
            .finish()
    }
}

impl Template {
    #[inline]
    pub fn tag(&self) -> &TypeTag {
        &self.tag
    }

    #[inline]
    pub fn header(&self) -> Option<&Header> {
        self.header.as_ref()
    }

    #[inline]
    pub fn plans(&self) -> &[FieldPlan] {
        &self.plans
    }

    /// Indexes (into `plans`) of evaluated fields, in declaration order.
    #[inline]
    pub fn evaluated(&self) -> &[usize] {
        &self.evaluated
    }

    /// Indexes of fields carrying a post-process directive, in declaration order.
    #[inline]
    pub fn post_processed(&self) -> &[usize] {
        &self.post_processed
    }

    /// Index of the checksum field, if any.
    #[inline]
    pub fn checksum(&self) -> Option<usize> {
        self.checksum
    }
}

fn order_err(tag: &TypeTag, field: &str, reason: &'static str) -> SchemaError {
    SchemaError::AnnotationOrder {
        carrier: tag.clone(),
        field: field.to_string(),
        reason,
    }
}

/// Compile one carrier schema into a template, validating the field annotation sequence and
/// resolving every binding against the codec registry.
pub fn compile(schema: &MessageSchema, codecs: &CodecRegistry) -> Result<Template> {
    let tag = schema.tag().clone();

    if let Some(header) = schema.header_ref() {
        if header.starts.is_empty() {
            return Err(SchemaError::BadStartMarker {
                carrier: tag,
                marker: String::new(),
            }
            .into());
        }
        for marker in &header.starts {
            if marker.is_empty() || header.charset.encode(marker).is_err() {
                return Err(SchemaError::BadStartMarker {
                    carrier: tag,
                    marker: marker.clone(),
                }
                .into());
            }
        }
        if let Some(end) = &header.end {
            if header.charset.encode(end).is_err() {
                return Err(SchemaError::BadStartMarker {
                    carrier: tag,
                    marker: end.clone(),
                }
                .into());
            }
        }
    }

    let mut plans = Vec::with_capacity(schema.fields().len());
    let mut evaluated = Vec::new();
    let mut post_processed = Vec::new();
    let mut checksum = None;

    for field in schema.fields() {
        let plan = compile_field(&tag, field, codecs)?;
        let idx = plans.len();
        match plan.role {
            FieldRole::Checksum(_) => {
                if checksum.replace(idx).is_some() {
                    return Err(SchemaError::DuplicateChecksum(tag).into());
                }
            }
            FieldRole::Evaluated(_) => evaluated.push(idx),
            FieldRole::Bind(_) => {}
        }
        if plan.post_process.is_some() {
            post_processed.push(idx);
        }
        plans.push(plan);
    }

    let wire_bearing = plans
        .iter()
        .any(|p| matches!(p.role, FieldRole::Bind(_) | FieldRole::Checksum(_)));
    if !wire_bearing {
        return Err(SchemaError::EmptySchedule(tag).into());
    }

    Ok(Template {
        tag,
        header: schema.header_ref().cloned(),
        plans,
        evaluated,
        post_processed,
        checksum,
    })
}

fn compile_field(tag: &TypeTag, field: &FieldDef, codecs: &CodecRegistry) -> Result<FieldPlan> {
    let name = field.name.as_str();
    let mut skips = Vec::new();
    let mut role: Option<FieldRole> = None;
    let mut collection = None;
    let mut converters = ConverterChoiceSet::default();
    let mut validator: Option<Arc<dyn Validator>> = None;
    let mut post_process = None;

    for ann in &field.annotations {
        match ann {
            FieldAnnotation::Skip(s) => {
                if role.is_some() {
                    return Err(order_err(tag, name, "skip directive after the primary binding").into());
                }
                skips.push(s.clone());
            }
            FieldAnnotation::Bind(b) => {
                if role.is_some() {
                    return Err(order_err(tag, name, "more than one primary binding").into());
                }
                role = Some(FieldRole::Bind(b.clone()));
            }
            FieldAnnotation::Checksum(c) => {
                if role.is_some() {
                    return Err(order_err(tag, name, "checksum combined with another binding").into());
                }
                role = Some(FieldRole::Checksum(c.clone()));
            }
            FieldAnnotation::Evaluated(e) => {
                if role.is_some() {
                    return Err(order_err(tag, name, "evaluated combined with another binding").into());
                }
                role = Some(FieldRole::Evaluated(e.clone()));
            }
            FieldAnnotation::Collection(c) => {
                if collection.is_some() {
                    return Err(order_err(tag, name, "more than one collection wrapper").into());
                }
                collection = Some(c.clone());
            }
            FieldAnnotation::DefaultConverter(c) => {
                if converters.default.is_some() {
                    return Err(order_err(tag, name, "more than one default converter").into());
                }
                converters.default = Some(c.clone());
            }
            FieldAnnotation::ConverterIf(cond, c) => converters.choices.push(ConverterChoice {
                condition: cond.clone(),
                converter: c.clone(),
            }),
            FieldAnnotation::Validator(v) => {
                if validator.is_some() {
                    return Err(order_err(tag, name, "more than one validator").into());
                }
                validator = Some(v.clone());
            }
            FieldAnnotation::PostProcess(p) => {
                if post_process.is_some() {
                    return Err(order_err(tag, name, "more than one post-process directive").into());
                }
                post_process = Some(p.clone());
            }
        }
    }

    let role = role.ok_or_else(|| order_err(tag, name, "field declares no binding"))?;

    match &role {
        FieldRole::Bind(binding) => {
            // every binding must resolve in the dispatch table
            codecs.get(&binding.kind())?;
            validate_binding(binding)?;
            if let Some(Collection::List) = &collection {
                let terminated = matches!(
                    binding,
                    Binding::Object {
                        choices: Some(ObjectChoices::Terminated { .. }),
                        ..
                    }
                );
                if !terminated {
                    return Err(order_err(
                        tag,
                        name,
                        "list wrapper requires a terminated object choice",
                    )
                    .into());
                }
            }
        }
        FieldRole::Checksum(_) | FieldRole::Evaluated(_) => {
            if collection.is_some() || !converters.is_empty() || validator.is_some() {
                return Err(order_err(
                    tag,
                    name,
                    "collection, converter and validator require a primary binding",
                )
                .into());
            }
            if post_process.is_some() && matches!(role, FieldRole::Checksum(_)) {
                return Err(order_err(tag, name, "checksum cannot be post-processed").into());
            }
        }
    }

    Ok(FieldPlan {
        name: name.to_string(),
        skips,
        role,
        collection,
        converters,
        validator,
        post_process,
    })
}

/// Static validation of literal sizes; expression sizes are checked when evaluated.
fn validate_binding(binding: &Binding) -> Result<()> {
    if let Binding::Integer { size, .. } = binding {
        if let Ok(bits) = size.trim().parse::<u64>() {
            if !(1..=128).contains(&bits) {
                return Err(SchemaError::SizeBounds {
                    size: bits,
                    max: 128,
                }
                .into());
            }
        }
    }
    Ok(())
}

/// Compile-once template store keyed by carrier type identity.
#[derive(Default)]
pub struct TemplateCache {
    map: RefCell<HashMap<TypeTag, Arc<Template>>>,
}

impl TemplateCache {
    pub fn new() -> TemplateCache {
        TemplateCache::default()
    }

    /// Fetch the template of `tag`, compiling and caching it on first use.
    pub fn get_or_compile(
        &self,
        schemas: &SchemaRegistry,
        codecs: &CodecRegistry,
        tag: &TypeTag,
    ) -> Result<Arc<Template>> {
        if let Some(t) = self.map.borrow().get(tag) {
            return Ok(t.clone());
        }
        let schema = schemas
            .get(tag)
            .ok_or_else(|| SchemaError::UnknownCarrier(tag.clone()))?;
        let template = Arc::new(compile(schema, codecs)?);
        self.map.borrow_mut().insert(tag.clone(), template.clone());
        Ok(template)
    }
}

//*************************************************************************************************
// Unit Tests
//*************************************************************************************************
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;
    use crate::numeric::ByteOrder;
    use crate::schema_def::FieldDef;
    use assert_matches::assert_matches;

    fn compile_one(schema: MessageSchema) -> Result<Template> {
        compile(&schema, &CodecRegistry::with_defaults())
    }

    #[test]
    fn skip_after_binding_is_rejected() {
        let schema = MessageSchema::new("T").field(
            FieldDef::new("f")
                .bind(Binding::unsigned("8", ByteOrder::Big))
                .skip_bits("4"),
        );
        assert_matches!(
            compile_one(schema),
            Err(CodecError::Schema(SchemaError::AnnotationOrder { .. }))
        );
    }

    #[test]
    fn double_binding_is_rejected() {
        let schema = MessageSchema::new("T").field(
            FieldDef::new("f")
                .bind(Binding::unsigned("8", ByteOrder::Big))
                .bind(Binding::bits("4")),
        );
        assert_matches!(
            compile_one(schema),
            Err(CodecError::Schema(SchemaError::AnnotationOrder { .. }))
        );
    }

    #[test]
    fn duplicate_checksum_is_rejected() {
        let spec = crate::checksum::ChecksumSpec::new(crate::checksum::ChecksumAlgorithm::Crc16Arc);
        let schema = MessageSchema::new("T")
            .field(FieldDef::new("a").bind(Binding::unsigned("8", ByteOrder::Big)))
            .field(FieldDef::new("c1").checksum(spec.clone()))
            .field(FieldDef::new("c2").checksum(spec));
        assert_matches!(
            compile_one(schema),
            Err(CodecError::Schema(SchemaError::DuplicateChecksum(_)))
        );
    }

    #[test]
    fn evaluated_only_schedule_is_rejected() {
        let schema = MessageSchema::new("T").field(FieldDef::new("f").evaluated("1 + 1"));
        assert_matches!(
            compile_one(schema),
            Err(CodecError::Schema(SchemaError::EmptySchedule(_)))
        );
    }

    #[test]
    fn unregistered_custom_kind_is_rejected() {
        let schema = MessageSchema::new("T").field(
            FieldDef::new("f").bind(Binding::custom("vendor", bitbind_model::Value::Null)),
        );
        assert_matches!(
            compile_one(schema),
            Err(CodecError::Schema(SchemaError::UnresolvedCodec(_)))
        );
    }

    #[test]
    fn list_needs_terminated_choices() {
        let schema = MessageSchema::new("T")
            .field(FieldDef::new("f").bind(Binding::object("U")).list());
        assert_matches!(
            compile_one(schema),
            Err(CodecError::Schema(SchemaError::AnnotationOrder { .. }))
        );
    }

    #[test]
    fn literal_integer_size_bounds() {
        let schema =
            MessageSchema::new("T").field(FieldDef::new("f").bind(Binding::unsigned("129", ByteOrder::Big)));
        assert_matches!(
            compile_one(schema),
            Err(CodecError::Schema(SchemaError::SizeBounds { size: 129, max: 128 }))
        );
    }

    #[test]
    fn schedule_indexes_are_recorded() {
        let schema = MessageSchema::new("T")
            .field(FieldDef::new("a").bind(Binding::unsigned("8", ByteOrder::Big)))
            .field(FieldDef::new("b").evaluated("a + 1"))
            .field(
                FieldDef::new("c")
                    .bind(Binding::unsigned("8", ByteOrder::Big))
                    .post_process("true", "c", "c"),
            );
        let t = compile_one(schema).unwrap();
        assert_eq!(t.evaluated(), &[1]);
        assert_eq!(t.post_processed(), &[2]);
        assert_eq!(t.checksum(), None);
    }
}
