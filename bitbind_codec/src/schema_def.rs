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
 * Carrier schemas
 *
 * User-built metadata for one message carrier: the header, the ordered field definitions with
 * their annotations in declaration order, and the registry of carriers known to a codec.
 **************************************************************************************************/
use std::collections::HashMap;
use std::sync::Arc;

use bitbind_model::TypeTag;

use crate::binding::{Binding, Collection, Evaluated, PostProcess, Skip};
use crate::charset::Charset;
use crate::checksum::ChecksumSpec;
use crate::convert::{Converter, Validator};

/// Message framing: one or more start markers, an optional end marker, and the charset the
/// markers encode under.
#[derive(Debug, Clone)]
pub struct Header {
    pub starts: Vec<String>,
    pub end: Option<String>,
    pub charset: Charset,
}

impl Header {
    /// A header with UTF-8 start markers and no end marker.
    pub fn new<S: AsRef<str>>(starts: &[S]) -> Header {
        Header {
            starts: starts.iter().map(|s| s.as_ref().to_string()).collect(),
            end: None,
            charset: Charset::utf8(),
        }
    }

    /// Require an end marker after the last field.
    pub fn with_end(mut self, end: &str) -> Header {
        self.end = Some(end.to_string());
        self
    }

    /// Charset the markers encode under.
    pub fn with_charset(mut self, charset: Charset) -> Header {
        self.charset = charset;
        self
    }
}

/// One annotation attached to a field, in the order the user declared it. The template
/// compiler validates the sequence; see the invariants on [`crate::template::compile`].
pub enum FieldAnnotation {
    Skip(Skip),
    Bind(Binding),
    Collection(Collection),
    DefaultConverter(Arc<dyn Converter>),
    ConverterIf(String, Arc<dyn Converter>),
    Validator(Arc<dyn Validator>),
    Checksum(ChecksumSpec),
    Evaluated(Evaluated),
    PostProcess(PostProcess),
}

/// One field of a carrier: a target name plus its annotations in declaration order.
pub struct FieldDef {
    pub name: String,
    pub(crate) annotations: Vec<FieldAnnotation>,
}

impl FieldDef {
    /// Start a field definition for `name`.
    pub fn new(name: &str) -> FieldDef {
        FieldDef {
            name: name.to_string(),
            annotations: Vec::new(),
        }
    }

    /// Discard `size` bits ahead of the field.
    pub fn skip_bits(mut self, size: &str) -> FieldDef {
        self.annotations.push(FieldAnnotation::Skip(Skip::Bits {
            size: size.to_string(),
        }));
        self
    }

    /// Discard bytes through `terminator` ahead of the field.
    pub fn skip_until(mut self, terminator: u8, consume: bool) -> FieldDef {
        self.annotations
            .push(FieldAnnotation::Skip(Skip::UntilTerminator {
                terminator,
                consume,
            }));
        self
    }

    /// The field's primary wire binding.
    pub fn bind(mut self, binding: Binding) -> FieldDef {
        self.annotations.push(FieldAnnotation::Bind(binding));
        self
    }

    /// Wrap the binding in a sized array.
    pub fn array(mut self, size: &str) -> FieldDef {
        self.annotations
            .push(FieldAnnotation::Collection(Collection::Array {
                size: size.to_string(),
            }));
        self
    }

    /// Wrap the binding in a terminator-driven list.
    pub fn list(mut self) -> FieldDef {
        self.annotations
            .push(FieldAnnotation::Collection(Collection::List));
        self
    }

    /// Default converter between the physical and logical value.
    pub fn convert(mut self, converter: Arc<dyn Converter>) -> FieldDef {
        self.annotations
            .push(FieldAnnotation::DefaultConverter(converter));
        self
    }

    /// Condition-gated converter alternative; the first true condition wins over the default.
    pub fn convert_if(mut self, condition: &str, converter: Arc<dyn Converter>) -> FieldDef {
        self.annotations
            .push(FieldAnnotation::ConverterIf(condition.to_string(), converter));
        self
    }

    /// Validator over the decoded value.
    pub fn validate(mut self, validator: Arc<dyn Validator>) -> FieldDef {
        self.annotations.push(FieldAnnotation::Validator(validator));
        self
    }

    /// Declare this field as the message checksum.
    pub fn checksum(mut self, spec: ChecksumSpec) -> FieldDef {
        self.annotations.push(FieldAnnotation::Checksum(spec));
        self
    }

    /// Declare this field as synthetic: `expression` is evaluated after decode.
    pub fn evaluated(mut self, expression: &str) -> FieldDef {
        self.annotations
            .push(FieldAnnotation::Evaluated(Evaluated {
                expression: expression.to_string(),
            }));
        self
    }

    /// Conditionally rewrite the field after decode (`value_decode`) and before encode
    /// (`value_encode`).
    pub fn post_process(
        mut self,
        condition: &str,
        value_decode: &str,
        value_encode: &str,
    ) -> FieldDef {
        self.annotations
            .push(FieldAnnotation::PostProcess(PostProcess {
                condition: condition.to_string(),
                value_decode: value_decode.to_string(),
                value_encode: value_encode.to_string(),
            }));
        self
    }
}

/// User-declared metadata for one carrier type.
pub struct MessageSchema {
    tag: TypeTag,
    header: Option<Header>,
    fields: Vec<FieldDef>,
}

impl MessageSchema {
    /// Start a schema for the carrier `tag`.
    pub fn new(tag: impl Into<TypeTag>) -> MessageSchema {
        MessageSchema {
            tag: tag.into(),
            header: None,
            fields: Vec::new(),
        }
    }

    /// Attach the message header. Carriers used only as object-choice alternatives may omit it.
    pub fn header(mut self, header: Header) -> MessageSchema {
        self.header = Some(header);
        self
    }

    /// Append a field. Declaration order is the wire order.
    pub fn field(mut self, field: FieldDef) -> MessageSchema {
        self.fields.push(field);
        self
    }

    /// The carrier type this schema describes.
    pub fn tag(&self) -> &TypeTag {
        &self.tag
    }

    pub(crate) fn header_ref(&self) -> Option<&Header> {
        self.header.as_ref()
    }

    pub(crate) fn fields(&self) -> &[FieldDef] {
        &self.fields
    }
}

/// All carriers known to a codec, keyed by type tag.
#[derive(Default)]
pub struct SchemaRegistry {
    map: HashMap<TypeTag, Arc<MessageSchema>>,
}

impl SchemaRegistry {
    pub fn new() -> SchemaRegistry {
        SchemaRegistry::default()
    }

    /// Register a carrier schema. Re-registration replaces the previous schema; templates
    /// compiled from the old schema stay valid for in-flight work.
    pub fn register(&mut self, schema: MessageSchema) {
        self.map.insert(schema.tag.clone(), Arc::new(schema));
    }

    /// Look up a carrier by tag.
    pub fn get(&self, tag: &TypeTag) -> Option<&Arc<MessageSchema>> {
        self.map.get(tag)
    }

    /// `true` when `tag` is registered.
    pub fn contains(&self, tag: &TypeTag) -> bool {
        self.map.contains_key(tag)
    }
}
