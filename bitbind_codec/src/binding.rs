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
 * Binding descriptors
 *
 * Normalized records describing one field's physical wire layout, plus the skip, collection,
 * object-choice, evaluated-field and post-process descriptors that ride along with them.
 **************************************************************************************************/
use bitbind_model::{TypeTag, Value};

use crate::charset::Charset;
use crate::numeric::ByteOrder;
use crate::registry::BindingKind;

/// Physical layout of one wire-bearing field.
///
/// Size expressions are evaluator sources; pure integer literals short-circuit the engine, so
/// `"16"` costs nothing at decode time.
#[derive(Debug, Clone)]
pub enum Binding {
    /// An integer window of `size` bits (1..=128) under `order`, sign-extended when `signed`.
    Integer {
        size: String,
        order: ByteOrder,
        signed: bool,
    },
    /// A raw bit vector of `size` bits.
    BitSet { size: String },
    /// `size` bytes of text decoded under `charset`.
    StringFixed { size: String, charset: Charset },
    /// Text up to `terminator`; `consume` controls whether the terminator byte is eaten.
    StringTerminated {
        terminator: u8,
        consume: bool,
        charset: Charset,
    },
    /// A nested carrier, optionally polymorphic through `choices`.
    Object {
        declared: TypeTag,
        choices: Option<ObjectChoices>,
    },
    /// A user-registered binding; `config` is handed to the registered codec untouched.
    Custom { kind: String, config: Value },
}

impl Binding {
    /// A signed integer window.
    pub fn integer(size: &str, order: ByteOrder) -> Binding {
        Binding::Integer {
            size: size.to_string(),
            order,
            signed: true,
        }
    }

    /// An unsigned integer window.
    pub fn unsigned(size: &str, order: ByteOrder) -> Binding {
        Binding::Integer {
            size: size.to_string(),
            order,
            signed: false,
        }
    }

    /// A raw bit vector.
    pub fn bits(size: &str) -> Binding {
        Binding::BitSet {
            size: size.to_string(),
        }
    }

    /// A fixed-size UTF-8 string.
    pub fn string(size: &str) -> Binding {
        Binding::string_with(size, Charset::utf8())
    }

    /// A fixed-size string under an explicit charset.
    pub fn string_with(size: &str, charset: Charset) -> Binding {
        Binding::StringFixed {
            size: size.to_string(),
            charset,
        }
    }

    /// A terminated UTF-8 string.
    pub fn string_terminated(terminator: u8, consume: bool) -> Binding {
        Binding::string_terminated_with(terminator, consume, Charset::utf8())
    }

    /// A terminated string under an explicit charset.
    pub fn string_terminated_with(terminator: u8, consume: bool, charset: Charset) -> Binding {
        Binding::StringTerminated {
            terminator,
            consume,
            charset,
        }
    }

    /// A nested carrier of a single concrete type.
    pub fn object(declared: impl Into<TypeTag>) -> Binding {
        Binding::Object {
            declared: declared.into(),
            choices: None,
        }
    }

    /// A polymorphic nested carrier resolved through `choices`.
    pub fn object_with(declared: impl Into<TypeTag>, choices: ObjectChoices) -> Binding {
        Binding::Object {
            declared: declared.into(),
            choices: Some(choices),
        }
    }

    /// A binding handled by a user-registered codec.
    pub fn custom(kind: &str, config: Value) -> Binding {
        Binding::Custom {
            kind: kind.to_string(),
            config,
        }
    }

    /// The registry key this binding dispatches through.
    pub fn kind(&self) -> BindingKind {
        match self {
            Binding::Integer { .. } => BindingKind::Integer,
            Binding::BitSet { .. } => BindingKind::BitSet,
            Binding::StringFixed { .. } => BindingKind::StringFixed,
            Binding::StringTerminated { .. } => BindingKind::StringTerminated,
            Binding::Object { .. } => BindingKind::Object,
            Binding::Custom { kind, .. } => BindingKind::Custom(kind.clone()),
        }
    }
}

/// A non-data directive executed before the field's primary binding.
#[derive(Debug, Clone)]
pub enum Skip {
    /// Discard `size` bits on decode; emit that many zero bits on encode.
    Bits { size: String },
    /// Discard bytes through the terminator on decode; emit the terminator byte on encode.
    UntilTerminator { terminator: u8, consume: bool },
}

/// Collection wrapper applied over a value-producing binding.
#[derive(Debug, Clone)]
pub enum Collection {
    /// A pre-known element count.
    Array { size: String },
    /// Terminator-driven iteration via the terminated object-choice protocol.
    List,
}

/// A condition-gated polymorphic type selection.
#[derive(Debug, Clone)]
pub enum ObjectChoices {
    /// The leading `prefix_bits` of the object select the concrete type. The prefix is read
    /// into `#prefix` as an unsigned integer before the conditions run.
    Prefix {
        prefix_bits: u32,
        order: ByteOrder,
        alternatives: Vec<PrefixAlternative>,
        default: Option<TypeTag>,
    },
    /// The text up to (not including) `terminator` is peeked into `#prefix`; the element's own
    /// fields re-read it. An empty peek is the end-of-list sentinel.
    Terminated {
        terminator: u8,
        charset: Charset,
        alternatives: Vec<TerminatedAlternative>,
        default: Option<TypeTag>,
    },
}

impl ObjectChoices {
    /// Start a prefix-driven choice set.
    pub fn prefix(prefix_bits: u32, order: ByteOrder) -> ObjectChoices {
        ObjectChoices::Prefix {
            prefix_bits,
            order,
            alternatives: Vec::new(),
            default: None,
        }
    }

    /// Start a terminator-driven choice set over UTF-8 prefixes.
    pub fn terminated(terminator: u8) -> ObjectChoices {
        ObjectChoices::Terminated {
            terminator,
            charset: Charset::utf8(),
            alternatives: Vec::new(),
            default: None,
        }
    }

    /// Append an alternative. For prefix-driven sets `prefix_literal` supplies the bits written
    /// on encode; terminator-driven sets ignore it (the element's fields carry the prefix).
    pub fn alternative(
        mut self,
        condition: &str,
        prefix_literal: u64,
        target: impl Into<TypeTag>,
    ) -> ObjectChoices {
        match &mut self {
            ObjectChoices::Prefix { alternatives, .. } => alternatives.push(PrefixAlternative {
                condition: condition.to_string(),
                prefix: prefix_literal,
                target: target.into(),
            }),
            ObjectChoices::Terminated { alternatives, .. } => {
                alternatives.push(TerminatedAlternative {
                    condition: condition.to_string(),
                    target: target.into(),
                })
            }
        }
        self
    }

    /// Set the fallback type used when no condition matches on decode.
    pub fn default_type(mut self, target: impl Into<TypeTag>) -> ObjectChoices {
        match &mut self {
            ObjectChoices::Prefix { default, .. } => *default = Some(target.into()),
            ObjectChoices::Terminated { default, .. } => *default = Some(target.into()),
        }
        self
    }

    /// Override the charset of a terminated choice set.
    pub fn charset(mut self, cs: Charset) -> ObjectChoices {
        if let ObjectChoices::Terminated { charset, .. } = &mut self {
            *charset = cs;
        }
        self
    }
}

/// One prefix-driven alternative.
#[derive(Debug, Clone)]
pub struct PrefixAlternative {
    pub condition: String,
    pub prefix: u64,
    pub target: TypeTag,
}

/// One terminator-driven alternative.
#[derive(Debug, Clone)]
pub struct TerminatedAlternative {
    pub condition: String,
    pub target: TypeTag,
}

/// A synthetic field: no wire presence, assigned after all wire-bearing fields are decoded.
#[derive(Debug, Clone)]
pub struct Evaluated {
    pub expression: String,
}

/// A conditional substitution applied after decode and before encode.
#[derive(Debug, Clone)]
pub struct PostProcess {
    pub condition: String,
    pub value_decode: String,
    pub value_encode: String,
}
