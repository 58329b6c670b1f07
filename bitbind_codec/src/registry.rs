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
 * Codec dispatch registry
 *
 * Maps a binding-kind tag to the codec implementing it. Built-in kinds are installed by
 * default; user registration under an existing kind overrides it.
 **************************************************************************************************/
use std::collections::HashMap;
use std::sync::Arc;

use bitbind_model::Value;

use crate::binding::Binding;
use crate::codecs;
use crate::error::{Result, SchemaError};
use crate::reader::BitReader;
use crate::session::Session;
use crate::writer::BitWriter;

/// Registry key of a binding. `Custom` kinds belong to user-registered codecs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BindingKind {
    Integer,
    BitSet,
    StringFixed,
    StringTerminated,
    Object,
    Custom(String),
}

/// One codec: the bidirectional wire implementation of a binding kind.
///
/// `root` is the carrier currently being decoded or encoded (the value `#self` refers to in
/// expressions). Collection wrappers are unrolled by the template parser/composer, so a codec
/// always handles exactly one element.
pub trait FieldCodec {
    fn decode(
        &self,
        sess: &mut Session<'_>,
        reader: &mut BitReader<'_>,
        binding: &Binding,
        root: &Value,
    ) -> Result<Value>;

    fn encode(
        &self,
        sess: &mut Session<'_>,
        writer: &mut BitWriter,
        binding: &Binding,
        root: &Value,
        value: &Value,
    ) -> Result<()>;
}

/// The binding-kind to codec table.
#[derive(Default)]
pub struct CodecRegistry {
    table: HashMap<BindingKind, Arc<dyn FieldCodec>>,
}

impl CodecRegistry {
    /// An empty registry, for fully custom dispatch tables.
    pub fn new() -> CodecRegistry {
        CodecRegistry::default()
    }

    /// A registry with all built-in codecs installed.
    pub fn with_defaults() -> CodecRegistry {
        let mut reg = CodecRegistry::new();
        reg.register(BindingKind::Integer, Arc::new(codecs::IntegerCodec));
        reg.register(BindingKind::BitSet, Arc::new(codecs::BitSetCodec));
        reg.register(BindingKind::StringFixed, Arc::new(codecs::StringFixedCodec));
        reg.register(
            BindingKind::StringTerminated,
            Arc::new(codecs::StringTerminatedCodec),
        );
        reg.register(BindingKind::Object, Arc::new(codecs::ObjectCodec));
        reg
    }

    /// Install `codec` under `kind`. Duplicate registration overrides.
    pub fn register(&mut self, kind: BindingKind, codec: Arc<dyn FieldCodec>) {
        self.table.insert(kind, codec);
    }

    /// Look up the codec for `kind`.
    pub fn get(&self, kind: &BindingKind) -> Result<Arc<dyn FieldCodec>> {
        self.table
            .get(kind)
            .cloned()
            .ok_or_else(|| SchemaError::UnresolvedCodec(kind.clone()).into())
    }

    /// `true` when `kind` resolves.
    pub fn contains(&self, kind: &BindingKind) -> bool {
        self.table.contains_key(kind)
    }
}
