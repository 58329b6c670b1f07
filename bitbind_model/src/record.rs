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
 * Message records
 *
 * A `Record` is the in-memory form of one decoded message carrier: the carrier's type tag plus
 * its fields in declaration order.
 **************************************************************************************************/
use std::fmt;
use std::sync::Arc;

use crate::value::Value;

/// Identity of a carrier type. Tags are interned strings; cloning is cheap and equality is
/// by content, so a tag built from a literal compares equal to one read back from a schema.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeTag(Arc<str>);

impl TypeTag {
    /// View the tag as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TypeTag {
    #[inline]
    fn from(s: &str) -> Self {
        TypeTag(Arc::from(s))
    }
}

impl From<String> for TypeTag {
    #[inline]
    fn from(s: String) -> Self {
        TypeTag(Arc::from(s.as_str()))
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeTag({})", self.0)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One decoded (or to-be-encoded) message carrier instance.
///
/// Fields keep the declaration order of the carrier schema that produced them. Lookup is by
/// name; carriers are small (tens of fields), so a linear scan beats hashing here.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    tag: TypeTag,
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Create an empty record for the carrier type `tag`.
    pub fn new(tag: TypeTag) -> Self {
        Record {
            tag,
            fields: Vec::new(),
        }
    }

    /// The carrier type this record was built from.
    #[inline]
    pub fn tag(&self) -> &TypeTag {
        &self.tag
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Set a field, replacing any previous value under the same name. New names append in
    /// arrival order, which is declaration order when driven by the template parser.
    pub fn set(&mut self, name: &str, value: Value) {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    /// `true` if a field of this name has been set.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _)| n == name)
    }

    /// Number of fields currently set.
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// `true` if no field has been set yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate `(name, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }
}
