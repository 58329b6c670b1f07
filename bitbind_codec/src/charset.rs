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
 * Charset layer
 *
 * Text fields and header markers decode/encode through a charset resolved by WHATWG label.
 * Malformed sequences are hard errors, never silent replacement characters.
 **************************************************************************************************/
use encoding_rs::Encoding;

use crate::error::{DecodeError, EncodeError, Result, SchemaError};

/// A resolved character encoding. Cheap to copy; equality is by encoding identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Charset(&'static Encoding);

impl Default for Charset {
    fn default() -> Self {
        Charset::utf8()
    }
}

impl Charset {
    /// Resolve a charset by WHATWG label (`"UTF-8"`, `"ISO-8859-1"`, `"windows-1252"`, ...).
    pub fn for_label(label: &str) -> Result<Charset> {
        Encoding::for_label(label.as_bytes())
            .map(Charset)
            .ok_or_else(|| SchemaError::UnknownCharset(label.to_string()).into())
    }

    /// The UTF-8 charset, the default for string bindings and headers.
    pub fn utf8() -> Charset {
        Charset(encoding_rs::UTF_8)
    }

    /// Canonical name of the encoding.
    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    /// Decode a byte run into text. Malformed input is a decode error.
    pub fn decode(&self, bytes: &[u8]) -> Result<String> {
        let (text, had_errors) = self.0.decode_without_bom_handling(bytes);
        if had_errors {
            Err(DecodeError::Charset(self.name()).into())
        } else {
            Ok(text.into_owned())
        }
    }

    /// Encode text into its byte run. Unmappable characters are an encode error.
    pub fn encode(&self, text: &str) -> Result<Vec<u8>> {
        let (bytes, _, had_errors) = self.0.encode(text);
        if had_errors {
            Err(EncodeError::Charset(self.name()).into())
        } else {
            Ok(bytes.into_owned())
        }
    }
}
