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
 * Converters and validators
 *
 * User-supplied value transforms and assertions, the condition-gated converter selection, and
 * the cast step that bridges a codec's natural value kind to a converter's declared physical
 * kind before dispatch.
 **************************************************************************************************/
use std::sync::Arc;

use bitbind_eval::Context;
use bitbind_model::Value;

use crate::error::{DataError, Result};
use crate::numeric::{float_from_bits, float_to_bits, low_mask_u128};

/// The value kind a converter declares for its physical side. The core casts the codec's
/// natural value to this kind ahead of `decode`, and normalizes the output of `encode` back to
/// it before the codec writes. `Any` skips the cast entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicalKind {
    Any,
    Int,
    Big,
    Float,
    Str,
    Bytes,
    Bits,
}

/// A logical<->physical value transform attached to a field.
///
/// `decode` receives the physical value produced by the field's codec, already cast to
/// [`Converter::physical`]; `encode` is its exact inverse and must return a value the codec can
/// write under the field's binding.
pub trait Converter {
    /// The value kind this converter expects on its physical side.
    fn physical(&self) -> PhysicalKind {
        PhysicalKind::Any
    }

    fn decode(&self, physical: Value) -> Result<Value>;
    fn encode(&self, logical: Value) -> Result<Value>;
}

/// An assertion over the decoded (and converted) value of a field.
pub trait Validator {
    fn is_valid(&self, value: &Value) -> bool;
}

/// Cast `value` to the declared physical `kind` of a converter. Numeric kinds bridge freely
/// where lossless (`Int` <-> `Big` when the magnitude fits, integers widen to `Float`); text,
/// byte and bit values only pass through to their own kind. Lists cast element-wise, since
/// collection wrappers hand converters the whole list.
pub fn cast_to(value: Value, kind: PhysicalKind) -> Result<Value> {
    if kind == PhysicalKind::Any {
        return Ok(value);
    }
    let value = match value {
        Value::List(items) => {
            let cast: Result<Vec<Value>> =
                items.into_iter().map(|v| cast_to(v, kind)).collect();
            return Ok(Value::List(cast?));
        }
        other => other,
    };
    let found = value.kind();
    match kind {
        PhysicalKind::Any => Ok(value),
        PhysicalKind::Int => value
            .as_int()
            .map(Value::Int)
            .ok_or_else(|| cast_err("int", found)),
        PhysicalKind::Big => value
            .as_big()
            .map(Value::Big)
            .ok_or_else(|| cast_err("big int", found)),
        PhysicalKind::Float => value
            .as_float()
            .map(Value::Float)
            .ok_or_else(|| cast_err("float", found)),
        PhysicalKind::Str => match value {
            Value::Str(_) => Ok(value),
            _ => Err(cast_err("string", found)),
        },
        PhysicalKind::Bytes => match value {
            Value::Bytes(_) => Ok(value),
            _ => Err(cast_err("bytes", found)),
        },
        PhysicalKind::Bits => match value {
            Value::Bits(_) => Ok(value),
            _ => Err(cast_err("bits", found)),
        },
    }
}

fn cast_err(expected: &'static str, found: &'static str) -> crate::error::CodecError {
    DataError::Cast { expected, found }.into()
}

/// One condition-gated converter alternative.
#[derive(Clone)]
pub struct ConverterChoice {
    pub condition: String,
    pub converter: Arc<dyn Converter>,
}

/// A default converter plus an ordered list of condition-gated alternatives. The first
/// alternative whose condition holds wins; otherwise the default applies; with neither, values
/// pass through untouched.
#[derive(Clone, Default)]
pub struct ConverterChoiceSet {
    pub choices: Vec<ConverterChoice>,
    pub default: Option<Arc<dyn Converter>>,
}

impl ConverterChoiceSet {
    /// `true` when no converter is attached at all.
    pub fn is_empty(&self) -> bool {
        self.choices.is_empty() && self.default.is_none()
    }

    /// Pick the converter for the current carrier state, or `None` for pass-through.
    pub fn select(&self, ctx: &Context, root: &Value) -> Result<Option<Arc<dyn Converter>>> {
        for choice in &self.choices {
            if ctx.evaluate_bool(&choice.condition, root)? {
                return Ok(Some(choice.converter.clone()));
            }
        }
        Ok(self.default.clone())
    }
}

/// Maps an unsigned integer window to an IEEE float through its bit pattern: the logical side
/// is `Value::Float`, the physical side the window's `Value::Int`. Pair it with an unsigned
/// integer binding of exactly the converter's width.
pub struct FloatConverter {
    width: u32,
}

impl FloatConverter {
    /// Half precision over a 16-bit window.
    pub fn f16() -> FloatConverter {
        FloatConverter { width: 16 }
    }

    /// Single precision over a 32-bit window.
    pub fn f32() -> FloatConverter {
        FloatConverter { width: 32 }
    }

    /// Double precision over a 64-bit window.
    pub fn f64() -> FloatConverter {
        FloatConverter { width: 64 }
    }
}

impl Converter for FloatConverter {
    fn physical(&self) -> PhysicalKind {
        PhysicalKind::Int
    }

    fn decode(&self, physical: Value) -> Result<Value> {
        let pattern = physical
            .as_int()
            .ok_or_else(|| cast_err("int", physical.kind()))?;
        let pattern = (pattern as u128 & low_mask_u128(self.width)) as u64;
        let value = float_from_bits(pattern, self.width)
            .ok_or_else(|| cast_err("float", physical.kind()))?;
        Ok(Value::Float(value))
    }

    fn encode(&self, logical: Value) -> Result<Value> {
        let value = logical
            .as_float()
            .ok_or_else(|| cast_err("float", logical.kind()))?;
        let pattern = float_to_bits(value, self.width)
            .ok_or_else(|| cast_err("int", logical.kind()))?;
        Ok(Value::Int(pattern as i128))
    }
}

//*************************************************************************************************
// Unit Tests
//*************************************************************************************************
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;
    use assert_matches::assert_matches;
    use num_bigint::BigInt;

    struct AddOne;
    impl Converter for AddOne {
        fn decode(&self, v: Value) -> Result<Value> {
            Ok(Value::Int(v.as_int().unwrap_or(0) + 1))
        }
        fn encode(&self, v: Value) -> Result<Value> {
            Ok(Value::Int(v.as_int().unwrap_or(0) - 1))
        }
    }

    struct TimesTen;
    impl Converter for TimesTen {
        fn decode(&self, v: Value) -> Result<Value> {
            Ok(Value::Int(v.as_int().unwrap_or(0) * 10))
        }
        fn encode(&self, v: Value) -> Result<Value> {
            Ok(Value::Int(v.as_int().unwrap_or(0) / 10))
        }
    }

    #[test]
    fn first_true_condition_wins() {
        let mut ctx = Context::new();
        ctx.put("flag", Value::Bool(true));
        let set = ConverterChoiceSet {
            choices: vec![
                ConverterChoice {
                    condition: "flag".to_string(),
                    converter: Arc::new(AddOne),
                },
                ConverterChoice {
                    condition: "true".to_string(),
                    converter: Arc::new(TimesTen),
                },
            ],
            default: None,
        };
        let chosen = set.select(&ctx, &Value::Null).unwrap().unwrap();
        assert_eq!(chosen.decode(Value::Int(1)).unwrap(), Value::Int(2));
    }

    #[test]
    fn default_applies_when_no_condition_holds() {
        let ctx = Context::new();
        let set = ConverterChoiceSet {
            choices: vec![ConverterChoice {
                condition: "false".to_string(),
                converter: Arc::new(AddOne),
            }],
            default: Some(Arc::new(TimesTen)),
        };
        let chosen = set.select(&ctx, &Value::Null).unwrap().unwrap();
        assert_eq!(chosen.decode(Value::Int(3)).unwrap(), Value::Int(30));
        let empty = ConverterChoiceSet::default();
        assert!(empty.select(&ctx, &Value::Null).unwrap().is_none());
    }

    #[test]
    fn casts_bridge_numeric_kinds() {
        assert_eq!(
            cast_to(Value::Big(BigInt::from(7)), PhysicalKind::Int).unwrap(),
            Value::Int(7)
        );
        assert_eq!(
            cast_to(Value::Int(7), PhysicalKind::Big).unwrap(),
            Value::Big(BigInt::from(7))
        );
        assert_eq!(
            cast_to(Value::Int(3), PhysicalKind::Float).unwrap(),
            Value::Float(3.0)
        );
        // Any is the identity
        assert_eq!(
            cast_to(Value::Str("x".to_string()), PhysicalKind::Any).unwrap(),
            Value::Str("x".to_string())
        );
    }

    #[test]
    fn casts_apply_element_wise_to_lists() {
        let list = Value::List(vec![Value::Int(1), Value::Big(BigInt::from(2))]);
        assert_eq!(
            cast_to(list, PhysicalKind::Int).unwrap(),
            Value::List(vec![Value::Int(1), Value::Int(2)])
        );
    }

    #[test]
    fn impossible_casts_are_data_errors() {
        assert_matches!(
            cast_to(Value::Str("x".to_string()), PhysicalKind::Int),
            Err(CodecError::Data(DataError::Cast {
                expected: "int",
                found: "string"
            }))
        );
        // a big magnitude that does not fit the int lane stays an error, not a truncation
        assert_matches!(
            cast_to(Value::Big(BigInt::from(1) << 200), PhysicalKind::Int),
            Err(CodecError::Data(DataError::Cast { .. }))
        );
    }

    #[test]
    fn float_converter_round_trips_bit_patterns() {
        let conv = FloatConverter::f32();
        assert_eq!(conv.physical(), PhysicalKind::Int);
        let logical = conv.decode(Value::Int(0x4148_0000)).unwrap();
        assert_eq!(logical, Value::Float(12.5));
        assert_eq!(conv.encode(logical).unwrap(), Value::Int(0x4148_0000));

        let conv = FloatConverter::f16();
        assert_eq!(conv.decode(Value::Int(0x3e00)).unwrap(), Value::Float(1.5));
        assert_eq!(
            conv.encode(Value::Float(1.5)).unwrap(),
            Value::Int(0x3e00)
        );

        assert_matches!(
            conv.encode(Value::Str("x".to_string())),
            Err(CodecError::Data(DataError::Cast { .. }))
        );
    }
}
