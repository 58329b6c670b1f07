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
 * Expression evaluation
 *
 * Tree-walking evaluator plus the named-variable context. Expressions are pure; compiled ASTs
 * are cached in the context keyed by source text.
 **************************************************************************************************/
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::rc::Rc;

use num_bigint::BigInt;

use bitbind_model::Value;

use crate::ast::{BinOp, Expr, UnOp};
use crate::error::EvaluationError;
use crate::parse::parse_expression;
use crate::Result;

/// Signature of a pluggable evaluator function.
pub type NativeFn = Rc<dyn Fn(&[Value]) -> Result<Value>>;

/// A named-variable mapping plus a pluggable function table.
///
/// One context belongs to one decode or encode invocation. Reserved variables (`#self` is passed
/// as the `root` argument of the evaluate operations; `#prefix` is installed by the choice
/// resolver) are layered with [`Context::put`] / [`Context::restore`] so nested carriers see
/// their own bindings and the outer bindings reappear on exit.
pub struct Context {
    vars: HashMap<String, Value>,
    funcs: HashMap<String, NativeFn>,
    cache: RefCell<HashMap<String, Rc<Expr>>>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Create an empty context.
    pub fn new() -> Self {
        Context {
            vars: HashMap::new(),
            funcs: HashMap::new(),
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Bind `name` to `value`, returning the previous binding so the caller can restore it.
    pub fn put(&mut self, name: &str, value: Value) -> Option<Value> {
        self.vars.insert(name.to_string(), value)
    }

    /// Undo a [`Context::put`]: reinstate the previous binding, or clear the name if there was
    /// none.
    pub fn restore(&mut self, name: &str, previous: Option<Value>) {
        match previous {
            Some(v) => {
                self.vars.insert(name.to_string(), v);
            }
            None => {
                self.vars.remove(name);
            }
        }
    }

    /// Look up a variable binding.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Register a function under `name`. Re-registration overrides.
    pub fn put_function<F>(&mut self, name: &str, f: F)
    where
        F: Fn(&[Value]) -> Result<Value> + 'static,
    {
        self.funcs.insert(name.to_string(), Rc::new(f));
    }

    /// Parse `src`, reusing a previously compiled AST when the same source was seen before.
    pub fn compile(&self, src: &str) -> Result<Rc<Expr>> {
        if let Some(ast) = self.cache.borrow().get(src) {
            return Ok(ast.clone());
        }
        let ast = Rc::new(parse_expression(src)?);
        self.cache
            .borrow_mut()
            .insert(src.to_string(), ast.clone());
        Ok(ast)
    }

    /// Evaluate `src` against `root` (the value `#self` refers to).
    pub fn evaluate(&self, src: &str, root: &Value) -> Result<Value> {
        let ast = self.compile(src)?;
        self.eval(&ast, root)
    }

    /// Evaluate a condition. The empty source is `true`; the exact sources `true` and `false`
    /// never reach the engine.
    pub fn evaluate_bool(&self, src: &str, root: &Value) -> Result<bool> {
        match src.trim() {
            "" | "true" => Ok(true),
            "false" => Ok(false),
            _ => match self.evaluate(src, root)? {
                Value::Bool(b) => Ok(b),
                other => Err(EvaluationError::NotABoolean(other.kind())),
            },
        }
    }

    /// Evaluate a size expression. Pure unsigned integer literals bypass the engine; any other
    /// source evaluates and coerces to an integer. Non-positive results are rejected.
    pub fn evaluate_size(&self, src: &str, root: &Value) -> Result<u64> {
        let trimmed = src.trim();
        if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            let n: i128 = trimmed.parse().map_err(|_| EvaluationError::Parse {
                src: src.to_string(),
                detail: "integer literal out of range".to_string(),
            })?;
            return size_of_int(n);
        }
        let v = self.evaluate(src, root)?;
        let n = match &v {
            Value::Int(_) | Value::Big(_) => v.as_int(),
            Value::Float(f) => Some(*f as i128),
            Value::Str(text) => text.trim().parse::<i128>().ok(),
            _ => None,
        }
        .ok_or(EvaluationError::NotAnInteger(v.kind()))?;
        size_of_int(n)
    }

    /// Evaluate an already compiled expression against `root`.
    pub fn eval(&self, e: &Expr, root: &Value) -> Result<Value> {
        match e {
            Expr::Int(v) => Ok(Value::Int(*v)),
            Expr::Str(t) => Ok(Value::Str(t.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::SelfRef => Ok(root.clone()),
            Expr::Var(name) => self
                .vars
                .get(name)
                .cloned()
                .ok_or_else(|| EvaluationError::UnknownVariable(name.clone())),
            Expr::Ident(name) => {
                if let Value::Record(r) = root {
                    if let Some(v) = r.get(name) {
                        return Ok(v.clone());
                    }
                }
                self.vars
                    .get(name)
                    .cloned()
                    .ok_or_else(|| EvaluationError::UnknownVariable(name.clone()))
            }
            Expr::Field(base, name) => match self.eval(base, root)? {
                Value::Record(r) => r
                    .get(name)
                    .cloned()
                    .ok_or_else(|| EvaluationError::UnknownField(name.clone())),
                other => Err(EvaluationError::TypeMismatch {
                    op: ".",
                    found: other.kind(),
                }),
            },
            Expr::Index(base, index) => {
                let b = self.eval(base, root)?;
                let iv = self.eval(index, root)?;
                let i = iv
                    .as_int()
                    .ok_or(EvaluationError::NotAnInteger(iv.kind()))?;
                if i < 0 {
                    return Err(EvaluationError::IndexOutOfBounds(i));
                }
                let iu = i as usize;
                match b {
                    Value::List(vs) => vs
                        .get(iu)
                        .cloned()
                        .ok_or(EvaluationError::IndexOutOfBounds(i)),
                    Value::Bytes(bs) => bs
                        .get(iu)
                        .map(|x| Value::Int(*x as i128))
                        .ok_or(EvaluationError::IndexOutOfBounds(i)),
                    Value::Bits(bv) => bv
                        .get(iu)
                        .map(|x| Value::Bool(*x))
                        .ok_or(EvaluationError::IndexOutOfBounds(i)),
                    other => Err(EvaluationError::TypeMismatch {
                        op: "[]",
                        found: other.kind(),
                    }),
                }
            }
            Expr::Unary(op, inner) => {
                let v = self.eval(inner, root)?;
                apply_unary(*op, v)
            }
            Expr::Binary(BinOp::And, l, r) => {
                if self.expect_bool("&&", l, root)? {
                    Ok(Value::Bool(self.expect_bool("&&", r, root)?))
                } else {
                    Ok(Value::Bool(false))
                }
            }
            Expr::Binary(BinOp::Or, l, r) => {
                if self.expect_bool("||", l, root)? {
                    Ok(Value::Bool(true))
                } else {
                    Ok(Value::Bool(self.expect_bool("||", r, root)?))
                }
            }
            Expr::Binary(op, l, r) => {
                let lv = self.eval(l, root)?;
                let rv = self.eval(r, root)?;
                apply_binary(*op, lv, rv)
            }
            Expr::Call(name, args) => {
                let f = self
                    .funcs
                    .get(name)
                    .cloned()
                    .ok_or_else(|| EvaluationError::UnknownFunction(name.clone()))?;
                let mut vs = Vec::with_capacity(args.len());
                for a in args {
                    vs.push(self.eval(a, root)?);
                }
                f(&vs)
            }
        }
    }

    fn expect_bool(&self, op: &'static str, e: &Expr, root: &Value) -> Result<bool> {
        match self.eval(e, root)? {
            Value::Bool(b) => Ok(b),
            other => Err(EvaluationError::TypeMismatch {
                op,
                found: other.kind(),
            }),
        }
    }
}

fn size_of_int(n: i128) -> Result<u64> {
    if n <= 0 || n > u64::MAX as i128 {
        Err(EvaluationError::InvalidSize(n))
    } else {
        Ok(n as u64)
    }
}

/***************************************************************************************************
 * Operator semantics
 **************************************************************************************************/

fn apply_unary(op: UnOp, v: Value) -> Result<Value> {
    match (op, v) {
        (UnOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnOp::Neg, Value::Int(i)) => match i.checked_neg() {
            Some(n) => Ok(Value::Int(n)),
            None => Ok(Value::Big(-BigInt::from(i))),
        },
        (UnOp::Neg, Value::Big(b)) => Ok(Value::Big(-b)),
        (UnOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnOp::Not, other) => Err(EvaluationError::TypeMismatch {
            op: "!",
            found: other.kind(),
        }),
        (UnOp::Neg, other) => Err(EvaluationError::TypeMismatch {
            op: "-",
            found: other.kind(),
        }),
    }
}

fn apply_binary(op: BinOp, l: Value, r: Value) -> Result<Value> {
    match op {
        BinOp::Eq => Ok(Value::Bool(values_equal(&l, &r))),
        BinOp::Ne => Ok(Value::Bool(!values_equal(&l, &r))),
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            let ord = compare(op_name(op), &l, &r)?;
            Ok(Value::Bool(match op {
                BinOp::Lt => ord == Ordering::Less,
                BinOp::Le => ord != Ordering::Greater,
                BinOp::Gt => ord == Ordering::Greater,
                BinOp::Ge => ord != Ordering::Less,
                _ => unreachable!(),
            }))
        }
        BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Rem => arith(op, l, r),
        BinOp::And | BinOp::Or => unreachable!("short-circuited by the evaluator"),
    }
}

fn op_name(op: BinOp) -> &'static str {
    match op {
        BinOp::Or => "||",
        BinOp::And => "&&",
        BinOp::Eq => "==",
        BinOp::Ne => "!=",
        BinOp::Lt => "<",
        BinOp::Le => "<=",
        BinOp::Gt => ">",
        BinOp::Ge => ">=",
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::Rem => "%",
    }
}

/// Equality is loose across numeric kinds and strict across categories; comparing values of
/// unrelated kinds is `false`, never an error, so choice conditions can probe freely.
fn values_equal(l: &Value, r: &Value) -> bool {
    match (l, r) {
        (Value::Float(_), _) | (_, Value::Float(_)) => match (l.as_float(), r.as_float()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
        (Value::Int(_) | Value::Big(_), Value::Int(_) | Value::Big(_)) => {
            match (l.as_int(), r.as_int()) {
                (Some(a), Some(b)) => a == b,
                // at least one side only fits a big int
                _ => match (l.as_big(), r.as_big()) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                },
            }
        }
        _ => l == r,
    }
}

fn compare(op: &'static str, l: &Value, r: &Value) -> Result<Ordering> {
    match (l, r) {
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        (Value::Float(_), _) | (_, Value::Float(_)) => {
            match (l.as_float(), r.as_float()) {
                (Some(a), Some(b)) => a.partial_cmp(&b).ok_or(EvaluationError::TypeMismatch {
                    op,
                    found: "NaN",
                }),
                _ => Err(EvaluationError::TypeMismatch {
                    op,
                    found: if l.as_float().is_none() {
                        l.kind()
                    } else {
                        r.kind()
                    },
                }),
            }
        }
        (Value::Int(_) | Value::Big(_), Value::Int(_) | Value::Big(_)) => {
            match (l.as_int(), r.as_int()) {
                (Some(a), Some(b)) => Ok(a.cmp(&b)),
                _ => Ok(l.as_big().unwrap().cmp(&r.as_big().unwrap())),
            }
        }
        _ => Err(EvaluationError::TypeMismatch {
            op,
            found: if matches!(l, Value::Int(_) | Value::Big(_) | Value::Str(_)) {
                r.kind()
            } else {
                l.kind()
            },
        }),
    }
}

fn arith(op: BinOp, l: Value, r: Value) -> Result<Value> {
    let name = op_name(op);
    // String concatenation rides on `+`
    if let (BinOp::Add, Value::Str(a), Value::Str(b)) = (op, &l, &r) {
        return Ok(Value::Str(format!("{}{}", a, b)));
    }
    match (&l, &r) {
        (Value::Float(_), _) | (_, Value::Float(_)) => {
            let (a, b) = match (l.as_float(), r.as_float()) {
                (Some(a), Some(b)) => (a, b),
                _ => {
                    return Err(EvaluationError::TypeMismatch {
                        op: name,
                        found: if l.as_float().is_none() {
                            l.kind()
                        } else {
                            r.kind()
                        },
                    })
                }
            };
            Ok(Value::Float(match op {
                BinOp::Add => a + b,
                BinOp::Sub => a - b,
                BinOp::Mul => a * b,
                BinOp::Div => a / b,
                BinOp::Rem => a % b,
                _ => unreachable!(),
            }))
        }
        (Value::Int(a), Value::Int(b)) => int_arith(op, *a, *b),
        (Value::Int(_) | Value::Big(_), Value::Int(_) | Value::Big(_)) => {
            let (a, b) = (l.as_big().unwrap(), r.as_big().unwrap());
            big_arith(op, a, b)
        }
        _ => Err(EvaluationError::TypeMismatch {
            op: name,
            found: if matches!(l, Value::Int(_) | Value::Big(_)) {
                r.kind()
            } else {
                l.kind()
            },
        }),
    }
}

fn int_arith(op: BinOp, a: i128, b: i128) -> Result<Value> {
    if matches!(op, BinOp::Div | BinOp::Rem) && b == 0 {
        return Err(EvaluationError::DivisionByZero);
    }
    let checked = match op {
        BinOp::Add => a.checked_add(b),
        BinOp::Sub => a.checked_sub(b),
        BinOp::Mul => a.checked_mul(b),
        BinOp::Div => a.checked_div(b),
        BinOp::Rem => a.checked_rem(b),
        _ => unreachable!(),
    };
    match checked {
        Some(v) => Ok(Value::Int(v)),
        // overflow widens to an arbitrary-precision result
        None => big_arith(op, BigInt::from(a), BigInt::from(b)),
    }
}

fn big_arith(op: BinOp, a: BigInt, b: BigInt) -> Result<Value> {
    use num_bigint::Sign;
    if matches!(op, BinOp::Div | BinOp::Rem) && b.sign() == Sign::NoSign {
        return Err(EvaluationError::DivisionByZero);
    }
    Ok(Value::Big(match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => a / b,
        BinOp::Rem => a % b,
        _ => unreachable!(),
    }))
}
