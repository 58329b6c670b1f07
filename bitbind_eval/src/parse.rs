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
 * Parser for the bitbind expression dialect
 *
 * The implementation uses the "Nom" parser combinator library
 **************************************************************************************************/
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char as chr, digit1, hex_digit1, multispace0},
    combinator::{all_consuming, map, map_res, opt, recognize, value as to},
    error::{convert_error, VerboseError},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded},
    Err, IResult,
};

use crate::ast::{BinOp, Expr, UnOp};
use crate::error::EvaluationError;

/***************************************************************************************************
 * Error Handling
 **************************************************************************************************/

/// Type alias for the parser buffer underlying implementation.
type Buf<'a> = &'a str;

/// Type alias for the error type used by expression parsers
type ExprError<'a> = VerboseError<Buf<'a>>;

/// Type Alias for the result of any expression parser operation
type ParseResult<'a, T> = IResult<Buf<'a>, T, ExprError<'a>>;

/// Parse an expression source string into its AST.
pub(crate) fn parse_expression(src: &str) -> Result<Expr, EvaluationError> {
    match all_consuming(delimited(s, expression, s))(src) {
        Ok((_, e)) => Ok(e),
        Err(Err::Error(e)) | Err(Err::Failure(e)) => Err(EvaluationError::Parse {
            src: src.to_string(),
            detail: convert_error(src, e),
        }),
        Err(Err::Incomplete(_)) => Err(EvaluationError::Parse {
            src: src.to_string(),
            detail: "incomplete input".to_string(),
        }),
    }
}

/***************************************************************************************************
 * Expression Grammar
 **************************************************************************************************/

/// Parser for optional whitespace.
fn s(b: Buf) -> ParseResult<Buf> {
    multispace0(b)
}

/// Parser for top level:
///
/// ```text
/// expression = or_expr
/// ```
pub(crate) fn expression(b: Buf) -> ParseResult<Expr> {
    or_expr(b)
}

/// Parser for
///
/// ```text
/// or_expr = and_expr *(S "||" S and_expr)
/// ```
fn or_expr(b: Buf) -> ParseResult<Expr> {
    let (i, init) = and_expr(b)?;
    let (i, rest) = many0(preceded(delimited(s, tag("||"), s), and_expr))(i)?;
    Ok((i, fold_chain(init, BinOp::Or, rest)))
}

/// Parser for
///
/// ```text
/// and_expr = cmp_expr *(S "&&" S cmp_expr)
/// ```
fn and_expr(b: Buf) -> ParseResult<Expr> {
    let (i, init) = cmp_expr(b)?;
    let (i, rest) = many0(preceded(delimited(s, tag("&&"), s), cmp_expr))(i)?;
    Ok((i, fold_chain(init, BinOp::And, rest)))
}

/// Parser for the (non-associative) comparison level:
///
/// ```text
/// cmp_expr = add_expr [S cmp_op S add_expr]
/// cmp_op   = "==" / "!=" / "<=" / ">=" / "<" / ">"
/// ```
fn cmp_expr(b: Buf) -> ParseResult<Expr> {
    let (i, lhs) = add_expr(b)?;
    let (i, rhs) = opt(pair(delimited(s, cmp_op, s), add_expr))(i)?;
    Ok((
        i,
        match rhs {
            Some((op, r)) => Expr::Binary(op, Box::new(lhs), Box::new(r)),
            None => lhs,
        },
    ))
}

fn cmp_op(b: Buf) -> ParseResult<BinOp> {
    alt((
        to(BinOp::Eq, tag("==")),
        to(BinOp::Ne, tag("!=")),
        to(BinOp::Le, tag("<=")),
        to(BinOp::Ge, tag(">=")),
        to(BinOp::Lt, tag("<")),
        to(BinOp::Gt, tag(">")),
    ))(b)
}

/// Parser for
///
/// ```text
/// add_expr = mul_expr *(S ("+" / "-") S mul_expr)
/// ```
fn add_expr(b: Buf) -> ParseResult<Expr> {
    let (i, init) = mul_expr(b)?;
    let (i, rest) = many0(pair(
        delimited(s, alt((to(BinOp::Add, chr('+')), to(BinOp::Sub, chr('-')))), s),
        mul_expr,
    ))(i)?;
    Ok((i, fold_ops(init, rest)))
}

/// Parser for
///
/// ```text
/// mul_expr = unary_expr *(S ("*" / "/" / "%") S unary_expr)
/// ```
fn mul_expr(b: Buf) -> ParseResult<Expr> {
    let (i, init) = unary_expr(b)?;
    let (i, rest) = many0(pair(
        delimited(
            s,
            alt((
                to(BinOp::Mul, chr('*')),
                to(BinOp::Div, chr('/')),
                to(BinOp::Rem, chr('%')),
            )),
            s,
        ),
        unary_expr,
    ))(i)?;
    Ok((i, fold_ops(init, rest)))
}

/// Parser for
///
/// ```text
/// unary_expr = ("!" / "-") S unary_expr / postfix_expr
/// ```
fn unary_expr(b: Buf) -> ParseResult<Expr> {
    alt((
        map(preceded(pair(chr('!'), s), unary_expr), |e| {
            Expr::Unary(UnOp::Not, Box::new(e))
        }),
        map(preceded(pair(chr('-'), s), unary_expr), |e| {
            Expr::Unary(UnOp::Neg, Box::new(e))
        }),
        postfix_expr,
    ))(b)
}

/// Postfix steps attached to a primary expression.
enum Post {
    Field(String),
    Index(Expr),
}

/// Parser for
///
/// ```text
/// postfix_expr = primary *(S "." S identifier / S "[" S expression S "]")
/// ```
fn postfix_expr(b: Buf) -> ParseResult<Expr> {
    let (i, base) = primary(b)?;
    let (i, posts) = many0(alt((
        map(preceded(delimited(s, chr('.'), s), identifier), |n| {
            Post::Field(n.to_string())
        }),
        map(
            delimited(pair(s, chr('[')), delimited(s, expression, s), chr(']')),
            Post::Index,
        ),
    )))(i)?;
    Ok((
        i,
        posts.into_iter().fold(base, |e, p| match p {
            Post::Field(n) => Expr::Field(Box::new(e), n),
            Post::Index(ix) => Expr::Index(Box::new(e), Box::new(ix)),
        }),
    ))
}

/// Parser for
///
/// ```text
/// primary = integer / string / "#" identifier / identifier ["(" args ")"] /
///           "(" S expression S ")"
/// ```
fn primary(b: Buf) -> ParseResult<Expr> {
    alt((
        integer,
        string_lit,
        varref,
        ident_or_call,
        delimited(pair(chr('('), s), expression, pair(s, chr(')'))),
    ))(b)
}

/// Parser for decimal and `0x` hexadecimal integer literals.
fn integer(b: Buf) -> ParseResult<Expr> {
    alt((
        map_res(preceded(tag("0x"), hex_digit1), |d: &str| {
            i128::from_str_radix(d, 16).map(Expr::Int)
        }),
        map_res(digit1, |d: &str| d.parse::<i128>().map(Expr::Int)),
    ))(b)
}

/// Parser for single- or double-quoted string literals. No escape sequences; a quote of the
/// other flavor is written by switching delimiters.
fn string_lit(b: Buf) -> ParseResult<Expr> {
    map(
        alt((
            delimited(chr('\''), take_while(|c| c != '\''), chr('\'')),
            delimited(chr('"'), take_while(|c| c != '"'), chr('"')),
        )),
        |t: &str| Expr::Str(t.to_string()),
    )(b)
}

/// Parser for `#name` context-variable references. `#self` is the root carrier.
fn varref(b: Buf) -> ParseResult<Expr> {
    let (i, name) = preceded(chr('#'), identifier)(b)?;
    if name == "self" {
        Ok((i, Expr::SelfRef))
    } else {
        Ok((i, Expr::Var(format!("#{}", name))))
    }
}

/// Parser for bare identifiers, the `true`/`false` keywords, and function calls.
fn ident_or_call(b: Buf) -> ParseResult<Expr> {
    let (i, name) = identifier(b)?;
    match name {
        "true" => return Ok((i, Expr::Bool(true))),
        "false" => return Ok((i, Expr::Bool(false))),
        _ => {}
    }
    let (i, args) = opt(delimited(
        pair(s, chr('(')),
        separated_list0(delimited(s, chr(','), s), delimited(s, expression, s)),
        chr(')'),
    ))(i)?;
    Ok((
        i,
        match args {
            Some(args) => Expr::Call(name.to_string(), args),
            None => Expr::Ident(name.to_string()),
        },
    ))
}

fn identifier(b: Buf) -> ParseResult<&str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(b)
}

fn fold_chain(init: Expr, op: BinOp, rest: Vec<Expr>) -> Expr {
    rest.into_iter()
        .fold(init, |l, r| Expr::Binary(op, Box::new(l), Box::new(r)))
}

fn fold_ops(init: Expr, rest: Vec<(BinOp, Expr)>) -> Expr {
    rest.into_iter()
        .fold(init, |l, (op, r)| Expr::Binary(op, Box::new(l), Box::new(r)))
}

//*************************************************************************************************
// Unit Tests
//*************************************************************************************************
#[cfg(test)]
mod tests {
    use super::*;

    fn p(src: &str) -> Expr {
        parse_expression(src).unwrap()
    }

    #[test]
    fn literals_t() {
        assert_eq!(p("42"), Expr::Int(42));
        assert_eq!(p("0x2a"), Expr::Int(42));
        assert_eq!(p("'a,b'"), Expr::Str("a,b".to_string()));
        assert_eq!(p("\"x\""), Expr::Str("x".to_string()));
        assert_eq!(p("true"), Expr::Bool(true));
        assert_eq!(p("false"), Expr::Bool(false));
    }

    #[test]
    fn varref_t() {
        assert_eq!(p("#self"), Expr::SelfRef);
        assert_eq!(p("#prefix"), Expr::Var("#prefix".to_string()));
        assert_eq!(p("count"), Expr::Ident("count".to_string()));
        // `trueish` is an identifier, not the keyword plus garbage
        assert_eq!(p("trueish"), Expr::Ident("trueish".to_string()));
    }

    #[test]
    fn precedence_t() {
        assert_eq!(
            p("1 + 2 * 3"),
            Expr::Binary(
                BinOp::Add,
                Box::new(Expr::Int(1)),
                Box::new(Expr::Binary(
                    BinOp::Mul,
                    Box::new(Expr::Int(2)),
                    Box::new(Expr::Int(3))
                ))
            )
        );
        assert_eq!(
            p("(1 + 2) * 3"),
            Expr::Binary(
                BinOp::Mul,
                Box::new(Expr::Binary(
                    BinOp::Add,
                    Box::new(Expr::Int(1)),
                    Box::new(Expr::Int(2))
                )),
                Box::new(Expr::Int(3))
            )
        );
    }

    #[test]
    fn postfix_t() {
        assert_eq!(
            p("header.length"),
            Expr::Field(
                Box::new(Expr::Ident("header".to_string())),
                "length".to_string()
            )
        );
        assert_eq!(
            p("index[#prefix]"),
            Expr::Index(
                Box::new(Expr::Ident("index".to_string())),
                Box::new(Expr::Var("#prefix".to_string()))
            )
        );
    }

    #[test]
    fn call_t() {
        assert_eq!(
            p("min(a, 2)"),
            Expr::Call(
                "min".to_string(),
                vec![Expr::Ident("a".to_string()), Expr::Int(2)]
            )
        );
    }

    #[test]
    fn boolean_structure_t() {
        // `a == 1 || b == 2 && c` parses as `(a == 1) || ((b == 2) && c)`
        let e = p("a == 1 || b == 2 && c");
        match e {
            Expr::Binary(BinOp::Or, _, rhs) => match *rhs {
                Expr::Binary(BinOp::And, _, _) => {}
                other => panic!("expected && on the right, got {:?}", other),
            },
            other => panic!("expected || at the top, got {:?}", other),
        }
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(parse_expression("1 +").is_err());
        assert!(parse_expression("a b").is_err());
        assert!(parse_expression("").is_err());
    }
}
