//! Elementwise numeric, bitwise and concatenation operators
//!
//! Numbers are arbitrary precision, so no result can overflow; every
//! result is stored in the minimal number of bytes for the evaluation
//! encoding. Bitwise operators work on the stored bit pattern, aligned at
//! the least significant byte.

use std::fmt::{Display, Formatter};

use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;

use super::structural::repeat;
use super::{ValueExpression, MAX_DERIVED_LEN};
use crate::encoding::{ByteOrder, Encoding};
use crate::error::ArgumentError;
use crate::parse::error::{ParseError, ParseResult};
use crate::value::{Value, ValueList};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Shl,
    Shr,
    Cat,
}

impl Display for UnaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            UnaryOp::Neg => "Neg",
            UnaryOp::Not => "Not",
        })
    }
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            BinaryOp::Add => "Add",
            BinaryOp::Sub => "Sub",
            BinaryOp::Mul => "Mul",
            BinaryOp::Div => "Div",
            BinaryOp::Mod => "Mod",
            BinaryOp::And => "And",
            BinaryOp::Or => "Or",
            BinaryOp::Shl => "ShiftLeft",
            BinaryOp::Shr => "ShiftRight",
            BinaryOp::Cat => "Cat",
        })
    }
}

type Pairs = Vec<(Option<Value>, Option<Value>)>;

/// Pairs two operand lists by position from the head, repeating the
/// shorter one when its length divides the longer one's.
///
/// # Errors
///
/// Returns [`ArgumentError::ArityMismatch`] for lengths that cannot be
/// reconciled.
pub(crate) fn broadcast(owner: &ValueExpression, left: ValueList, right: ValueList) -> ParseResult<Pairs> {
    let (l, r) = (left.len(), right.len());
    let (left, right) = if l == r || l == 0 || r == 0 {
        (left, right)
    } else if l > r && l % r == 0 {
        let right = repeat(&right, l / r);
        (left, right)
    } else if r > l && r % l == 0 {
        let left = repeat(&left, r / l);
        (left, right)
    } else {
        return Err(ArgumentError::ArityMismatch {
            operator: owner.to_string(),
            left: l,
            right: r,
        }
        .into());
    };
    let len = left.len().max(right.len());
    Ok((0..len)
        .map(|i| (left.get(i).cloned().flatten(), right.get(i).cloned().flatten()))
        .collect())
}

/// Stores most-significant-first `bytes` in `encoding`'s byte order.
fn store(mut bytes: Vec<u8>, encoding: &Encoding) -> Value {
    if encoding.byte_order == ByteOrder::LittleEndian {
        bytes.reverse();
    }
    Value::from_bytes(bytes, *encoding)
}

fn pad_to(mut bytes: Vec<u8>, width: usize) -> Vec<u8> {
    if bytes.len() < width {
        let mut padded = vec![0u8; width - bytes.len()];
        padded.append(&mut bytes);
        padded
    } else {
        bytes
    }
}

/// Non-negative shift amount; `None` when it does not fit in a `usize`.
fn shift_amount(owner: &ValueExpression, value: &Value) -> ParseResult<Option<usize>> {
    let n = value.as_numeric();
    if n.sign() == Sign::Minus {
        return Err(invalid_shift(owner));
    }
    Ok(usize::try_from(n).ok())
}

fn invalid_shift(owner: &ValueExpression) -> ParseError {
    ArgumentError::InvalidShift {
        expression: owner.to_string(),
    }
    .into()
}

pub(crate) fn eval_unary(op: UnaryOp, operand: &ValueList, encoding: &Encoding) -> ValueList {
    operand
        .iter()
        .map(|entry| {
            entry.as_ref().map(|value| match op {
                UnaryOp::Neg => Value::from_numeric(&-value.as_numeric(), *encoding),
                UnaryOp::Not => store(value.numeric_bytes().iter().map(|b| !b).collect(), encoding),
            })
        })
        .collect()
}

fn apply(owner: &ValueExpression, op: BinaryOp, left: &Value, right: &Value, encoding: &Encoding) -> ParseResult<Value> {
    let numeric = |n: BigInt| Value::from_numeric(&n, *encoding);
    let value = match op {
        BinaryOp::Add => numeric(left.as_numeric() + right.as_numeric()),
        BinaryOp::Sub => numeric(left.as_numeric() - right.as_numeric()),
        BinaryOp::Mul => numeric(left.as_numeric() * right.as_numeric()),
        BinaryOp::Div | BinaryOp::Mod => {
            let divisor = right.as_numeric();
            match divisor.sign() {
                Sign::NoSign => {
                    return Err(ArgumentError::DivisionByZero {
                        expression: owner.to_string(),
                    }
                    .into())
                }
                Sign::Minus if op == BinaryOp::Mod => {
                    return Err(ArgumentError::NonPositiveModulus {
                        expression: owner.to_string(),
                    }
                    .into())
                }
                _ if op == BinaryOp::Mod => numeric(left.as_numeric().mod_floor(&divisor)),
                _ => numeric(left.as_numeric() / divisor),
            }
        }
        BinaryOp::And | BinaryOp::Or => {
            let width = left.len().max(right.len());
            let l = pad_to(left.numeric_bytes(), width);
            let r = pad_to(right.numeric_bytes(), width);
            let bytes = l
                .iter()
                .zip(r.iter())
                .map(|(a, b)| if op == BinaryOp::And { a & b } else { a | b })
                .collect();
            store(bytes, encoding)
        }
        BinaryOp::Shl => {
            let amount = shift_amount(owner, right)?.ok_or_else(|| invalid_shift(owner))?;
            let width = left
                .len()
                .checked_mul(8)
                .and_then(|bits| bits.checked_add(amount))
                .and_then(|bits| bits.checked_add(7))
                .map(|bits| bits / 8)
                .filter(|&width| width <= MAX_DERIVED_LEN)
                .ok_or_else(|| invalid_shift(owner))?;
            let shifted = BigUint::from_bytes_be(&left.numeric_bytes()) << amount;
            store(pad_to(shifted.to_bytes_be(), width.max(1)), encoding)
        }
        BinaryOp::Shr => {
            let width = left.len().max(1);
            match shift_amount(owner, right)? {
                Some(amount) => {
                    let shifted = BigUint::from_bytes_be(&left.numeric_bytes()) >> amount;
                    store(pad_to(shifted.to_bytes_be(), width), encoding)
                }
                None => store(vec![0; width], encoding),
            }
        }
        BinaryOp::Cat => {
            let mut bytes = left.bytes();
            bytes.extend_from_slice(right.bytes_ref());
            Value::from_bytes(bytes, *encoding)
        }
    };
    Ok(value)
}

pub(crate) fn eval_binary(
    owner: &ValueExpression,
    op: BinaryOp,
    left: ValueList,
    right: ValueList,
    encoding: &Encoding,
) -> ParseResult<ValueList> {
    broadcast(owner, left, right)?
        .into_iter()
        .map(|pair| match pair {
            (Some(l), Some(r)) => apply(owner, op, &l, &r, encoding).map(Some),
            _ => Ok(None),
        })
        .collect::<ParseResult<Vec<_>>>()
        .map(ValueList::from)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graph::ParseState;
    use crate::parse::error::ParseError;
    use crate::shorthand::*;
    use crate::source::Source;

    fn eval(expr: &ValueExpression) -> ParseResult<ValueList> {
        expr.eval(&ParseState::new(Source::from_bytes([0u8]), 0), &Encoding::DEFAULT)
    }

    fn nums(list: &ValueList) -> Vec<Option<i64>> {
        list.iter().map(|e| e.as_ref().and_then(Value::as_i64)).collect()
    }

    #[test]
    fn arithmetic_widens() {
        assert_eq!(nums(&eval(&add(con(255), con(1))).unwrap()), vec![Some(256)]);
        assert_eq!(eval(&add(con(255), con(1))).unwrap()[0].as_ref().unwrap().len(), 2);
        assert_eq!(nums(&eval(&subtract(con(1), con(3))).unwrap()), vec![Some(-2)]);
        assert_eq!(nums(&eval(&mul(con(16), con(16))).unwrap()), vec![Some(256)]);
        assert_eq!(nums(&eval(&div(con(7), con(2))).unwrap()), vec![Some(3)]);
        assert_eq!(nums(&eval(&modulo(neg(con(7)), con(3))).unwrap()), vec![Some(2)]);
    }

    #[test]
    fn division_errors() {
        assert!(matches!(
            eval(&div(con(1), con(0))),
            Err(ParseError::Argument(ArgumentError::DivisionByZero { .. }))
        ));
        assert!(matches!(
            eval(&modulo(con(1), neg(con(2)))),
            Err(ParseError::Argument(ArgumentError::NonPositiveModulus { .. }))
        ));
        assert!(matches!(
            eval(&shl(con(1), neg(con(1)))),
            Err(ParseError::Argument(ArgumentError::InvalidShift { .. }))
        ));
    }

    #[test]
    fn bitwise_aligns_low_bytes() {
        let v = eval(&bit_and(con_bytes([0x12, 0x34]), con(0xff))).unwrap();
        assert_eq!(v[0].as_ref().unwrap().bytes(), vec![0x00, 0x34]);
        let v = eval(&bit_or(con(0x80), con(0x01))).unwrap();
        assert_eq!(v[0].as_ref().unwrap().bytes(), vec![0x81]);
        let v = eval(&bit_not(con(0x0f))).unwrap();
        assert_eq!(v[0].as_ref().unwrap().bytes(), vec![0xf0]);
    }

    #[test]
    fn shifts() {
        let v = eval(&shl(con(0x01), con(7))).unwrap();
        assert_eq!(v[0].as_ref().unwrap().bytes(), vec![0x00, 0x80]);
        let v = eval(&shl(con(0x01), con(1))).unwrap();
        assert_eq!(v[0].as_ref().unwrap().bytes(), vec![0x00, 0x02]);
        let v = eval(&shr(con_bytes([0x01, 0x00]), con(4))).unwrap();
        assert_eq!(v[0].as_ref().unwrap().bytes(), vec![0x00, 0x10]);
    }

    #[test]
    fn oversized_shifts() {
        for amount in [con_bytes([0xff; 8]), con_bytes([0x01, 0, 0, 0, 0, 0]), con_bytes([0xff; 16])] {
            assert!(matches!(
                eval(&shl(con(1), amount)),
                Err(ParseError::Argument(ArgumentError::InvalidShift { .. }))
            ));
        }
        let v = eval(&shr(con_bytes([0x12, 0x34]), con_bytes([0xff; 16]))).unwrap();
        assert_eq!(v[0].as_ref().unwrap().bytes(), vec![0x00, 0x00]);
        let v = eval(&shr(con(0x80), con_bytes([0x01, 0, 0, 0, 0, 0]))).unwrap();
        assert_eq!(v[0].as_ref().unwrap().bytes(), vec![0x00]);
    }

    #[test]
    fn broadcast_rules() {
        let two = exp(con(1), con(2));
        let four = exp(con(2), con(4));
        assert_eq!(nums(&eval(&add(two.clone(), four.clone())).unwrap()), vec![Some(3); 4]);
        assert_eq!(nums(&eval(&add(four, two)).unwrap()), vec![Some(3); 4]);
        let three = exp(con(1), con(3));
        assert!(matches!(
            eval(&add(exp(con(1), con(2)), three.clone())),
            Err(ParseError::Argument(ArgumentError::ArityMismatch { left: 2, right: 3, .. }))
        ));
        assert_eq!(nums(&eval(&add(three, name_ref("none"))).unwrap()), vec![None; 3]);
        assert!(eval(&add(name_ref("none"), name_ref("none"))).unwrap().is_empty());
    }

    #[test]
    fn cat_joins_pairwise() {
        let v = eval(&cat(con_bytes([1, 2]), con_bytes([3]))).unwrap();
        assert_eq!(v[0].as_ref().unwrap().bytes(), vec![1, 2, 3]);
        let v = eval(&cat(con(1), nth(con(1), con(5)))).unwrap();
        assert_eq!(v, ValueList::absent());
    }
}
