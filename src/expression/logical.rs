//! Boolean predicates over the parse state

use std::fmt::{Display, Formatter};
use std::rc::Rc;

use super::arithmetic::broadcast;
use super::ValueExpression;
use crate::encoding::Encoding;
use crate::graph::ParseState;
use crate::parse::error::ParseResult;
use crate::value::Value;

/// How a comparison relates its value operand to its predicate operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    /// Identical bytes.
    Eq,
    /// Equal numeric interpretation.
    EqNum,
    /// Equal text interpretation.
    EqStr,
    GtNum,
    GtEqNum,
    LtNum,
    LtEqNum,
}

impl ComparisonOp {
    fn holds(self, value: &Value, predicate: &Value) -> bool {
        match self {
            ComparisonOp::Eq => value.bytes_ref() == predicate.bytes_ref(),
            ComparisonOp::EqNum => value.as_numeric() == predicate.as_numeric(),
            ComparisonOp::EqStr => value.as_text() == predicate.as_text(),
            ComparisonOp::GtNum => value.as_numeric() > predicate.as_numeric(),
            ComparisonOp::GtEqNum => value.as_numeric() >= predicate.as_numeric(),
            ComparisonOp::LtNum => value.as_numeric() < predicate.as_numeric(),
            ComparisonOp::LtEqNum => value.as_numeric() <= predicate.as_numeric(),
        }
    }
}

impl Display for ComparisonOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ComparisonOp::Eq => "Eq",
            ComparisonOp::EqNum => "EqNum",
            ComparisonOp::EqStr => "EqStr",
            ComparisonOp::GtNum => "GtNum",
            ComparisonOp::GtEqNum => "GtEqNum",
            ComparisonOp::LtNum => "LtNum",
            ComparisonOp::LtEqNum => "LtEqNum",
        })
    }
}

/// Boolean predicate.
#[derive(Clone)]
pub enum Expression {
    True,
    And(Rc<Expression>, Rc<Expression>),
    Or(Rc<Expression>, Rc<Expression>),
    Not(Rc<Expression>),
    /// Compares `value` (the current value when `None`) against `predicate`.
    ///
    /// Holds when the value operand is non-empty and every broadcast pair
    /// is present and satisfies `op`. Operand lengths that cannot be
    /// broadcast make the comparison false.
    Comparison {
        op: ComparisonOp,
        value: Option<ValueExpression>,
        predicate: ValueExpression,
    },
}

impl Expression {
    /// Evaluates this predicate against `state`.
    ///
    /// # Errors
    ///
    /// Propagates evaluation errors of the compared value expressions.
    pub fn eval(&self, state: &ParseState, encoding: &Encoding) -> ParseResult<bool> {
        match self {
            Expression::True => Ok(true),
            Expression::And(left, right) => Ok(left.eval(state, encoding)? && right.eval(state, encoding)?),
            Expression::Or(left, right) => Ok(left.eval(state, encoding)? || right.eval(state, encoding)?),
            Expression::Not(operand) => Ok(!operand.eval(state, encoding)?),
            Expression::Comparison { op, value, predicate } => {
                let owner = match value {
                    Some(value) => value.clone(),
                    None => ValueExpression::new(super::ValueExpressionKind::SelfValue),
                };
                let values = owner.eval(state, encoding)?;
                if values.is_empty() {
                    return Ok(false);
                }
                let predicates = predicate.eval(state, encoding)?;
                let longer = values.len().max(predicates.len());
                let shorter = values.len().min(predicates.len());
                if shorter == 0 || longer % shorter != 0 {
                    return Ok(false);
                }
                let pairs = broadcast(&owner, values, predicates)?;
                Ok(pairs.iter().all(|pair| match pair {
                    (Some(v), Some(p)) => op.holds(v, p),
                    _ => false,
                }))
            }
        }
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Expression::True => f.write_str("True"),
            Expression::And(l, r) => write!(f, "And({},{})", l, r),
            Expression::Or(l, r) => write!(f, "Or({},{})", l, r),
            Expression::Not(x) => write!(f, "Not({})", x),
            Expression::Comparison {
                op,
                value: None,
                predicate,
            } => write!(f, "{}({})", op, predicate),
            Expression::Comparison {
                op,
                value: Some(value),
                predicate,
            } => write!(f, "{}({},{})", op, value, predicate),
        }
    }
}

impl std::fmt::Debug for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graph::ParseValue;
    use crate::shorthand::*;
    use crate::source::Source;

    fn check(expr: &Expression) -> bool {
        expr.eval(&ParseState::new(Source::from_bytes([0u8]), 0), &Encoding::DEFAULT)
            .unwrap()
    }

    #[test]
    fn comparisons() {
        assert!(check(&eq_of(con(1), con(1))));
        assert!(!check(&eq_of(con_bytes([0, 1]), con(1))));
        assert!(check(&eq_num_of(con_bytes([0, 1]), con(1))));
        assert!(check(&eq_str_of(con_str("abc"), con_str("abc"))));
        assert!(check(&gt_num_of(con(2), con(1))));
        assert!(check(&gt_eq_num_of(con(2), con(2))));
        assert!(check(&lt_num_of(con(1), con(2))));
        assert!(check(&lt_eq_num_of(con(1), con(1))));
        assert!(!check(&lt_num_of(con(1), con(1))));
    }

    fn with_values(bytes: &[u8]) -> ParseState {
        let token = def("x", con(1));
        bytes.iter().fold(ParseState::new(Source::from_bytes([0u8]), 0), |state, &b| {
            state.add_value(ParseValue::new(
                "x",
                token.clone(),
                Value::from_bytes(vec![b], Encoding::DEFAULT),
            ))
        })
    }

    #[test]
    fn every_pair_must_hold() {
        let expr = eq_num_of(name_ref("x"), con(1));
        assert!(expr.eval(&with_values(&[1, 1, 1]), &Encoding::DEFAULT).unwrap());
        assert!(!expr.eval(&with_values(&[1, 2, 1]), &Encoding::DEFAULT).unwrap());
        let pairwise = eq_num_of(name_ref("x"), rev(name_ref("x")));
        assert!(pairwise.eval(&with_values(&[1, 2, 1]), &Encoding::DEFAULT).unwrap());
        assert!(!pairwise.eval(&with_values(&[1, 2]), &Encoding::DEFAULT).unwrap());
        assert!(eq(con(7)).eval(&with_values(&[7]), &Encoding::DEFAULT).unwrap());
    }

    #[test]
    fn uneven_lengths_are_false() {
        let state = with_values(&[1, 1, 1]);
        let expr = eq_num_of(name_ref("x"), name_ref_limit("x", con(2)));
        assert!(!expr.eval(&state, &Encoding::DEFAULT).unwrap());
        let expr = eq_num_of(name_ref_limit("x", con(2)), name_ref("x"));
        assert!(!expr.eval(&state, &Encoding::DEFAULT).unwrap());
    }

    #[test]
    fn empty_or_absent_is_false() {
        assert!(!check(&eq_num_of(name_ref("none"), con(1))));
        assert!(!check(&eq_num_of(con(1), name_ref("none"))));
        assert!(!check(&eq(con(0))));
    }

    #[test]
    fn logic() {
        let t = Expression::True;
        let f = not(Expression::True);
        assert!(check(&and(t.clone(), t.clone())));
        assert!(!check(&and(t.clone(), f.clone())));
        assert!(check(&or(f.clone(), t.clone())));
        assert!(!check(&or(f.clone(), f)));
        assert_eq!(not(eq(con(3))).to_string(), "Not(Eq(Const(0x03)))");
    }
}
