//! Terse constructors for grammars and expressions
//!
//! Everything here is sugar over [`Token`], [`ValueExpression`] and
//! [`Expression`] constructors, meant to be glob-imported:
//!
//! ```
//! use ferrite::shorthand::*;
//!
//! // length-prefixed record
//! let record = ferrite::seq!("record", def("len", con(1)), def("data", last(name_ref("len"))));
//! let parsed = ferrite::parse(&record, ferrite::Source::from_bytes([2, 7, 9]), 0, Default::default()).unwrap();
//! assert_eq!(parsed.offset(), 3);
//! ```
//!
//! Binary value constructors take their operands by value so they can be
//! passed directly as fold reducers, e.g. `fold_left(xs, add)`.

use std::rc::Rc;

use num_bigint::BigInt;

use crate::encoding::Encoding;
use crate::expression::{
    BinaryOp, ComparisonOp, Expression, FoldDirection, UnaryOp, ValueExpression, ValueExpressionKind as K,
};
use crate::token::{Token, TokenKind};
use crate::value::Value;

/// Sequence of two or more tokens: `seq!(name, a, b, ...)`.
#[macro_export]
macro_rules! seq {
    ($name:expr, $first:expr, $second:expr $(, $rest:expr)* $(,)?) => {
        $crate::token::Token::sequence($name, $first, $second, [$($rest),*])
    };
}

/// Choice between two or more tokens, tried in order: `cho!(name, a, b, ...)`.
#[macro_export]
macro_rules! cho {
    ($name:expr, $first:expr, $second:expr $(, $rest:expr)* $(,)?) => {
        $crate::token::Token::choice($name, $first, $second, [$($rest),*])
    };
}

fn token_of(name: &str, kind: TokenKind) -> Token {
    Token::new_unchecked(name, None, kind)
}

// Tokens

#[must_use]
pub fn def(name: &str, size: impl Into<ValueExpression>) -> Token {
    token_of(
        name,
        TokenKind::Def {
            size: size.into(),
            predicate: None,
        },
    )
}

/// Field whose value must satisfy `predicate`.
#[must_use]
pub fn def_if(name: &str, size: impl Into<ValueExpression>, predicate: Expression) -> Token {
    token_of(
        name,
        TokenKind::Def {
            size: size.into(),
            predicate: Some(predicate),
        },
    )
}

/// Unnamed field, for bytes that are skipped over.
#[must_use]
pub fn nod(size: impl Into<ValueExpression>) -> Token {
    def("", size)
}

/// Token that always commits and consumes nothing.
#[must_use]
pub fn empty() -> Token {
    def("", 0)
}

#[must_use]
pub fn seq(name: &str, first: Token, second: Token) -> Token {
    Token::sequence(name, first, second, [])
}

#[must_use]
pub fn cho(name: &str, first: Token, second: Token) -> Token {
    Token::choice(name, first, second, [])
}

#[must_use]
pub fn rep(name: &str, body: Token) -> Token {
    token_of(name, TokenKind::Rep { body, condition: None })
}

/// Repetition that continues only while `condition` holds.
#[must_use]
pub fn rep_while(name: &str, body: Token, condition: Expression) -> Token {
    token_of(
        name,
        TokenKind::Rep {
            body,
            condition: Some(condition),
        },
    )
}

#[must_use]
pub fn repn(name: &str, body: Token, count: impl Into<ValueExpression>) -> Token {
    token_of(
        name,
        TokenKind::RepN {
            body,
            count: count.into(),
        },
    )
}

/// Records `1`, `2`, ... up to `max` under `name` and keeps the first
/// counter for which `body` parses.
#[must_use]
pub fn range(name: &str, body: Token, max: impl Into<ValueExpression>) -> Token {
    token_of(name, TokenKind::Range { body, max: max.into() })
}

/// Value of any size followed by `terminator`.
#[must_use]
pub fn until(name: &str, terminator: Token) -> Token {
    token_of(
        name,
        TokenKind::Until {
            initial: 0.into(),
            step: 1.into(),
            max: None,
            terminator,
        },
    )
}

#[must_use]
pub fn until_bounded(
    name: &str,
    initial: impl Into<ValueExpression>,
    step: impl Into<ValueExpression>,
    max: impl Into<ValueExpression>,
    terminator: Token,
) -> Token {
    token_of(
        name,
        TokenKind::Until {
            initial: initial.into(),
            step: step.into(),
            max: Some(max.into()),
            terminator,
        },
    )
}

#[must_use]
pub fn pre(body: Token, predicate: Expression) -> Token {
    token_of("", TokenKind::Pre { body, predicate })
}

#[must_use]
pub fn post(body: Token, predicate: Expression) -> Token {
    token_of("", TokenKind::Post { body, predicate })
}

#[must_use]
pub fn opt(body: Token) -> Token {
    cho("", body, empty())
}

/// `body` if `predicate` holds, nothing otherwise.
#[must_use]
pub fn when(body: Token, predicate: Expression) -> Token {
    cho("", pre(empty(), not(predicate)), body)
}

#[must_use]
pub fn sub(body: Token, offsets: impl Into<ValueExpression>) -> Token {
    token_of(
        "",
        TokenKind::Sub {
            body,
            offsets: offsets.into(),
        },
    )
}

#[must_use]
pub fn tie(body: Token, data: impl Into<ValueExpression>) -> Token {
    token_of("", TokenKind::Tie { body, data: data.into() })
}

/// Reference to the definition named `name`, resolved while parsing.
///
/// # Panics
///
/// Panics if `name` is empty; use [`Token::new`] to handle that case.
#[must_use]
pub fn token(name: &str) -> Token {
    assert!(!name.is_empty(), "token reference name may not be empty");
    token_of("", TokenKind::Ref(Rc::from(name)))
}

// Values

#[must_use]
pub fn con(n: i64) -> ValueExpression {
    n.into()
}

#[must_use]
pub fn con_bytes(bytes: impl Into<Vec<u8>>) -> ValueExpression {
    ValueExpression::constant(Value::from_bytes(bytes, Encoding::DEFAULT))
}

#[must_use]
pub fn con_str(text: &str) -> ValueExpression {
    ValueExpression::constant(Value::from_text(text, Encoding::DEFAULT))
}

/// Constant of arbitrary magnitude.
#[must_use]
pub fn con_big(n: &BigInt) -> ValueExpression {
    ValueExpression::constant(Value::from_numeric(n, Encoding::DEFAULT))
}

/// The current value.
#[must_use]
pub fn self_value() -> ValueExpression {
    ValueExpression::new(K::SelfValue)
}

#[must_use]
pub fn current_offset() -> ValueExpression {
    ValueExpression::new(K::CurrentOffset)
}

/// Iteration index of the repetition `level` scopes out (0 = innermost).
#[must_use]
pub fn iteration(level: usize) -> ValueExpression {
    ValueExpression::new(K::CurrentIteration(level))
}

#[must_use]
pub fn name_ref(name: &str) -> ValueExpression {
    ValueExpression::new(K::NameRef {
        name: Rc::from(name),
        limit: None,
    })
}

/// The `limit` most recent values named `name`.
#[must_use]
pub fn name_ref_limit(name: &str, limit: impl Into<ValueExpression>) -> ValueExpression {
    ValueExpression::new(K::NameRef {
        name: Rc::from(name),
        limit: Some(limit.into()),
    })
}

#[must_use]
pub fn def_ref(definition: &Token) -> ValueExpression {
    ValueExpression::new(K::DefinitionRef {
        definition: definition.clone(),
        limit: None,
    })
}

#[must_use]
pub fn def_ref_limit(definition: &Token, limit: impl Into<ValueExpression>) -> ValueExpression {
    ValueExpression::new(K::DefinitionRef {
        definition: definition.clone(),
        limit: Some(limit.into()),
    })
}

#[must_use]
pub fn first(operand: ValueExpression) -> ValueExpression {
    ValueExpression::new(K::First(operand))
}

#[must_use]
pub fn last(operand: ValueExpression) -> ValueExpression {
    ValueExpression::new(K::Last(operand))
}

#[must_use]
pub fn nth(values: ValueExpression, indices: ValueExpression) -> ValueExpression {
    ValueExpression::new(K::Nth { values, indices })
}

#[must_use]
pub fn count(operand: ValueExpression) -> ValueExpression {
    ValueExpression::new(K::Count(operand))
}

#[must_use]
pub fn len(operand: ValueExpression) -> ValueExpression {
    ValueExpression::new(K::Len(operand))
}

#[must_use]
pub fn offset(operand: ValueExpression) -> ValueExpression {
    ValueExpression::new(K::Offset(operand))
}

#[must_use]
pub fn rev(operand: ValueExpression) -> ValueExpression {
    ValueExpression::new(K::Reverse(operand))
}

#[must_use]
pub fn bytes_of(operand: ValueExpression) -> ValueExpression {
    ValueExpression::new(K::Bytes(operand))
}

/// `base` repeated `count` times.
#[must_use]
pub fn exp(base: ValueExpression, count: ValueExpression) -> ValueExpression {
    ValueExpression::new(K::Expand { base, count })
}

#[must_use]
pub fn elvis(left: ValueExpression, right: ValueExpression) -> ValueExpression {
    ValueExpression::new(K::Elvis { left, right })
}

/// All values of `operand` concatenated, oldest first.
#[must_use]
pub fn cat_all(operand: ValueExpression) -> ValueExpression {
    ValueExpression::new(K::FoldCat(operand))
}

fn fold_of(
    direction: FoldDirection,
    values: ValueExpression,
    reducer: impl Fn(ValueExpression, ValueExpression) -> ValueExpression + 'static,
    initial: Option<ValueExpression>,
) -> ValueExpression {
    ValueExpression::new(K::Fold {
        direction,
        values,
        reducer: Rc::new(reducer),
        initial,
    })
}

#[must_use]
pub fn fold_left(
    values: ValueExpression,
    reducer: impl Fn(ValueExpression, ValueExpression) -> ValueExpression + 'static,
) -> ValueExpression {
    fold_of(FoldDirection::Left, values, reducer, None)
}

#[must_use]
pub fn fold_left_from(
    values: ValueExpression,
    reducer: impl Fn(ValueExpression, ValueExpression) -> ValueExpression + 'static,
    initial: ValueExpression,
) -> ValueExpression {
    fold_of(FoldDirection::Left, values, reducer, Some(initial))
}

#[must_use]
pub fn fold_right(
    values: ValueExpression,
    reducer: impl Fn(ValueExpression, ValueExpression) -> ValueExpression + 'static,
) -> ValueExpression {
    fold_of(FoldDirection::Right, values, reducer, None)
}

#[must_use]
pub fn fold_right_from(
    values: ValueExpression,
    reducer: impl Fn(ValueExpression, ValueExpression) -> ValueExpression + 'static,
    initial: ValueExpression,
) -> ValueExpression {
    fold_of(FoldDirection::Right, values, reducer, Some(initial))
}

/// `op(left, exp(right, count(left)))`
#[must_use]
pub fn map_left(
    op: impl Fn(ValueExpression, ValueExpression) -> ValueExpression,
    left: ValueExpression,
    right: ValueExpression,
) -> ValueExpression {
    let expanded = exp(right, count(left.clone()));
    op(left, expanded)
}

/// `op(exp(left, count(right)), right)`
#[must_use]
pub fn map_right(
    op: impl Fn(ValueExpression, ValueExpression) -> ValueExpression,
    left: ValueExpression,
    right: ValueExpression,
) -> ValueExpression {
    let expanded = exp(left, count(right.clone()));
    op(expanded, right)
}

/// Applies `transform` to every present value of `operand`.
#[must_use]
pub fn transform(
    name: &str,
    operand: ValueExpression,
    transform: impl Fn(&Value, &Encoding) -> Option<Value> + 'static,
) -> ValueExpression {
    ValueExpression::new(K::Transform {
        name: Rc::from(name),
        operand,
        transform: Rc::new(transform),
    })
}

fn unary(op: UnaryOp, operand: ValueExpression) -> ValueExpression {
    ValueExpression::new(K::Unary { op, operand })
}

fn binary(op: BinaryOp, left: ValueExpression, right: ValueExpression) -> ValueExpression {
    ValueExpression::new(K::Binary { op, left, right })
}

macro_rules! binary_shorthand {
    ( $( $(#[$meta:meta])* $name:ident => $op:ident ),+ $(,)? ) => {
        $(
            $(#[$meta])*
            #[must_use]
            pub fn $name(left: ValueExpression, right: ValueExpression) -> ValueExpression {
                binary(BinaryOp::$op, left, right)
            }
        )+
    };
}

binary_shorthand! {
    add => Add,
    subtract => Sub,
    mul => Mul,
    /// Truncating division.
    div => Div,
    /// Non-negative remainder.
    modulo => Mod,
    bit_and => And,
    bit_or => Or,
    shl => Shl,
    shr => Shr,
    /// Byte concatenation, pairwise.
    cat => Cat,
}

#[must_use]
pub fn neg(operand: ValueExpression) -> ValueExpression {
    unary(UnaryOp::Neg, operand)
}

#[must_use]
pub fn bit_not(operand: ValueExpression) -> ValueExpression {
    unary(UnaryOp::Not, operand)
}

// Predicates

#[must_use]
pub fn and(left: Expression, right: Expression) -> Expression {
    Expression::And(Rc::new(left), Rc::new(right))
}

#[must_use]
pub fn or(left: Expression, right: Expression) -> Expression {
    Expression::Or(Rc::new(left), Rc::new(right))
}

#[must_use]
pub fn not(operand: Expression) -> Expression {
    Expression::Not(Rc::new(operand))
}

macro_rules! comparison_shorthand {
    ( $( $name:ident, $name_of:ident => $op:ident ),+ $(,)? ) => {
        $(
            /// Compares the current value against `predicate`.
            #[must_use]
            pub fn $name(predicate: ValueExpression) -> Expression {
                Expression::Comparison {
                    op: ComparisonOp::$op,
                    value: None,
                    predicate,
                }
            }

            /// Compares `value` against `predicate`.
            #[must_use]
            pub fn $name_of(value: ValueExpression, predicate: ValueExpression) -> Expression {
                Expression::Comparison {
                    op: ComparisonOp::$op,
                    value: Some(value),
                    predicate,
                }
            }
        )+
    };
}

comparison_shorthand! {
    eq, eq_of => Eq,
    eq_num, eq_num_of => EqNum,
    eq_str, eq_str_of => EqStr,
    gt_num, gt_num_of => GtNum,
    gt_eq_num, gt_eq_num_of => GtEqNum,
    lt_num, lt_num_of => LtNum,
    lt_eq_num, lt_eq_num_of => LtEqNum,
}
