//! Multi-valued expressions over the parse state
//!
//! A [`ValueExpression`] evaluates to a [`ValueList`]: zero, one or many
//! values, each possibly absent. Expressions size fields, bound
//! repetitions, compute sub-parse offsets and supply the bytes of derived
//! sources. An [`Expression`] is a boolean predicate built from
//! comparisons of value expressions, used to accept or reject values and
//! to steer repetitions.
//!
//! # Ordering
//!
//! Results follow [`ValueList`] order: the head is the most recent value.
//! Positional operators ([`first`](crate::shorthand::first),
//! [`last`](crate::shorthand::last), [`nth`](crate::shorthand::nth)) count
//! chronologically, so `first` is the oldest value and `last` the newest.
//!
//! # Broadcasting
//!
//! Binary operators pair their operands by position from the head. When
//! the lengths differ and the shorter length divides the longer one, the
//! shorter operand is repeated as a whole to match; when one operand is
//! empty every position yields an absent value; any other mismatch is an
//! [`ArgumentError::ArityMismatch`]. Comparisons pair the same way but
//! evaluate to false instead of failing.
//!
//! # Layout
//!
//! * [`reference`]: graph lookups and positional operators.
//! * [`structural`]: reversal, byte decomposition, expansion, folds.
//! * [`arithmetic`]: elementwise numeric, bitwise and concatenation operators.
//! * [`logical`]: boolean predicates.

pub mod arithmetic;
pub mod logical;
pub mod reference;
pub mod structural;

use std::fmt::{Debug, Display, Formatter};
use std::rc::Rc;

use num_bigint::BigInt;

use crate::encoding::Encoding;
use crate::error::ArgumentError;
use crate::graph::ParseState;
use crate::parse::error::ParseResult;
use crate::token::Token;
use crate::value::{Value, ValueList};

pub use arithmetic::{BinaryOp, UnaryOp};
pub use logical::{ComparisonOp, Expression};
pub use structural::FoldDirection;

/// Largest value, in bytes, that a shift or an expansion may produce.
pub const MAX_DERIVED_LEN: usize = 1 << 24;

/// Combines two single-value expressions into a new expression.
pub type Reducer = Rc<dyn Fn(ValueExpression, ValueExpression) -> ValueExpression>;

/// One-to-one mapping applied to every present value of an operand.
///
/// Returning `None` yields an absent value at that position.
pub type TransformFn = Rc<dyn Fn(&Value, &Encoding) -> Option<Value>>;

/// Node kinds of a [`ValueExpression`].
pub enum ValueExpressionKind {
    /// A literal, independent of the graph.
    Const(Value),
    /// The most recent value of the innermost open scope.
    SelfValue,
    /// The cursor position.
    CurrentOffset,
    /// Iteration index of the repetition `level` scopes out from the innermost.
    CurrentIteration(usize),
    /// All values with a matching name, most recent first.
    NameRef {
        name: Rc<str>,
        limit: Option<ValueExpression>,
    },
    /// All values produced by a token, most recent first.
    DefinitionRef {
        definition: Token,
        limit: Option<ValueExpression>,
    },
    First(ValueExpression),
    Last(ValueExpression),
    Nth {
        values: ValueExpression,
        indices: ValueExpression,
    },
    Count(ValueExpression),
    Len(ValueExpression),
    Offset(ValueExpression),
    Reverse(ValueExpression),
    Bytes(ValueExpression),
    Expand {
        base: ValueExpression,
        count: ValueExpression,
    },
    Elvis {
        left: ValueExpression,
        right: ValueExpression,
    },
    /// Concatenation of all values of the operand, oldest first.
    FoldCat(ValueExpression),
    Fold {
        direction: FoldDirection,
        values: ValueExpression,
        reducer: Reducer,
        initial: Option<ValueExpression>,
    },
    Unary {
        op: UnaryOp,
        operand: ValueExpression,
    },
    Binary {
        op: BinaryOp,
        left: ValueExpression,
        right: ValueExpression,
    },
    Transform {
        name: Rc<str>,
        operand: ValueExpression,
        transform: TransformFn,
    },
}

/// Shared, immutable expression tree.
#[derive(Clone)]
pub struct ValueExpression(Rc<ValueExpressionKind>);

impl ValueExpression {
    #[must_use]
    pub fn new(kind: ValueExpressionKind) -> Self {
        Self(Rc::new(kind))
    }

    #[must_use]
    pub fn kind(&self) -> &ValueExpressionKind {
        &self.0
    }

    /// Literal expression yielding `value`.
    #[must_use]
    pub fn constant(value: Value) -> Self {
        Self::new(ValueExpressionKind::Const(value))
    }

    /// Evaluates this expression against `state`, creating any computed
    /// values in `encoding`.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError`]s for operands of the wrong shape and
    /// propagates errors from reading sources.
    pub fn eval(&self, state: &ParseState, encoding: &Encoding) -> ParseResult<ValueList> {
        use ValueExpressionKind as K;
        match self.kind() {
            K::Const(value) => Ok(ValueList::single(value.clone())),
            K::SelfValue => Ok(reference::self_value(state)),
            K::CurrentOffset => Ok(reference::current_offset(state, encoding)),
            K::CurrentIteration(level) => Ok(reference::current_iteration(state, *level, encoding)),
            K::NameRef { name, limit } => {
                let limit = reference::eval_limit(self, limit.as_ref(), state, encoding)?;
                Ok(reference::to_list(state.graph().values_named(name, limit)))
            }
            K::DefinitionRef { definition, limit } => {
                let limit = reference::eval_limit(self, limit.as_ref(), state, encoding)?;
                Ok(reference::to_list(state.graph().values_defined_by(definition, limit)))
            }
            K::First(operand) => Ok(reference::first(operand.eval(state, encoding)?)),
            K::Last(operand) => Ok(reference::last(operand.eval(state, encoding)?)),
            K::Nth { values, indices } => Ok(reference::nth(
                values.eval(state, encoding)?,
                &indices.eval(state, encoding)?,
            )),
            K::Count(operand) => Ok(reference::count(&operand.eval(state, encoding)?, encoding)),
            K::Len(operand) => Ok(reference::len(&operand.eval(state, encoding)?, encoding)),
            K::Offset(operand) => Ok(reference::offset(&operand.eval(state, encoding)?, encoding)),
            K::Reverse(operand) => Ok(operand.eval(state, encoding)?.reversed()),
            K::Bytes(operand) => Ok(structural::bytes(&operand.eval(state, encoding)?, encoding)),
            K::Expand { base, count } => structural::expand(self, base, count, state, encoding),
            K::Elvis { left, right } => Ok(structural::elvis(
                left.eval(state, encoding)?,
                right.eval(state, encoding)?,
            )),
            K::FoldCat(operand) => Ok(structural::fold_cat(&operand.eval(state, encoding)?, encoding)),
            K::Fold {
                direction,
                values,
                reducer,
                initial,
            } => structural::fold(self, *direction, values, reducer, initial.as_ref(), state, encoding),
            K::Unary { op, operand } => Ok(arithmetic::eval_unary(*op, &operand.eval(state, encoding)?, encoding)),
            K::Binary { op, left, right } => arithmetic::eval_binary(
                self,
                *op,
                left.eval(state, encoding)?,
                right.eval(state, encoding)?,
                encoding,
            ),
            K::Transform {
                operand, transform, ..
            } => Ok(operand
                .eval(state, encoding)?
                .iter()
                .map(|entry| entry.as_ref().and_then(|value| transform(value, encoding)))
                .collect()),
        }
    }

    /// Evaluates to exactly one present value.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::NotSingleValue`] naming `context` otherwise.
    pub fn eval_single(&self, context: &'static str, state: &ParseState, encoding: &Encoding) -> ParseResult<Value> {
        let list = self.eval(state, encoding)?;
        list.single_value().cloned().ok_or_else(|| {
            ArgumentError::NotSingleValue {
                context,
                expression: self.to_string(),
                found: list.to_string(),
            }
            .into()
        })
    }
}

impl From<Value> for ValueExpression {
    fn from(value: Value) -> Self {
        Self::constant(value)
    }
}

macro_rules! value_expression_from_int {
    ( $( $t:ty ),+ $(,)? ) => {
        $( impl From<$t> for ValueExpression {
            fn from(n: $t) -> Self {
                Self::constant(Value::from_numeric(&BigInt::from(n), Encoding::DEFAULT))
            }
        }
        )+
    };
}

value_expression_from_int![i32, i64, u8, u32, u64, usize];

impl Display for ValueExpression {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use ValueExpressionKind as K;
        match self.kind() {
            K::Const(value) => write!(f, "Const({})", value),
            K::SelfValue => f.write_str("Self"),
            K::CurrentOffset => f.write_str("CurrentOffset"),
            K::CurrentIteration(level) => write!(f, "CurrentIteration({})", level),
            K::NameRef { name, limit: None } => write!(f, "NameRef({})", name),
            K::NameRef {
                name,
                limit: Some(limit),
            } => write!(f, "NameRef({},{})", name, limit),
            K::DefinitionRef {
                definition,
                limit: None,
            } => write!(f, "DefinitionRef({})", definition.name()),
            K::DefinitionRef {
                definition,
                limit: Some(limit),
            } => write!(f, "DefinitionRef({},{})", definition.name(), limit),
            K::First(x) => write!(f, "First({})", x),
            K::Last(x) => write!(f, "Last({})", x),
            K::Nth { values, indices } => write!(f, "Nth({},{})", values, indices),
            K::Count(x) => write!(f, "Count({})", x),
            K::Len(x) => write!(f, "Len({})", x),
            K::Offset(x) => write!(f, "Offset({})", x),
            K::Reverse(x) => write!(f, "Reverse({})", x),
            K::Bytes(x) => write!(f, "Bytes({})", x),
            K::Expand { base, count } => write!(f, "Expand({},{})", base, count),
            K::Elvis { left, right } => write!(f, "Elvis({},{})", left, right),
            K::FoldCat(x) => write!(f, "FoldCat({})", x),
            K::Fold {
                direction,
                values,
                initial,
                ..
            } => match initial {
                Some(initial) => write!(f, "{}({},{})", direction, values, initial),
                None => write!(f, "{}({})", direction, values),
            },
            K::Unary { op, operand } => write!(f, "{}({})", op, operand),
            K::Binary { op, left, right } => write!(f, "{}({},{})", op, left, right),
            K::Transform { name, operand, .. } => write!(f, "{}({})", name, operand),
        }
    }
}

impl Debug for ValueExpression {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}
