//! Invalid-argument conditions
//!
//! The errors in this module report grammars or expressions that are
//! malformed, as opposed to inputs that merely fail to match. They are
//! raised either when a [`Token`](crate::token::Token) is constructed
//! with parameters that violate its arity rules, or when a
//! [`ValueExpression`](crate::expression::ValueExpression) is evaluated
//! with operands whose shape it cannot accept.
//!
//! None of these conditions are ever converted into a refusal: they
//! surface through [`ParseError::Argument`](crate::parse::error::ParseError::Argument)
//! and abort the enclosing parse.

use thiserror::Error;

/// Enumeration over the argument-validation failures that can be raised
/// while building a grammar or evaluating an expression over a parse graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    /// A sequence or choice was given fewer than two sub-tokens.
    #[error("{kind} requires at least 2 tokens, found {found}")]
    TooFewTokens { kind: &'static str, found: usize },

    /// A token-by-name was constructed with an empty reference name.
    #[error("token reference name may not be empty")]
    EmptyReference,

    /// An operand that must evaluate to exactly one present value
    /// yielded zero values, several values, or an absent value.
    #[error("{context} must evaluate to a single non-empty value, got {found} in `{expression}`")]
    NotSingleValue {
        context: &'static str,
        expression: String,
        found: String,
    },

    /// Two operands of a binary operator have lengths that cannot be
    /// reconciled by repeating the shorter one.
    #[error("cannot broadcast operands of `{operator}`: {left} values against {right} values")]
    ArityMismatch {
        operator: String,
        left: usize,
        right: usize,
    },

    /// Division (or modulo) with a zero divisor.
    #[error("division by zero in `{expression}`")]
    DivisionByZero { expression: String },

    /// Modulo with a negative divisor.
    #[error("modulus must be positive in `{expression}`")]
    NonPositiveModulus { expression: String },

    /// An expansion would produce more than `limit` bytes or entries.
    #[error("expansion exceeds {limit} bytes in `{expression}`")]
    ExpansionTooLarge { expression: String, limit: usize },

    /// Bit shift by a negative amount, or one whose result would exceed
    /// [`MAX_DERIVED_LEN`](crate::expression::MAX_DERIVED_LEN) bytes.
    #[error("shift amount out of range in `{expression}`")]
    InvalidShift { expression: String },
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_names_operator() {
        let err = ArgumentError::ArityMismatch {
            operator: "add(a,b)".to_owned(),
            left: 2,
            right: 3,
        };
        assert_eq!(
            err.to_string(),
            "cannot broadcast operands of `add(a,b)`: 2 values against 3 values"
        );
    }
}
