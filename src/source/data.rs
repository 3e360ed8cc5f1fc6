use std::cell::OnceCell;
use std::fmt::{Debug, Display, Formatter};

use crate::encoding::Encoding;
use crate::expression::ValueExpression;
use crate::graph::state::{ParseState, WeakParseState};
use crate::parse::error::{InternalError, ParseResult};
use crate::value::Value;

/// Virtual source whose bytes are one value of an expression evaluated
/// over a captured parse state.
///
/// The value at `index` (counted from the head of the expression's
/// result) is computed on first use and cached.
pub struct DataExpressionSource {
    expression: ValueExpression,
    index: usize,
    state: WeakParseState,
    encoding: Encoding,
    cache: OnceCell<Value>,
}

impl DataExpressionSource {
    /// Source over the `index`-th result of `expression` on `state`.
    #[must_use]
    pub fn new(expression: ValueExpression, index: usize, state: &ParseState, encoding: Encoding) -> Self {
        Self {
            expression,
            index,
            state: state.downgrade(),
            encoding,
            cache: OnceCell::new(),
        }
    }

    /// Like [`new`](DataExpressionSource::new), for a caller that has
    /// already evaluated the expression.
    #[must_use]
    pub(crate) fn with_value(
        expression: ValueExpression,
        index: usize,
        state: &ParseState,
        encoding: Encoding,
        value: Value,
    ) -> Self {
        Self {
            cache: OnceCell::from(value),
            ..Self::new(expression, index, state, encoding)
        }
    }

    #[must_use]
    pub fn expression(&self) -> &ValueExpression {
        &self.expression
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The value providing this source's bytes.
    ///
    /// # Errors
    ///
    /// Returns an [`InternalError`] if the captured state is gone or the
    /// expression no longer yields a value at `index`, and propagates
    /// evaluation errors.
    pub fn value(&self) -> ParseResult<Value> {
        if let Some(value) = self.cache.get() {
            return Ok(value.clone());
        }
        let state = self.state.upgrade().ok_or_else(|| InternalError::DetachedSnapshot {
            expression: self.expression.to_string(),
        })?;
        let value = self
            .expression
            .eval(&state, &self.encoding)?
            .get(self.index)
            .cloned()
            .flatten()
            .ok_or_else(|| InternalError::DataIndexAbsent {
                expression: self.expression.to_string(),
                index: self.index,
            })?;
        let _ = self.cache.set(value.clone());
        Ok(value)
    }
}

impl Display for DataExpressionSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.expression, self.index)
    }
}

impl Debug for DataExpressionSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "DataExpressionSource({}[{}], {})", self.expression, self.index, self.encoding)
    }
}

#[cfg(test)]
mod test {
    use std::rc::Rc;

    use super::*;
    use crate::shorthand::{cat, con, con_bytes};
    use crate::source::Source;

    #[test]
    fn evaluates_lazily_on_captured_state() {
        let state = ParseState::new(Source::from_bytes([0u8]), 0);
        let data = DataExpressionSource::new(
            cat(con_bytes([1, 2]), con_bytes([3])),
            0,
            &state,
            Encoding::DEFAULT,
        );
        let source = Source::Data(Rc::new(data));
        assert!(source.is_available(1, 2).unwrap());
        assert!(!source.is_available(2, 2).unwrap());
        assert_eq!(&*source.read(1, 2).unwrap(), &[2, 3]);
    }

    #[test]
    fn missing_index_is_internal_error() {
        let state = ParseState::new(Source::from_bytes([0u8]), 0);
        let data = DataExpressionSource::new(con(1), 1, &state, Encoding::DEFAULT);
        assert!(matches!(
            data.value(),
            Err(crate::parse::error::ParseError::Internal(InternalError::DataIndexAbsent { index: 1, .. }))
        ));
    }

    #[test]
    fn detached_snapshot() {
        let data = {
            let state = ParseState::new(Source::from_bytes([0u8]), 0);
            DataExpressionSource::new(con(1), 0, &state, Encoding::DEFAULT)
        };
        assert!(matches!(
            data.value(),
            Err(crate::parse::error::ParseError::Internal(InternalError::DetachedSnapshot { .. }))
        ));
    }
}
