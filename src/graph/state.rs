use std::fmt::{Debug, Formatter};
use std::rc::Rc;

use super::{ParseGraph, ParseReference, ParseValue, WeakParseGraph};
use crate::parse::error::ParseResult;
use crate::source::{Slice, Source};
use crate::token::Token;

/// Everything a token needs to continue parsing: the graph built so far,
/// the source being read, the cursor within it and the iteration counter
/// of every enclosing repetition.
///
/// The outermost iteration counter belongs to the implicit top-level
/// scope and is always `0`.
#[derive(Clone)]
pub struct ParseState {
    graph: ParseGraph,
    source: Source,
    offset: u64,
    iterations: Rc<Vec<u64>>,
}

impl ParseState {
    /// Fresh state with an empty graph and the cursor at `offset`.
    #[must_use]
    pub fn new(source: Source, offset: u64) -> Self {
        Self {
            graph: ParseGraph::new(),
            source,
            offset,
            iterations: Rc::new(vec![0]),
        }
    }

    #[inline]
    #[must_use]
    pub fn graph(&self) -> &ParseGraph {
        &self.graph
    }

    #[inline]
    #[must_use]
    pub fn source(&self) -> &Source {
        &self.source
    }

    #[inline]
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Iteration index at `level`, counted outwards from the innermost
    /// repetition. Levels beyond the top-level scope are `None`.
    #[must_use]
    pub fn iteration(&self, level: usize) -> Option<u64> {
        let len = self.iterations.len();
        level.checked_add(1).and_then(|n| len.checked_sub(n)).map(|ix| self.iterations[ix])
    }

    fn with_graph(&self, graph: ParseGraph) -> Self {
        Self {
            graph,
            ..self.clone()
        }
    }

    /// Opens a branch for `token` at the cursor, starting a new iteration
    /// level if `token` is a repetition.
    #[must_use]
    pub fn open_branch(&self, token: &Token) -> Self {
        let mut next = self.with_graph(self.graph.open_branch(token, &self.source, self.offset));
        if token.is_iterable() {
            Rc::make_mut(&mut next.iterations).push(0);
        }
        next
    }

    /// Commits the innermost branch, which must have been opened by `token`.
    ///
    /// # Errors
    ///
    /// Propagates [`ParseGraph::close_branch`] errors.
    pub fn close_branch(&self, token: &Token) -> ParseResult<Self> {
        let mut next = self.with_graph(self.graph.close_branch(token)?);
        if token.is_iterable() {
            Rc::make_mut(&mut next.iterations).pop();
        }
        Ok(next)
    }

    /// Advances the innermost iteration counter.
    #[must_use]
    pub fn iterate(&self) -> Self {
        let mut next = self.clone();
        if let Some(top) = Rc::make_mut(&mut next.iterations).last_mut() {
            *top += 1;
        }
        next
    }

    #[must_use]
    pub fn add_value(&self, value: ParseValue) -> Self {
        self.with_graph(self.graph.add_value(value))
    }

    #[must_use]
    pub fn add_reference(&self, reference: ParseReference) -> Self {
        self.with_graph(self.graph.add_reference(reference))
    }

    /// Same state with the cursor moved to `offset`.
    #[must_use]
    pub fn seek(&self, offset: u64) -> Self {
        Self {
            offset,
            ..self.clone()
        }
    }

    /// Same state reading from the start of `source`.
    #[must_use]
    pub fn with_source(&self, source: Source) -> Self {
        Self {
            source,
            offset: 0,
            ..self.clone()
        }
    }

    /// Slice of `length` bytes at the cursor, or `None` if the source
    /// cannot provide them.
    ///
    /// # Errors
    ///
    /// Propagates availability checks of derived sources.
    pub fn slice(&self, length: u64) -> ParseResult<Option<Slice>> {
        self.source.slice(self.offset, length)
    }

    pub(crate) fn downgrade(&self) -> WeakParseState {
        WeakParseState {
            graph: self.graph.downgrade(),
            source: self.source.clone(),
            offset: self.offset,
            iterations: self.iterations.clone(),
        }
    }
}

impl Debug for ParseState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParseState")
            .field("graph", &self.graph)
            .field("source", &self.source)
            .field("offset", &self.offset)
            .field("iterations", &self.iterations)
            .finish()
    }
}

/// [`ParseState`] that does not keep its graph's arena alive.
#[derive(Clone)]
pub(crate) struct WeakParseState {
    graph: WeakParseGraph,
    source: Source,
    offset: u64,
    iterations: Rc<Vec<u64>>,
}

impl WeakParseState {
    pub(crate) fn upgrade(&self) -> Option<ParseState> {
        Some(ParseState {
            graph: self.graph.upgrade()?,
            source: self.source.clone(),
            offset: self.offset,
            iterations: self.iterations.clone(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::shorthand::{con, def, rep};

    #[test]
    fn iteration_levels_count_outwards() {
        let body = def("x", con(1));
        let outer = rep("outer", body.clone());
        let inner = rep("inner", body);
        let state = ParseState::new(Source::from_bytes([0u8]), 0);
        assert_eq!(state.iteration(0), Some(0));
        assert_eq!(state.iteration(1), None);
        let nested = state
            .open_branch(&outer)
            .iterate()
            .iterate()
            .open_branch(&inner)
            .iterate();
        assert_eq!(nested.iteration(0), Some(1));
        assert_eq!(nested.iteration(1), Some(2));
        assert_eq!(nested.iteration(2), Some(0));
        assert_eq!(nested.iteration(3), None);
        let closed = nested.close_branch(&inner).unwrap();
        assert_eq!(closed.iteration(0), Some(2));
        assert_eq!(state.iteration(0), Some(0));
    }

    #[test]
    fn seek_and_slice() {
        let state = ParseState::new(Source::from_bytes([1, 2, 3]), 0).seek(2);
        assert_eq!(state.offset(), 2);
        assert!(state.slice(1).unwrap().is_some());
        assert!(state.slice(2).unwrap().is_none());
        let moved = state.with_source(Source::from_bytes([9]));
        assert_eq!(moved.offset(), 0);
        assert_ne!(moved.source(), state.source());
    }
}
