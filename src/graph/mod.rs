//! Persistent record of everything parsed so far
//!
//! A [`ParseGraph`] is a tree of values, branches and references. All
//! graph values derived from one empty graph share a single append-only
//! [`Arena`]; a graph value itself is only a small stack of open frames
//! pointing into that arena. Opening, committing and discarding a branch
//! touch nothing but that stack, so any earlier graph value stays valid
//! and unchanged after a later one is derived from it.
//!
//! # Layout
//!
//! * [`item`] holds the public node types ([`ParseValue`], [`ParseBranch`],
//!   [`ParseReference`] and their sum [`ParseItem`]).
//! * [`state`] holds [`ParseState`], which pairs a graph with a source,
//!   a cursor and the iteration counters of enclosing repetitions.
//!
//! Every query over the graph walks it with an explicit work stack, so
//! graphs of any size can be queried without deep native recursion.

pub mod item;
mod node;
pub mod state;

use std::fmt::{Debug, Formatter};
use std::rc::Rc;

use crate::internal::arena::{Arena, NodeId};
use crate::internal::stack::{FrameStack, Stack};
use crate::parse::error::{InternalError, ParseResult};
use crate::source::Source;
use crate::token::Token;

pub use item::{ParseBranch, ParseItem, ParseReference, ParseValue};
pub use state::ParseState;

use node::{BranchNode, Frame, Node, NodeItem};

/// Immutable, structurally shared parse result.
///
/// Every operation returns a new graph and leaves `self` untouched.
#[derive(Clone)]
pub struct ParseGraph {
    arena: Rc<Arena<Node>>,
    frames: FrameStack<Frame>,
}

impl Default for ParseGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ParseGraph {
    /// Constructs an empty graph with no open branches.
    #[must_use]
    pub fn new() -> Self {
        Self {
            arena: Rc::new(Arena::new()),
            frames: FrameStack::with_root(Frame::root()),
        }
    }

    /// Number of branches currently open.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.depth() - 1
    }

    /// Returns `true` if nothing has been committed to the root scope and
    /// no branch is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.depth() == 0 && self.frames.peek().map_or(true, |f| f.len == 0)
    }

    /// Opens a branch for `definition`, positioned at `offset` in `source`.
    #[must_use]
    pub fn open_branch(&self, definition: &Token, source: &Source, offset: u64) -> Self {
        let mut next = self.clone();
        next.frames
            .push(Frame::branch(definition.clone(), source.clone(), offset));
        next
    }

    /// Commits the innermost open branch as the next child of its parent.
    ///
    /// # Errors
    ///
    /// Returns an [`InternalError`] if no branch is open, or if the
    /// innermost branch was not opened by `definition`.
    pub fn close_branch(&self, definition: &Token) -> ParseResult<Self> {
        let mut next = self.clone();
        let frame = next
            .frames
            .pop_validated(|top| match top.and_then(|f| f.opened.as_ref()) {
                None => Some(InternalError::CloseWithoutBranch),
                Some((opened, _, _)) if !opened.ptr_eq(definition) => {
                    Some(InternalError::CloseMismatch {
                        expected: definition.to_string(),
                        found: opened.to_string(),
                    })
                }
                Some(_) => None,
            })?;
        let header = frame
            .and_then(|f| f.header())
            .ok_or(InternalError::CloseWithoutBranch)?;
        Ok(next.append(NodeItem::Branch(header)))
    }

    /// Drops the innermost open branch and everything added to it.
    ///
    /// # Errors
    ///
    /// Returns [`InternalError::CloseWithoutBranch`] if no branch is open.
    pub fn discard_branch(&self) -> ParseResult<Self> {
        let mut next = self.clone();
        next.frames.pop_validated(|top| match top.and_then(|f| f.opened.as_ref()) {
            None => Some(InternalError::CloseWithoutBranch),
            Some(_) => None,
        })?;
        Ok(next)
    }

    /// Appends `value` to the innermost open branch.
    #[must_use]
    pub fn add_value(&self, value: ParseValue) -> Self {
        self.clone().append(NodeItem::Value(value))
    }

    /// Appends `reference` to the innermost open branch.
    #[must_use]
    pub fn add_reference(&self, reference: ParseReference) -> Self {
        self.clone().append(NodeItem::Reference(reference))
    }

    fn append(mut self, item: NodeItem) -> Self {
        if let Some(top) = self.frames.peek_mut() {
            let id = self.arena.alloc(Node {
                item,
                prev: top.last,
            });
            top.last = Some(id);
            top.len += 1;
        }
        self
    }

    /// Cursors at the last child of every open frame, outermost first, so
    /// that the innermost frame is popped first from a work stack.
    fn frame_cursors(&self) -> Vec<NodeId> {
        let mut cursors: Vec<NodeId> = self.frames.iter_innermost().filter_map(|f| f.last).collect();
        cursors.reverse();
        cursors
    }

    /// Visits every node reachable from the open frames, most recent first,
    /// until `visit` returns `false`.
    fn walk_recent_first(&self, mut visit: impl FnMut(&NodeItem) -> bool) {
        let mut work = self.frame_cursors();
        while let Some(id) = work.pop() {
            let node = self.arena.get(id);
            if let Some(prev) = node.prev {
                work.push(prev);
            }
            if let NodeItem::Branch(BranchNode { last: Some(last), .. }) = &node.item {
                work.push(*last);
            }
            if !visit(&node.item) {
                return;
            }
        }
    }

    fn values_where(&self, limit: Option<usize>, pred: impl Fn(&ParseValue) -> bool) -> Vec<ParseValue> {
        let mut found = Vec::new();
        if limit == Some(0) {
            return found;
        }
        self.walk_recent_first(|item| {
            if let NodeItem::Value(value) = item {
                if pred(value) {
                    found.push(value.clone());
                }
            }
            limit.map_or(true, |n| found.len() < n)
        });
        found
    }

    /// All values whose name matches `name`, most recent first, at most
    /// `limit` of them.
    #[must_use]
    pub fn values_named(&self, name: &str, limit: Option<usize>) -> Vec<ParseValue> {
        self.values_where(limit, |value| value.matches(name))
    }

    /// All values produced by `definition`, most recent first, at most
    /// `limit` of them.
    #[must_use]
    pub fn values_defined_by(&self, definition: &Token, limit: Option<usize>) -> Vec<ParseValue> {
        self.values_where(limit, |value| value.definition().ptr_eq(definition))
    }

    /// Most recent value whose name matches `name`.
    #[must_use]
    pub fn last_named(&self, name: &str) -> Option<ParseValue> {
        self.values_named(name, Some(1)).into_iter().next()
    }

    /// Earliest parsed value whose name matches `name`.
    #[must_use]
    pub fn first_named(&self, name: &str) -> Option<ParseValue> {
        self.values_named(name, None).pop()
    }

    /// Most recent value produced by `definition`.
    #[must_use]
    pub fn last_defined_by(&self, definition: &Token) -> Option<ParseValue> {
        self.values_defined_by(definition, Some(1)).into_iter().next()
    }

    /// Earliest parsed value produced by `definition`.
    #[must_use]
    pub fn first_defined_by(&self, definition: &Token) -> Option<ParseValue> {
        self.values_defined_by(definition, None).pop()
    }

    /// Most recently added value of the innermost open scope.
    ///
    /// Descends into the last child while it is a committed branch. Returns
    /// `None` if the innermost scope is empty or ends in a reference.
    #[must_use]
    pub fn current(&self) -> Option<ParseValue> {
        let mut cursor = self.frames.peek().and_then(|f| f.last);
        while let Some(id) = cursor {
            match &self.arena.get(id).item {
                NodeItem::Value(value) => return Some(value.clone()),
                NodeItem::Branch(branch) => cursor = branch.last,
                NodeItem::Reference(_) => return None,
            }
        }
        None
    }

    /// Every value in the graph, in the order it was parsed.
    #[must_use]
    pub fn flatten(&self) -> Vec<ParseValue> {
        let mut values = self.values_where(None, |_| true);
        values.reverse();
        values
    }

    /// Every reference node in the graph, in the order it was added.
    #[must_use]
    pub fn references(&self) -> Vec<ParseReference> {
        let mut found = Vec::new();
        self.walk_recent_first(|item| {
            if let NodeItem::Reference(reference) = item {
                found.push(reference.clone());
            }
            true
        });
        found.reverse();
        found
    }

    /// Direct children of the root scope, in the order they were committed.
    #[must_use]
    pub fn items(&self) -> Vec<ParseItem> {
        let root = self.frames.get(0).and_then(|f| f.last);
        item::collect_chain(&self.arena, root)
    }

    /// Finds the branch opened by `definition` at `offset` in `source`,
    /// whether committed or still open.
    #[must_use]
    pub fn find_branch(&self, definition: &Token, source: &Source, offset: u64) -> Option<ParseBranch> {
        let is_match = |branch: &BranchNode| {
            branch.offset == offset && branch.definition.ptr_eq(definition) && branch.source == *source
        };
        if let Some(open) = self
            .frames
            .iter_innermost()
            .filter_map(Frame::header)
            .find(|header| is_match(header))
        {
            return Some(ParseBranch::new(open, self.arena.clone()));
        }
        let mut found = None;
        self.walk_recent_first(|item| match item {
            NodeItem::Branch(branch) if is_match(branch) => {
                found = Some(branch.clone());
                false
            }
            _ => true,
        });
        found.map(|branch| ParseBranch::new(branch, self.arena.clone()))
    }

    /// Resolves `reference` to the branch it points to.
    ///
    /// # Errors
    ///
    /// An unresolvable reference is an [`InternalError::UnresolvableReference`].
    pub fn resolve(&self, reference: &ParseReference) -> ParseResult<ParseBranch> {
        self.find_branch(reference.definition(), reference.source(), reference.offset())
            .ok_or_else(|| {
                InternalError::UnresolvableReference {
                    definition: reference.definition().to_string(),
                    offset: reference.offset(),
                }
                .into()
            })
    }

    /// Token named `name` among the definitions of the open branches,
    /// innermost first.
    #[must_use]
    pub fn lookup_definition(&self, name: &str) -> Option<Token> {
        self.frames
            .iter_innermost()
            .filter_map(|f| f.opened.as_ref())
            .map(|(definition, _, _)| definition)
            .find(|definition| definition.name() == name)
            .cloned()
    }

    pub(crate) fn downgrade(&self) -> WeakParseGraph {
        WeakParseGraph {
            arena: Rc::downgrade(&self.arena),
            frames: self.frames.clone(),
        }
    }
}

impl Debug for ParseGraph {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParseGraph")
            .field("depth", &self.depth())
            .field("nodes", &self.arena.len())
            .finish()
    }
}

/// Graph snapshot that does not keep its arena alive.
///
/// Held by derived sources, whose values are themselves stored in that
/// arena.
#[derive(Clone)]
pub(crate) struct WeakParseGraph {
    arena: std::rc::Weak<Arena<Node>>,
    frames: FrameStack<Frame>,
}

impl WeakParseGraph {
    pub(crate) fn upgrade(&self) -> Option<ParseGraph> {
        Some(ParseGraph {
            arena: self.arena.upgrade()?,
            frames: self.frames.clone(),
        })
    }
}
