//! Storage representation of graph nodes
//!
//! Children of a branch are kept as a backwards-linked chain: every node
//! records its previous sibling, and a branch records only its last child.
//! Appending a child therefore never touches an existing node.

use super::item::{ParseReference, ParseValue};
use crate::internal::arena::NodeId;
use crate::source::Source;
use crate::token::Token;

#[derive(Clone, Debug)]
pub(crate) struct BranchNode {
    pub(crate) definition: Token,
    pub(crate) source: Source,
    pub(crate) offset: u64,
    pub(crate) last: Option<NodeId>,
    pub(crate) len: usize,
}

#[derive(Clone, Debug)]
pub(crate) enum NodeItem {
    Value(ParseValue),
    Branch(BranchNode),
    Reference(ParseReference),
}

#[derive(Clone, Debug)]
pub(crate) struct Node {
    pub(crate) item: NodeItem,
    pub(crate) prev: Option<NodeId>,
}

/// An open branch: the root scope, or a composite token still being parsed.
#[derive(Clone, Debug)]
pub(crate) struct Frame {
    pub(crate) opened: Option<(Token, Source, u64)>,
    pub(crate) last: Option<NodeId>,
    pub(crate) len: usize,
}

impl Frame {
    pub(crate) fn root() -> Self {
        Self {
            opened: None,
            last: None,
            len: 0,
        }
    }

    pub(crate) fn branch(definition: Token, source: Source, offset: u64) -> Self {
        Self {
            opened: Some((definition, source, offset)),
            last: None,
            len: 0,
        }
    }

    /// Snapshot of this frame as a branch, unless it is the root.
    pub(crate) fn header(&self) -> Option<BranchNode> {
        self.opened.as_ref().map(|(definition, source, offset)| BranchNode {
            definition: definition.clone(),
            source: source.clone(),
            offset: *offset,
            last: self.last,
            len: self.len,
        })
    }
}
