use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::rc::Rc;

use super::node::{BranchNode, Node, NodeItem};
use crate::internal::arena::{Arena, NodeId};
use crate::source::Source;
use crate::token::Token;
use crate::value::Value;

/// A value recorded in the graph, with the name and token that produced it.
///
/// Dereferences to the underlying [`Value`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseValue {
    name: Rc<str>,
    definition: Token,
    value: Value,
}

impl ParseValue {
    #[must_use]
    pub fn new(name: impl Into<Rc<str>>, definition: Token, value: Value) -> Self {
        Self {
            name: name.into(),
            definition,
            value,
        }
    }

    /// Fully scoped name, e.g. `header.length`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Token that produced this value.
    #[must_use]
    pub fn definition(&self) -> &Token {
        &self.definition
    }

    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Offset of the value within its source.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.value.slice().offset()
    }

    /// Returns `true` if `name` is this value's full name or a
    /// `.`-separated suffix of it.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        match self.name.strip_suffix(name) {
            Some("") => true,
            Some(prefix) => prefix.ends_with('.'),
            None => false,
        }
    }
}

impl Deref for ParseValue {
    type Target = Value;

    fn deref(&self) -> &Value {
        &self.value
    }
}

impl Display for ParseValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "pval({}:{})", self.name, self.value)
    }
}

/// Back-pointer to a branch already parsed at `offset` in `source` by
/// `definition`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseReference {
    source: Source,
    offset: u64,
    definition: Token,
}

impl ParseReference {
    #[must_use]
    pub fn new(source: Source, offset: u64, definition: Token) -> Self {
        Self {
            source,
            offset,
            definition,
        }
    }

    #[must_use]
    pub fn source(&self) -> &Source {
        &self.source
    }

    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    #[must_use]
    pub fn definition(&self) -> &Token {
        &self.definition
    }
}

impl Display for ParseReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "pref(@{}:{})", self.offset, self.definition.name())
    }
}

/// Handle on a branch of the graph: the output of one composite token.
#[derive(Clone)]
pub struct ParseBranch {
    header: BranchNode,
    arena: Rc<Arena<Node>>,
}

impl ParseBranch {
    pub(crate) fn new(header: BranchNode, arena: Rc<Arena<Node>>) -> Self {
        Self { header, arena }
    }

    /// Token that opened the branch.
    #[must_use]
    pub fn definition(&self) -> &Token {
        &self.header.definition
    }

    /// Source the branch was opened on.
    #[must_use]
    pub fn source(&self) -> &Source {
        &self.header.source
    }

    /// Offset at which the branch was opened.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.header.offset
    }

    /// Number of direct children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.header.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.header.len == 0
    }

    /// Direct children in the order they were added.
    #[must_use]
    pub fn children(&self) -> Vec<ParseItem> {
        collect_chain(&self.arena, self.header.last)
    }
}

impl std::fmt::Debug for ParseBranch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParseBranch")
            .field("definition", &self.header.definition)
            .field("offset", &self.header.offset)
            .field("len", &self.header.len)
            .finish()
    }
}

impl Display for ParseBranch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "pbranch({}@{}, {} children)",
            self.header.definition.name(),
            self.header.offset,
            self.header.len
        )
    }
}

/// One child of a branch.
#[derive(Clone, Debug)]
pub enum ParseItem {
    Value(ParseValue),
    Branch(ParseBranch),
    Reference(ParseReference),
}

impl ParseItem {
    pub(crate) fn from_node(item: NodeItem, arena: &Rc<Arena<Node>>) -> Self {
        match item {
            NodeItem::Value(value) => ParseItem::Value(value),
            NodeItem::Branch(header) => ParseItem::Branch(ParseBranch::new(header, arena.clone())),
            NodeItem::Reference(reference) => ParseItem::Reference(reference),
        }
    }

    #[must_use]
    pub fn as_value(&self) -> Option<&ParseValue> {
        match self {
            ParseItem::Value(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_branch(&self) -> Option<&ParseBranch> {
        match self {
            ParseItem::Branch(branch) => Some(branch),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_reference(&self) -> Option<&ParseReference> {
        match self {
            ParseItem::Reference(reference) => Some(reference),
            _ => None,
        }
    }
}

impl Display for ParseItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseItem::Value(value) => Display::fmt(value, f),
            ParseItem::Branch(branch) => Display::fmt(branch, f),
            ParseItem::Reference(reference) => Display::fmt(reference, f),
        }
    }
}

/// Items of the sibling chain ending at `last`, oldest first.
pub(crate) fn collect_chain(arena: &Rc<Arena<Node>>, last: Option<NodeId>) -> Vec<ParseItem> {
    let mut items = Vec::new();
    let mut cursor = last;
    while let Some(id) = cursor {
        let node = arena.get(id);
        cursor = node.prev;
        items.push(ParseItem::from_node(node.item.clone(), arena));
    }
    items.reverse();
    items
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::encoding::Encoding;
    use crate::shorthand::{con, def};

    #[test]
    fn scoped_name_matching() {
        let token = def("b", con(1));
        let pv = ParseValue::new("a.b", token, Value::from_bytes(vec![1], Encoding::DEFAULT));
        assert!(pv.matches("a.b"));
        assert!(pv.matches("b"));
        assert!(!pv.matches("ab"));
        assert!(!pv.matches(".b.c"));
        assert!(!pv.matches("a"));
    }
}
