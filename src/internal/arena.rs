//! Append-only node storage
//!
//! Every node a parse ever produces, including those of branches that are
//! later discarded, is pushed into one [`Arena`] shared by all graph values
//! derived from the same root. Nodes are never removed or modified, so a
//! [`NodeId`] stays valid for as long as the arena is alive.

use std::cell::RefCell;
use std::rc::Rc;

/// Wrapper around [`usize`] addressing a node within an [`Arena`].
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[repr(transparent)]
pub struct NodeId(usize);

impl NodeId {
    /// Unwraps the `usize` stored within a `NodeId` value.
    #[must_use]
    #[inline(always)]
    pub fn to_usize(self) -> usize {
        self.0
    }
}

macro_rules! node_id_impl_fmt {
    ( $( $tr:ident ),+ $(,)? ) => {
        $( impl std::fmt::$tr for NodeId {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                <usize as std::fmt::$tr>::fmt(&self.0, f)
            }
        }
        )+
    };
}

node_id_impl_fmt![Display, LowerHex];

/// Grow-only vector of nodes with interior mutability.
///
/// Nodes are individually reference-counted so a lookup hands out a
/// shared handle instead of copying the node.
#[derive(Debug)]
pub struct Arena<N> {
    nodes: RefCell<Vec<Rc<N>>>,
}

impl<N> Default for Arena<N> {
    fn default() -> Self {
        Self {
            nodes: RefCell::new(Vec::new()),
        }
    }
}

impl<N> Arena<N> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `node` and returns its address.
    pub fn alloc(&self, node: N) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(Rc::new(node));
        NodeId(nodes.len() - 1)
    }

    /// Returns a handle on the node at `id`.
    ///
    /// # Panics
    ///
    /// Will panic if `id` was not produced by this arena.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Rc<N> {
        Rc::clone(&self.nodes.borrow()[id.0])
    }

    /// Number of nodes ever allocated.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
