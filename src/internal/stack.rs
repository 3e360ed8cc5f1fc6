//! Stack abstraction over the open-branch frames of a parse graph
//!
//! The frame stack of a [`ParseGraph`](crate::graph::ParseGraph) is cloned
//! every time a speculative attempt forks, so its backing store is kept
//! swappable: with the `smallvec_framestack` feature the first
//! [`INLINE_ALLOC`] frames are stored inline and only deeper nesting
//! allocates.

use cfg_if::cfg_if;

pub trait Stack {
    /// Type of the values that are pushed onto the stack.
    type Item;

    /// Return a reference to the topmost value of the Stack, or `None` if it is empty
    fn peek(&self) -> Option<&Self::Item>;

    /// Return a mutable reference to the topmost value of the stack without otherwise
    /// mutating the stack itself.
    fn peek_mut(&mut self) -> Option<&mut Self::Item>;

    /// Like `peek`, but the topmost value of the stack is removed if it exists.
    fn pop(&mut self) -> Option<Self::Item>;

    /// Push `item` onto the top of the stack.
    fn push(&mut self, item: Self::Item);

    /// Number of items currently held.
    fn depth(&self) -> usize;

    /// Given a closure that returns `None` in the case of a valid value to pop,
    /// and `Some(err)` if an error occured, pre-validate and pop the topmost item.
    ///
    /// If `Err(_)` is returned, the mutably borrowed receiver is unmodified.
    fn pop_validated<Error, F: FnOnce(Option<&Self::Item>) -> Option<Error>>(
        &mut self,
        validate: F,
    ) -> Result<Option<Self::Item>, Error> {
        match validate(self.peek()) {
            None => Ok(self.pop()),
            Some(err) => Err(err),
        }
    }
}

/// Number of frames a `SmallVec`-backed [`FrameStack`] holds before it
/// requires heap allocation.
pub const INLINE_ALLOC: usize = 8;

cfg_if! {
    if #[cfg(feature = "smallvec_framestack")] {
        type Inner<T> = ::smallvec::SmallVec<[T; INLINE_ALLOC]>;

        fn inner_new<T>() -> Inner<T> {
            ::smallvec::SmallVec::new()
        }
    } else {
        type Inner<T> = Vec<T>;

        fn inner_new<T>() -> Inner<T> {
            Vec::new()
        }
    }
}

/// Stack of frames, ordered from outermost (bottom) to innermost (top).
#[derive(Clone, Debug)]
pub struct FrameStack<T>(Inner<T>);

impl<T> FrameStack<T> {
    /// Constructs a stack holding only `root`.
    #[must_use]
    pub fn with_root(root: T) -> Self {
        let mut inner = inner_new();
        inner.push(root);
        Self(inner)
    }

    /// Iterates from the innermost frame outwards.
    pub fn iter_innermost(&self) -> impl Iterator<Item = &T> + '_ {
        self.0.iter().rev()
    }

    /// Frame at `index` counted from the bottom of the stack.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.0.get(index)
    }
}

impl<T> Stack for FrameStack<T> {
    type Item = T;

    #[inline]
    fn peek(&self) -> Option<&T> {
        self.0.last()
    }

    #[inline]
    fn peek_mut(&mut self) -> Option<&mut T> {
        self.0.last_mut()
    }

    #[inline]
    fn pop(&mut self) -> Option<T> {
        self.0.pop()
    }

    #[inline]
    fn push(&mut self, item: T) {
        self.0.push(item)
    }

    #[inline]
    fn depth(&self) -> usize {
        self.0.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pop_validated_leaves_stack_on_error() {
        let mut stack = FrameStack::with_root(0u32);
        stack.push(1);
        let res: Result<_, &str> = stack.pop_validated(|top| match top {
            Some(&1) => Some("refused"),
            _ => None,
        });
        assert_eq!(res, Err("refused"));
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.pop_validated::<(), _>(|_| None), Ok(Some(1)));
        assert_eq!(stack.iter_innermost().copied().collect::<Vec<_>>(), vec![0]);
    }
}
