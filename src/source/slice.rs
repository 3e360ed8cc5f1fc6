use std::cell::OnceCell;
use std::fmt::{Debug, Display, Formatter};
use std::rc::Rc;

use super::Source;
use crate::parse::error::ParseResult;

/// Fixed-length, offset-tagged view into one [`Source`].
///
/// Contents are fetched on first use and cached; clones share the cache.
/// Equality and hashing consider only `(source, offset, length)`.
#[derive(Clone)]
pub struct Slice {
    source: Source,
    offset: u64,
    length: u64,
    cache: Rc<OnceCell<Rc<[u8]>>>,
}

impl Slice {
    #[must_use]
    pub(crate) fn new(source: Source, offset: u64, length: u64) -> Self {
        Self {
            source,
            offset,
            length,
            cache: Rc::new(OnceCell::new()),
        }
    }

    /// Slice covering all of `bytes`, backed by a fresh constant source.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Rc<[u8]>>) -> Self {
        let bytes: Rc<[u8]> = bytes.into();
        let length = bytes.len() as u64;
        let slice = Self::new(Source::Constant(bytes.clone()), 0, length);
        let _ = slice.cache.set(bytes);
        slice
    }

    /// Sub-slice of `length` bytes at `offset` relative to this slice,
    /// whose contents are already known.
    pub(crate) fn narrow(&self, offset: u64, length: u64, contents: Rc<[u8]>) -> Self {
        let slice = Self::new(self.source.clone(), self.offset + offset, length);
        let _ = slice.cache.set(contents);
        slice
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

    #[inline]
    #[must_use]
    pub fn len(&self) -> u64 {
        self.length
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns the bytes this slice covers, reading them on first call.
    ///
    /// # Errors
    ///
    /// Propagates read failures of the underlying [`Source`].
    pub fn data(&self) -> ParseResult<Rc<[u8]>> {
        if let Some(bytes) = self.cache.get() {
            return Ok(bytes.clone());
        }
        let bytes = self.source.read(self.offset, self.length)?;
        let _ = self.cache.set(bytes.clone());
        Ok(bytes)
    }
}

impl PartialEq for Slice {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset && self.length == other.length && self.source == other.source
    }
}

impl Eq for Slice {}

impl std::hash::Hash for Slice {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.source.hash(state);
        self.offset.hash(state);
        self.length.hash(state);
    }
}

impl Display for Slice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Slice({}@{}:{})", self.source, self.offset, self.length)
    }
}

impl Debug for Slice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}
