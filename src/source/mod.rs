//! Byte providers and the views parsed values hold into them
//!
//! A [`Source`] is where the bytes of a value come from: the input being
//! parsed ([`Source::Stream`]), a literal produced by an expression
//! ([`Source::Constant`]) or a virtual byte range computed from an
//! expression over an earlier parse state ([`Source::Data`]). A [`Slice`]
//! is a fixed-length window into exactly one source.
//!
//! # Layout
//!
//! * [`ByteStream`] is the minimal random-access contract for raw input,
//!   with [`InMemoryByteStream`] as the in-memory implementation.
//! * [`slice`] holds [`Slice`], which fetches its contents lazily.
//! * [`data`] holds [`DataExpressionSource`], the derived source used by
//!   tied tokens.

pub mod data;
pub mod slice;

use std::fmt::{Debug, Display, Formatter};
use std::rc::Rc;

use crate::parse::error::{InternalError, ParseError, ParseResult};

pub use data::DataExpressionSource;
pub use slice::Slice;

/// Random-access provider of raw input bytes.
///
/// Implementors must be stateless with respect to reads: the same
/// `(offset, length)` request always produces the same bytes, and reads
/// may be issued in any order.
pub trait ByteStream: Debug {
    /// Reads exactly `length` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying storage fails. Callers only
    /// request ranges for which [`is_available`](ByteStream::is_available)
    /// returned `true`.
    fn read(&self, offset: u64, length: usize) -> std::io::Result<Vec<u8>>;

    /// Returns `true` if every byte in `offset..offset + length` exists.
    fn is_available(&self, offset: u64, length: u64) -> bool;
}

/// [`ByteStream`] over an owned byte buffer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InMemoryByteStream {
    data: Vec<u8>,
}

impl InMemoryByteStream {
    #[must_use]
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl ByteStream for InMemoryByteStream {
    fn read(&self, offset: u64, length: usize) -> std::io::Result<Vec<u8>> {
        let start = usize::try_from(offset)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
        start
            .checked_add(length)
            .and_then(|end| self.data.get(start..end))
            .map(<[u8]>::to_vec)
            .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::UnexpectedEof))
    }

    fn is_available(&self, offset: u64, length: u64) -> bool {
        offset
            .checked_add(length)
            .map_or(false, |end| end <= self.data.len() as u64)
    }
}

/// Logical provider of the bytes behind a [`Slice`].
///
/// Two sources are equal only if they are the same provider; clones of a
/// `Source` share identity.
#[derive(Clone)]
pub enum Source {
    /// Raw input.
    Stream(Rc<dyn ByteStream>),
    /// Bytes of a value created by an expression rather than read.
    Constant(Rc<[u8]>),
    /// Bytes of one value of an expression evaluated over a captured state.
    Data(Rc<DataExpressionSource>),
}

impl Source {
    /// Wraps `stream` as a fresh source.
    pub fn stream(stream: impl ByteStream + 'static) -> Self {
        Source::Stream(Rc::new(stream))
    }

    /// Source over an in-memory copy of `bytes`.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::stream(InMemoryByteStream::new(bytes))
    }

    /// Returns `true` if every byte in `offset..offset + length` can be produced.
    ///
    /// # Errors
    ///
    /// A derived source evaluates its expression to answer this, and
    /// propagates any error raised by that evaluation.
    pub fn is_available(&self, offset: u64, length: u64) -> ParseResult<bool> {
        let within = |len: usize| offset.checked_add(length).map_or(false, |end| end <= len as u64);
        Ok(match self {
            Source::Stream(stream) => stream.is_available(offset, length),
            Source::Constant(bytes) => within(bytes.len()),
            Source::Data(data) => within(data.value()?.len()),
        })
    }

    /// Produces the `length` bytes at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`InternalError::UnavailableData`] if the range cannot be
    /// produced, and [`ParseError::Stream`] if a stream fails to read it.
    pub fn read(&self, offset: u64, length: u64) -> ParseResult<Rc<[u8]>> {
        let unavailable = |actual: usize| InternalError::UnavailableData {
            offset,
            length,
            actual,
        };
        let len = usize::try_from(length).map_err(|_| unavailable(0))?;
        let range = |bytes: &[u8]| -> ParseResult<Rc<[u8]>> {
            usize::try_from(offset)
                .ok()
                .and_then(|start| Some(start..start.checked_add(len)?))
                .and_then(|r| bytes.get(r))
                .map(Rc::from)
                .ok_or_else(|| unavailable(bytes.len()).into())
        };
        match self {
            Source::Stream(stream) => {
                let bytes = stream.read(offset, len).map_err(|source| ParseError::Stream {
                    offset,
                    length,
                    source,
                })?;
                if bytes.len() != len {
                    return Err(unavailable(bytes.len()).into());
                }
                Ok(Rc::from(bytes))
            }
            Source::Constant(bytes) => range(bytes),
            Source::Data(data) => range(data.value()?.bytes_ref()),
        }
    }

    /// Creates a slice of `length` bytes at `offset`, or `None` if the range
    /// is not available.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`is_available`](Source::is_available).
    pub fn slice(&self, offset: u64, length: u64) -> ParseResult<Option<Slice>> {
        if self.is_available(offset, length)? {
            Ok(Some(Slice::new(self.clone(), offset, length)))
        } else {
            Ok(None)
        }
    }

    fn address(&self) -> *const u8 {
        match self {
            Source::Stream(stream) => Rc::as_ptr(stream) as *const u8,
            Source::Constant(bytes) => Rc::as_ptr(bytes) as *const u8,
            Source::Data(data) => Rc::as_ptr(data) as *const u8,
        }
    }
}

impl PartialEq for Source {
    fn eq(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
            && self.address() == other.address()
    }
}

impl Eq for Source {}

impl std::hash::Hash for Source {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        self.address().hash(state);
    }
}

impl Debug for Source {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for Source {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Stream(stream) => write!(f, "Stream({:?})", stream),
            Source::Constant(bytes) => write!(f, "Constant(0x{})", crate::value::hex(bytes)),
            Source::Data(data) => write!(f, "Data({})", data),
        }
    }
}
