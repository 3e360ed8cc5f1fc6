//! Typed scalars produced by parsing and by expression evaluation
//!
//! A [`Value`] is a run of bytes together with the [`Encoding`] used to
//! interpret them and the [`Slice`] they were taken from. Expressions work
//! on [`ValueList`]s, ordered sequences of values that may contain absent
//! entries.
//!
//! Values created by expressions rather than read from input are backed by
//! a [`Source::Constant`](crate::source::Source::Constant); the numeric
//! constructors here store results in the minimal number of bytes.

pub mod list;

use std::fmt::{Debug, Display, Formatter};
use std::rc::Rc;

use num_bigint::{BigInt, Sign as BigSign};

use crate::encoding::{ByteOrder, Encoding, Sign};
use crate::parse::error::ParseResult;
use crate::source::Slice;

pub use list::ValueList;

/// Hexadecimal rendering of `bytes`, most significant nibble first.
pub(crate) fn hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut acc, b| {
        let _ = write!(acc, "{:02x}", b);
        acc
    })
}

/// Immutable byte run with interpretation metadata and provenance.
///
/// Equality and hashing are structural over the bytes and the encoding;
/// provenance is not compared.
#[derive(Clone)]
pub struct Value {
    slice: Slice,
    bytes: Rc<[u8]>,
    encoding: Encoding,
}

impl Value {
    /// Materializes the contents of `slice` as a value.
    ///
    /// # Errors
    ///
    /// Propagates read failures of the slice's source.
    pub fn from_slice(slice: Slice, encoding: Encoding) -> ParseResult<Self> {
        let bytes = slice.data()?;
        Ok(Self {
            slice,
            bytes,
            encoding,
        })
    }

    /// Constant value holding `bytes`.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Vec<u8>>, encoding: Encoding) -> Self {
        let bytes: Rc<[u8]> = Rc::from(bytes.into());
        Self {
            slice: Slice::from_bytes(bytes.clone()),
            bytes,
            encoding,
        }
    }

    /// Constant value holding the minimal representation of `n`.
    ///
    /// Non-negative numbers under an unsigned encoding drop the sign byte
    /// two's complement would need. A negative number is always stored in
    /// two's complement, and the encoding of the result is switched to
    /// [`Sign::Signed`] so that it reads back as the same number.
    #[must_use]
    pub fn from_numeric(n: &BigInt, encoding: Encoding) -> Self {
        let negative = n.sign() == BigSign::Minus;
        let mut bytes = n.to_signed_bytes_be();
        if !negative && !encoding.is_signed() && bytes.len() > 1 && bytes[0] == 0 {
            bytes.remove(0);
        }
        if encoding.byte_order == ByteOrder::LittleEndian {
            bytes.reverse();
        }
        let encoding = if negative {
            encoding.with_sign(Sign::Signed)
        } else {
            encoding
        };
        Self::from_bytes(bytes, encoding)
    }

    /// Constant value holding `text` encoded in the encoding's charset.
    #[must_use]
    pub fn from_text(text: &str, encoding: Encoding) -> Self {
        Self::from_bytes(encoding.charset.encode(text), encoding)
    }

    #[inline]
    #[must_use]
    pub fn slice(&self) -> &Slice {
        &self.slice
    }

    #[inline]
    #[must_use]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Number of bytes held.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Copy of the bytes held, in storage order.
    #[must_use]
    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    /// The byte at `index` as a value of its own, keeping provenance.
    pub(crate) fn byte_at(&self, index: usize, encoding: Encoding) -> Value {
        let bytes: Rc<[u8]> = Rc::from(&self.bytes[index..=index]);
        Self {
            slice: self.slice.narrow(index as u64, 1, bytes.clone()),
            bytes,
            encoding,
        }
    }

    #[inline]
    pub(crate) fn bytes_ref(&self) -> &[u8] {
        &self.bytes
    }

    /// Bytes ordered most significant first, whatever the byte order.
    pub(crate) fn numeric_bytes(&self) -> Vec<u8> {
        let mut bytes = self.bytes.to_vec();
        if self.encoding.byte_order == ByteOrder::LittleEndian {
            bytes.reverse();
        }
        bytes
    }

    /// Numeric interpretation honoring sign and byte order. The empty value is zero.
    #[must_use]
    pub fn as_numeric(&self) -> BigInt {
        let bytes = self.numeric_bytes();
        match self.encoding.sign {
            Sign::Signed => BigInt::from_signed_bytes_be(&bytes),
            Sign::Unsigned => BigInt::from_bytes_be(BigSign::Plus, &bytes),
        }
    }

    /// Numeric interpretation, if it fits in a `u64`.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        u64::try_from(self.as_numeric()).ok()
    }

    /// Numeric interpretation, if it fits in an `i64`.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        i64::try_from(self.as_numeric()).ok()
    }

    /// Text interpretation in the encoding's charset.
    #[must_use]
    pub fn as_text(&self) -> String {
        self.encoding.charset.decode(&self.bytes)
    }

    /// Bits of the numeric interpretation, least significant first, covering
    /// every stored byte.
    #[must_use]
    pub fn as_bits(&self) -> Vec<bool> {
        self.numeric_bytes()
            .iter()
            .rev()
            .flat_map(|b| (0..8).map(move |i| b & (1 << i) != 0))
            .collect()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes && self.encoding == other.encoding
    }
}

impl Eq for Value {}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
        self.encoding.hash(state);
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex(&self.bytes))
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Value(0x{} @ {})", hex(&self.bytes), self.slice)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::source::Source;

    #[test]
    fn numeric_honors_sign_and_order() {
        let be = Value::from_bytes(vec![0xff, 0x01], Encoding::DEFAULT);
        assert_eq!(be.as_numeric(), BigInt::from(0xff01));
        let le = Value::from_bytes(vec![0xff, 0x01], Encoding::little_endian());
        assert_eq!(le.as_numeric(), BigInt::from(0x01ff));
        let signed = Value::from_bytes(vec![0xff, 0x01], Encoding::signed());
        assert_eq!(signed.as_numeric(), BigInt::from(-255));
        assert_eq!(Value::from_bytes(vec![], Encoding::DEFAULT).as_numeric(), BigInt::from(0));
    }

    #[test]
    fn from_numeric_is_minimal() {
        let v = Value::from_numeric(&BigInt::from(255), Encoding::DEFAULT);
        assert_eq!(v.bytes(), vec![0xff]);
        let v = Value::from_numeric(&BigInt::from(255), Encoding::signed());
        assert_eq!(v.bytes(), vec![0x00, 0xff]);
        let v = Value::from_numeric(&BigInt::from(0), Encoding::DEFAULT);
        assert_eq!(v.bytes(), vec![0x00]);
        let v = Value::from_numeric(&BigInt::from(0x0102), Encoding::little_endian());
        assert_eq!(v.bytes(), vec![0x02, 0x01]);
        assert_eq!(v.as_u64(), Some(0x0102));
    }

    #[test]
    fn negative_under_unsigned_stays_negative() {
        let v = Value::from_numeric(&BigInt::from(-1), Encoding::DEFAULT);
        assert_eq!(v.bytes(), vec![0xff]);
        assert_eq!(v.as_i64(), Some(-1));
        assert!(v.encoding().is_signed());
    }

    #[test]
    fn bits_are_lsb_first() {
        let v = Value::from_bytes(vec![0x01, 0x80], Encoding::DEFAULT);
        let bits = v.as_bits();
        assert_eq!(bits.len(), 16);
        assert!(bits[7]);
        assert!(bits[8]);
        assert_eq!(bits.iter().filter(|b| **b).count(), 2);
    }

    #[test]
    fn equality_ignores_provenance() {
        let source = Source::from_bytes([0x41, 0x42]);
        let read = Value::from_slice(source.slice(0, 2).unwrap().unwrap(), Encoding::DEFAULT).unwrap();
        let made = Value::from_text("AB", Encoding::DEFAULT);
        assert_eq!(read, made);
        assert_eq!(read.as_text(), "AB");
        assert_ne!(read.slice(), made.slice());
        assert_ne!(made, Value::from_text("AB", Encoding::signed()));
    }
}
