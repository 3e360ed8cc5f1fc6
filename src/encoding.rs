//! Interpretation metadata attached to parsed values
//!
//! An [`Encoding`] decides how the raw bytes of a [`Value`](crate::value::Value)
//! are read back as a number or as text. A default is supplied per parse call
//! through [`ParseConfig`](crate::parse::ParseConfig), and any token may
//! override it for itself and everything it contains.

use std::fmt::{Display, Formatter};

#[cfg(feature = "serde_impls")]
use serde::{Deserialize, Serialize};

/// Whether numeric interpretation uses two's complement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(Serialize, Deserialize))]
pub enum Sign {
    Signed,
    #[default]
    Unsigned,
}

/// Order in which the bytes of a numeric value are stored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(Serialize, Deserialize))]
pub enum ByteOrder {
    #[default]
    BigEndian,
    LittleEndian,
}

/// Character set used when a value is decoded as text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(Serialize, Deserialize))]
pub enum Charset {
    /// 7-bit ASCII; bytes above `0x7f` decode to U+FFFD.
    #[default]
    Ascii,
    /// ISO-8859-1, where every byte maps to the code point of equal value.
    Latin1,
    /// UTF-8 with lossy replacement of invalid sequences.
    Utf8,
}

impl Charset {
    /// Decodes `bytes` as text in this character set.
    #[must_use]
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Charset::Ascii => bytes
                .iter()
                .map(|&b| if b.is_ascii() { b as char } else { '\u{fffd}' })
                .collect(),
            Charset::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
            Charset::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
        }
    }

    /// Encodes `text` in this character set.
    ///
    /// Characters that cannot be represented are replaced with `?`.
    #[must_use]
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Charset::Ascii => text
                .chars()
                .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
                .collect(),
            Charset::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                .collect(),
            Charset::Utf8 => text.as_bytes().to_vec(),
        }
    }
}

/// Sign, byte order and character set used to interpret a value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(Serialize, Deserialize))]
pub struct Encoding {
    pub sign: Sign,
    pub byte_order: ByteOrder,
    pub charset: Charset,
}

impl Encoding {
    #[must_use]
    pub const fn new(sign: Sign, byte_order: ByteOrder, charset: Charset) -> Self {
        Self {
            sign,
            byte_order,
            charset,
        }
    }

    /// Unsigned, big-endian, ASCII.
    pub const DEFAULT: Encoding = Encoding::new(Sign::Unsigned, ByteOrder::BigEndian, Charset::Ascii);

    #[must_use]
    pub const fn signed() -> Self {
        Self::new(Sign::Signed, ByteOrder::BigEndian, Charset::Ascii)
    }

    #[must_use]
    pub const fn little_endian() -> Self {
        Self::new(Sign::Unsigned, ByteOrder::LittleEndian, Charset::Ascii)
    }

    #[must_use]
    pub const fn with_sign(self, sign: Sign) -> Self {
        Self { sign, ..self }
    }

    #[must_use]
    pub const fn with_byte_order(self, byte_order: ByteOrder) -> Self {
        Self { byte_order, ..self }
    }

    #[must_use]
    pub const fn with_charset(self, charset: Charset) -> Self {
        Self { charset, ..self }
    }

    #[inline]
    #[must_use]
    pub fn is_signed(&self) -> bool {
        self.sign == Sign::Signed
    }
}

impl Display for Encoding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?},{:?},{:?}", self.sign, self.byte_order, self.charset)
    }
}
