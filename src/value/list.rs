use std::fmt::{Display, Formatter};
use std::ops::Index;

use super::Value;

/// Ordered sequence of optional values produced by an expression.
///
/// Index 0 is the *head*: the most recently produced value. Reading the
/// list back to front therefore gives chronological order, oldest first.
/// An absent entry stands for "no value at this position" and does not
/// invalidate its siblings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ValueList(Vec<Option<Value>>);

impl ValueList {
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// List holding exactly `value`.
    #[must_use]
    pub fn single(value: Value) -> Self {
        Self(vec![Some(value)])
    }

    /// List holding exactly one absent entry.
    #[must_use]
    pub fn absent() -> Self {
        Self(vec![None])
    }

    /// Builds a list from entries given in chronological order (oldest first).
    #[must_use]
    pub fn from_chronological(mut entries: Vec<Option<Value>>) -> Self {
        entries.reverse();
        Self(entries)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Most recent entry.
    #[must_use]
    pub fn head(&self) -> Option<&Option<Value>> {
        self.0.first()
    }

    /// Entry at `index` counted from the head.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Option<Value>> {
        self.0.get(index)
    }

    /// The only entry, if this list holds exactly one present value.
    #[must_use]
    pub fn single_value(&self) -> Option<&Value> {
        match self.0.as_slice() {
            [Some(value)] => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn contains_absent(&self) -> bool {
        self.0.iter().any(Option::is_none)
    }

    /// Iterates from the head.
    pub fn iter(&self) -> std::slice::Iter<'_, Option<Value>> {
        self.0.iter()
    }

    /// Iterates oldest first.
    pub fn chronological(&self) -> std::iter::Rev<std::slice::Iter<'_, Option<Value>>> {
        self.0.iter().rev()
    }

    /// Present values only, from the head.
    pub fn values(&self) -> impl DoubleEndedIterator<Item = &Value> + '_ {
        self.0.iter().flatten()
    }

    #[must_use]
    pub fn reversed(mut self) -> Self {
        self.0.reverse();
        self
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Option<Value>> {
        self.0
    }
}

impl From<Vec<Option<Value>>> for ValueList {
    /// Takes entries ordered head first.
    fn from(entries: Vec<Option<Value>>) -> Self {
        Self(entries)
    }
}

impl From<Value> for ValueList {
    fn from(value: Value) -> Self {
        Self::single(value)
    }
}

impl FromIterator<Option<Value>> for ValueList {
    fn from_iter<I: IntoIterator<Item = Option<Value>>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ValueList {
    type Item = Option<Value>;
    type IntoIter = std::vec::IntoIter<Option<Value>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValueList {
    type Item = &'a Option<Value>;
    type IntoIter = std::slice::Iter<'a, Option<Value>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Index<usize> for ValueList {
    type Output = Option<Value>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl Display for ValueList {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("[")?;
        for (i, entry) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match entry {
                Some(value) => Display::fmt(value, f)?,
                None => f.write_str("_")?,
            }
        }
        f.write_str("]")
    }
}
