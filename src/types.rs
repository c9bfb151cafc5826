// SPDX-License-Identifier: MIT
// Sequence view: one element abstraction shared by every kernel, plus the
// width-erased `Seq` used at object-safe boundaries.

use crate::error::{MetricError, Result};

/// A fixed-width code unit that kernels compare by its widened key.
///
/// Two elements are equal iff their keys are equal, so a `u8` sequence can be
/// compared against a `u32` sequence without converting either side.
pub trait HashableChar: Copy + Send + Sync {
    fn key(self) -> u64;

    /// Index into the 256-entry fast table, if the key fits.
    #[inline(always)]
    fn ascii_index(self) -> Option<usize> {
        let k = self.key();
        if k < 256 {
            Some(k as usize)
        } else {
            None
        }
    }
}

impl HashableChar for u8 {
    #[inline(always)]
    fn key(self) -> u64 {
        self as u64
    }
    #[inline(always)]
    fn ascii_index(self) -> Option<usize> {
        Some(self as usize)
    }
}
impl HashableChar for u16 {
    #[inline(always)]
    fn key(self) -> u64 {
        self as u64
    }
}
impl HashableChar for u32 {
    #[inline(always)]
    fn key(self) -> u64 {
        self as u64
    }
}
impl HashableChar for u64 {
    #[inline(always)]
    fn key(self) -> u64 {
        self
    }
}
impl HashableChar for char {
    #[inline(always)]
    fn key(self) -> u64 {
        self as u64
    }
}

#[inline(always)]
pub(crate) fn eq<A: HashableChar, B: HashableChar>(a: A, b: B) -> bool {
    a.key() == b.key()
}

// ---------------------------------------------------------------------------
// Code unit width
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CodeUnitWidth {
    W8,
    W16,
    W32,
    W64,
}

impl CodeUnitWidth {
    pub fn bits(self) -> usize {
        match self {
            CodeUnitWidth::W8 => 8,
            CodeUnitWidth::W16 => 16,
            CodeUnitWidth::W32 => 32,
            CodeUnitWidth::W64 => 64,
        }
    }
}

impl TryFrom<usize> for CodeUnitWidth {
    type Error = MetricError;

    fn try_from(bits: usize) -> Result<Self> {
        match bits {
            8 => Ok(CodeUnitWidth::W8),
            16 => Ok(CodeUnitWidth::W16),
            32 => Ok(CodeUnitWidth::W32),
            64 => Ok(CodeUnitWidth::W64),
            other => Err(MetricError::UnsupportedSequenceWidth(other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Width-erased borrowed sequence
// ---------------------------------------------------------------------------

/// Borrowed sequence of code units of any supported width.
#[derive(Clone, Copy, Debug)]
pub enum Seq<'a> {
    U8(&'a [u8]),
    U16(&'a [u16]),
    U32(&'a [u32]),
    U64(&'a [u64]),
}

/// Expands `$body` once per width with `$s` bound to the typed slice.
macro_rules! with_seq {
    ($seq:expr, |$s:ident| $body:expr) => {
        match $seq {
            $crate::types::Seq::U8($s) => $body,
            $crate::types::Seq::U16($s) => $body,
            $crate::types::Seq::U32($s) => $body,
            $crate::types::Seq::U64($s) => $body,
        }
    };
}
pub(crate) use with_seq;

impl<'a> Seq<'a> {
    pub fn len(&self) -> usize {
        with_seq!(self, |s| s.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn width(&self) -> CodeUnitWidth {
        match self {
            Seq::U8(_) => CodeUnitWidth::W8,
            Seq::U16(_) => CodeUnitWidth::W16,
            Seq::U32(_) => CodeUnitWidth::W32,
            Seq::U64(_) => CodeUnitWidth::W64,
        }
    }

    /// Widened key of the element at `i`.
    #[inline]
    pub fn at(&self, i: usize) -> u64 {
        with_seq!(self, |s| s[i].key())
    }

    pub fn to_keys(&self) -> Vec<u64> {
        with_seq!(self, |s| s.iter().map(|c| c.key()).collect())
    }
}

impl<'a> PartialEq for Seq<'a> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && (0..self.len()).all(|i| self.at(i) == other.at(i))
    }
}

impl<'a> From<&'a [u8]> for Seq<'a> {
    fn from(s: &'a [u8]) -> Self {
        Seq::U8(s)
    }
}
impl<'a> From<&'a [u16]> for Seq<'a> {
    fn from(s: &'a [u16]) -> Self {
        Seq::U16(s)
    }
}
impl<'a> From<&'a [u32]> for Seq<'a> {
    fn from(s: &'a [u32]) -> Self {
        Seq::U32(s)
    }
}
impl<'a> From<&'a [u64]> for Seq<'a> {
    fn from(s: &'a [u64]) -> Self {
        Seq::U64(s)
    }
}
impl<'a> From<&'a str> for Seq<'a> {
    fn from(s: &'a str) -> Self {
        Seq::U8(s.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widening_equality() {
        let a: &[u8] = b"abc";
        let b: Vec<u32> = "abc".chars().map(|c| c as u32).collect();
        assert_eq!(Seq::from(a), Seq::from(b.as_slice()));
        assert!(eq(b'a', 'a'));
        assert!(!eq(b'a', 0x1_0061u32));
    }

    #[test]
    fn test_width_validation() {
        assert_eq!(CodeUnitWidth::try_from(16).unwrap(), CodeUnitWidth::W16);
        assert_eq!(
            CodeUnitWidth::try_from(24),
            Err(MetricError::UnsupportedSequenceWidth(24))
        );
    }

    #[test]
    fn test_seq_accessors() {
        let wide = [0x263Au32, 0x61];
        let s = Seq::from(&wide[..]);
        assert_eq!(s.len(), 2);
        assert_eq!(s.width().bits(), 32);
        assert_eq!(s.at(0), 0x263A);
        assert_eq!(s.to_keys(), vec![0x263A, 0x61]);
        assert!(Seq::from("").is_empty());
    }
}
