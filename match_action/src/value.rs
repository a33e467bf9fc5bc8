/*
Copyright (c) 2021 VMware, Inc.
SPDX-License-Identifier: MIT
Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:
The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.
THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/


//! Match kinds and the per-field match values stored in table entries.

use itertools::Itertools;

use std::fmt::{self, Display};

/// Comparison semantics declared for one table key field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MatchKind {
    Exact,
    Ternary,
    Lpm,
    Range,
    /// Disjunction of ternary matches.
    TernaryList,
    /// Disjunction of range matches.
    RangeList,
}

impl Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use MatchKind::*;
        let s = match self {
            Exact => "exact",
            Ternary => "ternary",
            Lpm => "lpm",
            Range => "range",
            TernaryList => "list",
            RangeList => "range_list",
        };
        write!(f, "{}", s)
    }
}

/// All-ones mask covering the low `width` bits.
pub fn width_mask(width: u32) -> u128 {
    if width >= 128 {
        u128::MAX
    } else {
        (1u128 << width) - 1
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ternary {
    pub value: u128,
    pub mask: u128,
}

impl Ternary {
    pub fn matches(&self, field: u128) -> bool {
        (self.value & self.mask) == (field & self.mask)
    }
}

impl Display for Ternary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}&&&{:#x}", self.value, self.mask)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Lpm {
    pub value: u128,
    pub prefix_len: u32,
}

impl Lpm {
    /// The top `prefix_len` bits of a `width`-bit field.  A prefix longer than the field covers
    /// the whole field.
    pub fn mask(&self, width: u32) -> u128 {
        let width = width.min(128);
        let prefix_len = self.prefix_len.min(width);
        if prefix_len == 0 {
            0
        } else {
            width_mask(prefix_len) << (width - prefix_len)
        }
    }

    pub fn matches(&self, field: u128, width: u32) -> bool {
        let mask = self.mask(width);
        (self.value & mask) == (field & mask)
    }
}

impl Display for Lpm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}/{}", self.value, self.prefix_len)
    }
}

/// Inclusive range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Range {
    pub low: u128,
    pub high: u128,
}

impl Range {
    pub fn point(value: u128) -> Self {
        Range { low: value, high: value }
    }

    pub fn matches(&self, field: u128) -> bool {
        self.low <= field && field <= self.high
    }
}

impl Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}..={:#x}", self.low, self.high)
    }
}

/// The value an entry matches for one key field.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MatchValue {
    Exact(u128),
    Ternary(Ternary),
    Lpm(Lpm),
    Range(Range),
    TernaryList(Vec<Ternary>),
    RangeList(Vec<Range>),
}

impl MatchValue {
    pub fn kind(&self) -> MatchKind {
        match self {
            Self::Exact(_) => MatchKind::Exact,
            Self::Ternary(_) => MatchKind::Ternary,
            Self::Lpm(_) => MatchKind::Lpm,
            Self::Range(_) => MatchKind::Range,
            Self::TernaryList(_) => MatchKind::TernaryList,
            Self::RangeList(_) => MatchKind::RangeList,
        }
    }

    /// Tests the current value of a `width`-bit field.  List values match if any member does, so
    /// an empty list never matches.
    pub fn matches(&self, field: u128, width: u32) -> bool {
        match self {
            Self::Exact(v) => *v == field,
            Self::Ternary(t) => t.matches(field),
            Self::Lpm(l) => l.matches(field, width),
            Self::Range(r) => r.matches(field),
            Self::TernaryList(ts) => ts.iter().any(|t| t.matches(field)),
            Self::RangeList(rs) => rs.iter().any(|r| r.matches(field)),
        }
    }

    pub fn prefix_len(&self) -> Option<u32> {
        match self {
            Self::Lpm(l) => Some(l.prefix_len),
            _ => None,
        }
    }
}

impl Display for MatchValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(v) => write!(f, "{:#x}", v),
            Self::Ternary(t) => write!(f, "{}", t),
            Self::Lpm(l) => write!(f, "{}", l),
            Self::Range(r) => write!(f, "{}", r),
            Self::TernaryList(ts) => write!(f, "[{}]", ts.iter().join(", ")),
            Self::RangeList(rs) => write!(f, "[{}]", rs.iter().join(", ")),
        }
    }
}
