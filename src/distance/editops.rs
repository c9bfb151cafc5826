// SPDX-License-Identifier: MIT
// Alignment types: Editop / Editops, Opcode / Opcodes, MatchingBlock, plus the
// traceback shared by every metric that reports an alignment.

use crate::types::{eq, HashableChar};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EditType {
    /// Only used by opcodes: a run copied unchanged
    Equal,
    Replace,
    Insert,
    Delete,
}

impl EditType {
    pub fn as_str(self) -> &'static str {
        match self {
            EditType::Equal => "equal",
            EditType::Replace => "replace",
            EditType::Insert => "insert",
            EditType::Delete => "delete",
        }
    }
}

// ---------------------------------------------------------------------------
// Editop / Editops
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Editop {
    pub tag: EditType,
    pub src_pos: usize,
    pub dest_pos: usize,
}

impl Editop {
    pub fn new(tag: EditType, src_pos: usize, dest_pos: usize) -> Self {
        Editop { tag, src_pos, dest_pos }
    }
}

/// Ordered edit script turning a source of `src_len` elements into a
/// destination of `dest_len` elements.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Editops {
    ops: Vec<Editop>,
    src_len: usize,
    dest_len: usize,
}

impl Editops {
    pub fn new(ops: Vec<Editop>, src_len: usize, dest_len: usize) -> Self {
        Editops { ops, src_len, dest_len }
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn src_len(&self) -> usize {
        self.src_len
    }

    pub fn dest_len(&self) -> usize {
        self.dest_len
    }

    pub fn as_slice(&self) -> &[Editop] {
        &self.ops
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Editop> {
        self.ops.iter()
    }

    /// Script turning the destination back into the source.
    pub fn inverse(&self) -> Editops {
        let ops = self
            .ops
            .iter()
            .map(|op| {
                let tag = match op.tag {
                    EditType::Insert => EditType::Delete,
                    EditType::Delete => EditType::Insert,
                    other => other,
                };
                Editop::new(tag, op.dest_pos, op.src_pos)
            })
            .collect();
        Editops::new(ops, self.dest_len, self.src_len)
    }

    /// Replays the script on `s1`, taking inserted and replacing elements from `s2`.
    pub fn apply<T: Copy>(&self, s1: &[T], s2: &[T]) -> Vec<T> {
        let mut out = Vec::with_capacity(self.dest_len);
        let mut src_pos = 0;
        for op in &self.ops {
            while src_pos < op.src_pos {
                out.push(s1[src_pos]);
                src_pos += 1;
            }
            match op.tag {
                EditType::Replace => {
                    out.push(s2[op.dest_pos]);
                    src_pos += 1;
                }
                EditType::Insert => out.push(s2[op.dest_pos]),
                EditType::Delete => src_pos += 1,
                EditType::Equal => {}
            }
        }
        out.extend_from_slice(&s1[src_pos..]);
        out
    }

    pub fn as_opcodes(&self) -> Opcodes {
        let mut result = Vec::new();
        let (mut src_pos, mut dest_pos) = (0, 0);
        let mut i = 0;
        while i < self.ops.len() {
            let op = self.ops[i];
            if src_pos < op.src_pos || dest_pos < op.dest_pos {
                result.push(Opcode::new(EditType::Equal, src_pos, op.src_pos, dest_pos, op.dest_pos));
                src_pos = op.src_pos;
                dest_pos = op.dest_pos;
            }
            let (src_begin, dest_begin, tag) = (src_pos, dest_pos, op.tag);
            loop {
                match tag {
                    EditType::Replace => {
                        src_pos += 1;
                        dest_pos += 1;
                    }
                    EditType::Insert => dest_pos += 1,
                    EditType::Delete => src_pos += 1,
                    EditType::Equal => {}
                }
                i += 1;
                let continues = i < self.ops.len()
                    && self.ops[i].tag == tag
                    && self.ops[i].src_pos == src_pos
                    && self.ops[i].dest_pos == dest_pos;
                if !continues {
                    break;
                }
            }
            result.push(Opcode::new(tag, src_begin, src_pos, dest_begin, dest_pos));
        }
        if src_pos < self.src_len || dest_pos < self.dest_len {
            result.push(Opcode::new(EditType::Equal, src_pos, self.src_len, dest_pos, self.dest_len));
        }
        Opcodes::new(result, self.src_len, self.dest_len)
    }

    /// Runs copied unchanged, terminated by a zero-size block at the lengths.
    pub fn as_matching_blocks(&self) -> Vec<MatchingBlock> {
        let mut blocks = Vec::new();
        let (mut src_pos, mut dest_pos) = (0, 0);
        for op in &self.ops {
            if src_pos < op.src_pos && dest_pos < op.dest_pos {
                let size = (op.src_pos - src_pos).min(op.dest_pos - dest_pos);
                blocks.push(MatchingBlock::new(src_pos, dest_pos, size));
                src_pos = op.src_pos;
                dest_pos = op.dest_pos;
            }
            match op.tag {
                EditType::Replace => {
                    src_pos += 1;
                    dest_pos += 1;
                }
                EditType::Delete => src_pos += 1,
                EditType::Insert => dest_pos += 1,
                EditType::Equal => {}
            }
        }
        if src_pos < self.src_len && dest_pos < self.dest_len {
            let size = (self.src_len - src_pos).min(self.dest_len - dest_pos);
            blocks.push(MatchingBlock::new(src_pos, dest_pos, size));
        }
        blocks.push(MatchingBlock::new(self.src_len, self.dest_len, 0));
        blocks
    }
}

impl<'a> IntoIterator for &'a Editops {
    type Item = &'a Editop;
    type IntoIter = std::slice::Iter<'a, Editop>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

// ---------------------------------------------------------------------------
// Opcode / Opcodes
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Opcode {
    pub tag: EditType,
    pub src_start: usize,
    pub src_end: usize,
    pub dest_start: usize,
    pub dest_end: usize,
}

impl Opcode {
    pub fn new(tag: EditType, src_start: usize, src_end: usize, dest_start: usize, dest_end: usize) -> Self {
        Opcode { tag, src_start, src_end, dest_start, dest_end }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Opcodes {
    ops: Vec<Opcode>,
    src_len: usize,
    dest_len: usize,
}

impl Opcodes {
    pub fn new(ops: Vec<Opcode>, src_len: usize, dest_len: usize) -> Self {
        Opcodes { ops, src_len, dest_len }
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn as_slice(&self) -> &[Opcode] {
        &self.ops
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Opcode> {
        self.ops.iter()
    }

    pub fn inverse(&self) -> Opcodes {
        let ops = self
            .ops
            .iter()
            .map(|op| {
                let tag = match op.tag {
                    EditType::Insert => EditType::Delete,
                    EditType::Delete => EditType::Insert,
                    other => other,
                };
                Opcode::new(tag, op.dest_start, op.dest_end, op.src_start, op.src_end)
            })
            .collect();
        Opcodes::new(ops, self.dest_len, self.src_len)
    }

    pub fn as_editops(&self) -> Editops {
        let mut ops = Vec::new();
        for op in &self.ops {
            match op.tag {
                EditType::Equal => {}
                EditType::Replace => {
                    for j in 0..op.src_end - op.src_start {
                        ops.push(Editop::new(EditType::Replace, op.src_start + j, op.dest_start + j));
                    }
                }
                EditType::Insert => {
                    for j in 0..op.dest_end - op.dest_start {
                        ops.push(Editop::new(EditType::Insert, op.src_start, op.dest_start + j));
                    }
                }
                EditType::Delete => {
                    for j in 0..op.src_end - op.src_start {
                        ops.push(Editop::new(EditType::Delete, op.src_start + j, op.dest_start));
                    }
                }
            }
        }
        Editops::new(ops, self.src_len, self.dest_len)
    }

    pub fn apply<T: Copy>(&self, s1: &[T], s2: &[T]) -> Vec<T> {
        let mut out = Vec::with_capacity(self.dest_len);
        for op in &self.ops {
            match op.tag {
                EditType::Equal => out.extend_from_slice(&s1[op.src_start..op.src_end]),
                EditType::Replace | EditType::Insert => {
                    out.extend_from_slice(&s2[op.dest_start..op.dest_end])
                }
                EditType::Delete => {}
            }
        }
        out
    }
}

impl<'a> IntoIterator for &'a Opcodes {
    type Item = &'a Opcode;
    type IntoIter = std::slice::Iter<'a, Opcode>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatchingBlock {
    pub src_start: usize,
    pub dest_start: usize,
    pub size: usize,
}

impl MatchingBlock {
    pub fn new(src_start: usize, dest_start: usize, size: usize) -> Self {
        MatchingBlock { src_start, dest_start, size }
    }
}

// ---------------------------------------------------------------------------
// Traceback
// ---------------------------------------------------------------------------

/// Walks from `(len1, len2)` back to `(0, 0)` over a DP table exposed through
/// `cell(i, j)`. Tie-break order: match, replace, delete, insert.
/// Positions are shifted by `offset` (the trimmed common prefix).
pub(crate) fn traceback<A, B, F>(
    s1: &[A],
    s2: &[B],
    allow_replace: bool,
    offset: usize,
    cell: F,
) -> Vec<Editop>
where
    A: HashableChar,
    B: HashableChar,
    F: Fn(usize, usize) -> usize,
{
    let (mut i, mut j) = (s1.len(), s2.len());
    let mut ops = Vec::with_capacity(i.max(j));

    while i > 0 && j > 0 {
        let cur = cell(i, j);
        let diag = cell(i - 1, j - 1);
        if eq(s1[i - 1], s2[j - 1]) && diag == cur {
            i -= 1;
            j -= 1;
        } else if allow_replace && diag + 1 == cur {
            ops.push(Editop::new(EditType::Replace, offset + i - 1, offset + j - 1));
            i -= 1;
            j -= 1;
        } else if cell(i - 1, j) + 1 == cur {
            ops.push(Editop::new(EditType::Delete, offset + i - 1, offset + j));
            i -= 1;
        } else {
            ops.push(Editop::new(EditType::Insert, offset + i, offset + j - 1));
            j -= 1;
        }
    }
    while i > 0 {
        i -= 1;
        ops.push(Editop::new(EditType::Delete, offset + i, offset));
    }
    while j > 0 {
        j -= 1;
        ops.push(Editop::new(EditType::Insert, offset, offset + j));
    }
    ops.reverse();
    ops
}

/// Edit script for sequences with nothing in common after trimming.
pub(crate) fn trivial_ops(len1: usize, len2: usize, offset: usize) -> Vec<Editop> {
    if len1 == 0 {
        (0..len2).map(|j| Editop::new(EditType::Insert, offset, offset + j)).collect()
    } else {
        (0..len1).map(|i| Editop::new(EditType::Delete, offset + i, offset)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Editops {
        // "kitten" -> "sitting"
        Editops::new(
            vec![
                Editop::new(EditType::Replace, 0, 0),
                Editop::new(EditType::Replace, 4, 4),
                Editop::new(EditType::Insert, 6, 6),
            ],
            6,
            7,
        )
    }

    #[test]
    fn test_apply() {
        let ops = sample();
        assert_eq!(ops.apply(b"kitten", b"sitting"), b"sitting".to_vec());
    }

    #[test]
    fn test_inverse_apply() {
        let inv = sample().inverse();
        assert_eq!(inv.src_len(), 7);
        assert_eq!(inv.as_slice()[2], Editop::new(EditType::Delete, 6, 6));
        assert_eq!(inv.apply(b"sitting", b"kitten"), b"kitten".to_vec());
    }

    #[test]
    fn test_as_opcodes() {
        let opcodes = sample().as_opcodes();
        let tags: Vec<&str> = opcodes.iter().map(|o| o.tag.as_str()).collect();
        assert_eq!(tags, ["replace", "equal", "replace", "equal", "insert"]);
        assert_eq!(opcodes.as_slice()[1], Opcode::new(EditType::Equal, 1, 4, 1, 4));
        assert_eq!(opcodes.apply(b"kitten", b"sitting"), b"sitting".to_vec());
        assert_eq!(opcodes.as_editops(), sample());
    }

    #[test]
    fn test_matching_blocks() {
        let blocks = sample().as_matching_blocks();
        assert_eq!(
            blocks,
            vec![
                MatchingBlock::new(1, 1, 3),
                MatchingBlock::new(5, 5, 1),
                MatchingBlock::new(6, 7, 0),
            ]
        );
    }

    #[test]
    fn test_trailing_equal_opcode() {
        let ops = Editops::new(vec![Editop::new(EditType::Delete, 0, 0)], 3, 2);
        let opcodes = ops.as_opcodes();
        assert_eq!(opcodes.as_slice().last(), Some(&Opcode::new(EditType::Equal, 1, 3, 0, 2)));
    }
}
