// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Track slot validity for board object groups.
// Author: Lukas Bower

/// Validity bitmask with one bit per group slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardObjGrpMask {
    bit_count: usize,
    words: Vec<u32>,
}

impl BoardObjGrpMask {
    /// Construct an all-clear mask covering `bit_count` slots.
    #[must_use]
    pub fn new(bit_count: usize) -> Self {
        Self {
            bit_count,
            words: vec![0; word_count(bit_count)],
        }
    }

    /// Like [`BoardObjGrpMask::new`] but reports allocation failure.
    pub(crate) fn try_new(bit_count: usize) -> Option<Self> {
        let mut words = Vec::new();
        words.try_reserve_exact(word_count(bit_count)).ok()?;
        words.resize(word_count(bit_count), 0);
        Some(Self { bit_count, words })
    }

    /// Number of slots covered by the mask.
    #[must_use]
    pub fn bit_count(&self) -> usize {
        self.bit_count
    }

    /// Set the bit for `index`. Out-of-range indices are ignored.
    pub fn set(&mut self, index: usize) {
        if index < self.bit_count {
            self.words[index / 32] |= 1 << (index % 32);
        }
    }

    /// Clear the bit for `index`.
    pub fn clear(&mut self, index: usize) {
        if index < self.bit_count {
            self.words[index / 32] &= !(1 << (index % 32));
        }
    }

    /// Reports whether the bit for `index` is set.
    #[must_use]
    pub fn test(&self, index: usize) -> bool {
        index < self.bit_count && self.words[index / 32] & (1 << (index % 32)) != 0
    }

    /// Number of set bits.
    #[must_use]
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Reports whether no bit is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    /// Clear every bit.
    pub fn clear_all(&mut self) {
        self.words.iter_mut().for_each(|w| *w = 0);
    }

    /// Words backing the mask, least significant slot first.
    #[must_use]
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Ascending iterator over set bit indices.
    #[must_use]
    pub fn iter(&self) -> SetBits<'_> {
        SetBits { mask: self, next: 0 }
    }
}

/// Iterator over the set bits of a [`BoardObjGrpMask`].
#[derive(Debug, Clone)]
pub struct SetBits<'a> {
    mask: &'a BoardObjGrpMask,
    next: usize,
}

impl Iterator for SetBits<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while self.next < self.mask.bit_count {
            let index = self.next;
            self.next += 1;
            if self.mask.test(index) {
                return Some(index);
            }
        }
        None
    }
}

fn word_count(bit_count: usize) -> usize {
    bit_count.div_ceil(32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_bits_iterate_in_index_order() {
        let mut mask = BoardObjGrpMask::new(40);
        mask.set(33);
        mask.set(2);
        mask.set(31);
        assert_eq!(mask.iter().collect::<Vec<_>>(), vec![2, 31, 33]);
        assert_eq!(mask.count(), 3);
        assert_eq!(mask.words().len(), 2);
    }

    #[test]
    fn out_of_range_bits_are_ignored() {
        let mut mask = BoardObjGrpMask::new(4);
        mask.set(4);
        assert!(mask.is_empty());
        assert!(!mask.test(4));
    }
}
