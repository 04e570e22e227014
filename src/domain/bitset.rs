//! Fixed-width bit sets over fact indices
//!
//! States, preconditions and effects are all sets of facts. The width of a
//! set is the fact count `F` of the grounded problem and is fixed when the
//! set is created, so iteration never depends on how many bits happen to be
//! set in the highest word.

use std::fmt;

use thiserror::Error;

const WORD_BITS: usize = u64::BITS as usize;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BitSetError {
    #[error("Fact index {index} out of range for {len} facts")]
    IndexOutOfRange { index: usize, len: usize },
}

/// A dense set of fact indices in `0..len`
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct BitSet {
    len: usize,
    words: Vec<u64>,
}

impl BitSet {
    /// Creates an empty set able to hold indices `0..len`
    pub fn new(len: usize) -> Self {
        Self {
            len,
            words: vec![0; len.div_ceil(WORD_BITS)],
        }
    }

    /// Creates a set from a list of indices, rejecting any index `>= len`
    pub fn from_indices(
        len: usize,
        indices: impl IntoIterator<Item = usize>,
    ) -> Result<Self, BitSetError> {
        let mut set = Self::new(len);
        for index in indices {
            if index >= len {
                return Err(BitSetError::IndexOutOfRange { index, len });
            }
            set.insert(index);
        }
        Ok(set)
    }

    /// Returns the width of the set (the fact count)
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no bit is set
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    /// Returns the number of set bits
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Tests a single bit. Indices outside the width are never set.
    pub fn contains(&self, index: usize) -> bool {
        if index >= self.len {
            return false;
        }
        self.words[index / WORD_BITS] & (1u64 << (index % WORD_BITS)) != 0
    }

    /// Sets a bit, returning true if it was not set before
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn insert(&mut self, index: usize) -> bool {
        assert!(
            index < self.len,
            "bit index {} out of range for width {}",
            index,
            self.len
        );
        let word = &mut self.words[index / WORD_BITS];
        let mask = 1u64 << (index % WORD_BITS);
        let was_set = *word & mask != 0;
        *word |= mask;
        !was_set
    }

    /// Iterates the set indices in ascending order
    ///
    /// The iterator borrows the set, so it can be recreated any number of
    /// times.
    pub fn ones(&self) -> Ones<'_> {
        Ones {
            words: &self.words,
            word_index: 0,
            current: self.words.first().copied().unwrap_or(0),
        }
    }

    /// Returns true if every index in `self` is also in `other`
    ///
    /// Sets of different widths are compared bit by bit; bits beyond the
    /// shorter width count as unset.
    pub fn is_subset(&self, other: &BitSet) -> bool {
        self.words.iter().enumerate().all(|(i, word)| {
            let theirs = other.words.get(i).copied().unwrap_or(0);
            word & !theirs == 0
        })
    }

    /// Returns true if `self` holds every index in `required`
    ///
    /// This is the precondition check: a state entails an operator's
    /// preconditions when they are a subset of it.
    pub fn entails(&self, required: &BitSet) -> bool {
        required.is_subset(self)
    }
}

impl fmt::Debug for BitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitSet({})", self.len)?;
        f.debug_set().entries(self.ones()).finish()
    }
}

/// Iterator over the set indices of a [`BitSet`]
pub struct Ones<'a> {
    words: &'a [u64],
    word_index: usize,
    current: u64,
}

impl Iterator for Ones<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        loop {
            if self.current != 0 {
                let bit = self.current.trailing_zeros() as usize;
                // clear lowest set bit
                self.current &= self.current - 1;
                return Some(self.word_index * WORD_BITS + bit);
            }

            self.word_index += 1;
            if self.word_index >= self.words.len() {
                return None;
            }
            self.current = self.words[self.word_index];
        }
    }
}
