//! # Bit Set
//!
//! Growable set of small non-negative integers, used for the populated
//! chunk and section slots of a region.
//!
//! ## Layout
//!
//! Bit `i` lives in byte `i / 8` at bit position `i % 8` (LSB first).
//! Trailing zero bytes are never kept, so two sets with the same members
//! always have the same byte representation and compare equal.

/// A set of slot indices backed by a packed byte run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct BitSet {
    bytes: Vec<u8>,
}

impl BitSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Rebuilds a set from its serialized byte run.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut set = Self { bytes: bytes.to_vec() };
        set.trim();
        set
    }

    /// Returns the canonical byte run (no trailing zero bytes).
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Adds `index` to the set.
    pub fn set(&mut self, index: usize) {
        let byte = index / 8;
        if byte >= self.bytes.len() {
            self.bytes.resize(byte + 1, 0);
        }
        self.bytes[byte] |= 1 << (index % 8);
    }

    /// Removes `index` from the set.
    pub fn clear(&mut self, index: usize) {
        if let Some(byte) = self.bytes.get_mut(index / 8) {
            *byte &= !(1 << (index % 8));
            self.trim();
        }
    }

    /// Returns true if `index` is in the set.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> bool {
        self.bytes
            .get(index / 8)
            .is_some_and(|byte| byte & (1 << (index % 8)) != 0)
    }

    /// Number of members.
    #[must_use]
    pub fn count(&self) -> usize {
        self.bytes.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Returns true if no bit is set.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// One past the highest member, or 0 for an empty set.
    #[must_use]
    pub fn len(&self) -> usize {
        match self.bytes.last() {
            Some(&last) => (self.bytes.len() - 1) * 8 + (8 - last.leading_zeros() as usize),
            None => 0,
        }
    }

    /// Iterates members in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.bytes.iter().enumerate().flat_map(|(byte_index, &byte)| {
            (0..8)
                .filter(move |bit| byte & (1 << bit) != 0)
                .map(move |bit| byte_index * 8 + bit)
        })
    }

    fn trim(&mut self) {
        while self.bytes.last() == Some(&0) {
            self.bytes.pop();
        }
    }
}

impl FromIterator<usize> for BitSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = Self::new();
        for index in iter {
            set.set(index);
        }
        set
    }
}
