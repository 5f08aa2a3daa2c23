//! The dense, fixed-universe [`BitVector`].

use std::ops::Range;

use crate::error::BitError;
use crate::iter::Ones;
use crate::setop::SetOp;

/// Number of bits in one storage word.
pub const WORD_BITS: usize = 64;

/// Largest universe size a [`BitVector`] may have.
///
/// Bounded by the `u32` universe field of the record header, so every
/// vector that can be created can also be encoded.
pub const MAX_UNIVERSE_SIZE: usize = u32::MAX as usize;

fn word_count_for(universe_size: usize) -> usize {
    universe_size.div_ceil(WORD_BITS)
}

/// Mask of the valid bits in the last word of a universe.
fn tail_mask(universe_size: usize) -> u64 {
    match universe_size % WORD_BITS {
        0 => u64::MAX,
        r => (1u64 << r) - 1,
    }
}

/// A set of integers drawn from `0..universe_size`, stored as packed
/// `u64` words.
///
/// The universe size is fixed at construction. Bits at positions
/// `>= universe_size` are never set, so two vectors are equal exactly
/// when their universe sizes and words are equal.
///
/// Every fallible method checks its arguments before mutating, so an
/// error always leaves the vector as it was.
///
/// # Examples
///
/// ```
/// use bitdb_core::BitVector;
///
/// let mut v = BitVector::new(16).unwrap();
/// v.set_many(&[2, 5, 9]).unwrap();
/// assert_eq!(v.count(), 3);
/// assert_eq!(v.to_index_list(), vec![2, 5, 9]);
/// assert!(v.set(16).is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BitVector {
    universe_size: usize,
    words: Vec<u64>,
}

impl BitVector {
    /// Create a vector over `0..universe_size` with every bit clear.
    pub fn new(universe_size: usize) -> Result<Self, BitError> {
        if universe_size > MAX_UNIVERSE_SIZE {
            return Err(BitError::InvalidSize {
                requested: universe_size,
                max: MAX_UNIVERSE_SIZE,
            });
        }
        Ok(Self {
            universe_size,
            words: vec![0; word_count_for(universe_size)],
        })
    }

    /// Create a vector with exactly the given indices set.
    pub fn from_indices(universe_size: usize, indices: &[usize]) -> Result<Self, BitError> {
        let mut v = Self::new(universe_size)?;
        v.set_many(indices)?;
        Ok(v)
    }

    /// Rebuild a vector from its packed words.
    ///
    /// The word count must match `universe_size` and no padding bit may
    /// be set.
    pub fn from_words(universe_size: usize, words: Vec<u64>) -> Result<Self, BitError> {
        if universe_size > MAX_UNIVERSE_SIZE {
            return Err(BitError::InvalidSize {
                requested: universe_size,
                max: MAX_UNIVERSE_SIZE,
            });
        }
        let expected = word_count_for(universe_size);
        if words.len() != expected {
            return Err(BitError::WordCountMismatch {
                expected,
                found: words.len(),
            });
        }
        if let Some(&last) = words.last() {
            if last & !tail_mask(universe_size) != 0 {
                return Err(BitError::PaddingBitsSet { universe_size });
            }
        }
        Ok(Self {
            universe_size,
            words,
        })
    }

    /// Number of addressable bit positions.
    pub fn universe_size(&self) -> usize {
        self.universe_size
    }

    /// The packed words, least significant bit first.
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Number of storage words.
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    // ── Single-bit access ───────────────────────────────────────

    fn check_index(&self, index: usize) -> Result<(), BitError> {
        if index >= self.universe_size {
            return Err(BitError::OutOfRange {
                index,
                universe_size: self.universe_size,
            });
        }
        Ok(())
    }

    #[inline]
    fn locate(index: usize) -> (usize, u64) {
        (index / WORD_BITS, 1u64 << (index % WORD_BITS))
    }

    /// Whether `index` is in the set.
    pub fn test(&self, index: usize) -> Result<bool, BitError> {
        self.check_index(index)?;
        let (word, mask) = Self::locate(index);
        Ok(self.words[word] & mask != 0)
    }

    /// Add `index` to the set.
    pub fn set(&mut self, index: usize) -> Result<(), BitError> {
        self.check_index(index)?;
        let (word, mask) = Self::locate(index);
        self.words[word] |= mask;
        Ok(())
    }

    /// Remove `index` from the set.
    pub fn clear(&mut self, index: usize) -> Result<(), BitError> {
        self.check_index(index)?;
        let (word, mask) = Self::locate(index);
        self.words[word] &= !mask;
        Ok(())
    }

    /// Write one bit and return its previous value.
    pub fn put(&mut self, index: usize, bit: bool) -> Result<bool, BitError> {
        self.check_index(index)?;
        let (word, mask) = Self::locate(index);
        let previous = self.words[word] & mask != 0;
        if bit {
            self.words[word] |= mask;
        } else {
            self.words[word] &= !mask;
        }
        Ok(previous)
    }

    // ── Bulk index operations ───────────────────────────────────

    fn check_indices(&self, indices: &[usize]) -> Result<(), BitError> {
        match indices.iter().find(|&&i| i >= self.universe_size) {
            Some(&index) => Err(BitError::OutOfRange {
                index,
                universe_size: self.universe_size,
            }),
            None => Ok(()),
        }
    }

    /// Set every index in `indices`.
    ///
    /// All indices are validated first: if any is out of range, nothing
    /// is set.
    pub fn set_many(&mut self, indices: &[usize]) -> Result<(), BitError> {
        self.check_indices(indices)?;
        for &i in indices {
            let (word, mask) = Self::locate(i);
            self.words[word] |= mask;
        }
        Ok(())
    }

    /// Clear every index in `indices`, with the same all-or-nothing rule
    /// as [`set_many`](Self::set_many).
    pub fn clear_many(&mut self, indices: &[usize]) -> Result<(), BitError> {
        self.check_indices(indices)?;
        for &i in indices {
            let (word, mask) = Self::locate(i);
            self.words[word] &= !mask;
        }
        Ok(())
    }

    // ── Ranges ──────────────────────────────────────────────────

    fn check_range(&self, range: &Range<usize>) -> Result<(), BitError> {
        if range.start > range.end || range.end > self.universe_size {
            return Err(BitError::InvalidRange {
                start: range.start,
                end: range.end,
                universe_size: self.universe_size,
            });
        }
        Ok(())
    }

    /// Call `f(word, mask)` for each word touched by a validated range,
    /// where `mask` selects the range's bits within that word.
    fn for_each_range_word(&mut self, range: Range<usize>, mut f: impl FnMut(&mut u64, u64)) {
        if range.is_empty() {
            return;
        }
        let first = range.start / WORD_BITS;
        let last = (range.end - 1) / WORD_BITS;
        for w in first..=last {
            let lo = if w == first { range.start % WORD_BITS } else { 0 };
            let hi = if w == last {
                (range.end - 1) % WORD_BITS
            } else {
                WORD_BITS - 1
            };
            let mask = (u64::MAX >> (WORD_BITS - 1 - hi)) & (u64::MAX << lo);
            f(&mut self.words[w], mask);
        }
    }

    /// Set every index in the half-open `range`.
    pub fn set_range(&mut self, range: Range<usize>) -> Result<(), BitError> {
        self.check_range(&range)?;
        self.for_each_range_word(range, |w, m| *w |= m);
        Ok(())
    }

    /// Clear every index in the half-open `range`.
    pub fn clear_range(&mut self, range: Range<usize>) -> Result<(), BitError> {
        self.check_range(&range)?;
        self.for_each_range_word(range, |w, m| *w &= !m);
        Ok(())
    }

    /// Flip every index in the half-open `range`.
    pub fn flip_range(&mut self, range: Range<usize>) -> Result<(), BitError> {
        self.check_range(&range)?;
        self.for_each_range_word(range, |w, m| *w ^= m);
        Ok(())
    }

    /// Set every bit in the universe.
    pub fn fill(&mut self) {
        self.words.fill(u64::MAX);
        self.mask_tail();
    }

    /// Clear every bit.
    pub fn clear_all(&mut self) {
        self.words.fill(0);
    }

    fn mask_tail(&mut self) {
        let mask = tail_mask(self.universe_size);
        if let Some(last) = self.words.last_mut() {
            *last &= mask;
        }
    }

    // ── Queries ─────────────────────────────────────────────────

    /// Population count: the number of set bits.
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Whether no bit is set.
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Whether every bit in the universe is set.
    pub fn is_full(&self) -> bool {
        self.count() == self.universe_size
    }

    /// Iterate the set indices in ascending order.
    pub fn iter_ones(&self) -> Ones<'_> {
        Ones::new(&self.words, self.count())
    }

    /// Collect the set indices in ascending order.
    pub fn to_index_list(&self) -> Vec<usize> {
        self.iter_ones().collect()
    }

    // ── Set algebra ─────────────────────────────────────────────

    fn check_same_universe(&self, other: &Self) -> Result<(), BitError> {
        if self.universe_size != other.universe_size {
            return Err(BitError::SizeMismatch {
                left: self.universe_size,
                right: other.universe_size,
            });
        }
        Ok(())
    }

    /// Apply `op` in place: `self = self OP other`.
    pub fn apply_in_place(&mut self, other: &Self, op: SetOp) -> Result<(), BitError> {
        self.check_same_universe(other)?;
        for (a, &b) in self.words.iter_mut().zip(&other.words) {
            *a = op.apply(*a, b);
        }
        Ok(())
    }

    /// Return `self OP other` as a new vector.
    pub fn apply(&self, other: &Self, op: SetOp) -> Result<Self, BitError> {
        self.check_same_universe(other)?;
        let words = self
            .words
            .iter()
            .zip(&other.words)
            .map(|(&a, &b)| op.apply(a, b))
            .collect();
        Ok(Self {
            universe_size: self.universe_size,
            words,
        })
    }

    /// Population count of `self OP other`, without materialising it.
    pub fn setop_count(&self, other: &Self, op: SetOp) -> Result<usize, BitError> {
        self.check_same_universe(other)?;
        Ok(self
            .words
            .iter()
            .zip(&other.words)
            .map(|(&a, &b)| op.apply(a, b).count_ones() as usize)
            .sum())
    }

    /// Return the union of two sets (`self | other`).
    pub fn union(&self, other: &Self) -> Result<Self, BitError> {
        self.apply(other, SetOp::Union)
    }

    /// Return the intersection of two sets (`self & other`).
    pub fn intersect(&self, other: &Self) -> Result<Self, BitError> {
        self.apply(other, SetOp::Intersect)
    }

    /// Return the elements of `self` not in `other`.
    pub fn difference(&self, other: &Self) -> Result<Self, BitError> {
        self.apply(other, SetOp::Difference)
    }

    /// Return the elements in exactly one of the two sets.
    pub fn symmetric_difference(&self, other: &Self) -> Result<Self, BitError> {
        self.apply(other, SetOp::SymmetricDifference)
    }

    /// In-place [`union`](Self::union).
    pub fn union_with(&mut self, other: &Self) -> Result<(), BitError> {
        self.apply_in_place(other, SetOp::Union)
    }

    /// In-place [`intersect`](Self::intersect).
    pub fn intersect_with(&mut self, other: &Self) -> Result<(), BitError> {
        self.apply_in_place(other, SetOp::Intersect)
    }

    /// In-place [`difference`](Self::difference).
    pub fn difference_with(&mut self, other: &Self) -> Result<(), BitError> {
        self.apply_in_place(other, SetOp::Difference)
    }

    /// In-place [`symmetric_difference`](Self::symmetric_difference).
    pub fn symmetric_difference_with(&mut self, other: &Self) -> Result<(), BitError> {
        self.apply_in_place(other, SetOp::SymmetricDifference)
    }

    /// Size of the union.
    pub fn union_count(&self, other: &Self) -> Result<usize, BitError> {
        self.setop_count(other, SetOp::Union)
    }

    /// Size of the intersection.
    pub fn intersect_count(&self, other: &Self) -> Result<usize, BitError> {
        self.setop_count(other, SetOp::Intersect)
    }

    /// Size of the difference.
    pub fn difference_count(&self, other: &Self) -> Result<usize, BitError> {
        self.setop_count(other, SetOp::Difference)
    }

    /// Size of the symmetric difference.
    pub fn symmetric_difference_count(&self, other: &Self) -> Result<usize, BitError> {
        self.setop_count(other, SetOp::SymmetricDifference)
    }

    /// Return the complement within the universe.
    pub fn complement(&self) -> Self {
        let mut v = self.clone();
        v.complement_in_place();
        v
    }

    /// Flip every bit in the universe.
    pub fn complement_in_place(&mut self) {
        for w in &mut self.words {
            *w = !*w;
        }
        self.mask_tail();
    }

    /// Whether every element of `self` is also in `other`.
    pub fn is_subset(&self, other: &Self) -> Result<bool, BitError> {
        self.check_same_universe(other)?;
        Ok(self
            .words
            .iter()
            .zip(&other.words)
            .all(|(&a, &b)| a & !b == 0))
    }

    /// Whether `self` is a subset of `other` and not equal to it.
    pub fn is_proper_subset(&self, other: &Self) -> Result<bool, BitError> {
        Ok(self.is_subset(other)? && self.words != other.words)
    }
}

impl<'a> IntoIterator for &'a BitVector {
    type Item = usize;
    type IntoIter = Ones<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_ones()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const UNIVERSE: usize = 200;

    fn arb_vector() -> impl Strategy<Value = BitVector> {
        prop::collection::vec(0usize..UNIVERSE, 0..64)
            .prop_map(|ids| BitVector::from_indices(UNIVERSE, &ids).unwrap())
    }

    proptest! {
        #[test]
        fn union_commutative(a in arb_vector(), b in arb_vector()) {
            prop_assert_eq!(a.union(&b).unwrap(), b.union(&a).unwrap());
        }

        #[test]
        fn union_idempotent(a in arb_vector()) {
            prop_assert_eq!(a.union(&a).unwrap(), a);
        }

        #[test]
        fn intersect_commutative(a in arb_vector(), b in arb_vector()) {
            prop_assert_eq!(a.intersect(&b).unwrap(), b.intersect(&a).unwrap());
        }

        #[test]
        fn intersect_count_bounded_by_operands(a in arb_vector(), b in arb_vector()) {
            let n = a.intersect(&b).unwrap().count();
            prop_assert!(n <= a.count().min(b.count()));
        }

        #[test]
        fn union_associative(
            a in arb_vector(),
            b in arb_vector(),
            c in arb_vector(),
        ) {
            prop_assert_eq!(
                a.union(&b).unwrap().union(&c).unwrap(),
                a.union(&b.union(&c).unwrap()).unwrap()
            );
        }

        #[test]
        fn de_morgan(a in arb_vector(), b in arb_vector()) {
            let lhs = a.union(&b).unwrap().complement();
            let rhs = a.complement().intersect(&b.complement()).unwrap();
            prop_assert_eq!(lhs, rhs);
        }

        #[test]
        fn setop_count_matches_materialised(a in arb_vector(), b in arb_vector()) {
            for op in SetOp::ALL {
                prop_assert_eq!(
                    a.setop_count(&b, op).unwrap(),
                    a.apply(&b, op).unwrap().count()
                );
            }
        }

        #[test]
        fn in_place_matches_new(a in arb_vector(), b in arb_vector()) {
            for op in SetOp::ALL {
                let mut c = a.clone();
                c.apply_in_place(&b, op).unwrap();
                prop_assert_eq!(c, a.apply(&b, op).unwrap());
            }
        }

        #[test]
        fn set_then_test(mut v in arb_vector(), i in 0usize..UNIVERSE) {
            v.set(i).unwrap();
            prop_assert!(v.test(i).unwrap());
            v.clear(i).unwrap();
            prop_assert!(!v.test(i).unwrap());
        }

        #[test]
        fn out_of_range_leaves_vector_unchanged(
            mut v in arb_vector(),
            i in UNIVERSE..UNIVERSE * 4,
        ) {
            let before = v.clone();
            prop_assert!(
                matches!(v.set(i), Err(BitError::OutOfRange { .. })),
                "set({}) accepted",
                i
            );
            prop_assert!(
                matches!(v.clear(i), Err(BitError::OutOfRange { .. })),
                "clear({}) accepted",
                i
            );
            prop_assert!(
                matches!(v.test(i), Err(BitError::OutOfRange { .. })),
                "test({}) accepted",
                i
            );
            prop_assert_eq!(v, before);
        }

        #[test]
        fn index_list_ascending_and_counted(v in arb_vector()) {
            let list = v.to_index_list();
            prop_assert_eq!(list.len(), v.count());
            prop_assert!(list.windows(2).all(|w| w[0] < w[1]));
        }

        #[test]
        fn range_ops_match_per_bit(
            v in arb_vector(),
            start in 0usize..UNIVERSE,
            len in 0usize..UNIVERSE,
        ) {
            let end = (start + len).min(UNIVERSE);
            let mut ranged = v.clone();
            ranged.flip_range(start..end).unwrap();
            let mut single = v.clone();
            for i in start..end {
                let bit = single.test(i).unwrap();
                single.put(i, !bit).unwrap();
            }
            prop_assert_eq!(ranged, single);
        }
    }

    #[test]
    fn create_rejects_oversized_universe() {
        let err = BitVector::new(MAX_UNIVERSE_SIZE + 1).unwrap_err();
        assert!(matches!(err, BitError::InvalidSize { .. }));
    }

    #[test]
    fn zero_universe_is_valid_and_empty() {
        let mut v = BitVector::new(0).unwrap();
        assert_eq!(v.word_count(), 0);
        assert_eq!(v.count(), 0);
        assert!(v.is_empty());
        assert!(v.is_full());
        assert!(v.set(0).is_err());
    }

    #[test]
    fn word_count_rounds_up() {
        assert_eq!(BitVector::new(1).unwrap().word_count(), 1);
        assert_eq!(BitVector::new(64).unwrap().word_count(), 1);
        assert_eq!(BitVector::new(65).unwrap().word_count(), 2);
    }

    #[test]
    fn set_many_is_all_or_nothing() {
        let mut v = BitVector::new(16).unwrap();
        let err = v.set_many(&[1, 2, 16, 3]).unwrap_err();
        assert_eq!(
            err,
            BitError::OutOfRange {
                index: 16,
                universe_size: 16
            }
        );
        assert!(v.is_empty(), "no index may be set when one is invalid");
    }

    #[test]
    fn clear_many_is_all_or_nothing() {
        let mut v = BitVector::from_indices(16, &[1, 2, 3]).unwrap();
        assert!(v.clear_many(&[1, 99]).is_err());
        assert_eq!(v.to_index_list(), vec![1, 2, 3]);
        v.clear_many(&[1, 3]).unwrap();
        assert_eq!(v.to_index_list(), vec![2]);
    }

    #[test]
    fn put_returns_previous_bit() {
        let mut v = BitVector::new(8).unwrap();
        assert!(!v.put(3, true).unwrap());
        assert!(v.put(3, true).unwrap());
        assert!(v.put(3, false).unwrap());
        assert!(!v.test(3).unwrap());
    }

    #[test]
    fn mismatched_sizes_rejected_without_mutation() {
        let mut a = BitVector::from_indices(10, &[1]).unwrap();
        let b = BitVector::from_indices(11, &[2]).unwrap();
        assert_eq!(
            a.union(&b).unwrap_err(),
            BitError::SizeMismatch {
                left: 10,
                right: 11
            }
        );
        assert!(a.union_with(&b).is_err());
        assert_eq!(a.to_index_list(), vec![1]);
        assert!(a.is_subset(&b).is_err());
        assert!(a.intersect_count(&b).is_err());
    }

    #[test]
    fn complement_keeps_padding_clear() {
        let v = BitVector::new(70).unwrap().complement();
        assert_eq!(v.count(), 70);
        assert_eq!(v.words()[1], (1u64 << 6) - 1);
        assert!(v.is_full());
    }

    #[test]
    fn fill_and_clear_all() {
        let mut v = BitVector::new(130).unwrap();
        v.fill();
        assert_eq!(v.count(), 130);
        v.clear_all();
        assert!(v.is_empty());
    }

    #[test]
    fn set_range_across_words() {
        let mut v = BitVector::new(200).unwrap();
        v.set_range(60..130).unwrap();
        assert_eq!(v.count(), 70);
        assert_eq!(v.iter_ones().next(), Some(60));
        assert_eq!(v.iter_ones().last(), Some(129));
        v.clear_range(64..128).unwrap();
        assert_eq!(v.to_index_list(), vec![60, 61, 62, 63, 128, 129]);
    }

    #[test]
    fn empty_range_is_noop_and_bad_range_rejected() {
        let mut v = BitVector::new(10).unwrap();
        v.set_range(5..5).unwrap();
        assert!(v.is_empty());
        #[allow(clippy::reversed_empty_ranges)]
        let reversed = 6..5;
        assert!(matches!(
            v.set_range(reversed),
            Err(BitError::InvalidRange { .. })
        ));
        assert!(matches!(
            v.set_range(0..11),
            Err(BitError::InvalidRange { .. })
        ));
        assert!(v.is_empty());
    }

    #[test]
    fn subset_relations() {
        let a = BitVector::from_indices(32, &[1, 2]).unwrap();
        let b = BitVector::from_indices(32, &[1, 2, 3]).unwrap();
        assert!(a.is_subset(&b).unwrap());
        assert!(a.is_proper_subset(&b).unwrap());
        assert!(b.is_subset(&b).unwrap());
        assert!(!b.is_proper_subset(&b).unwrap());
        assert!(!b.is_subset(&a).unwrap());
    }

    #[test]
    fn from_words_validates_layout() {
        assert!(matches!(
            BitVector::from_words(65, vec![0]),
            Err(BitError::WordCountMismatch {
                expected: 2,
                found: 1
            })
        ));
        assert!(matches!(
            BitVector::from_words(65, vec![0, 0b10]),
            Err(BitError::PaddingBitsSet { universe_size: 65 })
        ));
        let v = BitVector::from_words(65, vec![1, 1]).unwrap();
        assert_eq!(v.to_index_list(), vec![0, 64]);
    }

    #[test]
    fn equality_considers_universe_size() {
        let a = BitVector::from_indices(10, &[1]).unwrap();
        let b = BitVector::from_indices(20, &[1]).unwrap();
        assert_ne!(a, b);
        assert_eq!(a, BitVector::from_indices(10, &[1]).unwrap());
    }

    #[test]
    fn iteration_is_restartable() {
        let v = BitVector::from_indices(100, &[3, 70, 99]).unwrap();
        let first: Vec<_> = v.iter_ones().collect();
        let second: Vec<_> = (&v).into_iter().collect();
        assert_eq!(first, second);
        assert_eq!(first, vec![3, 70, 99]);
    }
}
