//! Iteration over set bits.

use std::iter::FusedIterator;

/// Iterator over the set bits of a [`BitVector`](crate::BitVector),
/// yielding indices in ascending order.
///
/// Borrowing iterator: call [`BitVector::iter_ones`](crate::BitVector::iter_ones)
/// again to restart from the first set bit.
#[derive(Clone, Debug)]
pub struct Ones<'a> {
    words: &'a [u64],
    word_idx: usize,
    current: u64,
    remaining: usize,
}

impl<'a> Ones<'a> {
    pub(crate) fn new(words: &'a [u64], count: usize) -> Self {
        Self {
            words,
            word_idx: 0,
            current: words.first().copied().unwrap_or(0),
            remaining: count,
        }
    }
}

impl Iterator for Ones<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        loop {
            if self.current != 0 {
                let bit = self.current.trailing_zeros() as usize;
                // Clear the lowest set bit.
                self.current &= self.current - 1;
                self.remaining -= 1;
                return Some(self.word_idx * 64 + bit);
            }
            self.word_idx += 1;
            match self.words.get(self.word_idx) {
                Some(&w) => self.current = w,
                None => {
                    self.word_idx = self.words.len();
                    return None;
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Ones<'_> {}

impl FusedIterator for Ones<'_> {}
