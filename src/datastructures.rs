use bitvec::prelude::*;
use core::mem;
use num::{NumCast, ToPrimitive};
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::ops::Index;

/// Fixed size set of small integers, used as memo key by the exact solver and
/// as visited marker by the traversals.
#[derive(Clone, Default)]
pub struct BitSet {
    cardinality: usize,
    bit_vec: BitVec,
}

impl Debug for BitSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let values: Vec<_> = self.iter().map(|i| i.to_string()).collect();
        write!(
            f,
            "BitSet {{ cardinality: {}, bit_vec: [{}]}}",
            self.cardinality,
            values.join(", "),
        )
    }
}

impl PartialEq for BitSet {
    fn eq(&self, other: &Self) -> bool {
        self.cardinality == other.cardinality && self.bit_vec == other.bit_vec
    }
}
impl Eq for BitSet {}

impl Hash for BitSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bit_vec.as_raw_slice().hash(state)
    }
}

const fn block_size() -> usize {
    mem::size_of::<usize>() * 8
}

impl BitSet {
    #[inline]
    pub fn new(size: usize) -> Self {
        Self {
            cardinality: 0,
            bit_vec: bitvec![0; size],
        }
    }

    pub fn from_slice<T: ToPrimitive + Copy>(size: usize, slice: &[T]) -> Self {
        let mut bit_set = Self::new(size);
        for i in slice {
            let idx: usize = NumCast::from(*i).expect("index must fit into usize");
            bit_set.set_bit(idx);
        }
        bit_set
    }

    #[inline]
    pub fn new_all_set(size: usize) -> Self {
        Self {
            cardinality: size,
            bit_vec: bitvec![1; size],
        }
    }

    #[inline]
    pub fn empty(&self) -> bool {
        self.cardinality == 0
    }

    #[inline]
    pub fn full(&self) -> bool {
        self.cardinality == self.bit_vec.len()
    }

    /// Sets the bit, returns whether it was set before.
    #[inline]
    pub fn set_bit(&mut self, idx: usize) -> bool {
        if !self.bit_vec[idx] {
            self.bit_vec.set(idx, true);
            self.cardinality += 1;
            false
        } else {
            true
        }
    }

    /// Unsets the bit, returns whether it was set before.
    #[inline]
    pub fn unset_bit(&mut self, idx: usize) -> bool {
        if self.bit_vec[idx] {
            self.bit_vec.set(idx, false);
            self.cardinality -= 1;
            true
        } else {
            false
        }
    }

    #[inline]
    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

    #[inline]
    pub fn get_next_set(&self, idx: usize) -> Option<usize> {
        if idx >= self.bit_vec.len() {
            return None;
        }
        let slice = self.bit_vec.as_raw_slice();
        let mut block_idx = idx / block_size();
        let mut block = slice[block_idx] & (usize::MAX << (idx % block_size()));
        while block == 0 {
            block_idx += 1;
            if block_idx >= slice.len() {
                return None;
            }
            block = slice[block_idx];
        }
        let v = block_idx * block_size() + block.trailing_zeros() as usize;
        if v >= self.bit_vec.len() {
            None
        } else {
            Some(v)
        }
    }

    #[inline]
    pub fn get_first_set(&self) -> Option<usize> {
        if self.cardinality == 0 {
            return None;
        }
        self.get_next_set(0)
    }

    #[inline]
    pub fn iter(&self) -> BitSetIterator {
        BitSetIterator {
            bit_set: self,
            next: 0,
        }
    }
}

pub struct BitSetIterator<'a> {
    bit_set: &'a BitSet,
    next: usize,
}

impl<'a> Iterator for BitSetIterator<'a> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let current = self.bit_set.get_next_set(self.next)?;
        self.next = current + 1;
        Some(current)
    }
}

impl Index<usize> for BitSet {
    type Output = bool;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        if self.bit_vec[index] {
            &true
        } else {
            &false
        }
    }
}
