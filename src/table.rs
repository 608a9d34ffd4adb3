// SPDX-License-Identifier: MIT

use crate::error::{ReduceError, Result};
use std::sync::atomic::{AtomicU64, Ordering::Relaxed};

/// One `f64` slot per worker, indexed by worker id.
///
/// Slots are stored as raw bits in atomics so workers can share the table
/// without a lock. No ordering is imposed here: a slot is only read by
/// another worker after both have passed the same barrier round, and the
/// barrier supplies the happens-before edge.
pub struct PartialSumTable {
    slots: Box<[AtomicU64]>,
}

impl PartialSumTable {
    /// Allocates `len` slots initialised to `0.0`.
    ///
    /// Fails with [`ReduceError::AllocationFailure`] instead of aborting when
    /// the slots cannot be reserved.
    pub fn new(len: usize) -> Result<Self> {
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(len)
            .map_err(|_| ReduceError::AllocationFailure {
                what: "partial-sum slots",
                requested: len,
            })?;
        slots.extend((0..len).map(|_| AtomicU64::new(0.0f64.to_bits())));

        Ok(PartialSumTable {
            slots: slots.into_boxed_slice(),
        })
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if the table has no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Reads slot `index`.
    pub fn get(&self, index: usize) -> f64 {
        f64::from_bits(self.slots[index].load(Relaxed))
    }

    /// Overwrites slot `index`.
    pub fn set(&self, index: usize, value: f64) {
        self.slots[index].store(value.to_bits(), Relaxed);
    }

    /// Adds slot `from` into slot `into` and returns the new value of `into`.
    ///
    /// Only `into`'s owner may call this in a given round, and nobody may
    /// write `from` in the same round.
    pub fn combine(&self, into: usize, from: usize) -> f64 {
        let combined = self.get(into) + self.get(from);
        self.set(into, combined);
        combined
    }

    /// Copies every slot out, in id order.
    pub fn snapshot(&self) -> Vec<f64> {
        (0..self.len()).map(|index| self.get(index)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_table_is_zeroed() {
        let table = PartialSumTable::new(5).unwrap();
        assert_eq!(table.len(), 5);
        assert_eq!(table.snapshot(), vec![0.0; 5]);
    }

    #[test]
    fn test_set_and_combine() {
        let table = PartialSumTable::new(3).unwrap();
        table.set(0, 1.5);
        table.set(2, 2.25);
        assert_eq!(table.combine(0, 2), 3.75);
        assert_eq!(table.snapshot(), vec![3.75, 0.0, 2.25]);
    }

    #[test]
    fn test_impossible_size_is_an_error() {
        match PartialSumTable::new(usize::MAX) {
            Err(ReduceError::AllocationFailure { requested, .. }) => {
                assert_eq!(requested, usize::MAX)
            }
            other => panic!("expected allocation failure, got {:?}", other.err()),
        }
    }
}
