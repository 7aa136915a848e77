// slots.rs - Write-once shared output buffers

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

// Every slot is written by the single worker that owns its index, and read
// only after the pool has joined, so relaxed stores are enough: the join
// barrier provides the happens-before edge for the final read.

/// Fixed-size buffer of `f64` cells, zero-initialised.
pub(crate) struct ValueSlots {
    cells: Vec<AtomicU64>,
}

impl ValueSlots {
    pub(crate) fn zeroed(len: usize) -> Self {
        let zero = 0.0f64.to_bits();
        Self {
            cells: (0..len).map(|_| AtomicU64::new(zero)).collect(),
        }
    }

    #[inline]
    pub(crate) fn set(&self, index: usize, value: f64) {
        self.cells[index].store(value.to_bits(), Ordering::Relaxed);
    }

    pub(crate) fn len(&self) -> usize {
        self.cells.len()
    }

    pub(crate) fn into_vec(self) -> Vec<f64> {
        self.cells
            .into_iter()
            .map(|cell| f64::from_bits(cell.into_inner()))
            .collect()
    }
}

/// Fixed-size buffer of index cells, zero-initialised.
pub(crate) struct IndexSlots {
    cells: Vec<AtomicUsize>,
}

impl IndexSlots {
    pub(crate) fn zeroed(len: usize) -> Self {
        Self {
            cells: (0..len).map(|_| AtomicUsize::new(0)).collect(),
        }
    }

    #[inline]
    pub(crate) fn set(&self, index: usize, value: usize) {
        self.cells[index].store(value, Ordering::Relaxed);
    }

    pub(crate) fn into_vec(self) -> Vec<usize> {
        self.cells.into_iter().map(AtomicUsize::into_inner).collect()
    }
}
