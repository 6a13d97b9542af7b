//! Ordering primitive shared by every reorder operation
//!
//! Positions are plain 0-based indices. After any structural change the
//! affected sequence is renumbered so that positions are contiguous.

use crate::{Error, Result};

/// Something that stores its own index within a sequence.
pub trait Positioned {
    fn set_position(&mut self, position: usize);
}

/// Remove the element at `from` and reinsert it at `to`.
///
/// Returns a new sequence of identical length; the input is untouched.
/// Panics if either index is out of range, callers are expected to have
/// validated them (see [`check_index`]).
pub fn reorder<T: Clone>(sequence: &[T], from: usize, to: usize) -> Vec<T> {
    let mut out = sequence.to_vec();
    reorder_in_place(&mut out, from, to);
    out
}

/// In-place variant of [`reorder`] for sequences the caller already owns.
pub fn reorder_in_place<T>(sequence: &mut Vec<T>, from: usize, to: usize) {
    if from == to {
        return;
    }
    let item = sequence.remove(from);
    sequence.insert(to, item);
}

/// Rewrite every element's position to match its index.
pub fn renumber<T: Positioned>(items: &mut [T]) {
    for (index, item) in items.iter_mut().enumerate() {
        item.set_position(index);
    }
}

/// Ensure `index` addresses an existing element of a sequence of length `len`.
pub fn check_index(index: usize, len: usize) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(Error::IndexOutOfRange { index, len })
    }
}

/// Ensure `index` is a valid insertion point (0..=len).
pub fn check_insert_index(index: usize, len: usize) -> Result<()> {
    if index <= len {
        Ok(())
    } else {
        Err(Error::IndexOutOfRange { index, len })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reorder_forward() {
        let seq = vec!["a", "b", "c", "d"];
        assert_eq!(reorder(&seq, 0, 2), vec!["b", "c", "a", "d"]);
    }

    #[test]
    fn test_reorder_backward() {
        let seq = vec!["a", "b", "c", "d"];
        assert_eq!(reorder(&seq, 3, 1), vec!["a", "d", "b", "c"]);
    }

    #[test]
    fn test_reorder_same_index_is_identity() {
        let seq = vec![1, 2, 3];
        for i in 0..seq.len() {
            assert_eq!(reorder(&seq, i, i), seq);
        }
    }

    #[test]
    fn test_reorder_does_not_touch_input() {
        let seq = vec![1, 2, 3];
        let moved = reorder(&seq, 0, 2);
        assert_eq!(seq, vec![1, 2, 3]);
        assert_eq!(moved.len(), seq.len());
    }

    #[test]
    fn test_check_index() {
        assert!(check_index(0, 1).is_ok());
        assert!(matches!(
            check_index(1, 1),
            Err(Error::IndexOutOfRange { index: 1, len: 1 })
        ));
        assert!(check_insert_index(1, 1).is_ok());
        assert!(check_insert_index(2, 1).is_err());
    }

    struct Slot(usize);

    impl Positioned for Slot {
        fn set_position(&mut self, position: usize) {
            self.0 = position;
        }
    }

    #[test]
    fn test_renumber() {
        let mut slots = vec![Slot(7), Slot(3), Slot(3)];
        renumber(&mut slots);
        let positions: Vec<usize> = slots.iter().map(|s| s.0).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }
}
