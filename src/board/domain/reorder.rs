//! Within-column reordering.
//!
//! A reorder is an array splice: the element at `from` is lifted out and
//! reinserted at `to`, shifting everything in between by one place. The
//! resulting order is session-local and never sent to the server.

use super::BoardDomainError;

/// Returns a copy of `items` with the element at `from` moved to `to`.
///
/// # Examples
///
/// ```
/// use taskboard::board::domain::reorder;
///
/// let moved = reorder(&["t1", "t2", "t3"], 0, 2).unwrap();
/// assert_eq!(moved, vec!["t2", "t3", "t1"]);
/// ```
///
/// # Errors
///
/// Returns [`BoardDomainError::IndexOutOfRange`] when either index does not
/// address an element of `items`.
pub fn reorder<T: Clone>(items: &[T], from: usize, to: usize) -> Result<Vec<T>, BoardDomainError> {
    let mut reordered = items.to_vec();
    reorder_in_place(&mut reordered, from, to)?;
    Ok(reordered)
}

/// In-place variant of [`reorder`].
///
/// # Errors
///
/// Returns [`BoardDomainError::IndexOutOfRange`] when either index does not
/// address an element of `items`. `items` is left untouched in that case.
pub fn reorder_in_place<T>(items: &mut Vec<T>, from: usize, to: usize) -> Result<(), BoardDomainError> {
    let len = items.len();
    for index in [from, to] {
        if index >= len {
            return Err(BoardDomainError::IndexOutOfRange { index, len });
        }
    }
    if from != to {
        let moved = items.remove(from);
        items.insert(to, moved);
    }
    Ok(())
}
