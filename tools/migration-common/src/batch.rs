//! Fixed-size chunking of row sets

use std::num::NonZeroUsize;

/// Split `items` into contiguous batches of at most `max_batch_size`
///
/// Batches preserve input order and are never empty: zero items yield zero
/// batches and an exact multiple of the batch size yields only full batches.
/// The input is consumed so every item ends up in exactly one batch.
#[must_use]
pub fn split<T>(items: Vec<T>, max_batch_size: NonZeroUsize) -> Vec<Vec<T>> {
    let size = max_batch_size.get();
    let mut batches = Vec::with_capacity(items.len().div_ceil(size));
    let mut current = Vec::new();

    for item in items {
        current.push(item);
        if current.len() == size {
            batches.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        batches.push(current);
    }

    batches
}
