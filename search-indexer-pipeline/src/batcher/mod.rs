//! Batcher module for the search indexer pipeline.
//!
//! Splits an ordered collection of document operations into batches of at
//! most `batch_size` operations. For N operations this yields `ceil(N / B)`
//! batches; only the last one may be partial.

use std::num::NonZeroUsize;

use search_indexer_shared::{DocumentBatch, DocumentOperation};

/// Group items into consecutive chunks of `batch_size`, preserving order.
///
/// A new chunk starts whenever the running index is a multiple of the batch
/// size. Each call keeps its own counter.
pub fn group<T, I>(items: I, batch_size: NonZeroUsize) -> Vec<Vec<T>>
where
    I: IntoIterator<Item = T>,
{
    let batch_size = batch_size.get();
    let mut groups: Vec<Vec<T>> = Vec::new();

    for (i, item) in items.into_iter().enumerate() {
        if i % batch_size == 0 {
            groups.push(Vec::with_capacity(batch_size));
        }
        if let Some(current) = groups.last_mut() {
            current.push(item);
        }
    }

    groups
}

/// Group document operations into dispatchable batches.
pub fn into_batches<I>(operations: I, batch_size: NonZeroUsize) -> Vec<DocumentBatch>
where
    I: IntoIterator<Item = DocumentOperation>,
{
    group(operations, batch_size)
        .into_iter()
        .map(DocumentBatch::from)
        .collect()
}
