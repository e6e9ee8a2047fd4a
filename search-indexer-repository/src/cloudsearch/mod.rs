//! HTTP implementation of the dispatch client.
//!
//! Batches are posted as JSON arrays to the document batch API of the
//! remote index.

mod client;
mod response;

pub use client::HttpDispatchClient;
pub use response::BatchResponse;
