//! # Search Indexer Repository
//!
//! This crate provides the boundary between the staging/commit core and the
//! remote search index. It includes the dispatch error type, the
//! `DispatchClient` trait, the request description shared by every dispatch,
//! and an HTTP implementation of the client.

pub mod cloudsearch;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod types;

pub use cloudsearch::HttpDispatchClient;
pub use config::DispatchClientConfig;
pub use errors::{DispatchError, DispatchErrorKind};
pub use interfaces::DispatchClient;
pub use types::{AuthenticationMode, Credentials, DispatchRequest};
