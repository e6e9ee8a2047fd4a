//! Interface definitions for the dispatch boundary.
//!
//! This module defines the abstract `DispatchClient` trait that allows the
//! commit core to be wired to any remote index, or to a test double.

mod dispatch_client;

pub use dispatch_client::DispatchClient;
