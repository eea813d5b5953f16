//! Repository query layer and the Smart HTTP gateway.
//!
//! Everything here returns `crate::error::Result` and leaves logging of
//! failures and status-code mapping to the HTTP layer.

pub mod diff;
pub mod history;
pub mod refs;
pub mod registry;
pub mod repository;
pub mod smart_http;
pub mod tree;

pub use registry::{Registry, SharedRegistry};
pub use repository::RepositoryHandle;
