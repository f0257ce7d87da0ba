//! Server-driven UI view core.
//!
//! Fetches JSON view trees from a backend, caches them, and keeps each
//! [`View`]'s rendered tree in sync through a hookable render pipeline.

pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod network;
pub mod service;
pub mod tree;
pub mod view;

pub use error::{BeagleError, FetchErrors};
pub use fetch::{LoadRequest, Strategy, TreeLoader};
pub use service::{BeagleService, ServiceError};
pub use tree::{InsertionMode, Tree};
pub use view::{LoadParams, NetworkOptions, View};
