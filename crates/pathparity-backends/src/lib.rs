//! pathparity backends - concrete adapters
//!
//! - [`RestBackend`]: HTTP client for `<base>/<path>.json` stores
//! - [`MemoryBackend`]: in-process JSON tree with a selectable [`PathStyle`]

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod memory;
pub mod rest;

pub use memory::{MemoryBackend, PathStyle};
pub use rest::{RestBackend, RestConfig, DEFAULT_TIMEOUT};
