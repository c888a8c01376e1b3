//! catlink-core: Core traits, types, and error definitions for catlink.
//!
//! This crate defines the manufacturer-agnostic abstractions that the
//! transaction engine and every rig backend build on. Applications depend on
//! these types without pulling in a specific rig driver.
//!
//! # Key types
//!
//! - [`Transport`] -- byte-level communication channel
//! - [`RigFamily`] -- protocol family tag (terminator, identification codes)
//! - [`Error`] / [`Result`] -- error handling

pub mod error;
pub mod transport;
pub mod types;

// Re-export key types at crate root for ergonomic `use catlink_core::*`.
pub use error::{Error, Result};
pub use transport::Transport;
pub use types::*;
