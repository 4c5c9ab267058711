//! Markup renderer for resolved node trees
//!
//! This module turns a [`Node`](crate::Node) tree into text, either eagerly or
//! as a lazily produced sequence of chunks.

pub mod escape;
pub mod serialize;

pub use serialize::{serialize, serialize_chunks, Chunks, SerializeError};
