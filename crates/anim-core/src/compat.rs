//! Compatibility layer for no_std + alloc.

pub use alloc::{format, string::String, vec, vec::Vec};
