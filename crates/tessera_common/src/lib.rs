//! Shared foundational types used across the tessera simulator build system.
//!
//! This crate provides the content hash that every fingerprint and cache key
//! is built from.

#![warn(missing_docs)]

pub mod hash;

pub use hash::{ContentHash, ContentHasher, ParseHashError};
