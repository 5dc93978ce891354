//! Decoding of page-embedded streaming payloads
//!
//! `payload` finds and double-decodes the flat heap fragments embedded in
//! streamed share pages; `heap` reconstructs nested values from the
//! pointer-compacted encoding.

pub mod heap;
pub mod payload;

pub use heap::{decode, HeapDecoder};
