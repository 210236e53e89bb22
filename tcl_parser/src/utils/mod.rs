//! Shared helpers for turning byte offsets into human-facing locations

pub mod source_map;

pub use source_map::{Position, SourceMap};
