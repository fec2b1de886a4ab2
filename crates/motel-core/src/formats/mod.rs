//! # Formats Module
//!
//! On-disk encodings shared by motif, dataset, sparse image, and
//! neighborhood files.

mod jsonl;

pub use jsonl::{MAX_LINE_BYTES, read_jsonl, read_jsonl_file, write_jsonl, write_jsonl_file};
