//! # Storage Module
//!
//! Persistent document stores.

mod redb_graph;

pub use redb_graph::RedbGraph;
