//! # motel
//!
//! Command layer of the Motel binary, exposed as a library so the commands
//! can be driven from integration tests.

pub mod cli;
