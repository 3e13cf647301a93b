//! Rewind: record and verify API test cases.
//!
//! The crate centers on the process bootstrap in [`bootstrap`]: it wires the
//! logger, the privilege elevation gate, diagnostics, configuration,
//! installation identity, and the auth service together, executes the command
//! dispatch tree in [`cli`], and guarantees teardown through the cleanup
//! chain on every exit path.

pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod platform;
pub mod support;
