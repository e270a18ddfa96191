//! # Gradebook Application Library
//!
//! The HTTP API, CLI, configuration, and source bundling for the
//! `gradebook` binary. Exposed as a library so integration tests can
//! drive the router directly.

pub mod api;
pub mod bundle;
pub mod cli;
pub mod config;
