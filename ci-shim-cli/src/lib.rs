//! ci-shim CLI library.
//!
//! Exposes the CLI modules for integration testing. In production
//! `ci-shim` is used as a binary (main.rs).

pub mod app;
pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;
