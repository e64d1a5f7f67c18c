//! Segtrim - cut a video into fixed segments, trim each tail, join the rest
//!
//! This library crate exposes the application layers for integration testing.

pub mod config;
pub mod processor;
pub mod server;
pub mod state;
