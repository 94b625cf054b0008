//! Storage Layer
//!
//! Handles engine configuration persistence.

pub mod config;

pub use config::*;
