//! Data Models
//!
//! Configuration models. Prompt and analysis types live in
//! `prompt-coach-core`.

pub mod settings;

pub use settings::*;
