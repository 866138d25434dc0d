//! nixvoice-lib — Voice guide engine.
//!
//! Narration control, platform speech backends, recognition bridge, and HTTP
//! API. Depends on nixvoice-core for pure types and the command vocabulary.

pub mod backend;
pub mod capability;
pub mod error;
pub mod guide;
pub mod narrator;
pub mod platform;
pub mod recognition;
pub mod server;

#[cfg(test)]
pub(crate) mod fake;

// Re-export nixvoice-core for convenience
pub use nixvoice_core;
