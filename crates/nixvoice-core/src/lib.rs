//! nixvoice-core — Pure types, voice selection, and command vocabulary.
//!
//! No async runtime, no I/O, no platform dependencies.

pub mod commands;
pub mod pages;
pub mod select;
pub mod text_prep;
pub mod types;
