//! Output writers.
//!
//! Each writer turns a normalized, deduplicated declaration tree into source
//! text for a target language.

pub mod rust;

pub use rust::{PrimitiveNames, RustOptions, generate_rust_types};
