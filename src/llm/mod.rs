//! Language-model side of the assistant
//!
//! Raw model text flows: extract -> decode -> (repair) -> sanitize, with the
//! [`parser::Interpreter`] driving the round-trips.

pub mod client;
pub mod decode;
pub mod extract;
pub mod parser;
pub mod prompt;
pub mod sanitize;

pub use client::{LlmClient, TextGenerator};
pub use decode::{DecodeError, StructuredResponse};
pub use parser::Interpreter;
