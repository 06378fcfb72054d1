//! Halo - voice assistant core
//!
//! Interprets free-form model output into a spoken reply plus a list of
//! desktop actions, and dispatches those actions to capability handlers.

pub mod command;
pub mod core;
pub mod llm;
pub mod pipeline;
pub mod skills;
