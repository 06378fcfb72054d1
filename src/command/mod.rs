//! Command execution pipeline
//!
//! Converts decoded model intents into side effects:
//! raw intents -> normalize -> Vec<Intent> -> Dispatcher -> messages

pub mod dispatcher;
pub mod normalize;
pub mod registry;

pub use dispatcher::Dispatcher;
pub use normalize::normalize_intents;
pub use registry::{ActionRegistry, RegistryEntry, RegistryError};
