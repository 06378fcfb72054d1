pub mod config;
pub mod error;
pub mod types;

pub use config::HaloConfig;
pub use error::{HaloError, Result};
pub use types::{Intent, Interpretation, Target};
