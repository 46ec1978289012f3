//! Configuration loading and validation
//!
//! Configuration lives in a TOML file. Every section and key is optional;
//! anything missing falls back to a built-in default, so the tool runs with
//! no config file at all.

mod parser;
mod types;
mod validation;

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use types::{Config, RequestSettings, SpanSettings, StorageSettings, TimeoutSettings};
pub use validation::validate;
