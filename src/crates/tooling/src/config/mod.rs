//! Environment variable helpers
//!
//! Configuration files are owned by the binaries; this module only covers the
//! environment layer that fills secrets and endpoints left unset in files.
//!
//! ```rust,ignore
//! use tooling::config::fill_from_env;
//!
//! let mut api_key = config.generation.api_key.take();
//! fill_from_env(&mut api_key, "ANTHROPIC_API_KEY")?;
//! ```

mod env;

pub use env::{fill_from_env, get_env};
