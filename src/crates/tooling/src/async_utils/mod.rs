//! Async utilities
//!
//! Every external call made by the pipeline carries an explicit bound:
//!
//! ```rust,ignore
//! use tooling::async_utils::timeout::with_timeout;
//! use std::time::Duration;
//!
//! let output = with_timeout(Duration::from_secs(120), command.output()).await?;
//! ```

pub mod timeout;
