//! Configuration module for Deepshot
//!
//! A crawl is configured from command-line arguments, optionally refined by a
//! TOML tuning file carrying delays, WebDriver connection details, checkpoint
//! cadence and retry bounds.
//!
//! # Example
//!
//! ```no_run
//! use deepshot::config::{finalize_config, Config};
//! use std::path::Path;
//!
//! let config = Config::new("https://example.com", vec!["example.com".into()], "out");
//! let config = finalize_config(config, Some(Path::new("deepshot.toml"))).unwrap();
//! println!("Checkpoint every {} pages", config.tuning.checkpoint.interval);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CheckpointConfig, Config, PdfConfig, RetryConfig, TimingConfig, Tuning, WebDriverConfig,
};

// Re-export parser functions
pub use parser::{finalize_config, load_tuning, parse_tuning};
pub use validation::validate;
