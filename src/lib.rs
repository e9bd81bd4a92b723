//! Highlights: sports highlight search across video and social platforms.
//!
//! This crate is the application shell around [`highlight_search`]:
//! - **config**: TOML settings converted into the search core's configuration
//! - **credentials**: platform API credentials from the environment or a `.env` file
//! - **app**: registers a platform adapter for every usable credential
//!
//! The `highlights` binary runs one aggregation and prints the ranked
//! records, with a notice for each platform that failed.

pub mod app;
pub mod config;
pub mod credentials;
pub mod error;

pub use app::{build_orchestrator, build_query, format_record};
pub use config::AppConfig;
pub use credentials::Credentials;
pub use error::{AppError, Result};
