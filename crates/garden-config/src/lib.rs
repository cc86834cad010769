//! # Garden Configuration Library
//!
//! Configuration management for the garden site builder.
//! Provides type-safe configuration loading, validation, and path resolution.
//!
//! ## Features
//!
//! - Multi-format support (TOML, YAML, JSON)
//! - Serde defaults for every section, so an empty file is a valid config
//! - Content exclusion globs compiled once into an [`ExclusionMatcher`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use garden_config::ConfigLoader;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::load_from_file("garden.toml").await?;
//!     let exclusions = config.content.exclusion_matcher()?;
//!     println!("content root: {}", config.content.root.display());
//!     # let _ = exclusions;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod components;
mod config;
mod exclusions;
mod loader;

pub use components::*;
pub use config::*;
pub use exclusions::*;
pub use loader::*;
