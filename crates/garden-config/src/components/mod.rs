//! Configuration components for the garden builder
//!
//! One focused section per concern: where notes live, how the build runs,
//! how edit history is collected, and how much gets logged.

pub mod build;
pub mod content;
pub mod enrichment;
pub mod logging;

pub use build::*;
pub use content::*;
pub use enrichment::*;
pub use logging::*;
