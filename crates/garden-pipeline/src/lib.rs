//! Build Orchestration Layer
//!
//! This crate turns a content directory into a closed [`garden_core::NoteGraph`].
//!
//! ## Architecture
//!
//! Infrastructure crates (do not orchestrate):
//! - `garden-parser`: parses one markdown document
//! - `garden-enrichment`: looks up edit history, loads the bibliography
//! - `garden-core`: owns the registry, indexes and the backlink sweep
//!
//! This crate:
//! - Walks the content tree and creates notes concurrently ([`NoteFactory`])
//! - Runs the quiescence barriers, aggregate synthesis and backlink
//!   resolution in order ([`SiteBuilder`])
//! - Reports link health and garden statistics ([`analysis`])
//! - Checks external links over HTTP ([`external`])
//!
//! ## Usage
//!
//! ```rust,no_run
//! use garden_config::GardenConfig;
//! use garden_pipeline::SiteBuilder;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let builder = SiteBuilder::from_config(GardenConfig::default()).await?;
//! let build = builder.build().await?;
//! println!("{} notes", build.graph.len());
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod builder;
pub mod discovery;
pub mod error;
pub mod external;
pub mod factory;

pub use analysis::{
    analyze_links, garden_stats, BrokenLink, GardenStats, LinkAnalysis, NoteRef, RankedNote,
};
pub use builder::{Build, BuildReport, NoteDiagnostic, SiteBuilder};
pub use discovery::{discover, Discovery, SourceFile};
pub use error::{PipelineError, PipelineResult};
pub use external::{
    collect_external_links, extract_external_links, CheckerOptions, ExternalLinkChecker,
    ExternalLinkReport, ExternalLinkSummary, ExternalLinks, LinkCheck, LinkStatus, UrlCheck,
};
pub use factory::{NoteFactory, Produced};
