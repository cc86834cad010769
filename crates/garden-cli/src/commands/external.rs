use crate::cli::{LinkCheckArgs, OutputFormat};
use crate::output;
use anyhow::{Context, Result};
use garden_config::GardenConfig;
use garden_core::NoteGraph;
use garden_pipeline::{
    collect_external_links, CheckerOptions, ExternalLinkChecker, ExternalLinkReport,
};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub async fn execute(
    config: GardenConfig,
    args: LinkCheckArgs,
    format: OutputFormat,
    cancel: CancellationToken,
) -> Result<()> {
    let options = checker_options(args)?;
    let build = super::build_graph(config, cancel.clone()).await?;
    let report = check_links(&build.graph, options, &cancel).await?;
    output::emit(format, &report, output::external_links)
}

/// Check the external links of a built graph
pub(crate) async fn check_links(
    graph: &NoteGraph,
    options: CheckerOptions,
    cancel: &CancellationToken,
) -> Result<ExternalLinkReport> {
    let checker = ExternalLinkChecker::new(options)
        .context("Failed to set up the link checker")?;
    Ok(checker.check(collect_external_links(graph), cancel).await)
}

/// Validated checker settings from the command line
pub(crate) fn checker_options(args: LinkCheckArgs) -> Result<CheckerOptions> {
    let delay = Duration::try_from_secs_f64(args.delay)
        .with_context(|| format!("Invalid delay {}: expected seconds >= 0", args.delay))?;
    Ok(CheckerOptions {
        timeout: Duration::from_secs(args.timeout),
        delay,
    })
}
