use crate::cli::{LinkCheckArgs, OutputFormat};
use crate::output::{self, AllReports};
use anyhow::Result;
use garden_config::GardenConfig;
use garden_pipeline::{analyze_links, garden_stats};
use tokio_util::sync::CancellationToken;
use tracing::info;

pub async fn execute(
    config: GardenConfig,
    top: usize,
    args: LinkCheckArgs,
    format: OutputFormat,
    cancel: CancellationToken,
) -> Result<()> {
    let options = super::external::checker_options(args)?;
    let build = super::build_graph(config, cancel.clone()).await?;

    info!("Generating statistics");
    let stats = garden_stats(&build.graph);
    info!("Analyzing internal links");
    let links = analyze_links(&build.graph, top);
    info!("Checking external links");
    let external = super::external::check_links(&build.graph, options, &cancel).await?;

    let reports = AllReports {
        stats,
        links,
        external,
    };
    output::emit(format, &reports, output::all_reports)
}
