use std::path::PathBuf;

use clap::Args;

use crate::api::LayoutRequest;
use crate::cli::utils::{load_forest, output_json, warn_findings};
use crate::cli::OutputFormat;
use crate::config;
use crate::layout::LayoutEngine;
use crate::types::EmployeeId;

#[derive(Args)]
pub struct LayoutArgs {
    #[arg(help = "Staff file (.json, .yaml or .yml)")]
    pub file: PathBuf,

    #[arg(long, help = "Expand every employee")]
    pub expand_all: bool,

    #[arg(long = "expand", value_name = "ID", help = "Expand this employee (repeatable)")]
    pub expand: Vec<String>,
}

/// Geometry is always printed as JSON; `--text` only adds a summary line on stderr.
pub async fn handle(args: LayoutArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let (forest, report) = load_forest(&args.file).await?;
    warn_findings(&report);

    let request = LayoutRequest {
        expanded: (!args.expand.is_empty()).then(|| args.expand.into_iter().map(EmployeeId::new).collect()),
        expand_all: args.expand_all,
        fit: None,
        commands: Vec::new(),
    };
    let frame = request.render(&forest, &LayoutEngine::new(config::config().layout));

    if let OutputFormat::Text = output_format {
        eprintln!(
            "{} nodes, {} edges, {:.0} x {:.0}",
            frame.nodes.len(),
            frame.edges.len(),
            frame.bounds.width(),
            frame.bounds.height()
        );
    }
    output_json(&frame)
}
