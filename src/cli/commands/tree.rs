use std::path::PathBuf;

use clap::Args;
use serde_json::json;

use crate::cli::utils::{load_forest, output_json, render_tree, warn_findings};
use crate::cli::OutputFormat;

#[derive(Args)]
pub struct TreeArgs {
    #[arg(help = "Staff file (.json, .yaml or .yml)")]
    pub file: PathBuf,
}

pub async fn handle(args: TreeArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let (forest, report) = load_forest(&args.file).await?;

    match output_format {
        OutputFormat::Json => output_json(&json!({ "forest": forest, "report": report })),
        OutputFormat::Text => {
            warn_findings(&report);
            print!("{}", render_tree(&forest));
            Ok(())
        }
    }
}
