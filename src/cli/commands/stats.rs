use std::path::PathBuf;

use clap::Args;

use crate::cli::utils::{load_forest, output_json, warn_findings};
use crate::cli::OutputFormat;
use crate::hierarchy::StatisticsAggregator;

#[derive(Args)]
pub struct StatsArgs {
    #[arg(help = "Staff file (.json, .yaml or .yml)")]
    pub file: PathBuf,
}

pub async fn handle(args: StatsArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let (forest, report) = load_forest(&args.file).await?;
    let stats = StatisticsAggregator::summarize(&forest);

    match output_format {
        OutputFormat::Json => output_json(&stats),
        OutputFormat::Text => {
            warn_findings(&report);
            println!("Employees:   {}", stats.total_employees);
            println!("Top level:   {}", stats.root_count);
            println!("Max level:   {}", stats.max_level);
            println!("Departments:");
            for (department, count) in &stats.departments {
                let name = if department.is_empty() { "(none)" } else { department };
                println!("  {:<24} {}", name, count);
            }
            Ok(())
        }
    }
}
