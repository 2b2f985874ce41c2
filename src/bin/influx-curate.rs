// src/bin/influx-curate.rs

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};

use influx_gate::config::CurateArgs;
use influx_gate::curate_logic::{check_pipeline_config, run_curation};
use influx_gate::error::PipelineError;
use influx_gate::utils::init_tracing;

fn main() -> ExitCode {
    let args = CurateArgs::parse();
    init_tracing(args.log_format);

    if args.validate_config {
        return match check_pipeline_config(&args) {
            Ok(steps) => {
                println!("Pipeline configuration is valid: {}", steps.join(" -> "));
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("Invalid pipeline configuration: {}", e);
                eprintln!("error: {}", e);
                ExitCode::from(2)
            }
        };
    }

    info!("Curation starting.");
    info!("Input file: {}", args.input.display());
    info!("Output file: {}", args.output.display());

    match run_curation(&args) {
        Ok(summary) => {
            println!(
                "{}: {} kept, {} excluded of {} input lines (sha256 {})",
                summary.output.path.display(),
                summary.kept,
                summary.excluded,
                summary.input_lines,
                summary.output.sha256
            );
            if summary.repaired > 0 {
                println!("repaired: {}", summary.repaired);
            }
            for (category, count) in &summary.excluded_by_category {
                println!("excluded ({}): {}", category, count);
            }
            println!("manifest: {}", summary.manifest_path.display());
            if let Some(path) = &summary.excluded_path {
                println!("excluded: {}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(PipelineError::DatasetRejected(reason)) => {
            error!("Curated dataset rejected; live files untouched");
            eprintln!("rejected: {}", reason);
            ExitCode::from(1)
        }
        Err(e) => {
            error!("Curation failed: {}", e);
            eprintln!("error: {}", e);
            ExitCode::from(2)
        }
    }
}
