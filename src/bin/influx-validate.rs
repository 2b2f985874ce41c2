// src/bin/influx-validate.rs

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};

use influx_gate::config::ValidateArgs;
use influx_gate::utils::init_tracing;
use influx_gate::validate_logic::run_validation;

fn main() -> ExitCode {
    let args = ValidateArgs::parse();
    init_tracing(args.log_format);

    info!(
        "Validating {} against {}",
        args.dataset.display(),
        args.schema.display()
    );
    if let Some(manifest) = &args.manifest {
        info!("Manifest: {}", manifest.display());
    }

    match run_validation(&args) {
        Ok(summary) => {
            for line in summary.report_lines() {
                println!("{}", line);
            }
            println!("{}", summary.summary_line());
            ExitCode::from(summary.exit_code() as u8)
        }
        Err(e) => {
            error!("Validation could not run: {}", e);
            eprintln!("error: {}", e);
            ExitCode::from(2)
        }
    }
}
