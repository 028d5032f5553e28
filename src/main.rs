use clap::Parser;
use log::{error, info, LevelFilter};
use snafu::ErrorCompat;

mod args;
mod publish;

fn main() {
    let args = args::Args::parse();

    if args.verbose {
        env_logger::Builder::new()
            .filter_level(LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }
    info!("args: {:?}", args);

    match publish::run_build(&args) {
        Ok(report) if report.failures.is_empty() => {
            info!(
                "Published {} result sets of {} elections ({} files)",
                report.result_sets, report.elections, report.artifacts
            );
        }
        Ok(report) => {
            for failure in report.failures.iter() {
                eprintln!(
                    "Skipped election {} result set {}: {}",
                    failure.election_id, failure.result_id, failure.reason
                );
            }
            eprintln!(
                "{} result set(s) failed, {} published",
                report.failures.len(),
                report.result_sets
            );
            std::process::exit(1);
        }
        Err(e) => {
            error!("Error occured {:?}", e);
            eprintln!("An error occured {}", e);
            if let Some(bt) = ErrorCompat::backtrace(&e) {
                eprintln!("trace: {}", bt);
            }
            std::process::exit(1);
        }
    }
}
