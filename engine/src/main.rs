//! CLI entry point: grades one submission read from a JSON file and prints
//! the outcome as JSON.

use std::env;
use std::process::ExitCode;

use common::config::Config;
use common::logger::init_logger;
use engine::{Engine, SubmissionRequest};

#[tokio::main]
async fn main() -> ExitCode {
    let cfg = Config::init(".env");
    init_logger(&cfg.log_level, &cfg.log_file);

    let path = match env::args().nth(1) {
        Some(path) => path,
        None => {
            eprintln!("usage: engine <submission.json>");
            return ExitCode::from(2);
        }
    };

    let request: SubmissionRequest = match std::fs::read_to_string(&path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(request) => request,
            Err(e) => {
                log::error!("invalid submission file {}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        Err(e) => {
            log::error!("cannot read {}: {}", path, e);
            return ExitCode::FAILURE;
        }
    };

    let engine = Engine::from_config(cfg);
    match engine.submit(request).await {
        Ok(outcome) => {
            log::info!(
                "submission by {} finished as {} with grade {}",
                outcome.identity,
                outcome.status,
                outcome.grading.overall_grade
            );
            match serde_json::to_string_pretty(&outcome) {
                Ok(rendered) => {
                    println!("{}", rendered);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    log::error!("cannot render outcome: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
        Err(e) => {
            log::error!("submission aborted: {}", e);
            ExitCode::FAILURE
        }
    }
}
