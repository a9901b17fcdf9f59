use clap::Parser;
use serde::Serialize;

use store_harness::params::{Args, Scenario, StoreKind};
use store_harness::telemetry::init_telemetry;
use store_harness::{check_store_correct, check_store_random, open_store, ScenarioTimings};

#[derive(Serialize)]
struct ScenarioReport {
    store: StoreKind,
    scenario: Scenario,
    processors: usize,
    chunks: usize,
    chunk_size: usize,
    #[serde(flatten)]
    timings: Option<ScenarioTimings>,
    error: Option<String>,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let args = Args::parse();
    init_telemetry(&args.telemetry());

    let store = open_store(args.store, args.buffer_capacity);
    tracing::info!(store = ?args.store, scenario = ?args.scenario, "running scenario");
    let outcome = match args.scenario {
        Scenario::Random => {
            check_store_random(store.clone(), args.processors, args.chunks, args.chunk_size).await
        }
        Scenario::Correct => {
            check_store_correct(store.clone(), args.processors, args.chunks, args.chunk_size).await
        }
    };
    store.close().await;

    if let Err(err) = &outcome {
        tracing::error!("scenario failed: {}", err);
    }
    let failed = outcome.is_err();
    let report = ScenarioReport {
        store: args.store,
        scenario: args.scenario,
        processors: args.processors,
        chunks: args.chunks,
        chunk_size: args.chunk_size,
        timings: outcome.as_ref().ok().copied(),
        error: outcome.err().map(|err| err.to_string()),
    };
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(err) => tracing::error!("failed to encode report: {}", err),
    }

    if failed {
        std::process::ExitCode::FAILURE
    } else {
        std::process::ExitCode::SUCCESS
    }
}
