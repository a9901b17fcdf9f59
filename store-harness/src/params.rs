use clap::builder::RangedU64ValueParser;
use clap::{Parser, ValueEnum};
use serde::Serialize;

use crate::telemetry::TelemetryConfig;

/// Largest accepted `--buffer-capacity`.
pub const MAX_BUFFER_CAPACITY: u64 = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// In-memory map, durable as soon as `put` returns
    Map,
    /// Map behind a background flush queue
    Buffered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    /// Write then read back every key
    Random,
    /// Write, read back and verify every chunk against its key
    Correct,
}

/// Runs a bulk write/read scenario against a chunk store.
#[derive(Parser, Debug)]
#[clap(version, about)]
pub struct Args {
    #[clap(long, value_enum, default_value = "map")]
    pub store: StoreKind,
    #[clap(long, value_enum, default_value = "correct")]
    pub scenario: Scenario,
    /// Concurrent write workers
    #[clap(long, default_value_t = 8)]
    pub processors: usize,
    #[clap(long, default_value_t = 100)]
    pub chunks: usize,
    /// Body bytes per chunk, excluding the span header
    #[clap(long, default_value_t = 4096)]
    pub chunk_size: usize,
    /// Queue depth of the buffered store
    #[clap(
        long,
        default_value_t = 64,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..=MAX_BUFFER_CAPACITY)
    )]
    pub buffer_capacity: usize,
    /// 0=off 1=error 2=warn 3=info 4=debug 5=trace
    #[clap(long, default_value_t = 3)]
    pub verbosity: u8,
    /// Emit span timings
    #[clap(long)]
    pub tracing: bool,
}

impl Args {
    pub fn telemetry(&self) -> TelemetryConfig {
        TelemetryConfig {
            verbosity: self.verbosity,
            tracing: self.tracing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["store-harness"]);
        assert_eq!(args.store, StoreKind::Map);
        assert_eq!(args.scenario, Scenario::Correct);
        assert_eq!(args.processors, 8);
        assert_eq!(args.chunks, 100);
        assert_eq!(args.chunk_size, 4096);
        assert_eq!(args.buffer_capacity, 64);
        assert!(!args.telemetry().tracing);
    }

    #[test]
    fn test_tracing_flag() {
        let args = Args::parse_from([
            "store-harness",
            "--store",
            "buffered",
            "--scenario",
            "random",
            "--tracing",
            "--verbosity",
            "4",
        ]);
        assert_eq!(args.store, StoreKind::Buffered);
        assert_eq!(args.scenario, Scenario::Random);
        let telemetry = args.telemetry();
        assert!(telemetry.tracing);
        assert_eq!(telemetry.verbosity, 4);
    }

    #[test]
    fn test_buffer_capacity_out_of_range() {
        for value in ["0", "1048577", "18446744073709551615"] {
            let parsed = Args::try_parse_from(["store-harness", "--buffer-capacity", value]);
            assert!(parsed.is_err(), "--buffer-capacity {value} should be rejected");
        }
        let args = Args::try_parse_from(["store-harness", "--buffer-capacity", "1048576"]).unwrap();
        assert_eq!(args.buffer_capacity, 1 << 20);
    }
}
