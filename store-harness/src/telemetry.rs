use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

/// Logging setup handed to `init_telemetry` at startup.
#[derive(Debug, Clone, Copy, Default)]
pub struct TelemetryConfig {
    pub verbosity: u8,
    /// Report each span's busy/idle time when it closes.
    pub tracing: bool,
}

impl TelemetryConfig {
    pub fn level(&self) -> LevelFilter {
        match self.verbosity {
            0 => LevelFilter::OFF,
            1 => LevelFilter::ERROR,
            2 => LevelFilter::WARN,
            3 => LevelFilter::INFO,
            4 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}

/// Installs the global fmt subscriber. `RUST_LOG` overrides the verbosity.
pub fn init_telemetry(config: &TelemetryConfig) {
    let filter = EnvFilter::builder()
        .with_default_directive(config.level().into())
        .from_env_lossy();
    let span_events = if config.tracing {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(span_events)
        .with_writer(std::io::stderr)
        .try_init();
    if installed.is_ok() && config.tracing {
        tracing::info!("span tracing enabled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        let level = |verbosity| TelemetryConfig { verbosity, tracing: false }.level();
        assert_eq!(level(0), LevelFilter::OFF);
        assert_eq!(level(3), LevelFilter::INFO);
        assert_eq!(level(4), LevelFilter::DEBUG);
        assert_eq!(level(9), LevelFilter::TRACE);
    }
}
