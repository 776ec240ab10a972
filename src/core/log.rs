use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, fmt::format::FmtSpan,
    prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
};

/// Installs the global subscriber. Logs stay off unless `verbose` is set or
/// `RUST_LOG` asks for them.
///
/// Verbose runs also report how long each provider fetch span took.
pub fn init_logging(verbose: bool) {
    let (level_filter, level, span_events) = if verbose {
        (LevelFilter::DEBUG, "debug", FmtSpan::CLOSE)
    } else {
        (LevelFilter::OFF, "off", FmtSpan::NONE)
    };
    let app_filter = Targets::new().with_target("macrodash", level_filter);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .pretty()
                .without_time()
                .with_span_events(span_events)
                .with_writer(std::io::stderr),
        )
        .with(app_filter)
        .with(env_filter)
        .init();
}
