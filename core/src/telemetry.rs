use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const DEFAULT_LOG_FILTER: &str = "advice_core=info,bootstrap=info,advice_local=info";

/// Installs the global subscriber. `RUST_LOG` wins over the default filter.
///
/// Colors are off because CloudWatch stores the escape codes verbatim.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_ansi(false))
        .init();
}
