pub mod persistence;

use std::sync::Once;

use tracing_subscriber::filter::Directive;

static TRACING_INIT: Once = Once::new();

const DEFAULT_DIRECTIVES: [&str; 3] = ["saldo=info", "saldo_core=info", "saldo_store_memory=info"];

/// Initializes the global tracing subscriber with sensible defaults.
///
/// `RUST_LOG` still applies; the defaults only add the crate-level
/// directives above.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = DEFAULT_DIRECTIVES
            .iter()
            .filter_map(|raw| raw.parse::<Directive>().ok())
            .fold(EnvFilter::from_default_env(), EnvFilter::add_directive);

        // Another subscriber may already be installed by the host application.
        let _ = fmt().with_env_filter(filter).try_init();
    });
}
