use std::sync::OnceLock;

use color_eyre::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: OnceLock<()> = OnceLock::new();

/// Install the console subscriber. `RUST_LOG` wins over the configured level.
///
/// Calling this twice is a no-op.
pub fn init(default_level: &str) -> Result<()> {
    if INIT.get().is_some() {
        return Ok(());
    }

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;

    let console_layer = fmt::Layer::default()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .try_init()?;

    let _ = INIT.set(());
    Ok(())
}
