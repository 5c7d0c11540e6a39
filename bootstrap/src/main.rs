use anyhow::Result;
use bootstrap::{app::App, init_logging, BootstrapConfig, LoggingConfig};

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());
    App::run(BootstrapConfig::default())
}
