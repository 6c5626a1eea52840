use crate::config::LoggingConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the logging system based on configuration
pub fn init_logging(config: &LoggingConfig, cli_verbose: u8) -> anyhow::Result<()> {
    let log_level = if cli_verbose > 0 {
        match cli_verbose {
            1 => "debug",
            _ => "trace",
        }
    } else {
        &config.level
    };

    // RUST_LOG wins over the config file when set.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("laurel={},info", log_level)));

    match config.format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to init logging: {}", e))?,
        _ => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to init logging: {}", e))?,
    }

    Ok(())
}

/// Display the boot banner
pub fn display_boot_banner(version: &str) {
    println!("\n╔══════════════════════════════════════════╗");
    println!("║   L A U R E L   ·   Ranking Engine       ║");
    println!("║   Version {:<31}║", version);
    println!("╚══════════════════════════════════════════╝\n");
}
