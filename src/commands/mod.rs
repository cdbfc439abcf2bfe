pub mod collect;
pub mod daemon;
pub mod query;

use anyhow::Result;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Compact stderr logging for one-shot commands; RUST_LOG wins over config.
pub fn init_cli_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // a second init (tests, repeated calls) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

/// Print as pretty JSON, or hand the value to a table printer.
pub fn print_output<T: Serialize>(format: &str, data: &T, table: fn(&T)) -> Result<()> {
    match format {
        "json" => {
            let json = serde_json::to_string_pretty(data)?;
            println!("{}", json);
        }
        "table" => table(data),
        other => anyhow::bail!("unknown format '{}' (expected table or json)", other),
    }
    Ok(())
}
