//! # Fraction Bars CLI
//!
//! Replays scripts against saved fraction bars sessions.

use bars_cli::{CliArgs, CliCommand, CliConfig};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize structured tracing with optional JSON format.
///
/// Set `RUST_LOG` to control log levels (default: info,bars_core=debug).
/// Set `RUST_LOG_FORMAT=json` for JSON output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bars_core=debug,bars_cli=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = CliArgs::parse();
    let config = CliConfig::from(&args);
    tracing::debug!(
        data_dir = %config.data_dir.display(),
        session = %config.session,
        "Using session"
    );

    match args.command {
        CliCommand::Replay { script, print } => {
            let state = bars_cli::replay(&config, &script).await?;
            if print {
                println!("{}", serde_json::to_string_pretty(state.as_ref())?);
            }
        }
        CliCommand::Show => {
            let lines = bars_cli::show(&config).await?;
            if lines.is_empty() {
                println!("No bars in session \"{}\"", config.session);
            }
            for line in lines {
                println!("{line}");
            }
        }
        CliCommand::Reset => {
            if bars_cli::reset(&config)? {
                println!("Session \"{}\" deleted", config.session);
            } else {
                println!("Session \"{}\" was not saved", config.session);
            }
        }
    }

    Ok(())
}
