//! # sleet
//!
//! Minimal host for the Sleet generator: loads settings once, builds one
//! generator and either prints fresh IDs or decodes existing ones.

use clap::{Parser, Subcommand};
use sleet_core::{Generator, Settings};

#[derive(Debug, Parser)]
#[command(name = "sleet", version, about = "Generate and decode Sleet IDs")]
struct Cli {
    /// Config file (extension optional). Defaults to `sleet.toml` in the working directory.
    #[arg(long, global = true, env = "SLEET_CONFIG", default_value = "sleet")]
    config: String,

    /// Override the configured node ID.
    #[arg(long, global = true)]
    node_id: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print new IDs, one per line.
    Generate {
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
    },
    /// Split IDs into their time, node and sequence fields.
    Decode {
        #[arg(required = true)]
        ids: Vec<u64>,
    },
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays pipeable.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sleet=info,sleet_core=info".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let cli = Cli::parse();

    // Decoding never uses the node ID, so an unconfigured one is filled with 0.
    let node_id = match cli.command {
        Command::Generate { .. } => cli.node_id,
        Command::Decode { .. } => cli.node_id.or(Some(0)),
    };
    let settings = Settings::load_with(&cli.config, node_id)?;

    match cli.command {
        Command::Generate { count } => {
            let generator = Generator::from_settings(&settings).inspect_err(|e| {
                tracing::error!("Refusing to start: {e}");
            })?;
            for _ in 0..count {
                println!("{}", generator.next_id());
            }
            tracing::debug!(
                count,
                last_timestamp = generator.last_timestamp(),
                sequence = generator.sequence(),
                "generated"
            );
        }
        Command::Decode { ids } => {
            let layout = settings.generator.layout()?;
            let base_epoch = settings.generator.base_epoch;
            for id in ids {
                let parts = layout.decompose(id);
                let created = parts
                    .datetime(base_epoch)
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "out of range".to_string());
                println!(
                    "{id}\ttime={}\tnode_id={}\tsequence={}\tcreated={created}",
                    parts.elapsed_ms, parts.node_id, parts.sequence
                );
            }
        }
    }

    Ok(())
}
