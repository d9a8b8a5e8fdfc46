use anyhow::Context;
use clap::{Parser, Subcommand};
use pgprov_core::{Manifest, ObjectType};
use pgprov_runtime::Mode;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::reconcile::Format;

#[derive(Parser, Debug)]
#[command(name = "pgprov", version, about = "Declarative PostgreSQL grant management")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the privileges `ALL` stands for on a server version.
    Expand {
        /// Object type, e.g. table, schema, foreign_server
        #[arg(long)]
        object_type: ObjectType,

        /// PostgreSQL version, e.g. "17.0" or "16.2 (Debian ...)"
        #[arg(long)]
        server_version: String,
    },

    /// Compare granted privileges with desired ones. Exits with status 2 on drift.
    Compare {
        #[arg(long)]
        object_type: ObjectType,

        #[arg(long)]
        server_version: String,

        /// Privileges currently held, comma separated
        #[arg(long, value_delimiter = ',')]
        granted: Vec<String>,

        /// Desired privileges, comma separated; `ALL` alone for everything
        #[arg(long, value_delimiter = ',', required = true)]
        desired: Vec<String>,
    },

    /// Validate a manifest without connecting.
    Check {
        #[arg(short, long, default_value = "pgprov.yaml")]
        config: PathBuf,

        /// Validate against this version instead of `provider.expected_version`
        #[arg(long)]
        server_version: Option<String>,
    },

    /// Show the statements needed to bring grants in line with the manifest.
    Plan {
        #[arg(short, long, default_value = "pgprov.yaml")]
        config: PathBuf,

        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Apply every drifted grant in the manifest.
    Apply {
        #[arg(short, long, default_value = "pgprov.yaml")]
        config: PathBuf,

        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
}

fn init_tracing(default_level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.unwrap_or("info")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_manifest(path: &Path) -> anyhow::Result<Manifest> {
    Manifest::from_file(path).with_context(|| format!("failed to load {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Command::Expand {
            object_type,
            server_version,
        } => {
            init_tracing(None);
            let privileges = commands::expand::expand(object_type, &server_version)?;
            println!("{}", privileges.join(","));
        }

        Command::Compare {
            object_type,
            server_version,
            granted,
            desired,
        } => {
            init_tracing(None);
            let comparison =
                commands::expand::compare(object_type, &server_version, &granted, &desired)?;
            print!("{}", commands::expand::render(&comparison));
            if !comparison.in_sync {
                std::process::exit(2);
            }
        }

        Command::Check {
            config,
            server_version,
        } => {
            let manifest = load_manifest(&config)?;
            init_tracing(manifest.log_level.as_deref());
            println!("{}", commands::check::run(&manifest, server_version.as_deref())?);
        }

        Command::Plan { config, format } => {
            let manifest = load_manifest(&config)?;
            init_tracing(manifest.log_level.as_deref());
            commands::reconcile::run(&manifest, Mode::Plan, format).await?;
        }

        Command::Apply { config, format } => {
            let manifest = load_manifest(&config)?;
            init_tracing(manifest.log_level.as_deref());
            commands::reconcile::run(&manifest, Mode::Apply, format).await?;
        }
    }

    Ok(())
}
