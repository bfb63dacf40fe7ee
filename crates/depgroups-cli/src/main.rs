mod commands;

use clap::{Parser, Subcommand};
use commands::{EXIT_FAILURE, EXIT_MANIFEST_ERROR};
use depgroups_schema::HashAlgorithm;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "depgroups",
    version,
    about = "Inspect dependency groups and lock freshness of a pyproject manifest"
)]
struct Cli {
    /// Path to the project manifest.
    #[arg(long, default_value = "pyproject.toml", global = true)]
    manifest: PathBuf,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the merged dependency groups.
    Groups {
        /// Only show this group.
        #[arg(long)]
        name: Option<String>,
    },
    /// Print the manifest content hash used for lock freshness.
    Hash {
        /// Digest algorithm (sha224, sha256, sha384, sha512, blake3).
        #[arg(long, default_value = "sha256")]
        algo: HashAlgorithm,
    },
    /// Check whether a lock file still matches the manifest.
    Check {
        /// Lock file path. Defaults to pdm.lock next to the manifest.
        #[arg(long)]
        lock: Option<PathBuf>,
    },
    /// Add requirements to a dependency group and write the manifest.
    Add {
        /// Group name.
        group: String,
        /// Requirement strings to append.
        #[arg(required = true)]
        requirements: Vec<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("DEPGROUPS_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let json_output = cli.json;
    let result = match cli.command {
        Commands::Groups { name } => {
            commands::groups::run(&cli.manifest, name.as_deref(), json_output)
        }
        Commands::Hash { algo } => commands::hash::run(&cli.manifest, algo, json_output),
        Commands::Check { lock } => {
            commands::check::run(&cli.manifest, lock.as_deref(), json_output)
        }
        Commands::Add {
            group,
            requirements,
        } => commands::add::run(&cli.manifest, &group, &requirements, json_output),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("failed to parse manifest")
                || msg.starts_with("failed to read manifest")
            {
                EXIT_MANIFEST_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}
