mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use commands::normalize::cmd_normalize;
use commands::render::cmd_render;
use commands::validate::cmd_validate;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Contact-flow promotion toolchain.
#[derive(Parser)]
#[command(name = "flowbridge", version, about = "Contact-flow promotion toolchain")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a flow export (single file or a directory of .json files)
    Normalize {
        /// Path to a flow JSON file or a directory containing them
        path: PathBuf,
    },

    /// Render every template against one environment map
    Render {
        /// Environment name (dev/test/prod); resolves <env-dir>/<name>.yaml
        #[arg(long)]
        env: String,
        /// Directory of flow templates
        #[arg(long, default_value = "flows")]
        flows: PathBuf,
        /// Directory of environment maps
        #[arg(long, default_value = "environments")]
        env_dir: PathBuf,
        /// Output directory for rendered artifacts
        #[arg(long, default_value = "rendered")]
        output: PathBuf,
    },

    /// Validate all templates against all environment maps
    Validate {
        /// Directory of flow templates
        #[arg(long, default_value = "flows")]
        flows: PathBuf,
        /// Directory of environment maps
        #[arg(long, default_value = "environments")]
        env: PathBuf,
        /// Output format (text or json)
        #[arg(long, value_enum)]
        output: Option<OutputFormat>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Normalize { path } => {
            cmd_normalize(&path, cli.output, cli.quiet);
        }
        Commands::Render {
            env,
            flows,
            env_dir,
            output,
        } => {
            cmd_render(&env, &flows, &env_dir, &output, cli.output, cli.quiet);
        }
        Commands::Validate { flows, env, output } => {
            cmd_validate(&flows, &env, output.unwrap_or(cli.output), cli.quiet);
        }
    }
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{{\"error\": \"{}\"}}", msg.replace('"', "\\\""));
        }
    }
}
