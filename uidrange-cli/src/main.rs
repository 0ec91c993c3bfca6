///! uidrange CLI
///!
///! Inspects namespace ID ranges through the webhook's ops endpoints and
///! checks pod manifests against a range offline.

mod api;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uidrange_common::IdRange;

use output::OutputFormat;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Ops endpoint address (defaults to the CLI config)
    #[arg(short, long)]
    server: Option<String>,

    /// Output format (table, json, yaml)
    #[arg(short, long)]
    output: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List namespace ranges, or show one namespace
    Ranges {
        /// Namespace name
        namespace: Option<String>,
    },
    /// Show allocator state
    Allocator,
    /// Check a pod manifest against a range without a cluster
    Check {
        /// Pod manifest (YAML or JSON)
        manifest: PathBuf,
        /// Range as <start>/<size>
        #[arg(short, long)]
        range: IdRange,
    },
    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config
    let config = config::Config::load().unwrap_or_default();
    let server = cli.server.unwrap_or(config.default_server);
    let output_format = OutputFormat::parse(cli.output.as_deref().unwrap_or(&config.default_output));

    let api_client = api::ApiClient::new(&server);

    match cli.command {
        Commands::Ranges { namespace } => {
            commands::ranges::handle_ranges_command(namespace, &api_client, output_format).await?
        }
        Commands::Allocator => {
            commands::ranges::handle_allocator_command(&api_client, output_format).await?
        }
        Commands::Check { manifest, range } => {
            commands::check::handle_check_command(&manifest, range, output_format)?
        }
        Commands::Completions { shell } => {
            generate_completions(shell);
        }
    }

    Ok(())
}

fn generate_completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();

    generate(shell, &mut cmd, name, &mut io::stdout());
}
