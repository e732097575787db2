use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod error;
mod export;
mod mcp;
mod model;
mod share;
mod store;
mod synth;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // stdout belongs to the MCP transport
    let is_mcp = matches!(cli.command, cli::Command::Mcp);
    if !is_mcp {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new(if cli.verbose {
                    "mcp_bundler=debug"
                } else {
                    "mcp_bundler=info"
                })
            }))
            .init();
    }

    let paths = cli::Paths {
        data_dir: cli.data_dir,
        catalogue: cli.catalogue,
    };

    match cli.command {
        cli::Command::Search { query, category } => cli::search::run(&paths, query, category),
        cli::Command::Info { server } => cli::info::run(&paths, server),
        cli::Command::Bundle(cmd) => cli::bundle::run(&paths, cmd),
        cli::Command::Connection(cmd) => cli::connection::run(&paths, cmd),
        cli::Command::Export {
            bundle,
            format,
            output,
        } => cli::export::run(&paths, bundle, format, output),
        cli::Command::Install {
            bundle,
            path,
            force,
        } => cli::export::run_install(&paths, bundle, path, force),
        cli::Command::Share { bundle } => cli::share::run_share(&paths, bundle),
        cli::Command::Import { token, dry_run } => cli::share::run_import(&paths, token, dry_run),
        cli::Command::Credential(cmd) => cli::credential::run(&paths, cmd),
        cli::Command::Config(cmd) => cli::config::run(&paths, cmd),
        cli::Command::Mcp => cli::mcp::run(&paths).await,
    }
}
