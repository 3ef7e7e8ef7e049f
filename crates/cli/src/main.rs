use anyhow::Context;
use bguard_domain::config::CliOverrides;
use bguard_domain::Config;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

mod bootstrap;
mod di;
mod server;

#[derive(Parser)]
#[command(name = "bguard")]
#[command(version)]
#[command(about = "bguard - DNS resolver with list-based blocking")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// DNS listen address, e.g. 0.0.0.0:53
    #[arg(long, global = true)]
    dns_listen: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the DNS server (default)
    Serve,
    /// Load and validate the configuration, then exit
    Validate,
    /// Print the version
    Version,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            dns_listen: self.dns_listen.clone(),
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None | Some(Command::Serve) => serve(&cli).await,
        Some(Command::Validate) => validate(&cli),
        Some(Command::Version) => {
            println!("bguard {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn validate(cli: &Cli) -> anyhow::Result<()> {
    match bootstrap::load_config(cli.config.as_deref(), cli.overrides()) {
        Ok(_) => {
            println!("Configuration OK");
            Ok(())
        }
        Err(e) => {
            println!("Configuration invalid: {:#}", e);
            Err(e)
        }
    }
}

async fn serve(cli: &Cli) -> anyhow::Result<()> {
    let config: Config = bootstrap::load_config(cli.config.as_deref(), cli.overrides())?;
    bootstrap::init_logging(&config.log)?;

    info!("Starting bguard v{}", env!("CARGO_PKG_VERSION"));
    bootstrap::config::log_summary(&config);

    let shutdown = CancellationToken::new();
    let services = di::Services::new(&config)?;

    let jobs = services
        .lists
        .job_runner(shutdown.clone())
        .start()
        .await
        .context("list initialization failed")?;

    let dns_addr = config.ports.dns_addr()?;
    let mut dns_server = tokio::spawn(server::start_dns_server(
        dns_addr,
        services.chain.clone(),
        shutdown.clone(),
    ));

    let result = tokio::select! {
        joined = &mut dns_server => {
            shutdown.cancel();
            match joined {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => {
                    error!(error = %e, "DNS server error");
                    Err(e)
                }
                Err(e) => Err(e.into()),
            }
        }
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                warn!(error = %e, "Failed to listen for Ctrl-C, shutting down");
            }
            info!("Shutdown requested");
            shutdown.cancel();
            dns_server.await?
        }
    };

    for job in jobs {
        if let Err(e) = job.await {
            warn!(error = %e, "Background job ended abnormally");
        }
    }

    info!("Server shutdown complete");
    result
}
