//! CLI for running commands on a NIOS console over SSH.

use anyhow::Result;
use clap::Parser;
use nioscon::{Console, ConsoleCommand, ConsoleConfig, Status};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nioscon")]
#[command(author, version, about = "Run commands on the NIOS console over SSH", long_about = None)]
struct Args {
    /// Override config file
    #[arg(short, long, default_value = "gm.ini")]
    config: PathBuf,

    /// Member to connect to
    #[arg(short, long)]
    member: String,

    /// Command to run: promote_master, show ..., shutdown or reboot
    #[arg(short = 'C', long)]
    command: String,

    /// Confirm a master promotion
    #[arg(short, long)]
    promote: bool,

    /// Member notification delay in seconds for promote_master
    #[arg(short = 'D', long, default_value_t = 0)]
    delay: u32,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    setup_logging(args.debug);

    let config = ConsoleConfig::load(&args.config);
    let credentials = config.credentials();
    let console = Console::new();

    match ConsoleCommand::classify(&args.command) {
        ConsoleCommand::PromoteMaster => {
            if !args.promote {
                warn!("Safeguard prevented promotion");
                let argv: Vec<String> = std::env::args().collect();
                println!("To activate promotion use: $ {} --promote", argv.join(" "));
                return Ok(ExitCode::FAILURE);
            }

            match console
                .promote_master(&args.member, &credentials, args.delay)
                .await
            {
                Ok(outcome) if outcome.is_success() => {
                    info!("Promotion in progress");
                    Ok(ExitCode::SUCCESS)
                }
                Ok(outcome) => {
                    info!(status = %outcome.status, "Failed to promote GMC {}", args.member);
                    Ok(ExitCode::FAILURE)
                }
                Err(e) => {
                    error!("{e}");
                    info!("Failed to promote GMC {}", args.member);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        ConsoleCommand::Run(command) => {
            let outcome = console
                .run_command(&args.member, &credentials, &command)
                .await?;
            println!("{}", outcome.transcript);

            Ok(match outcome.status {
                Status::Success => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            })
        }
        ConsoleCommand::Unsupported(command) => {
            error!("Command {command} not supported");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn setup_logging(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    if debug {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .without_time()
            .init();
    }
}
