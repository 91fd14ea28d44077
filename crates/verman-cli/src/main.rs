mod cli;
mod completion;
mod config;
mod dispatch;
mod fetch;
mod managers;
mod render;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(exit_code(&err));
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    dispatch::run_cli(cli)
}

fn init_tracing(verbose: u8) {
    let default_directive = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env("VERMAN_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn exit_code(err: &anyhow::Error) -> i32 {
    use verman_core::RegistryError;

    match RegistryError::find(err) {
        Some(RegistryError::CommandNotFound { .. })
        | Some(RegistryError::BinaryNotFound)
        | Some(RegistryError::ShimNotFound { .. }) => 3,
        Some(RegistryError::CommandAlreadyActivated { .. }) => 4,
        Some(RegistryError::InvalidVersion { .. }) | Some(RegistryError::UnknownProvider { .. }) => 2,
        Some(RegistryError::ManagerClosed) | None => 1,
    }
}
