use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[command(name = "verman")]
#[command(about = "Install and switch between versions of command-line tools", long_about = None)]
#[command(version)]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "VERMAN_ROOT",
        help = "Managed root holding bin/, shims/ and state/"
    )]
    pub(crate) root: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        help = "Manager backend: shims, records or doctor. Defaults to the config value"
    )]
    pub(crate) provider: Option<String>,
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase log verbosity (-v info, -vv debug)"
    )]
    pub(crate) verbose: u8,
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    #[command(about = "Create the managed directory layout")]
    Init,
    #[command(about = "Fetch a binary from a path or URL and register it")]
    Install {
        name: String,
        version: String,
        uri: String,
        #[arg(long)]
        activate: bool,
    },
    #[command(about = "Register a local binary as a version of a command")]
    Define {
        name: String,
        version: String,
        path: PathBuf,
    },
    #[command(about = "Remove a registered version. The version must not be active")]
    Undefine { name: String, version: String },
    #[command(about = "Make a version the active one for its command")]
    Use { name: String, version: String },
    #[command(about = "Remove the active link for a command")]
    Deactivate { name: String },
    #[command(about = "List registered versions")]
    List {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        version: Option<String>,
        #[arg(long)]
        active: bool,
        #[arg(long)]
        json: bool,
    },
    #[command(about = "Print the shim path of the active version")]
    Which { name: String },
    #[command(about = "Check shims against records and optionally repair drift")]
    Doctor {
        #[arg(long)]
        fix: bool,
        #[arg(long)]
        dry_run: bool,
        #[arg(long)]
        no_backup: bool,
        #[arg(long)]
        json: bool,
    },
    #[command(about = "Print the PATH line for the managed bin directory")]
    InitShell,
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}
