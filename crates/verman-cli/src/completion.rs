use std::io::Write;

use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::Shell;

use crate::cli::Cli;

pub(crate) fn write_completions_script<W: Write>(shell: Shell, writer: &mut W) -> Result<()> {
    let mut command = Cli::command();
    let mut generated = Vec::new();
    clap_complete::generate(shell, &mut command, "verman", &mut generated);
    writer
        .write_all(&generated)
        .context("failed writing generated completion script")
}

pub(crate) fn init_shell_snippet(bin_dir: &std::path::Path) -> String {
    if cfg!(windows) {
        format!("setx PATH \"%PATH%;{}\"", bin_dir.display())
    } else {
        format!("export PATH=\"{}:$PATH\"", bin_dir.display())
    }
}
