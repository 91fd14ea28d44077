use std::io::{self, Write};

use anyhow::{Context, Result};
use verman_core::CommandManager;
use verman_doctor::FixOptions;
use verman_shims::InstallStrategy;

use crate::cli::{Cli, Commands};
use crate::completion::{init_shell_snippet, write_completions_script};
use crate::config::Config;
use crate::fetch::{default_fetchers, install_command, InstallRequest};
use crate::managers::{open_doctor, open_manager, open_shims};
use crate::render::{
    current_output_style, format_command_lines, format_diagnosis_lines, format_fix_report_lines,
    render_status_line,
};

pub(crate) fn run_cli(cli: Cli) -> Result<()> {
    let config = Config::load(cli.root.as_deref())?;
    let provider = cli
        .provider
        .clone()
        .unwrap_or_else(|| config.provider.clone());
    let style = current_output_style();

    match cli.command {
        Commands::Init => {
            open_shims(&config)?;
            println!(
                "{}",
                render_status_line(style, "init", &config.root.display().to_string())
            );
        }
        Commands::Install {
            name,
            version,
            uri,
            activate,
        } => {
            let layout = config.layout();
            let keep_download = config.install_strategy == InstallStrategy::Link;
            let staging_root = if keep_download {
                layout.downloads_dir()
            } else {
                layout.tmp_dir()
            };
            let fetchers = default_fetchers()?;
            let request = InstallRequest {
                name,
                version,
                uri,
                activate,
                keep_download,
            };
            let command = with_manager(&provider, &config, |manager| {
                install_command(manager, &fetchers, &staging_root, &request)
            })?;
            println!(
                "{}",
                render_status_line(
                    style,
                    "installed",
                    &format!("{} -> {}", command.identity(), command.location)
                )
            );
        }
        Commands::Define {
            name,
            version,
            path,
        } => {
            let location = path.display().to_string();
            let command = with_manager(&provider, &config, |manager| {
                manager.define(&name, &version, &location)
            })?;
            println!(
                "{}",
                render_status_line(
                    style,
                    "defined",
                    &format!("{} -> {}", command.identity(), command.location)
                )
            );
        }
        Commands::Undefine { name, version } => {
            with_manager(&provider, &config, |manager| manager.undefine(&name, &version))?;
            println!(
                "{}",
                render_status_line(style, "removed", &format!("{name}@{version}"))
            );
        }
        Commands::Use { name, version } => {
            with_manager(&provider, &config, |manager| manager.activate(&name, &version))?;
            println!(
                "{}",
                render_status_line(style, "active", &format!("{name}@{version}"))
            );
        }
        Commands::Deactivate { name } => {
            with_manager(&provider, &config, |manager| manager.deactivate(&name))?;
            println!("{}", render_status_line(style, "inactive", &name));
        }
        Commands::List {
            name,
            version,
            active,
            json,
        } => {
            let commands = with_manager(&provider, &config, |manager| {
                let mut query = manager.query()?;
                if let Some(name) = &name {
                    query.with_name(name);
                }
                if let Some(version) = &version {
                    query.with_version(version);
                }
                if active {
                    query.with_activated(true);
                }
                query.all()
            })?;
            if json {
                println!("{}", serde_json::to_string_pretty(&commands)?);
            } else {
                for line in format_command_lines(&commands, style) {
                    println!("{line}");
                }
            }
        }
        Commands::Which { name } => {
            let command = with_manager(&provider, &config, |manager| {
                manager.query()?.with_name(&name).with_activated(true).one()
            })?;
            println!("{}", command.location);
        }
        Commands::Doctor {
            fix,
            dry_run,
            no_backup,
            json,
        } => {
            let doctor = open_doctor(&config)?;
            let result = if fix || dry_run {
                let options = FixOptions {
                    dry_run,
                    backup: config.backup_on_fix && !no_backup,
                };
                doctor.fix(options).map(|report| {
                    if json {
                        serde_json::to_string_pretty(&report).map(|body| vec![body])
                    } else {
                        Ok(format_fix_report_lines(&report, style))
                    }
                })
            } else {
                doctor.diagnose().map(|diagnosis| {
                    if json {
                        serde_json::to_string_pretty(&diagnosis).map(|body| vec![body])
                    } else {
                        Ok(format_diagnosis_lines(&diagnosis, style))
                    }
                })
            };
            let closed = doctor.close();
            for line in result?? {
                println!("{line}");
            }
            closed?;
        }
        Commands::InitShell => {
            println!("{}", init_shell_snippet(&config.layout().bin_dir()));
        }
        Commands::Completions { shell } => {
            let mut stdout = io::stdout().lock();
            write_completions_script(shell, &mut stdout)?;
            stdout.flush().context("failed flushing completion script")?;
        }
    }

    Ok(())
}

fn with_manager<T>(
    tag: &str,
    config: &Config,
    action: impl FnOnce(&dyn CommandManager) -> Result<T>,
) -> Result<T> {
    let manager = open_manager(tag, config)?;
    let result = action(manager.as_ref());
    let closed = manager.close();
    let value = result?;
    closed?;
    Ok(value)
}
