use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use verman_core::{Command, CommandManager, CommandQuery, StaticCommands};
use verman_shims::{
    copy_tree, current_unix_timestamp, is_executable_file, move_path, ManagedLayout,
};

use crate::merge::merge_commands;
use crate::report::{FixAction, FixReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FixOptions {
    pub dry_run: bool,
    pub backup: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnosis {
    pub available: Vec<Command>,
    pub unavailable: Vec<Command>,
}

impl Diagnosis {
    pub fn from_commands(commands: Vec<Command>) -> Self {
        let (available, unavailable) = commands
            .into_iter()
            .partition(|command| is_executable_file(Path::new(&command.location)));
        Self {
            available,
            unavailable,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.unavailable.is_empty()
    }
}

pub struct Doctor {
    main: Box<dyn CommandManager>,
    recorder: Box<dyn CommandManager>,
    backup_root: Option<PathBuf>,
}

impl Doctor {
    pub fn new(main: Box<dyn CommandManager>, recorder: Box<dyn CommandManager>) -> Self {
        Self {
            main,
            recorder,
            backup_root: None,
        }
    }

    pub fn with_backup_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.backup_root = Some(root.into());
        self
    }

    pub fn merged(&self) -> Result<Vec<Command>> {
        let main = self.main.query().and_then(|query| query.all());
        let recorder = self.recorder.query().and_then(|query| query.all());

        match (main, recorder) {
            (Ok(main), Ok(recorder)) => Ok(merge_commands(main, recorder)),
            (Ok(main), Err(err)) => {
                tracing::warn!(
                    provider = self.recorder.provider(),
                    error = %format!("{err:#}"),
                    "record query failed; using shim view only"
                );
                Ok(main)
            }
            (Err(err), Ok(recorder)) => {
                tracing::warn!(
                    provider = self.main.provider(),
                    error = %format!("{err:#}"),
                    "shim query failed; using record view only"
                );
                Ok(recorder)
            }
            (Err(err), Err(other)) => {
                tracing::warn!(
                    provider = self.recorder.provider(),
                    error = %format!("{other:#}"),
                    "record query failed"
                );
                Err(err.context(format!("failed to query {}", self.main.provider())))
            }
        }
    }

    pub fn diagnose(&self) -> Result<Diagnosis> {
        Ok(Diagnosis::from_commands(self.merged()?))
    }

    pub fn fix(&self, options: FixOptions) -> Result<FixReport> {
        let mut report = FixReport {
            dry_run: options.dry_run,
            ..FixReport::default()
        };

        if options.backup {
            report.backup_path = self
                .backup(options.dry_run)?
                .map(|path| path.display().to_string());
        }

        let diagnosis = self.diagnose().context("failed to inspect installed commands")?;

        for command in diagnosis.unavailable {
            tracing::info!(
                name = %command.name,
                version = %command.version,
                location = %command.location,
                activated = command.activated,
                dry_run = options.dry_run,
                "removing unavailable command"
            );
            if !options.dry_run {
                if command.activated {
                    if let Err(err) = self.recorder.deactivate(&command.name) {
                        report.record_failure(&command, FixAction::Deactivate, &err);
                    }
                }
                if let Err(err) = self.undefine(&command.name, &command.version) {
                    report.record_failure(&command, FixAction::Undefine, &err);
                }
            }
            report.removed.push(command);
        }

        for command in diagnosis.available {
            tracing::info!(
                name = %command.name,
                version = %command.version,
                location = %command.location,
                activated = command.activated,
                dry_run = options.dry_run,
                "restoring command"
            );
            if !options.dry_run {
                match self
                    .recorder
                    .define(&command.name, &command.version, &command.location)
                {
                    Ok(_) => {
                        if command.activated {
                            if let Err(err) =
                                self.recorder.activate(&command.name, &command.version)
                            {
                                report.record_failure(&command, FixAction::Activate, &err);
                            }
                        }
                    }
                    Err(err) => report.record_failure(&command, FixAction::Define, &err),
                }
            }
            report.restored.push(command);
        }

        tracing::info!(
            removed = report.removed.len(),
            restored = report.restored.len(),
            failures = report.failures.len(),
            dry_run = options.dry_run,
            "repair finished"
        );
        Ok(report)
    }

    fn backup(&self, dry_run: bool) -> Result<Option<PathBuf>> {
        let Some(root) = &self.backup_root else {
            tracing::debug!("no backup root configured; skipping backup");
            return Ok(None);
        };
        if !root.exists() {
            tracing::info!(
                root = %root.display(),
                "managed root does not exist; nothing to back up"
            );
            return Ok(None);
        }

        let destination = next_backup_path(root);
        if dry_run {
            tracing::info!(
                root = %root.display(),
                backup = %destination.display(),
                "would back up managed root"
            );
            return Ok(Some(destination));
        }

        let mut staged = destination.clone().into_os_string();
        staged.push(".partial");
        let staged = PathBuf::from(staged);
        copy_tree(root, &staged)
            .with_context(|| format!("failed to back up {}", root.display()))?;
        move_path(&staged, &destination)
            .with_context(|| format!("failed to finalize backup {}", destination.display()))?;

        tracing::info!(
            root = %root.display(),
            backup = %destination.display(),
            "backed up managed root"
        );
        Ok(Some(destination))
    }
}

fn next_backup_path(root: &Path) -> PathBuf {
    let base = ManagedLayout::new(root).backup_path(current_unix_timestamp());
    if !base.exists() {
        return base;
    }

    let mut attempt = 1_u32;
    loop {
        let mut candidate = base.clone().into_os_string();
        candidate.push(format!("-{attempt}"));
        let candidate = PathBuf::from(candidate);
        if !candidate.exists() {
            return candidate;
        }
        attempt += 1;
    }
}

impl CommandManager for Doctor {
    fn provider(&self) -> &'static str {
        "doctor"
    }

    fn define(&self, name: &str, version: &str, location: &str) -> Result<Command> {
        self.recorder.define(name, version, location)
    }

    fn undefine(&self, name: &str, version: &str) -> Result<()> {
        self.recorder.undefine(name, version)?;
        self.main.undefine(name, version)
    }

    fn activate(&self, name: &str, version: &str) -> Result<()> {
        self.recorder.activate(name, version)
    }

    fn deactivate(&self, name: &str) -> Result<()> {
        self.recorder.deactivate(name)
    }

    fn query(&self) -> Result<CommandQuery<'_>> {
        Ok(CommandQuery::new(StaticCommands::new(self.merged()?)))
    }

    fn close(&self) -> Result<()> {
        let recorder = self.recorder.close();
        let main = self.main.close();
        recorder.and(main)
    }
}
