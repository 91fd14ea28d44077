use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use verman_core::{
    Command, CommandFilter, CommandManager, CommandQuery, QueryBackend, RegistryError,
};

use crate::fs_utils::{
    create_symlink, is_executable_file, move_path, remove_file_if_exists, set_dir_mode,
    set_executable_mode, unique_suffix,
};
use crate::ManagedLayout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstallStrategy {
    #[default]
    Copy,
    Link,
}

impl InstallStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::Link => "link",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "copy" => Ok(Self::Copy),
            "link" => Ok(Self::Link),
            _ => Err(anyhow!("invalid install strategy: {value}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShimStore {
    layout: ManagedLayout,
    strategy: InstallStrategy,
}

impl ShimStore {
    pub fn new(layout: ManagedLayout, strategy: InstallStrategy) -> Self {
        Self { layout, strategy }
    }

    pub fn layout(&self) -> &ManagedLayout {
        &self.layout
    }

    pub fn strategy(&self) -> InstallStrategy {
        self.strategy
    }

    pub fn init(&self) -> Result<()> {
        self.layout.ensure_base_dirs()
    }

    pub fn define_with_renamer<F>(
        &self,
        name: &str,
        version: &str,
        source: &Path,
        rename: F,
    ) -> Result<Command>
    where
        F: Fn(&Path, &Path) -> io::Result<()>,
    {
        validate_command_name(name)?;
        let canonical = self.layout.canonical_shim_path(name, version)?;
        let legacy = self.layout.legacy_shim_path(name, version);

        let shim_path = if is_executable_file(&canonical) {
            tracing::debug!(name, version, location = %canonical.display(), "reusing shim");
            canonical
        } else if legacy != canonical && is_executable_file(&legacy) {
            match rename(&legacy, &canonical) {
                Ok(()) => {
                    tracing::info!(
                        name,
                        version,
                        from = %legacy.display(),
                        to = %canonical.display(),
                        "migrated legacy shim"
                    );
                    canonical
                }
                Err(err) => {
                    tracing::warn!(
                        name,
                        version,
                        location = %legacy.display(),
                        error = %err,
                        "failed to migrate legacy shim; keeping legacy filename"
                    );
                    legacy
                }
            }
        } else {
            self.install(name, source, &canonical)?;
            tracing::info!(
                name,
                version,
                source = %source.display(),
                location = %canonical.display(),
                strategy = self.strategy.as_str(),
                "installed shim"
            );
            if legacy != canonical {
                self.remove_broken_legacy(name, version, &legacy);
            }
            canonical
        };

        Ok(self.shim_command(name, version, &shim_path))
    }

    fn install(&self, name: &str, source: &Path, destination: &Path) -> Result<()> {
        if !source.is_file() {
            anyhow::bail!("source binary not found: {}", source.display());
        }

        let dir = self.layout.command_shims_dir(name);
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create shim dir: {}", dir.display()))?;
        set_dir_mode(&dir)
            .with_context(|| format!("failed to set permissions on {}", dir.display()))?;

        match self.strategy {
            InstallStrategy::Copy => {
                let file_name = destination
                    .file_name()
                    .map(|value| value.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let staged = dir.join(format!(".{file_name}.tmp-{}", unique_suffix()));
                fs::copy(source, &staged).with_context(|| {
                    format!(
                        "failed to copy {} to {}",
                        source.display(),
                        staged.display()
                    )
                })?;
                set_executable_mode(&staged)
                    .with_context(|| format!("failed to chmod {}", staged.display()))?;
                remove_file_if_exists(destination).with_context(|| {
                    format!("failed to replace existing shim: {}", destination.display())
                })?;
                if let Err(err) = move_path(&staged, destination) {
                    let _ = remove_file_if_exists(&staged);
                    return Err(err);
                }
            }
            InstallStrategy::Link => {
                let target = std::path::absolute(source).with_context(|| {
                    format!("failed to resolve source path: {}", source.display())
                })?;
                remove_file_if_exists(destination).with_context(|| {
                    format!("failed to replace existing shim: {}", destination.display())
                })?;
                create_symlink(&target, destination).with_context(|| {
                    format!(
                        "failed to create symlink {} -> {}",
                        destination.display(),
                        target.display()
                    )
                })?;
            }
        }
        Ok(())
    }

    pub fn resolve_shim(&self, name: &str, version: &str) -> Option<PathBuf> {
        if let Ok(canonical) = self.layout.canonical_shim_path(name, version) {
            if shim_exists(&canonical) {
                return Some(canonical);
            }
        }
        let legacy = self.layout.legacy_shim_path(name, version);
        shim_exists(&legacy).then_some(legacy)
    }

    pub fn active_target(&self, name: &str) -> Option<PathBuf> {
        let link = self.layout.active_link_path(name);
        let target = fs::read_link(&link).ok()?;
        if target.is_absolute() {
            Some(target)
        } else {
            Some(self.layout.bin_dir().join(target))
        }
    }

    fn shim_command(&self, name: &str, version: &str, shim_path: &Path) -> Command {
        let activated = self.active_target(name).as_deref() == Some(shim_path);
        Command::new(name, version, shim_path.display().to_string(), activated)
    }

    fn scan(&self, filter: &CommandFilter) -> Result<Vec<Command>> {
        let shims_dir = self.layout.shims_dir();
        if !shims_dir.exists() {
            return Ok(Vec::new());
        }

        let name_dirs = match &filter.name {
            Some(name) => vec![self.layout.command_shims_dir(name)],
            None => {
                let mut dirs = Vec::new();
                for entry in fs::read_dir(&shims_dir).with_context(|| {
                    format!("failed to read shims directory: {}", shims_dir.display())
                })? {
                    let entry = entry?;
                    if entry.file_type()?.is_dir() {
                        dirs.push(entry.path());
                    }
                }
                dirs
            }
        };

        let mut commands = Vec::new();
        for dir in name_dirs {
            let Some(name) = dir.file_name().and_then(|value| value.to_str()) else {
                continue;
            };
            if !dir.is_dir() {
                continue;
            }
            let active = self.active_target(name);
            let prefix = format!("{name}_");

            for entry in fs::read_dir(&dir)
                .with_context(|| format!("failed to read shim dir: {}", dir.display()))?
            {
                let entry = entry?;
                if entry.file_type()?.is_dir() {
                    continue;
                }
                let file_name = entry.file_name();
                let Some(file_name) = file_name.to_str() else {
                    continue;
                };
                let Some(version) = file_name.strip_prefix(&prefix) else {
                    continue;
                };
                if version.is_empty() {
                    continue;
                }

                let path = entry.path();
                let activated = active.as_deref() == Some(path.as_path());
                commands.push(Command::new(
                    name,
                    version,
                    path.display().to_string(),
                    activated,
                ));
            }
        }

        Ok(commands)
    }

    fn remove_active_link_if_targets(&self, name: &str, shim_path: &Path) {
        if self.active_target(name).as_deref() != Some(shim_path) {
            return;
        }
        let link = self.layout.active_link_path(name);
        match remove_file_if_exists(&link) {
            Ok(_) => tracing::info!(
                name,
                location = %link.display(),
                "removed active link to undefined shim"
            ),
            Err(err) => tracing::warn!(
                name,
                location = %link.display(),
                error = %err,
                "failed to remove active link to undefined shim"
            ),
        }
    }

    fn remove_broken_legacy(&self, name: &str, version: &str, legacy: &Path) {
        match remove_file_if_exists(legacy) {
            Ok(true) => tracing::info!(
                name,
                version,
                location = %legacy.display(),
                "removed unusable legacy shim"
            ),
            Ok(false) => {}
            Err(err) => tracing::warn!(
                name,
                version,
                location = %legacy.display(),
                error = %err,
                "failed to remove unusable legacy shim"
            ),
        }
    }

    fn prune_empty_shim_dir(&self, name: &str) {
        let dir = self.layout.command_shims_dir(name);
        let is_empty = fs::read_dir(&dir)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
        if is_empty {
            let _ = fs::remove_dir(&dir);
        }
    }
}

impl CommandManager for ShimStore {
    fn provider(&self) -> &'static str {
        "shims"
    }

    fn define(&self, name: &str, version: &str, location: &str) -> Result<Command> {
        self.define_with_renamer(name, version, Path::new(location), |from, to| {
            fs::rename(from, to)
        })
    }

    fn undefine(&self, name: &str, version: &str) -> Result<()> {
        validate_command_name(name)?;
        let mut candidates = Vec::with_capacity(2);
        if let Ok(canonical) = self.layout.canonical_shim_path(name, version) {
            candidates.push(canonical);
        }
        let legacy = self.layout.legacy_shim_path(name, version);
        if !candidates.contains(&legacy) {
            candidates.push(legacy);
        }

        let mut failures = Vec::new();
        for path in &candidates {
            self.remove_active_link_if_targets(name, path);
            match remove_file_if_exists(path) {
                Ok(true) => {
                    tracing::info!(name, version, location = %path.display(), "removed shim")
                }
                Ok(false) => {}
                Err(err) => {
                    tracing::warn!(
                        name,
                        version,
                        location = %path.display(),
                        error = %err,
                        "failed to remove shim"
                    );
                    failures.push(format!("{}: {err}", path.display()));
                }
            }
        }
        self.prune_empty_shim_dir(name);

        if !failures.is_empty() && failures.len() == candidates.len() {
            anyhow::bail!(
                "failed to remove shims for {name}@{version}: {}",
                failures.join("; ")
            );
        }
        Ok(())
    }

    fn activate(&self, name: &str, version: &str) -> Result<()> {
        validate_command_name(name)?;
        let shim_path = self
            .resolve_shim(name, version)
            .ok_or_else(|| RegistryError::shim_not_found(name, version))?;

        let bin_dir = self.layout.bin_dir();
        fs::create_dir_all(&bin_dir)
            .with_context(|| format!("failed to create {}", bin_dir.display()))?;
        let link = self.layout.active_link_path(name);
        remove_file_if_exists(&link)
            .with_context(|| format!("failed to replace active link: {}", link.display()))?;
        create_symlink(&shim_path, &link).with_context(|| {
            format!(
                "failed to create symlink {} -> {}",
                link.display(),
                shim_path.display()
            )
        })?;

        tracing::info!(name, version, location = %shim_path.display(), "activated shim");
        Ok(())
    }

    fn deactivate(&self, name: &str) -> Result<()> {
        validate_command_name(name)?;
        let link = self.layout.active_link_path(name);
        if remove_file_if_exists(&link)
            .with_context(|| format!("failed to remove active link: {}", link.display()))?
        {
            tracing::info!(name, location = %link.display(), "deactivated shim");
        }
        Ok(())
    }

    fn query(&self) -> Result<CommandQuery<'_>> {
        Ok(CommandQuery::new(ShimQuery { store: self }))
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

struct ShimQuery<'a> {
    store: &'a ShimStore,
}

impl QueryBackend for ShimQuery<'_> {
    fn fetch(&self, filter: &CommandFilter) -> Result<Vec<Command>> {
        self.store.scan(filter)
    }

    fn not_found(&self, _filter: &CommandFilter) -> RegistryError {
        RegistryError::BinaryNotFound
    }
}

fn shim_exists(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|metadata| !metadata.is_dir())
        .unwrap_or(false)
}

pub fn validate_command_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.starts_with('.') {
        anyhow::bail!("invalid command name: '{name}'");
    }
    if name
        .chars()
        .any(|ch| ch == '/' || ch == '\\' || ch.is_control() || ch.is_whitespace())
    {
        anyhow::bail!("invalid command name: '{name}'");
    }
    Ok(())
}

