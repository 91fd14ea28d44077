use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::fs_utils::set_dir_mode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedLayout {
    root: PathBuf,
}

impl ManagedLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root = std::path::absolute(&root).unwrap_or(root);
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    pub fn shims_dir(&self) -> PathBuf {
        self.root.join("shims")
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root.join("state")
    }

    pub fn tmp_dir(&self) -> PathBuf {
        self.state_dir().join("tmp")
    }

    pub fn downloads_dir(&self) -> PathBuf {
        self.state_dir().join("downloads")
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    pub fn records_path(&self) -> PathBuf {
        self.state_dir().join("commands.toml")
    }

    pub fn command_shims_dir(&self, name: &str) -> PathBuf {
        self.shims_dir().join(name)
    }

    pub fn active_link_path(&self, name: &str) -> PathBuf {
        self.bin_dir().join(name)
    }

    pub fn legacy_shim_path(&self, name: &str, version: &str) -> PathBuf {
        self.command_shims_dir(name)
            .join(shim_file_name(name, version))
    }

    pub fn canonical_shim_path(&self, name: &str, version: &str) -> Result<PathBuf> {
        let canonical = verman_core::version::canonical(version)?;
        Ok(self
            .command_shims_dir(name)
            .join(shim_file_name(name, &canonical)))
    }

    pub fn backup_path(&self, timestamp: u64) -> PathBuf {
        let mut file_name = self
            .root
            .file_name()
            .map(|value| value.to_os_string())
            .unwrap_or_else(|| "verman".into());
        file_name.push(format!(".backup.{timestamp}"));
        self.root.with_file_name(file_name)
    }

    pub fn ensure_base_dirs(&self) -> Result<()> {
        for dir in [
            self.bin_dir(),
            self.shims_dir(),
            self.state_dir(),
            self.tmp_dir(),
        ] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
            set_dir_mode(&dir)
                .with_context(|| format!("failed to set permissions on {}", dir.display()))?;
        }
        Ok(())
    }
}

pub(crate) fn shim_file_name(name: &str, version: &str) -> String {
    format!("{name}_{version}")
}

pub fn default_user_root() -> Result<PathBuf> {
    if cfg!(windows) {
        let app_data = std::env::var("LOCALAPPDATA")
            .context("LOCALAPPDATA is not set; cannot resolve Windows user root")?;
        return Ok(PathBuf::from(app_data).join("verman"));
    }

    let home = std::env::var("HOME").context("HOME is not set; cannot resolve user root")?;
    Ok(PathBuf::from(home).join(".verman"))
}
