use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use verman_shims::{default_user_root, InstallStrategy, ManagedLayout};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Config {
    pub(crate) root: PathBuf,
    pub(crate) install_strategy: InstallStrategy,
    pub(crate) backup_on_fix: bool,
    pub(crate) provider: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    install_strategy: Option<String>,
    backup_on_fix: Option<bool>,
    provider: Option<String>,
}

impl Config {
    pub(crate) fn defaults(root: PathBuf) -> Self {
        Self {
            root,
            install_strategy: InstallStrategy::Copy,
            backup_on_fix: true,
            provider: "records".to_string(),
        }
    }

    pub(crate) fn load(root: Option<&Path>) -> Result<Self> {
        let root = match root {
            Some(root) => root.to_path_buf(),
            None => default_user_root()?,
        };
        Self::load_from_root(root)
    }

    pub(crate) fn load_from_root(root: PathBuf) -> Result<Self> {
        let mut config = Self::defaults(root);
        let path = config.layout().config_path();
        if !path.exists() {
            return Ok(config);
        }

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        let file = parse_config_file(&raw)
            .with_context(|| format!("failed to parse config: {}", path.display()))?;
        config.apply(file)?;
        tracing::debug!(
            path = %path.display(),
            strategy = config.install_strategy.as_str(),
            provider = %config.provider,
            "loaded config"
        );
        Ok(config)
    }

    pub(crate) fn layout(&self) -> ManagedLayout {
        ManagedLayout::new(self.root.clone())
    }

    fn apply(&mut self, file: ConfigFile) -> Result<()> {
        if let Some(strategy) = file.install_strategy {
            self.install_strategy = InstallStrategy::parse(&strategy)?;
        }
        if let Some(backup_on_fix) = file.backup_on_fix {
            self.backup_on_fix = backup_on_fix;
        }
        if let Some(provider) = file.provider {
            self.provider = provider;
        }
        Ok(())
    }
}

fn parse_config_file(raw: &str) -> Result<ConfigFile> {
    Ok(toml::from_str(raw)?)
}
