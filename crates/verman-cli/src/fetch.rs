use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use verman_core::{Command, CommandManager};
use verman_shims::unique_suffix;

pub(crate) trait Fetcher {
    fn name(&self) -> &'static str;

    fn is_supported(&self, uri: &str) -> bool;

    fn fetch(&self, uri: &str, dest_dir: &Path) -> Result<PathBuf>;
}

#[derive(Debug, Default)]
pub(crate) struct LocalFetcher;

impl Fetcher for LocalFetcher {
    fn name(&self) -> &'static str {
        "local"
    }

    fn is_supported(&self, uri: &str) -> bool {
        uri.starts_with("file://") || !uri.contains("://")
    }

    fn fetch(&self, uri: &str, dest_dir: &Path) -> Result<PathBuf> {
        let source = PathBuf::from(uri.strip_prefix("file://").unwrap_or(uri));
        if !source.is_file() {
            anyhow::bail!("local binary not found: {}", source.display());
        }

        let file_name = source
            .file_name()
            .map(|value| value.to_os_string())
            .unwrap_or_else(|| "download".into());
        let destination = dest_dir.join(file_name);
        fs::copy(&source, &destination).with_context(|| {
            format!(
                "failed to copy {} to {}",
                source.display(),
                destination.display()
            )
        })?;
        Ok(destination)
    }
}

pub(crate) struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub(crate) fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("verman/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build http client")?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn name(&self) -> &'static str {
        "http"
    }

    fn is_supported(&self, uri: &str) -> bool {
        uri.starts_with("https://") || uri.starts_with("http://")
    }

    fn fetch(&self, uri: &str, dest_dir: &Path) -> Result<PathBuf> {
        let response = self
            .client
            .get(uri)
            .send()
            .with_context(|| format!("failed to download {uri}"))?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("download of {uri} failed with status {status}");
        }
        let body = response
            .bytes()
            .with_context(|| format!("failed to read response body from {uri}"))?;

        let destination = dest_dir.join(download_file_name(uri));
        fs::write(&destination, &body)
            .with_context(|| format!("failed to write download: {}", destination.display()))?;
        tracing::info!(
            uri,
            bytes = body.len(),
            location = %destination.display(),
            "downloaded binary"
        );
        Ok(destination)
    }
}

pub(crate) fn download_file_name(uri: &str) -> String {
    let without_fragment = uri.split('#').next().unwrap_or(uri);
    let without_query = without_fragment.split('?').next().unwrap_or(without_fragment);
    let after_scheme = without_query
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(without_query);
    match after_scheme.split_once('/') {
        Some((_, path)) => path
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or("download")
            .to_string(),
        None => "download".to_string(),
    }
}

pub(crate) fn default_fetchers() -> Result<Vec<Box<dyn Fetcher>>> {
    Ok(vec![Box::new(LocalFetcher), Box::new(HttpFetcher::new()?)])
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct InstallRequest {
    pub(crate) name: String,
    pub(crate) version: String,
    pub(crate) uri: String,
    pub(crate) activate: bool,
    pub(crate) keep_download: bool,
}

pub(crate) fn install_command(
    manager: &dyn CommandManager,
    fetchers: &[Box<dyn Fetcher>],
    staging_root: &Path,
    request: &InstallRequest,
) -> Result<Command> {
    let Some(fetcher) = fetchers
        .iter()
        .find(|fetcher| fetcher.is_supported(&request.uri))
    else {
        anyhow::bail!("no fetcher supports '{}'", request.uri);
    };

    let staging = staging_root.join(format!(
        "{}-{}-{}",
        request.name,
        request.version,
        unique_suffix()
    ));
    fs::create_dir_all(&staging)
        .with_context(|| format!("failed to create staging dir: {}", staging.display()))?;
    tracing::debug!(
        fetcher = fetcher.name(),
        uri = %request.uri,
        staging = %staging.display(),
        "fetching binary"
    );

    let result = register_fetched(manager, fetcher.as_ref(), &staging, request);
    if result.is_err() || !request.keep_download {
        let _ = fs::remove_dir_all(&staging);
    }
    result
}

fn register_fetched(
    manager: &dyn CommandManager,
    fetcher: &dyn Fetcher,
    staging: &Path,
    request: &InstallRequest,
) -> Result<Command> {
    let fetched = fetcher.fetch(&request.uri, staging)?;
    let location = fetched.display().to_string();
    let mut command = manager.define(&request.name, &request.version, &location)?;
    if request.activate {
        manager.activate(&request.name, &request.version)?;
        command.activated = true;
    }
    Ok(command)
}
