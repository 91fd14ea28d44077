use anyhow::Result;
use semver::Version;

use crate::RegistryError;

/// Strips one leading `v` and pads a missing minor or patch with zero.
pub fn normalize(raw: &str) -> Result<Version> {
    let trimmed = raw.trim();
    let stripped = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);
    if stripped.is_empty() {
        return Err(invalid(raw));
    }

    let split_at = stripped
        .find(|ch: char| ch == '-' || ch == '+')
        .unwrap_or(stripped.len());
    let (core, suffix) = stripped.split_at(split_at);
    let components = core.split('.').count();
    let padded = match components {
        1 => format!("{core}.0.0{suffix}"),
        2 => format!("{core}.0{suffix}"),
        _ => stripped.to_string(),
    };

    Version::parse(&padded).map_err(|_| invalid(raw))
}

pub fn canonical(raw: &str) -> Result<String> {
    Ok(normalize(raw)?.to_string())
}

pub fn equal(left: &str, right: &str) -> bool {
    match (normalize(left), normalize(right)) {
        (Ok(left), Ok(right)) => left == right,
        _ => left == right,
    }
}

pub fn identity_key(raw: &str) -> String {
    canonical(raw).unwrap_or_else(|_| raw.to_string())
}

fn invalid(raw: &str) -> anyhow::Error {
    RegistryError::InvalidVersion {
        raw: raw.to_string(),
    }
    .into()
}
