use serde::Serialize;
use verman_core::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FixAction {
    Deactivate,
    Undefine,
    Define,
    Activate,
}

impl FixAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deactivate => "deactivate",
            Self::Undefine => "undefine",
            Self::Define => "define",
            Self::Activate => "activate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixFailure {
    pub name: String,
    pub version: String,
    pub action: FixAction,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FixReport {
    pub dry_run: bool,
    pub backup_path: Option<String>,
    pub removed: Vec<Command>,
    pub restored: Vec<Command>,
    pub failures: Vec<FixFailure>,
}

impl FixReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub(crate) fn record_failure(
        &mut self,
        command: &Command,
        action: FixAction,
        err: &anyhow::Error,
    ) {
        tracing::warn!(
            name = %command.name,
            version = %command.version,
            action = action.as_str(),
            error = %format!("{err:#}"),
            "repair step failed"
        );
        self.failures.push(FixFailure {
            name: command.name.clone(),
            version: command.version.clone(),
            action,
            error: format!("{err:#}"),
        });
    }
}
