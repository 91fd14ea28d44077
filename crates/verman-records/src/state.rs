use std::collections::HashSet;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use verman_core::{version, Command};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRecord {
    pub id: u64,
    pub name: String,
    pub version: String,
    pub location: String,
    #[serde(default)]
    pub activated: bool,
    #[serde(default)]
    pub created_at_unix: u64,
    #[serde(default)]
    pub updated_at_unix: u64,
}

impl CommandRecord {
    pub fn to_command(&self) -> Command {
        Command::new(
            self.name.clone(),
            self.version.clone(),
            self.location.clone(),
            self.activated,
        )
    }

    pub(crate) fn is_identity(&self, name: &str, version: &str) -> bool {
        self.name == name && version::equal(&self.version, version)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CommandStateFile {
    #[serde(default = "state_file_version")]
    pub(crate) version: u32,
    #[serde(default = "first_record_id")]
    pub(crate) next_id: u64,
    #[serde(default)]
    pub(crate) commands: Vec<CommandRecord>,
}

impl Default for CommandStateFile {
    fn default() -> Self {
        Self {
            version: state_file_version(),
            next_id: first_record_id(),
            commands: Vec::new(),
        }
    }
}

impl CommandStateFile {
    pub(crate) fn position(&self, name: &str, version: &str) -> Option<usize> {
        self.commands
            .iter()
            .position(|record| record.is_identity(name, version))
    }

    pub(crate) fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

pub(crate) fn parse_command_state_file(content: &str) -> Result<CommandStateFile> {
    let mut state =
        toml::from_str::<CommandStateFile>(content).context("failed parsing command state")?;
    let expected = state_file_version();
    if state.version != expected {
        anyhow::bail!(
            "unsupported command state version {} (expected {})",
            state.version,
            expected
        );
    }

    let mut seen = HashSet::with_capacity(state.commands.len());
    let mut max_id = 0;
    for record in &state.commands {
        if !seen.insert((record.name.as_str(), version::identity_key(&record.version))) {
            anyhow::bail!(
                "duplicate command record '{}' version '{}'",
                record.name,
                record.version
            );
        }
        max_id = max_id.max(record.id);
    }
    if state.next_id <= max_id {
        state.next_id = max_id + 1;
    }

    sort_records(&mut state.commands);
    Ok(state)
}

pub(crate) fn sort_records(records: &mut [CommandRecord]) {
    records.sort_by(|left, right| {
        left.name
            .cmp(&right.name)
            .then_with(|| left.version.cmp(&right.version))
    });
}

pub(crate) fn state_file_version() -> u32 {
    1
}

fn first_record_id() -> u64 {
    1
}
