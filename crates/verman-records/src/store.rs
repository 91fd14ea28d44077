use std::cell::Cell;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use verman_core::{
    Command, CommandFilter, CommandManager, CommandQuery, QueryBackend, RegistryError,
};
use verman_shims::{current_unix_timestamp, move_path, unique_suffix, ShimStore};

use crate::state::{parse_command_state_file, sort_records, CommandStateFile};
use crate::CommandRecord;

#[derive(Debug)]
pub struct RecordStore {
    shims: ShimStore,
    path: PathBuf,
    closed: Cell<bool>,
}

impl RecordStore {
    pub fn open(shims: ShimStore) -> Result<Self> {
        let path = shims.layout().records_path();
        let store = Self {
            shims,
            path,
            closed: Cell::new(false),
        };
        store.load_state()?;
        Ok(store)
    }

    pub fn shims(&self) -> &ShimStore {
        &self.shims
    }

    pub fn records(&self) -> Result<Vec<CommandRecord>> {
        self.ensure_open()?;
        Ok(self.load_state()?.commands)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.get() {
            return Err(RegistryError::ManagerClosed.into());
        }
        Ok(())
    }

    fn load_state(&self) -> Result<CommandStateFile> {
        if !self.path.exists() {
            return Ok(CommandStateFile::default());
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("failed reading command state: {}", self.path.display()))?;
        parse_command_state_file(&content)
            .with_context(|| format!("failed parsing command state: {}", self.path.display()))
    }

    fn save_state(&self, state: &CommandStateFile) -> Result<()> {
        let Some(parent) = self.path.parent() else {
            anyhow::bail!("command state path has no parent: {}", self.path.display());
        };
        fs::create_dir_all(parent).with_context(|| {
            format!("failed creating command state dir: {}", parent.display())
        })?;

        let mut state = state.clone();
        sort_records(&mut state.commands);
        let content = toml::to_string(&state).with_context(|| {
            format!("failed serializing command state: {}", self.path.display())
        })?;

        let staged = parent.join(format!(".commands.toml.tmp-{}", unique_suffix()));
        fs::write(&staged, content)
            .with_context(|| format!("failed writing command state: {}", staged.display()))?;
        move_path(&staged, &self.path)
            .with_context(|| format!("failed replacing command state: {}", self.path.display()))
    }
}

impl CommandManager for RecordStore {
    fn provider(&self) -> &'static str {
        "records"
    }

    fn define(&self, name: &str, version: &str, location: &str) -> Result<Command> {
        self.ensure_open()?;
        let shim = self.shims.define(name, version, location)?;

        let mut state = self.load_state()?;
        let now = current_unix_timestamp();
        let record = match state.position(name, version) {
            Some(index) => {
                let record = &mut state.commands[index];
                record.location = shim.location.clone();
                record.updated_at_unix = now;
                record.clone()
            }
            None => {
                let record = CommandRecord {
                    id: state.allocate_id(),
                    name: name.to_string(),
                    version: version.to_string(),
                    location: shim.location.clone(),
                    activated: false,
                    created_at_unix: now,
                    updated_at_unix: now,
                };
                state.commands.push(record.clone());
                record
            }
        };
        self.save_state(&state)?;

        tracing::info!(
            id = record.id,
            name,
            version = %record.version,
            location = %record.location,
            "recorded command"
        );
        Ok(record.to_command())
    }

    fn undefine(&self, name: &str, version: &str) -> Result<()> {
        self.ensure_open()?;
        let mut state = self.load_state()?;
        let Some(index) = state.position(name, version) else {
            tracing::debug!(name, version, "no command record to remove");
            return Ok(());
        };

        let record = &state.commands[index];
        if record.activated {
            return Err(RegistryError::CommandAlreadyActivated {
                name: record.name.clone(),
                version: record.version.clone(),
            }
            .into());
        }

        let record = state.commands.remove(index);
        self.save_state(&state)?;
        tracing::info!(id = record.id, name, version = %record.version, "removed command record");

        self.shims.undefine(name, &record.version)?;
        if record.version != version {
            self.shims.undefine(name, version)?;
        }
        Ok(())
    }

    fn activate(&self, name: &str, version: &str) -> Result<()> {
        self.ensure_open()?;
        if self.load_state()?.position(name, version).is_none() {
            return Err(RegistryError::command_not_found(name, version).into());
        }

        self.deactivate(name)?;

        let mut state = self.load_state()?;
        let Some(index) = state.position(name, version) else {
            return Err(RegistryError::command_not_found(name, version).into());
        };
        let record = &mut state.commands[index];
        record.activated = true;
        record.updated_at_unix = current_unix_timestamp();
        let record_version = record.version.clone();
        self.save_state(&state)?;

        self.shims.activate(name, &record_version)?;
        tracing::info!(name, version = %record_version, "activated command");
        Ok(())
    }

    fn deactivate(&self, name: &str) -> Result<()> {
        self.ensure_open()?;
        let mut state = self.load_state()?;
        let now = current_unix_timestamp();
        let mut changed = 0_usize;
        for record in state
            .commands
            .iter_mut()
            .filter(|record| record.name == name && record.activated)
        {
            record.activated = false;
            record.updated_at_unix = now;
            changed += 1;
        }
        if changed > 0 {
            self.save_state(&state)?;
        }
        if changed > 1 {
            tracing::warn!(name, count = changed, "cleared multiple active records");
        }

        self.shims.deactivate(name)?;
        if changed > 0 {
            tracing::info!(name, "deactivated command");
        }
        Ok(())
    }

    fn query(&self) -> Result<CommandQuery<'_>> {
        self.ensure_open()?;
        Ok(CommandQuery::new(RecordQuery { store: self }))
    }

    fn close(&self) -> Result<()> {
        self.closed.set(true);
        self.shims.close()
    }
}

struct RecordQuery<'a> {
    store: &'a RecordStore,
}

impl QueryBackend for RecordQuery<'_> {
    fn fetch(&self, filter: &CommandFilter) -> Result<Vec<Command>> {
        self.store.ensure_open()?;
        Ok(self
            .store
            .load_state()?
            .commands
            .iter()
            .map(CommandRecord::to_command)
            .filter(|command| filter.matches(command))
            .collect())
    }

    fn not_found(&self, filter: &CommandFilter) -> RegistryError {
        RegistryError::command_not_found(
            filter.name.as_deref().unwrap_or("*"),
            filter.version.as_deref().unwrap_or("*"),
        )
    }
}
