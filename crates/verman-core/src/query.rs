use anyhow::Result;

use crate::{version, Command, RegistryError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandFilter {
    pub name: Option<String>,
    pub version: Option<String>,
    pub activated: Option<bool>,
    pub location: Option<String>,
}

impl CommandFilter {
    pub fn matches(&self, command: &Command) -> bool {
        if let Some(name) = &self.name {
            if &command.name != name {
                return false;
            }
        }
        if let Some(expected) = &self.version {
            if !version::equal(&command.version, expected) {
                return false;
            }
        }
        if let Some(activated) = self.activated {
            if command.activated != activated {
                return false;
            }
        }
        if let Some(location) = &self.location {
            if &command.location != location {
                return false;
            }
        }
        true
    }

    fn describe_name(&self) -> &str {
        self.name.as_deref().unwrap_or("*")
    }

    fn describe_version(&self) -> &str {
        self.version.as_deref().unwrap_or("*")
    }
}

/// Results are filtered again in memory, so a backend may ignore the filter.
pub trait QueryBackend {
    fn fetch(&self, filter: &CommandFilter) -> Result<Vec<Command>>;

    fn not_found(&self, filter: &CommandFilter) -> RegistryError;
}

pub struct CommandQuery<'a> {
    backend: Box<dyn QueryBackend + 'a>,
    filter: CommandFilter,
}

impl<'a> CommandQuery<'a> {
    pub fn new(backend: impl QueryBackend + 'a) -> Self {
        Self {
            backend: Box::new(backend),
            filter: CommandFilter::default(),
        }
    }

    pub fn with_name(&mut self, name: &str) -> &mut Self {
        self.filter.name = Some(name.to_string());
        self
    }

    pub fn with_version(&mut self, version: &str) -> &mut Self {
        self.filter.version = Some(version.to_string());
        self
    }

    pub fn with_activated(&mut self, activated: bool) -> &mut Self {
        self.filter.activated = Some(activated);
        self
    }

    pub fn with_location(&mut self, location: &str) -> &mut Self {
        self.filter.location = Some(location.to_string());
        self
    }

    pub fn filter(&self) -> &CommandFilter {
        &self.filter
    }

    pub fn all(&self) -> Result<Vec<Command>> {
        let mut commands = self
            .backend
            .fetch(&self.filter)?
            .into_iter()
            .filter(|command| self.filter.matches(command))
            .collect::<Vec<_>>();
        commands.sort_by(|left, right| {
            left.name
                .cmp(&right.name)
                .then_with(|| left.version.cmp(&right.version))
                .then_with(|| left.location.cmp(&right.location))
        });
        Ok(commands)
    }

    pub fn one(&self) -> Result<Command> {
        match self.all()?.into_iter().next() {
            Some(command) => Ok(command),
            None => {
                let err = self.backend.not_found(&self.filter);
                Err(anyhow::Error::new(err).context(format!(
                    "no command matched name={} version={}",
                    self.filter.describe_name(),
                    self.filter.describe_version()
                )))
            }
        }
    }

    pub fn count(&self) -> Result<usize> {
        Ok(self.all()?.len())
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticCommands {
    commands: Vec<Command>,
}

impl StaticCommands {
    pub fn new(commands: Vec<Command>) -> Self {
        Self { commands }
    }
}

impl QueryBackend for StaticCommands {
    fn fetch(&self, filter: &CommandFilter) -> Result<Vec<Command>> {
        Ok(self
            .commands
            .iter()
            .filter(|command| filter.matches(command))
            .cloned()
            .collect())
    }

    fn not_found(&self, _filter: &CommandFilter) -> RegistryError {
        RegistryError::BinaryNotFound
    }
}
