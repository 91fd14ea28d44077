use anyhow::Result;

use crate::{Command, CommandQuery};

/// Implemented by the shim store, the record store and the doctor.
pub trait CommandManager {
    fn provider(&self) -> &'static str;

    fn define(&self, name: &str, version: &str, location: &str) -> Result<Command>;

    fn undefine(&self, name: &str, version: &str) -> Result<()>;

    fn activate(&self, name: &str, version: &str) -> Result<()>;

    fn deactivate(&self, name: &str) -> Result<()>;

    fn query(&self) -> Result<CommandQuery<'_>>;

    fn close(&self) -> Result<()>;
}

impl<M: CommandManager + ?Sized> CommandManager for Box<M> {
    fn provider(&self) -> &'static str {
        (**self).provider()
    }

    fn define(&self, name: &str, version: &str, location: &str) -> Result<Command> {
        (**self).define(name, version, location)
    }

    fn undefine(&self, name: &str, version: &str) -> Result<()> {
        (**self).undefine(name, version)
    }

    fn activate(&self, name: &str, version: &str) -> Result<()> {
        (**self).activate(name, version)
    }

    fn deactivate(&self, name: &str) -> Result<()> {
        (**self).deactivate(name)
    }

    fn query(&self) -> Result<CommandQuery<'_>> {
        (**self).query()
    }

    fn close(&self) -> Result<()> {
        (**self).close()
    }
}
