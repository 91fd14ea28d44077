mod command;
mod error;
mod manager;
mod query;
pub mod version;

pub use command::Command;
pub use error::RegistryError;
pub use manager::CommandManager;
pub use query::{CommandFilter, CommandQuery, QueryBackend, StaticCommands};
