use thiserror::Error;

/// Recover one from an `anyhow` chain with [`RegistryError::find`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("command '{name}' version '{version}' not found")]
    CommandNotFound { name: String, version: String },
    #[error("command '{name}' version '{version}' is activated; deactivate it first")]
    CommandAlreadyActivated { name: String, version: String },
    #[error("no binary matched the query")]
    BinaryNotFound,
    #[error("no shim installed for '{name}' version '{version}'")]
    ShimNotFound { name: String, version: String },
    #[error("invalid version '{raw}'")]
    InvalidVersion { raw: String },
    #[error("manager is closed")]
    ManagerClosed,
    #[error("unknown manager provider '{tag}'")]
    UnknownProvider { tag: String },
}

impl RegistryError {
    pub fn find(err: &anyhow::Error) -> Option<&RegistryError> {
        err.chain().find_map(|cause| cause.downcast_ref::<RegistryError>())
    }

    pub fn command_not_found(name: &str, version: &str) -> Self {
        Self::CommandNotFound {
            name: name.to_string(),
            version: version.to_string(),
        }
    }

    pub fn shim_not_found(name: &str, version: &str) -> Self {
        Self::ShimNotFound {
            name: name.to_string(),
            version: version.to_string(),
        }
    }
}
