use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Command {
    pub name: String,
    pub version: String,
    pub location: String,
    pub activated: bool,
}

impl Command {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        location: impl Into<String>,
        activated: bool,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            location: location.into(),
            activated,
        }
    }

    pub fn identity(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}
