//! The node's module and command catalogue (`system_getMetadata`).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMetadata {
    #[serde(default)]
    pub modules: Vec<ModuleMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleMetadata {
    pub name: String,
    #[serde(default)]
    pub commands: Vec<CommandMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMetadata {
    pub name: String,
}

impl NodeMetadata {
    /// Every `(module, command)` pair the node can execute.
    pub fn commands(&self) -> impl Iterator<Item = (&str, &str)> {
        self.modules.iter().flat_map(|m| {
            m.commands
                .iter()
                .map(move |c| (m.name.as_str(), c.name.as_str()))
        })
    }
}
