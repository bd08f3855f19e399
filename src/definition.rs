//! Read-only description of a map set, as declared by the module that owns it.

use chrono::Duration;
use serde::Deserialize;
use std::fmt;

/// Identity of a definition, used to index cached instances for bulk refresh.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct DefinitionId(String);

impl DefinitionId {
    /// Identity for `local_name` as declared in `module`.
    pub fn new(module: &str, local_name: &str) -> Self {
        Self(format!("{module}/{local_name}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DefinitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MapSetDefinition {
    pub id: DefinitionId,
    pub local_name: String,
    /// Content may differ between otherwise identical construction contexts.
    #[serde(default)]
    pub dynamic: bool,
    /// Maximum cached age for dynamic map sets. 0 means refresh on every access.
    #[serde(default)]
    pub refresh_timeout_mins: u32,
}

impl MapSetDefinition {
    /// A static (never refreshed) definition.
    pub fn fixed(module: &str, local_name: &str) -> Self {
        Self {
            id: DefinitionId::new(module, local_name),
            local_name: local_name.to_owned(),
            dynamic: false,
            refresh_timeout_mins: 0,
        }
    }

    /// A dynamic definition refreshed after `refresh_timeout_mins` (0 = always).
    pub fn dynamic(module: &str, local_name: &str, refresh_timeout_mins: u32) -> Self {
        Self {
            dynamic: true,
            refresh_timeout_mins,
            ..Self::fixed(module, local_name)
        }
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    pub fn refresh_timeout(&self) -> Duration {
        Duration::minutes(i64::from(self.refresh_timeout_mins))
    }
}
