use std::fmt;

use serde::{Deserialize, Serialize};

/// Handle returned to callers for a started container.
///
/// The name is the stable identity. The engine id is only a cache of the last
/// lookup and may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instance {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    engine_id: Option<String>,
}

impl Instance {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            engine_id: None,
        }
    }

    pub fn with_engine_id(mut self, engine_id: impl Into<String>) -> Self {
        self.engine_id = Some(engine_id.into());
        self
    }

    /// Identifier of the instance, which is its namespaced machine name.
    pub fn id(&self) -> &str {
        &self.name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn engine_id(&self) -> Option<&str> {
        self.engine_id.as_deref()
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dock:{}", self.name)
    }
}
