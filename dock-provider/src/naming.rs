//! Machine ids, tags and container names.

use dock_core::{DockError, Result};
use regex::Regex;

/// Prefix of every machine tag.
pub const MACHINE_TAG_PREFIX: &str = "machine-";

fn machine_id_regex() -> Result<Regex> {
    Regex::new(r"^(0|[1-9][0-9]*)(/[a-z]+/(0|[1-9][0-9]*))*$")
        .map_err(|e| DockError::Config(format!("Invalid regex pattern: {}", e)))
}

/// Whether `id` is a machine id such as `0`, `7` or `1/lxc/0`.
pub fn is_machine_id(id: &str) -> bool {
    machine_id_regex().map(|re| re.is_match(id)).unwrap_or(false)
}

/// Tag of a machine id: `1/lxc/0` becomes `machine-1-lxc-0`.
pub fn machine_tag(machine_id: &str) -> Result<String> {
    if !machine_id_regex()?.is_match(machine_id) {
        return Err(DockError::InvalidInput(format!(
            "'{}' is not a valid machine id",
            machine_id
        )));
    }
    Ok(format!("{}{}", MACHINE_TAG_PREFIX, machine_id.replace('/', "-")))
}

/// A machine as seen by one manager: its id and the container name derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalMachine {
    machine_id: String,
    namespace: Option<String>,
    tag: String,
    name: String,
}

impl LogicalMachine {
    pub fn new(machine_id: &str, namespace: Option<&str>) -> Result<Self> {
        let tag = machine_tag(machine_id)?;
        let namespace = namespace.filter(|ns| !ns.is_empty()).map(str::to_string);
        let name = match &namespace {
            Some(ns) => format!("{}-{}", ns, tag),
            None => tag.clone(),
        };
        Ok(Self {
            machine_id: machine_id.to_string(),
            namespace,
            tag,
            name,
        })
    }

    pub fn machine_id(&self) -> &str {
        &self.machine_id
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Join key for the workspace directory and the container hostname.
    pub fn name(&self) -> &str {
        &self.name
    }
}
