//! Manager configuration structure.
//!
//! Every field has a default, so an empty document is a valid configuration.
//! Unknown fields are rejected to catch typos early.

use std::path::{Path, PathBuf};
use std::time::Duration;

use dock_core::{DockError, Result};
use dock_logging::LogSettings;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Root configuration handed to the container manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManagerConfig {
    /// Namespace distinguishing several managers sharing one host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Root of the active workspaces.
    #[serde(default = "default_containers_dir")]
    pub containers_dir: PathBuf,

    /// Root that destroyed workspaces are moved into.
    #[serde(default = "default_removed_containers_dir")]
    pub removed_containers_dir: PathBuf,

    /// Host directory bind-mounted into every container for agent logs.
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    #[serde(default)]
    pub engine: EngineSettings,

    #[serde(default)]
    pub boot: BootSettings,

    #[serde(default)]
    pub ports: PortSettings,

    #[serde(default)]
    pub ansible: AnsibleSettings,

    #[serde(default)]
    pub logging: LogSettings,
}

fn default_containers_dir() -> PathBuf {
    PathBuf::from("/var/lib/dock/containers")
}

fn default_removed_containers_dir() -> PathBuf {
    PathBuf::from("/var/lib/dock/removed-containers")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("/var/log/dock")
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            name: None,
            containers_dir: default_containers_dir(),
            removed_containers_dir: default_removed_containers_dir(),
            log_dir: default_log_dir(),
            engine: EngineSettings::default(),
            boot: BootSettings::default(),
            ports: PortSettings::default(),
            ansible: AnsibleSettings::default(),
            logging: LogSettings::default(),
        }
    }
}

/// Container engine CLI settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSettings {
    pub binary: String,
    /// Root of the engine's per-container directories (`<root>/<id>/<id>-json.log`).
    pub containers_dir: PathBuf,
    /// Pause between the run call and the identity lookup.
    pub resolve_delay_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_timeout_secs: Option<u64>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            binary: "docker".to_string(),
            containers_dir: PathBuf::from("/var/lib/docker/containers"),
            resolve_delay_ms: 500,
            command_timeout_secs: None,
        }
    }
}

impl EngineSettings {
    pub fn resolve_delay(&self) -> Duration {
        Duration::from_millis(self.resolve_delay_ms)
    }
}

/// How a fresh container gets its configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum InitializerKind {
    /// The container runs cloud-init against the mounted payload.
    #[default]
    #[serde(rename = "cloudinit", alias = "cloud-init")]
    CloudInit,
    /// The container starts its remote shell agent and is configured from outside.
    #[serde(rename = "ansible")]
    Ansible,
}

impl InitializerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InitializerKind::CloudInit => "cloudinit",
            InitializerKind::Ansible => "ansible",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BootSettings {
    pub initializer: InitializerKind,
    /// Port of the in-container service the forwarded port maps to.
    pub service_port: u16,
    /// Where the workspace is mounted inside the container.
    pub mount_point: PathBuf,
    pub guest_log_dir: PathBuf,
    pub shell: String,
    pub cloud_init_command: String,
    pub agent_command: String,
    /// Address the post-boot configurator connects to.
    pub host_address: String,
}

impl Default for BootSettings {
    fn default() -> Self {
        Self {
            initializer: InitializerKind::default(),
            service_port: 22,
            mount_point: PathBuf::from("/mnt"),
            guest_log_dir: PathBuf::from("/var/log/dock"),
            shell: "/bin/bash".to_string(),
            cloud_init_command: "cloud-init -f /mnt/cloud-init init".to_string(),
            agent_command: "/usr/sbin/sshd -D".to_string(),
            host_address: "127.0.0.1".to_string(),
        }
    }
}

/// Whether forwarded ports go back to a pool once their container is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReleasePolicy {
    /// Ports are consumed and never handed out again.
    #[default]
    Monotonic,
    /// Ports of cleanly destroyed containers are reused before the counter moves.
    Recycle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PortSettings {
    pub counter_key: String,
    /// Counter value used when the key does not exist yet.
    pub seed: i64,
    pub state_file: PathBuf,
    pub release: ReleasePolicy,
}

impl Default for PortSettings {
    fn default() -> Self {
        Self {
            counter_key: "default_ssh_port".to_string(),
            seed: 50000,
            state_file: PathBuf::from("/var/lib/dock/ports.json"),
            release: ReleasePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnsibleSettings {
    pub binary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playbook: Option<PathBuf>,
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for AnsibleSettings {
    fn default() -> Self {
        Self {
            binary: "ansible-playbook".to_string(),
            playbook: None,
            user: "root".to_string(),
            timeout_secs: None,
        }
    }
}

fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&raw).into_owned())
}

impl ManagerConfig {
    pub fn from_yaml_str(input: &str) -> Result<Self> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml_ng::from_str(input)?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Prefix every container name owned by this manager carries.
    pub fn name_prefix(&self) -> String {
        match self.namespace() {
            Some(ns) => format!("{}-", ns),
            None => String::new(),
        }
    }

    /// The configured namespace, treating an empty string as unset.
    pub fn namespace(&self) -> Option<&str> {
        self.name.as_deref().filter(|ns| !ns.is_empty())
    }

    /// Expands `~` in every configured path.
    pub fn expand_paths(&mut self) {
        self.containers_dir = expand_path(&self.containers_dir);
        self.removed_containers_dir = expand_path(&self.removed_containers_dir);
        self.log_dir = expand_path(&self.log_dir);
        self.engine.containers_dir = expand_path(&self.engine.containers_dir);
        self.ports.state_file = expand_path(&self.ports.state_file);
        self.logging.file = expand_path(&self.logging.file);
        if let Some(playbook) = &self.ansible.playbook {
            self.ansible.playbook = Some(expand_path(playbook));
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.validate_namespace()?;
        self.validate_paths()?;

        if self.boot.service_port == 0 {
            return Err(DockError::Config(
                "boot.service_port must be between 1 and 65535".to_string(),
            ));
        }
        if self.ports.seed <= 0 {
            return Err(DockError::Config(format!(
                "ports.seed must be positive, got {}",
                self.ports.seed
            )));
        }
        if self.ports.counter_key.trim().is_empty() {
            return Err(DockError::Config(
                "ports.counter_key must not be empty".to_string(),
            ));
        }
        if self.engine.binary.trim().is_empty() {
            return Err(DockError::Config("engine.binary must not be empty".to_string()));
        }
        if self.boot.initializer == InitializerKind::Ansible && self.ansible.playbook.is_none() {
            return Err(DockError::Config(
                "ansible.playbook is required with the ansible initializer".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_namespace(&self) -> Result<()> {
        let Some(name) = &self.name else {
            return Ok(());
        };
        let namespace_regex = Regex::new(r"^[a-z0-9][a-z0-9-]*$")
            .map_err(|e| DockError::Config(format!("Invalid regex pattern: {}", e)))?;
        if !namespace_regex.is_match(name) {
            return Err(DockError::Config(format!(
                "Invalid manager name '{}': use lowercase letters, digits and dashes",
                name
            )));
        }
        Ok(())
    }

    fn validate_paths(&self) -> Result<()> {
        let paths = [
            ("containers_dir", &self.containers_dir),
            ("removed_containers_dir", &self.removed_containers_dir),
            ("log_dir", &self.log_dir),
            ("engine.containers_dir", &self.engine.containers_dir),
            ("ports.state_file", &self.ports.state_file),
        ];
        for (field, path) in paths {
            if path.as_os_str().is_empty() {
                return Err(DockError::Config(format!("{} must not be empty", field)));
            }
        }
        if self.containers_dir == self.removed_containers_dir {
            return Err(DockError::Config(format!(
                "containers_dir and removed_containers_dir are both {}",
                self.containers_dir.display()
            )));
        }
        Ok(())
    }
}
