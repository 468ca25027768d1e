//! Boot strategies.
//!
//! A strategy is picked once per manager. `CloudInit` containers configure
//! themselves from the mounted payload. `ExternalConfigurator` containers only
//! start their remote shell agent and are configured from the host once they
//! are up.

// Standard library
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// External crates
use tracing::{debug, info};

// Internal imports
use dock_config::{AnsibleSettings, BootSettings, InitializerKind, ManagerConfig};
use dock_core::command_stream::{command_line, stream_command_with_timeout};
use dock_core::{DockError, ErrorKind, Result};
use dock_ports::ForwardedPort;

/// The command a container runs as its entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootCommand {
    argv: Vec<String>,
}

impl BootCommand {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }

    /// `shell -c command`.
    pub fn shell(shell: &str, command: &str) -> Self {
        Self::new(vec![shell.to_string(), "-c".to_string(), command.to_string()])
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// The command line as the engine reports it back in its listing.
    pub fn command_line(&self) -> String {
        self.argv.join(" ")
    }
}

/// Where a freshly started container can be reached for configuration.
#[derive(Debug, Clone, Copy)]
pub struct PostBootTarget<'a> {
    pub name: &'a str,
    pub address: &'a str,
    pub port: ForwardedPort,
    pub payload: &'a Path,
}

/// Configures a running container from outside.
pub trait PostConfigurator: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, target: &PostBootTarget<'_>) -> Result<()>;
}

/// Runs an Ansible playbook against the container's forwarded port.
#[derive(Debug, Clone)]
pub struct AnsibleConfigurator {
    binary: String,
    playbook: PathBuf,
    user: String,
    timeout_secs: Option<u64>,
}

impl AnsibleConfigurator {
    pub fn new(binary: impl Into<String>, playbook: impl Into<PathBuf>, user: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            playbook: playbook.into(),
            user: user.into(),
            timeout_secs: None,
        }
    }

    pub fn with_timeout(mut self, timeout_secs: Option<u64>) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn from_settings(settings: &AnsibleSettings) -> Result<Self> {
        let playbook = settings.playbook.clone().ok_or_else(|| {
            DockError::Config("ansible.playbook is required with the ansible initializer".into())
        })?;
        Ok(Self::new(&settings.binary, playbook, &settings.user).with_timeout(settings.timeout_secs))
    }

    /// Arguments passed to the playbook runner for `target`.
    pub fn args(&self, target: &PostBootTarget<'_>) -> Vec<String> {
        vec![
            "-i".to_string(),
            format!("{},", target.address),
            "-u".to_string(),
            self.user.clone(),
            "-e".to_string(),
            format!("ansible_port={}", target.port),
            "-e".to_string(),
            format!("machine_name={}", target.name),
            "-e".to_string(),
            format!("@{}", target.payload.display()),
            self.playbook.to_string_lossy().into_owned(),
        ]
    }
}

impl PostConfigurator for AnsibleConfigurator {
    fn name(&self) -> &'static str {
        "ansible"
    }

    fn apply(&self, target: &PostBootTarget<'_>) -> Result<()> {
        let args = self.args(target);
        info!(
            "Configuring {} through {}:{}",
            target.name, target.address, target.port
        );
        debug!("Running {}", command_line(&self.binary, &args));
        stream_command_with_timeout(&self.binary, &args, self.timeout_secs)
            .map_err(|e| DockError::PostConfigurationFailed(e.to_string()))
    }
}

#[derive(Clone)]
pub enum BootStrategy {
    CloudInit {
        command: BootCommand,
    },
    ExternalConfigurator {
        command: BootCommand,
        configurator: Arc<dyn PostConfigurator>,
    },
}

impl fmt::Debug for BootStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootStrategy::CloudInit { command } => f
                .debug_struct("CloudInit")
                .field("command", command)
                .finish(),
            BootStrategy::ExternalConfigurator {
                command,
                configurator,
            } => f
                .debug_struct("ExternalConfigurator")
                .field("command", command)
                .field("configurator", &configurator.name())
                .finish(),
        }
    }
}

impl BootStrategy {
    pub fn cloud_init(boot: &BootSettings) -> Self {
        BootStrategy::CloudInit {
            command: BootCommand::shell(&boot.shell, &boot.cloud_init_command),
        }
    }

    pub fn external(boot: &BootSettings, configurator: Arc<dyn PostConfigurator>) -> Self {
        BootStrategy::ExternalConfigurator {
            command: BootCommand::shell(&boot.shell, &boot.agent_command),
            configurator,
        }
    }

    pub fn from_config(config: &ManagerConfig) -> Result<Self> {
        match config.boot.initializer {
            InitializerKind::CloudInit => Ok(Self::cloud_init(&config.boot)),
            InitializerKind::Ansible => {
                let configurator = AnsibleConfigurator::from_settings(&config.ansible)?;
                Ok(Self::external(&config.boot, Arc::new(configurator)))
            }
        }
    }

    pub fn kind(&self) -> InitializerKind {
        match self {
            BootStrategy::CloudInit { .. } => InitializerKind::CloudInit,
            BootStrategy::ExternalConfigurator { .. } => InitializerKind::Ansible,
        }
    }

    pub fn boot_command(&self) -> &BootCommand {
        match self {
            BootStrategy::CloudInit { command } => command,
            BootStrategy::ExternalConfigurator { command, .. } => command,
        }
    }

    /// Post-boot pass. A no-op for cloud-init containers.
    ///
    /// Failures are always `PostConfigurationFailed`.
    pub fn after_boot(&self, target: &PostBootTarget<'_>) -> Result<()> {
        match self {
            BootStrategy::CloudInit { .. } => {
                debug!("{} configures itself through cloud-init", target.name);
                Ok(())
            }
            BootStrategy::ExternalConfigurator { configurator, .. } => {
                configurator.apply(target).map_err(|e| match e.kind() {
                    ErrorKind::PostConfigurationFailed => e,
                    _ => DockError::PostConfigurationFailed(e.to_string()),
                })
            }
        }
    }
}
