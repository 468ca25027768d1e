//! Container engine abstraction.
//!
//! The engine assigns container ids itself; nothing here lets the caller pick
//! one. The orchestrator correlates containers back to machines through
//! [`crate::resolver`].

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use dock_core::{CommandError, DockError};
use dock_ports::ForwardedPort;

pub mod command;
#[cfg(feature = "docker")]
pub mod docker;
#[cfg(any(test, feature = "test-helpers"))]
pub mod mock;

/// A container as listed by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineContainer {
    pub id: String,
    /// Hostname or name the engine reports for the container.
    #[serde(default)]
    pub name: String,
    pub image: String,
    /// Creation time in seconds.
    pub created: i64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub command: String,
}

impl EngineContainer {
    /// Whether the status is a terminal one: exited or dead.
    pub fn is_exited(&self) -> bool {
        let status = self.status.trim().to_ascii_lowercase();
        status.contains("exit") || status.starts_with("dead")
    }
}

/// Network attachment of a new container.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NetworkConfig {
    /// The engine's default network.
    #[default]
    Default,
    /// A named bridge network.
    Bridge(String),
    /// The host's network stack.
    Host,
}

impl NetworkConfig {
    /// Value of the engine's `--network` option, if any.
    pub fn network_arg(&self) -> Option<&str> {
        match self {
            NetworkConfig::Default => None,
            NetworkConfig::Bridge(name) => Some(name.as_str()),
            NetworkConfig::Host => Some("host"),
        }
    }
}

impl fmt::Display for NetworkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkConfig::Default => f.write_str("default"),
            NetworkConfig::Bridge(name) => write!(f, "bridge:{}", name),
            NetworkConfig::Host => f.write_str("host"),
        }
    }
}

impl FromStr for NetworkConfig {
    type Err = DockError;

    /// Accepts `default`, `host`, `bridge` and `bridge:<name>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "default" => Ok(NetworkConfig::Default),
            "host" => Ok(NetworkConfig::Host),
            "bridge" => Ok(NetworkConfig::Bridge("bridge".to_string())),
            other => match other.strip_prefix("bridge:") {
                Some(name) if !name.is_empty() => Ok(NetworkConfig::Bridge(name.to_string())),
                _ => Err(DockError::InvalidInput(format!(
                    "unknown network '{}': expected default, host, bridge or bridge:<name>",
                    other
                ))),
            },
        }
    }
}

/// A host directory bind-mounted into the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    pub host: PathBuf,
    pub guest: PathBuf,
}

/// Everything the engine's run primitive needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSpec {
    pub image: String,
    pub hostname: String,
    pub port: ForwardedPort,
    pub service_port: u16,
    pub mounts: Vec<Mount>,
    pub network: NetworkConfig,
    pub command: Vec<String>,
}

impl RunSpec {
    /// Arguments of the run subcommand, detached.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "-d".to_string(),
            "-p".to_string(),
            format!("{}:{}", self.port, self.service_port),
            "-h".to_string(),
            self.hostname.clone(),
        ];
        for mount in &self.mounts {
            args.push("-v".to_string());
            args.push(format!("{}:{}", mount.host.display(), mount.guest.display()));
        }
        if let Some(network) = self.network.network_arg() {
            args.push("--network".to_string());
            args.push(network.to_string());
        }
        args.push(self.image.clone());
        args.extend(self.command.iter().cloned());
        args
    }
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("unexpected engine output: {0}")]
    Parse(String),
}

/// Primitives of a container engine.
pub trait ContainerEngine: Send + Sync {
    fn name(&self) -> &'static str;

    /// Creates and starts a container. Its id is not returned.
    fn run(&self, spec: &RunSpec) -> Result<(), EngineError>;

    /// Every container the engine knows about, running or not.
    fn list_containers(&self) -> Result<Vec<EngineContainer>, EngineError>;

    fn stop(&self, id: &str) -> Result<(), EngineError>;

    fn remove(&self, id: &str) -> Result<(), EngineError>;

    /// Host path of the engine's log file for container `id`.
    fn log_path(&self, id: &str) -> PathBuf;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(network: NetworkConfig) -> RunSpec {
        RunSpec {
            image: "base:v1".to_string(),
            hostname: "machine-0".to_string(),
            port: ForwardedPort::new(49999).unwrap(),
            service_port: 22,
            mounts: vec![Mount {
                host: PathBuf::from("/var/lib/dock/containers/machine-0"),
                guest: PathBuf::from("/mnt"),
            }],
            network,
            command: vec!["/bin/bash".into(), "-c".into(), "/usr/sbin/sshd -D".into()],
        }
    }

    #[test]
    fn test_run_arguments_order() {
        assert_eq!(
            spec(NetworkConfig::Default).to_args(),
            vec![
                "-d",
                "-p",
                "49999:22",
                "-h",
                "machine-0",
                "-v",
                "/var/lib/dock/containers/machine-0:/mnt",
                "base:v1",
                "/bin/bash",
                "-c",
                "/usr/sbin/sshd -D",
            ]
        );
    }

    #[test]
    fn test_network_option_precedes_image() {
        let args = spec(NetworkConfig::Bridge("br0".into())).to_args();
        let network = args.iter().position(|a| a == "--network").unwrap();
        let image = args.iter().position(|a| a == "base:v1").unwrap();
        assert_eq!(args[network + 1], "br0");
        assert!(network < image);
    }

    #[test]
    fn test_network_parsing() {
        assert_eq!("".parse::<NetworkConfig>().unwrap(), NetworkConfig::Default);
        assert_eq!("host".parse::<NetworkConfig>().unwrap(), NetworkConfig::Host);
        assert_eq!(
            "bridge:lxcbr0".parse::<NetworkConfig>().unwrap(),
            NetworkConfig::Bridge("lxcbr0".into())
        );
        assert!("bridge:".parse::<NetworkConfig>().is_err());
        assert!("physical".parse::<NetworkConfig>().is_err());
        assert_eq!(NetworkConfig::Bridge("br0".into()).to_string(), "bridge:br0");
    }

    #[test]
    fn test_exited_status_detection() {
        let mut container = EngineContainer {
            id: "a".into(),
            name: "ns-a".into(),
            image: "x:latest".into(),
            created: 1,
            status: "Up 3 minutes".into(),
            command: String::new(),
        };
        assert!(!container.is_exited());
        container.status = "Exited (0) 2 seconds ago".into();
        assert!(container.is_exited());
        container.status = "exited".into();
        assert!(container.is_exited());
        container.status = "dead".into();
        assert!(container.is_exited());
        container.status = "Dead".into();
        assert!(container.is_exited());
        container.status = "Up 2 hours (healthy)".into();
        assert!(!container.is_exited());
    }
}
