//! Docker CLI engine.

use std::path::PathBuf;

use chrono::DateTime;
use serde::Deserialize;
use tracing::{debug, warn};

use dock_config::EngineSettings;
use dock_core::CommandError;

use super::command::EngineCommand;
use super::{ContainerEngine, EngineContainer, EngineError, RunSpec};

/// Drives the `docker` binary.
#[derive(Debug, Clone)]
pub struct DockerEngine {
    binary: String,
    containers_dir: PathBuf,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectRecord {
    id: String,
    created: String,
    #[serde(default)]
    path: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    name: String,
    config: InspectConfig,
    state: InspectState,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectConfig {
    #[serde(default)]
    hostname: String,
    image: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectState {
    #[serde(default)]
    status: String,
}

impl InspectRecord {
    fn into_container(self) -> Result<EngineContainer, String> {
        let created = DateTime::parse_from_rfc3339(&self.created)
            .map_err(|e| format!("bad creation time '{}': {}", self.created, e))?
            .timestamp();

        let name = if self.config.hostname.is_empty() {
            self.name.trim_start_matches('/').to_string()
        } else {
            self.config.hostname
        };

        let mut command = self.path;
        for arg in &self.args {
            command.push(' ');
            command.push_str(arg);
        }

        Ok(EngineContainer {
            id: self.id,
            name,
            image: self.config.image,
            created,
            status: self.state.status,
            command,
        })
    }
}

/// Parses `docker inspect` output, skipping records that do not fit.
fn parse_inspect(output: &str) -> Result<Vec<EngineContainer>, EngineError> {
    let records: Vec<serde_json::Value> = serde_json::from_str(output)
        .map_err(|e| EngineError::Parse(format!("docker inspect: {}", e)))?;

    let mut containers = Vec::with_capacity(records.len());
    for record in records {
        let id = record
            .get("Id")
            .and_then(|v| v.as_str())
            .unwrap_or("<unknown>")
            .to_string();
        let parsed = serde_json::from_value::<InspectRecord>(record)
            .map_err(|e| e.to_string())
            .and_then(InspectRecord::into_container);
        match parsed {
            Ok(container) => containers.push(container),
            Err(e) => warn!("Skipping malformed container record {}: {}", id, e),
        }
    }
    Ok(containers)
}

impl DockerEngine {
    pub fn new(binary: impl Into<String>, containers_dir: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            containers_dir: containers_dir.into(),
            timeout_secs: None,
        }
    }

    pub fn from_settings(settings: &EngineSettings) -> Self {
        let mut engine = Self::new(&settings.binary, &settings.containers_dir);
        engine.timeout_secs = settings.command_timeout_secs;
        engine
    }

    fn command(&self) -> EngineCommand {
        EngineCommand::new(&self.binary).timeout(self.timeout_secs)
    }
}

impl ContainerEngine for DockerEngine {
    fn name(&self) -> &'static str {
        "docker"
    }

    fn run(&self, spec: &RunSpec) -> Result<(), EngineError> {
        // docker prints the new id; it is logged, correlation goes through the listing.
        self.command()
            .subcommand("run")
            .args(spec.to_args())
            .execute()?;
        Ok(())
    }

    fn list_containers(&self) -> Result<Vec<EngineContainer>, EngineError> {
        let ids = self
            .command()
            .subcommand("ps")
            .args(["-a", "-q", "--no-trunc"])
            .execute_with_output()?;
        let ids: Vec<&str> = ids.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let output = self
            .command()
            .subcommand("inspect")
            .args(ids.iter().copied())
            .execute_raw()?;
        // A container removed between ps and inspect makes inspect exit non-zero
        // while still printing the others.
        if !output.success() {
            debug!("docker inspect partially failed: {}", output.stderr.trim());
            if output.stdout.trim().is_empty() {
                return Err(EngineError::Command(CommandError::Failed {
                    command: format!("{} inspect", self.binary),
                    code: output.code,
                    output: output.stderr.trim().to_string(),
                }));
            }
        }
        parse_inspect(&output.stdout)
    }

    fn stop(&self, id: &str) -> Result<(), EngineError> {
        self.command().subcommand("stop").arg(id).execute()?;
        Ok(())
    }

    fn remove(&self, id: &str) -> Result<(), EngineError> {
        self.command().subcommand("rm").arg(id).execute()?;
        Ok(())
    }

    fn log_path(&self, id: &str) -> PathBuf {
        self.containers_dir
            .join(id)
            .join(format!("{}-json.log", id))
    }
}
