use std::fs;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use dock_core::{DockError, ErrorKind, Result, Step, StepContext};
use dock_ports::ForwardedPort;

use super::DockManager;
use crate::boot::PostBootTarget;
use crate::engine::{Mount, NetworkConfig, RunSpec};
use crate::instance::Instance;
use crate::naming::LogicalMachine;
use crate::payload::{write_payload, MachineConfig};
use crate::resolver::resolve_newest_id;
use crate::workspace::PAYLOAD_FILE;

/// Outcome of a successful start.
#[derive(Debug)]
pub struct Started {
    pub instance: Instance,
    pub workspace: PathBuf,
    pub port: ForwardedPort,
    pub engine_id: String,
    /// Set when the post-boot pass failed. The container is left running.
    pub post_configuration: Option<DockError>,
}

impl Started {
    pub fn is_configured(&self) -> bool {
        self.post_configuration.is_none()
    }
}

impl DockManager {
    /// Creates and boots the container for `machine_id`.
    ///
    /// Nothing is rolled back on failure: the workspace, payload and port
    /// stay allocated, and a retry for the same machine fails on the
    /// existing workspace.
    pub fn start(
        &self,
        machine_id: &str,
        image: &str,
        boot: &MachineConfig,
        network: &NetworkConfig,
    ) -> Result<Started> {
        let machine = LogicalMachine::new(machine_id, self.config.namespace())
            .in_step(machine_id, Step::TagMachine)?;
        let name = machine.name();
        if image.trim().is_empty() {
            return Err(DockError::InvalidInput("an image is required".into())
                .in_step(name, Step::TagMachine));
        }
        info!("Starting {} from image {}", name, image);

        let workspace = self.workspaces.create(name).in_step(name, Step::CreateWorkspace)?;

        let mut machine_config = boot.clone();
        machine_config.machine_id = machine.machine_id().to_string();
        let payload = write_payload(&workspace, self.renderer.as_ref(), &machine_config)
            .in_step(name, Step::WritePayload)?;

        let port = self.ports.allocate().in_step(name, Step::AllocatePort)?;
        self.workspaces
            .record_port(&workspace, port)
            .in_step(name, Step::AllocatePort)?;
        debug!("{} forwards port {}", name, port);

        let command = self.strategy.boot_command();
        fs::create_dir_all(&self.config.log_dir)
            .map_err(|e| DockError::io(&self.config.log_dir, e))
            .in_step(name, Step::RunContainer)?;
        let spec = RunSpec {
            image: image.to_string(),
            hostname: name.to_string(),
            port,
            service_port: self.config.boot.service_port,
            mounts: vec![
                Mount {
                    host: workspace.clone(),
                    guest: self.config.boot.mount_point.clone(),
                },
                Mount {
                    host: self.config.log_dir.clone(),
                    guest: self.config.boot.guest_log_dir.clone(),
                },
            ],
            network: network.clone(),
            command: command.argv().to_vec(),
        };
        self.engine
            .run(&spec)
            .map_err(|e| DockError::ContainerCreationFailed(e.to_string()))
            .in_step(name, Step::RunContainer)?;

        if !self.resolve_delay.is_zero() {
            std::thread::sleep(self.resolve_delay);
        }
        let command_line = command.command_line();
        let engine_id = resolve_newest_id(
            self.engine.as_ref(),
            image,
            Some(command_line.as_str()),
            Some(name),
        )
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => DockError::ContainerCreationFailed(format!(
                "{} after run; the engine may not have created the container",
                e
            )),
            _ => DockError::ContainerCreationFailed(e.to_string()),
        })
        .in_step(name, Step::ResolveContainer)?;
        debug!("{} runs as engine container {}", name, engine_id);

        self.workspaces
            .link_console_log(&workspace, &self.engine.log_path(&engine_id))
            .in_step(name, Step::LinkConsoleLog)?;

        let target = PostBootTarget {
            name,
            address: self.post_boot_address(),
            port,
            payload: &payload,
        };
        let post_configuration = match self.strategy.after_boot(&target) {
            Ok(()) => None,
            Err(e) => {
                warn!("{} is running but its configuration failed: {}", name, e);
                Some(e.in_step(name, Step::PostConfigure))
            }
        };

        info!("Started {} on port {}", name, port);
        Ok(Started {
            instance: Instance::new(name).with_engine_id(&engine_id),
            workspace,
            port,
            engine_id,
            post_configuration,
        })
    }

    /// Runs the post-boot pass again for a started instance.
    pub fn configure(&self, instance: &Instance) -> Result<()> {
        let name = instance.name();
        let workspace = self.workspaces.path(name);
        let payload = workspace.join(PAYLOAD_FILE);
        if !payload.is_file() {
            return Err(DockError::NotFound(format!(
                "no boot payload at {}",
                payload.display()
            ))
            .in_step(name, Step::PostConfigure));
        }
        let port = self
            .workspaces
            .read_port(&workspace)
            .in_step(name, Step::PostConfigure)?
            .ok_or_else(|| {
                DockError::NotFound(format!("no forwarded port recorded for {}", name))
                    .in_step(name, Step::PostConfigure)
            })?;

        let target = PostBootTarget {
            name,
            address: self.post_boot_address(),
            port,
            payload: &payload,
        };
        self.strategy.after_boot(&target).in_step(name, Step::PostConfigure)?;
        info!("Configured {}", name);
        Ok(())
    }
}
