// Command handlers

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use dock_config::ManagerConfig;
use dock_core::ErrorKind;
use dock_provider::{ContainerManager, DockManager, Instance, MachineConfig, NetworkConfig};

use crate::cli::Command;

pub fn execute_command(command: Command, config: ManagerConfig) -> Result<()> {
    let manager = dock_provider::docker_manager(config)?;
    debug!("Using {:?}", manager);

    match command {
        Command::Start {
            machine_id,
            image,
            boot,
            network,
        } => handle_start(&manager, &machine_id, &image, &boot, &network),
        Command::Stop { name, engine_id } => handle_stop(&manager, name, engine_id),
        Command::List { json } => handle_list(&manager, json),
        Command::Configure { name } => {
            manager.configure(&Instance::new(name.as_str()))?;
            println!("Configured {}", name);
            Ok(())
        }
    }
}

fn read_boot_config(path: &Path) -> Result<MachineConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read boot configuration {}", path.display()))?;
    MachineConfig::from_yaml_str(&content)
        .with_context(|| format!("Invalid boot configuration {}", path.display()))
}

fn handle_start(
    manager: &DockManager,
    machine_id: &str,
    image: &str,
    boot: &Path,
    network: &str,
) -> Result<()> {
    let network: NetworkConfig = network.parse()?;
    let boot = read_boot_config(boot)?;

    let started = manager.start_container(machine_id, image, &boot, &network)?;
    println!(
        "Started {} (container {}, port {})",
        started.instance.name(),
        started.engine_id,
        started.port
    );
    if let Some(e) = &started.post_configuration {
        warn!("{}", e);
        println!(
            "Configuration of {} failed; retry with `dock configure {}`",
            started.instance.name(),
            started.instance.name()
        );
    }
    Ok(())
}

fn handle_stop(manager: &DockManager, name: String, engine_id: Option<String>) -> Result<()> {
    let mut instance = Instance::new(name);
    if let Some(id) = engine_id {
        instance = instance.with_engine_id(id);
    }

    match manager.stop_container(&instance) {
        Ok(()) => {
            println!("Stopped {}", instance.name());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::AlreadyStopped => {
            println!("{} is already stopped", instance.name());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn handle_list(manager: &DockManager, json: bool) -> Result<()> {
    let instances = manager.list_containers()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&instances)?);
    } else {
        for instance in &instances {
            match instance.engine_id() {
                Some(id) => println!("{}\t{}", instance.name(), id),
                None => println!("{}", instance.name()),
            }
        }
    }
    Ok(())
}
