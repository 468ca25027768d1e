//! Container identity resolution.
//!
//! The engine picks container ids, so a new container is found again by its
//! image tag and recency, narrowed by command line and hostname when the
//! engine reports them. The listing is a point-in-time snapshot: a concurrent
//! start with the same image can still win the race.
//!
//! Two candidates with the same newest creation time are never guessed
//! between; the lookup fails as ambiguous.

use tracing::debug;

use dock_core::{DockError, Result};

use crate::engine::{ContainerEngine, EngineContainer};

fn newest<'c, I>(candidates: I, what: &str) -> Result<Option<&'c EngineContainer>>
where
    I: IntoIterator<Item = &'c EngineContainer>,
{
    let mut best: Option<&EngineContainer> = None;
    let mut tied = false;
    for candidate in candidates {
        match best {
            Some(current) if candidate.created < current.created => {}
            Some(current) if candidate.created == current.created => tied = true,
            _ => {
                best = Some(candidate);
                tied = false;
            }
        }
    }
    match best {
        Some(container) if tied => Err(DockError::NotFound(format!(
            "ambiguous match for {}: several containers created at {}",
            what, container.created
        ))),
        other => Ok(other),
    }
}

/// Newest container with exactly `image`.
///
/// `command` and `hostname` narrow the match when given; containers for which
/// the engine reported no command or name are not excluded by them.
pub fn resolve_newest<'c>(
    containers: &'c [EngineContainer],
    image: &str,
    command: Option<&str>,
    hostname: Option<&str>,
) -> Result<&'c EngineContainer> {
    let candidates = containers.iter().filter(|c| {
        c.image == image
            && command.map_or(true, |cmd| c.command.is_empty() || c.command == cmd)
            && hostname.map_or(true, |host| c.name.is_empty() || c.name == host)
    });

    newest(candidates, &format!("image {}", image))?
        .ok_or_else(|| DockError::NotFound(format!("no container found with image {}", image)))
}

/// Every container whose reported name is `name`, in listing order.
pub fn containers_named<'c>(
    containers: &'c [EngineContainer],
    name: &str,
) -> Vec<&'c EngineContainer> {
    containers.iter().filter(|c| c.name == name).collect()
}

/// Container with id `id`, or the only one whose id starts with it.
pub fn find_by_engine_id<'c>(
    containers: &'c [EngineContainer],
    id: &str,
) -> Option<&'c EngineContainer> {
    if id.is_empty() {
        return None;
    }
    if let Some(exact) = containers.iter().find(|c| c.id == id) {
        return Some(exact);
    }
    let mut prefixed = containers.iter().filter(|c| c.id.starts_with(id));
    match (prefixed.next(), prefixed.next()) {
        (Some(only), None) => Some(only),
        _ => None,
    }
}

/// Lists the engine's containers and resolves the newest match to its id.
///
/// A failed listing is an `EngineQuery` error.
pub fn resolve_newest_id(
    engine: &dyn ContainerEngine,
    image: &str,
    command: Option<&str>,
    hostname: Option<&str>,
) -> Result<String> {
    let containers = engine
        .list_containers()
        .map_err(|e| DockError::EngineQuery(e.to_string()))?;
    let container = resolve_newest(&containers, image, command, hostname)?;
    debug!(
        "Resolved image {} to container {} created at {}",
        image, container.id, container.created
    );
    Ok(container.id.clone())
}
