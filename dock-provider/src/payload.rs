//! Boot payload: the machine configuration a container consumes at first boot.
//!
//! Rendering is delegated to a [`BootConfigRenderer`]. The writer only
//! persists the rendered bytes as `cloud-init` inside the workspace.

// Standard library
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// External crates
use serde::{Deserialize, Serialize};
use tracing::debug;

// Internal imports
use crate::naming::{is_machine_id, machine_tag};
use crate::workspace::PAYLOAD_FILE;
use dock_config::InitializerKind;
use dock_core::{DockError, ErrorKind, Result};

/// Everything the machine agent needs to join the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MachineConfig {
    pub machine_id: String,
    pub machine_nonce: String,
    pub tools_url: String,
    pub tools_version: String,
    pub state_addresses: Vec<String>,
    pub api_addresses: Vec<String>,
    pub ca_cert: String,
    pub password: String,
    pub data_dir: PathBuf,
    pub authorized_keys: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apt_proxy: Option<String>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            machine_id: String::new(),
            machine_nonce: String::new(),
            tools_url: String::new(),
            tools_version: String::new(),
            state_addresses: Vec::new(),
            api_addresses: Vec::new(),
            ca_cert: String::new(),
            password: String::new(),
            data_dir: PathBuf::from("/var/lib/dock-agent"),
            authorized_keys: Vec::new(),
            apt_proxy: None,
        }
    }
}

fn missing(what: &str) -> DockError {
    DockError::Config(format!("invalid machine configuration: missing {}", what))
}

impl MachineConfig {
    pub fn from_yaml_str(input: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(input)?)
    }

    pub fn validate(&self) -> Result<()> {
        if !is_machine_id(&self.machine_id) {
            return Err(DockError::Config(format!(
                "invalid machine configuration: bad machine id '{}'",
                self.machine_id
            )));
        }
        if self.data_dir.as_os_str().is_empty() {
            return Err(missing("data directory"));
        }
        if self.tools_url.is_empty() {
            return Err(missing("tools URL"));
        }
        if self.state_addresses.is_empty() {
            return Err(missing("state hosts"));
        }
        if self.api_addresses.is_empty() {
            return Err(missing("API hosts"));
        }
        if self.ca_cert.is_empty() {
            return Err(missing("CA certificate"));
        }
        if self.machine_nonce.is_empty() {
            return Err(missing("machine nonce"));
        }
        Ok(())
    }

    /// Shared tools directory for the configured tools version.
    pub fn tools_dir(&self) -> PathBuf {
        let version = if self.tools_version.is_empty() {
            "current"
        } else {
            self.tools_version.as_str()
        };
        self.data_dir.join("tools").join(version)
    }

    /// Directory holding the agent configuration for `tag`.
    pub fn agent_dir(&self, tag: &str) -> PathBuf {
        self.data_dir.join("agents").join(tag)
    }
}

/// Produces the serialized boot payload for a machine.
pub trait BootConfigRenderer: Send + Sync {
    fn render(&self, config: &MachineConfig) -> Result<Vec<u8>>;
}

fn shquote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

#[derive(Serialize)]
struct AgentConf<'a> {
    tag: &'a str,
    nonce: &'a str,
    data_dir: &'a Path,
    state_addresses: &'a [String],
    api_addresses: &'a [String],
    ca_cert: &'a str,
    old_password: &'a str,
}

#[derive(Serialize)]
struct WriteFile {
    path: String,
    permissions: String,
    content: String,
}

#[derive(Serialize)]
struct CloudConfig<'a> {
    #[serde(skip_serializing_if = "no_keys")]
    ssh_authorized_keys: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    apt_proxy: Option<&'a str>,
    write_files: Vec<WriteFile>,
    runcmd: Vec<String>,
}

fn no_keys(keys: &&[String]) -> bool {
    keys.is_empty()
}

/// Renders a `#cloud-config` document.
#[derive(Debug, Clone, Copy, Default)]
pub struct CloudConfigRenderer;

impl BootConfigRenderer for CloudConfigRenderer {
    fn render(&self, config: &MachineConfig) -> Result<Vec<u8>> {
        config.validate()?;
        let tag = machine_tag(&config.machine_id)?;

        let agent_conf = serde_yaml_ng::to_string(&AgentConf {
            tag: &tag,
            nonce: &config.machine_nonce,
            data_dir: &config.data_dir,
            state_addresses: &config.state_addresses,
            api_addresses: &config.api_addresses,
            ca_cert: &config.ca_cert,
            old_password: &config.password,
        })?;

        let tools_dir = config.tools_dir().to_string_lossy().into_owned();
        let agent_conf_path = config.agent_dir(&tag).join("agent.conf");
        let data_dir = config.data_dir.to_string_lossy();

        let runcmd = vec![
            format!("mkdir -p {}", shquote(&tools_dir)),
            format!(
                "curl -sSf -o {} {}",
                shquote(&format!("{}/tools.tar.gz", tools_dir)),
                shquote(&config.tools_url)
            ),
            format!(
                "tar zxf {} -C {}",
                shquote(&format!("{}/tools.tar.gz", tools_dir)),
                shquote(&tools_dir)
            ),
            format!(
                "{} machine --data-dir {} --machine-id {}",
                shquote(&format!("{}/machine-agent", tools_dir)),
                shquote(&data_dir),
                shquote(&config.machine_id)
            ),
            "ifconfig".to_string(),
        ];

        let document = CloudConfig {
            ssh_authorized_keys: &config.authorized_keys,
            apt_proxy: config.apt_proxy.as_deref(),
            write_files: vec![WriteFile {
                path: agent_conf_path.to_string_lossy().into_owned(),
                permissions: "0600".to_string(),
                content: agent_conf,
            }],
            runcmd,
        };

        let mut out = b"#cloud-config\n".to_vec();
        out.extend_from_slice(serde_yaml_ng::to_string(&document)?.as_bytes());
        Ok(out)
    }
}

#[derive(Serialize)]
struct AnsibleVars<'a> {
    authorized_keys: String,
    data_dir: &'a Path,
    agent_bin: PathBuf,
    tools_url: &'a str,
    tools_dir: PathBuf,
    machine_id: &'a str,
    machine_tag: &'a str,
    machine_nonce: &'a str,
    oldpassword: &'a str,
    state_addresses: &'a [String],
    api_addresses: &'a [String],
    ca_cert: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    apt_proxy: Option<&'a str>,
    update_cache: bool,
}

/// Renders flat YAML variables for the external playbook.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnsibleVarsRenderer;

impl BootConfigRenderer for AnsibleVarsRenderer {
    fn render(&self, config: &MachineConfig) -> Result<Vec<u8>> {
        config.validate()?;
        let tag = machine_tag(&config.machine_id)?;
        let vars = AnsibleVars {
            authorized_keys: config.authorized_keys.join("\n"),
            data_dir: &config.data_dir,
            agent_bin: config.tools_dir(),
            tools_url: &config.tools_url,
            tools_dir: config.agent_dir(&tag).join("tools"),
            machine_id: &config.machine_id,
            machine_tag: &tag,
            machine_nonce: &config.machine_nonce,
            oldpassword: &config.password,
            state_addresses: &config.state_addresses,
            api_addresses: &config.api_addresses,
            ca_cert: &config.ca_cert,
            apt_proxy: config.apt_proxy.as_deref(),
            update_cache: true,
        };
        Ok(serde_yaml_ng::to_string(&vars)?.into_bytes())
    }
}

/// Default renderer for an initializer.
pub fn renderer_for(initializer: InitializerKind) -> Arc<dyn BootConfigRenderer> {
    match initializer {
        InitializerKind::CloudInit => Arc::new(CloudConfigRenderer),
        InitializerKind::Ansible => Arc::new(AnsibleVarsRenderer),
    }
}

#[cfg(unix)]
fn payload_options() -> OpenOptions {
    use std::os::unix::fs::OpenOptionsExt;
    let mut options = OpenOptions::new();
    options.write(true).create_new(true).mode(0o644);
    options
}

#[cfg(not(unix))]
fn payload_options() -> OpenOptions {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    options
}

/// Renders `config` and writes it to `<workspace>/cloud-init`.
///
/// Any renderer failure is reported as a configuration error.
pub fn write_payload(
    workspace: &Path,
    renderer: &dyn BootConfigRenderer,
    config: &MachineConfig,
) -> Result<PathBuf> {
    let bytes = renderer.render(config).map_err(|e| match e.kind() {
        ErrorKind::Config => e,
        _ => DockError::Config(e.to_string()),
    })?;

    let path = workspace.join(PAYLOAD_FILE);
    let mut file = payload_options()
        .open(&path)
        .map_err(|e| DockError::io(&path, e))?;
    file.write_all(&bytes).map_err(|e| DockError::io(&path, e))?;
    file.sync_all().map_err(|e| DockError::io(&path, e))?;

    debug!("Wrote {} byte boot payload to {}", bytes.len(), path.display());
    Ok(path)
}
