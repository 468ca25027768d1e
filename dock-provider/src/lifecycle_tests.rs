#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::fs;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use tempfile::TempDir;

    use dock_config::{ManagerConfig, ReleasePolicy};
    use dock_core::{DockError, ErrorKind, Result, Step};
    use dock_ports::{MemoryCounter, PortAllocator};

    use crate::boot::{BootStrategy, PostBootTarget, PostConfigurator};
    use crate::engine::mock::MockEngine;
    use crate::engine::{ContainerEngine, EngineContainer, NetworkConfig};
    use crate::instance::Instance;
    use crate::lifecycle::DockManager;
    use crate::payload::{BootConfigRenderer, CloudConfigRenderer, MachineConfig};
    use crate::workspace::{CONSOLE_LOG, PAYLOAD_FILE, PORT_FILE};
    use crate::ContainerManager;

    struct Fixture {
        dir: TempDir,
        engine: Arc<MockEngine>,
        manager: DockManager,
    }

    impl Fixture {
        fn containers(&self) -> std::path::PathBuf {
            self.dir.path().join("containers")
        }

        fn removed(&self) -> std::path::PathBuf {
            self.dir.path().join("removed")
        }
    }

    fn test_config(dir: &Path) -> ManagerConfig {
        let mut config = ManagerConfig::default();
        config.containers_dir = dir.join("containers");
        config.removed_containers_dir = dir.join("removed");
        config.log_dir = dir.join("logs");
        config.engine.containers_dir = dir.join("engine");
        config.engine.resolve_delay_ms = 0;
        config
    }

    fn build(config: ManagerConfig, dir: TempDir, engine: Arc<MockEngine>) -> Fixture {
        let counter = Arc::new(MemoryCounter::new(config.ports.seed));
        let ports = PortAllocator::new(counter, &config.ports.counter_key, config.ports.release);
        let manager = DockManager::new(config, engine.clone(), ports)
            .unwrap()
            .with_resolve_delay(Duration::ZERO);
        Fixture {
            dir,
            engine,
            manager,
        }
    }

    fn fixture_with(configure: impl FnOnce(&mut ManagerConfig)) -> Fixture {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(dir.path());
        configure(&mut config);
        let engine = Arc::new(MockEngine::new().with_log_root(dir.path().join("engine")));
        build(config, dir, engine)
    }

    fn fixture() -> Fixture {
        fixture_with(|_| {})
    }

    fn boot_config() -> MachineConfig {
        MachineConfig {
            machine_id: "1/lxc/0".to_string(),
            machine_nonce: "fake-nonce".to_string(),
            tools_url: "https://tools.example.com/tools-1.16.0.tgz".to_string(),
            tools_version: "1.16.0".to_string(),
            state_addresses: vec!["10.0.0.1:37017".to_string()],
            api_addresses: vec!["10.0.0.1:17070".to_string()],
            ca_cert: "-----BEGIN CERTIFICATE-----".to_string(),
            password: "secret".to_string(),
            ..MachineConfig::default()
        }
    }

    fn listed(name: &str, status: &str) -> EngineContainer {
        EngineContainer {
            id: format!("id-{}", name),
            name: name.to_string(),
            image: "base:v1".to_string(),
            created: 1,
            status: status.to_string(),
            command: String::new(),
        }
    }

    /// Fails the first `failures` calls, then succeeds.
    struct FlakyConfigurator {
        failures: usize,
        calls: AtomicUsize,
    }

    impl PostConfigurator for FlakyConfigurator {
        fn name(&self) -> &'static str {
            "flaky"
        }

        fn apply(&self, target: &PostBootTarget<'_>) -> Result<()> {
            assert!(target.payload.ends_with(PAYLOAD_FILE));
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(DockError::PostConfigurationFailed(format!(
                    "{} unreachable on port {}",
                    target.address, target.port
                )))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_start_end_to_end() {
        let fx = fixture();
        let started = fx
            .manager
            .start("1/lxc/0", "base:v1", &boot_config(), &NetworkConfig::Default)
            .unwrap();

        assert_eq!(started.instance.id(), "machine-1-lxc-0");
        assert!(started.is_configured());

        let workspace = fx.containers().join("machine-1-lxc-0");
        assert_eq!(started.workspace, workspace);
        assert!(workspace.join(PAYLOAD_FILE).is_file());

        let link = fs::read_link(workspace.join(CONSOLE_LOG)).unwrap();
        assert_eq!(link, fx.engine.log_path(&started.engine_id));
        assert_eq!(started.instance.engine_id(), Some(started.engine_id.as_str()));

        let port = fs::read_to_string(workspace.join(PORT_FILE)).unwrap();
        assert_eq!(port.trim(), "49999");
        assert_eq!(started.port.get(), 49999);

        let containers = fx.engine.containers();
        assert_eq!(containers.len(), 1);
        assert_eq!(containers[0].image, "base:v1");
        assert_eq!(containers[0].name, "machine-1-lxc-0");
        assert_eq!(
            containers[0].command,
            "/bin/bash -c cloud-init -f /mnt/cloud-init init"
        );
    }

    #[test]
    fn test_payload_matches_renderer_output() {
        let fx = fixture();
        let started = fx
            .manager
            .start("1/lxc/0", "base:v1", &boot_config(), &NetworkConfig::Default)
            .unwrap();

        let written = fs::read(started.workspace.join(PAYLOAD_FILE)).unwrap();
        let expected = CloudConfigRenderer.render(&boot_config()).unwrap();
        assert_eq!(written, expected);
    }

    #[test]
    fn test_payload_carries_started_machine_id() {
        let fx = fixture();
        let mut boot = boot_config();
        boot.machine_id = String::new();
        let started = fx
            .manager
            .start("7", "base:v1", &boot, &NetworkConfig::Default)
            .unwrap();

        let written = fs::read_to_string(started.workspace.join(PAYLOAD_FILE)).unwrap();
        assert!(written.contains("machine-7"));
    }

    #[test]
    fn test_second_start_of_same_machine_is_rejected() {
        let fx = fixture();
        fx.manager
            .start("0", "base:v1", &boot_config(), &NetworkConfig::Default)
            .unwrap();

        let err = fx
            .manager
            .start("0", "base:v1", &boot_config(), &NetworkConfig::Default)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(err.step(), Some(Step::CreateWorkspace));
        assert_eq!(err.machine(), Some("machine-0"));
        assert_eq!(fx.engine.containers().len(), 1);
    }

    #[test]
    fn test_concurrent_starts_of_same_machine() {
        let fx = fixture();
        let boot = boot_config();
        let results: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    s.spawn(|| {
                        fx.manager
                            .start("3", "base:v1", &boot, &NetworkConfig::Default)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        for result in results.iter().filter_map(|r| r.as_ref().err()) {
            assert_eq!(result.kind(), ErrorKind::InvalidInput);
        }
    }

    #[test]
    fn test_concurrent_starts_of_distinct_machines() {
        let fx = fixture();
        let boot = boot_config();
        let results: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = ["10", "11", "12", "13"]
                .into_iter()
                .map(|id| {
                    let fx = &fx;
                    let boot = &boot;
                    s.spawn(move || {
                        fx.manager
                            .start(id, "base:v1", boot, &NetworkConfig::Default)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let ports: HashSet<_> = results
            .iter()
            .map(|r| r.as_ref().unwrap().port)
            .collect();
        assert_eq!(ports.len(), 4);
        assert_eq!(fx.engine.containers().len(), 4);
        for id in ["10", "11", "12", "13"] {
            assert!(fx.containers().join(format!("machine-{}", id)).is_dir());
        }
    }

    #[test]
    fn test_invalid_machine_id() {
        let fx = fixture();
        for bad in ["", "1/LXC/0", "01", "1/lxc", "../1"] {
            let err = fx
                .manager
                .start(bad, "base:v1", &boot_config(), &NetworkConfig::Default)
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput, "{:?}", bad);
            assert_eq!(err.step(), Some(Step::TagMachine));
        }
        assert!(fx.engine.calls().is_empty());
    }

    #[test]
    fn test_missing_image_is_invalid_input() {
        let fx = fixture();
        let err = fx
            .manager
            .start("0", " ", &boot_config(), &NetworkConfig::Default)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(!fx.containers().join("machine-0").exists());
    }

    #[test]
    fn test_invalid_boot_config_leaves_workspace() {
        let fx = fixture();
        let mut boot = boot_config();
        boot.ca_cert.clear();

        let err = fx
            .manager
            .start("0", "base:v1", &boot, &NetworkConfig::Default)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert_eq!(err.step(), Some(Step::WritePayload));
        assert!(fx.containers().join("machine-0").is_dir());

        let retry = fx
            .manager
            .start("0", "base:v1", &boot_config(), &NetworkConfig::Default)
            .unwrap_err();
        assert_eq!(retry.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_silent_run_is_creation_failure() {
        let fx = fixture();
        fx.engine.set_silent_run(true);

        let err = fx
            .manager
            .start("0", "base:v1", &boot_config(), &NetworkConfig::Default)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ContainerCreationFailed);
        assert_eq!(err.step(), Some(Step::ResolveContainer));
        assert!(fx.containers().join("machine-0").join(PAYLOAD_FILE).is_file());
        assert!(!fx.containers().join("machine-0").join(CONSOLE_LOG).exists());
    }

    #[test]
    fn test_resolve_ignores_older_container_with_same_image() {
        let fx = fixture();
        let mut stale = listed("machine-9", "Up 2 days");
        stale.created = 5;
        fx.engine.push_container(stale);
        fx.engine.set_silent_run(true);

        let err = fx
            .manager
            .start("0", "base:v1", &boot_config(), &NetworkConfig::Default)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ContainerCreationFailed);
    }

    #[test]
    fn test_failed_run_is_creation_failure() {
        let fx = fixture();
        fx.engine.set_fail_run(true);

        let err = fx
            .manager
            .start("0", "missing:v1", &boot_config(), &NetworkConfig::Default)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ContainerCreationFailed);
        assert_eq!(err.step(), Some(Step::RunContainer));
        assert!(err.to_string().contains("unable to find image"));
    }

    #[test]
    fn test_post_configuration_failure_keeps_container() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());
        let boot = config.boot.clone();
        let engine = Arc::new(MockEngine::new().with_log_root(dir.path().join("engine")));
        let mut fx = build(config, dir, engine);
        let configurator = Arc::new(FlakyConfigurator {
            failures: 1,
            calls: AtomicUsize::new(0),
        });
        fx.manager = fx
            .manager
            .with_strategy(BootStrategy::external(&boot, configurator.clone()));

        let started = fx
            .manager
            .start("2", "base:v1", &boot_config(), &NetworkConfig::Default)
            .unwrap();
        let failure = started.post_configuration.as_ref().unwrap();
        assert_eq!(failure.kind(), ErrorKind::PostConfigurationFailed);
        assert_eq!(failure.step(), Some(Step::PostConfigure));
        assert_eq!(fx.engine.containers()[0].command, "/bin/bash -c /usr/sbin/sshd -D");
        assert!(started.workspace.join(CONSOLE_LOG).exists());

        fx.manager.configure(&started.instance).unwrap();
        assert_eq!(configurator.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_configure_unknown_instance_is_not_found() {
        let fx = fixture();
        let err = fx
            .manager
            .configure(&Instance::new("machine-5"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let fx = fixture();
        let started = fx
            .manager
            .start("1/lxc/0", "base:v1", &boot_config(), &NetworkConfig::Default)
            .unwrap();

        fx.manager.stop(&started.instance).unwrap();
        assert!(fx.engine.containers().is_empty());
        assert!(!fx.containers().join("machine-1-lxc-0").exists());
        assert!(fx
            .removed()
            .join("machine-1-lxc-0")
            .join(PAYLOAD_FILE)
            .is_file());

        let err = fx.manager.stop(&started.instance).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyStopped);
    }

    #[test]
    fn test_restart_after_stop_keeps_each_workspace() {
        let fx = fixture();
        for _ in 0..2 {
            let started = fx
                .manager
                .start("4", "base:v1", &boot_config(), &NetworkConfig::Default)
                .unwrap();
            fx.manager.stop(&Instance::new(started.instance.name())).unwrap();
        }

        assert!(fx.removed().join("machine-4").is_dir());
        assert!(fx.removed().join("machine-4.1").is_dir());
        assert!(!fx.removed().join("machine-4.2").exists());
    }

    #[test]
    fn test_stop_relocates_even_when_container_is_gone() {
        let fx = fixture();
        fs::create_dir_all(fx.containers().join("machine-6")).unwrap();

        let err = fx.manager.stop(&Instance::new("machine-6")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyStopped);
        assert!(fx.removed().join("machine-6").is_dir());
        assert!(!fx.containers().join("machine-6").exists());
    }

    #[test]
    fn test_failed_remove_still_relocates_and_blocks_restart() {
        let fx = fixture();
        let started = fx
            .manager
            .start("0", "base:v1", &boot_config(), &NetworkConfig::Default)
            .unwrap();
        fx.engine.set_fail_remove(true);

        let err = fx.manager.stop(&started.instance).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ContainerTeardownFailed);
        assert_eq!(err.step(), Some(Step::RemoveContainer));
        assert!(fx.removed().join("machine-0").is_dir());
        assert!(!fx.containers().join("machine-0").exists());

        let blocked = fx
            .manager
            .start("0", "base:v1", &boot_config(), &NetworkConfig::Default)
            .unwrap_err();
        assert_eq!(blocked.kind(), ErrorKind::InvalidInput);

        fx.engine.set_fail_remove(false);
        fx.manager.stop(&started.instance).unwrap();
        assert!(fx.engine.containers().is_empty());

        fx.manager
            .start("0", "base:v1", &boot_config(), &NetworkConfig::Default)
            .unwrap();
    }

    #[test]
    fn test_failed_stop_skips_remove() {
        let fx = fixture();
        let started = fx
            .manager
            .start("0", "base:v1", &boot_config(), &NetworkConfig::Default)
            .unwrap();
        fx.engine.set_fail_stop(true);

        let err = fx.manager.stop(&started.instance).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ContainerTeardownFailed);
        assert_eq!(err.step(), Some(Step::StopContainer));
        assert!(!fx
            .engine
            .calls()
            .iter()
            .any(|call| call.starts_with("remove")));
    }

    #[test]
    fn test_stop_aggregates_teardown_and_relocation_errors() {
        let fx = fixture();
        let started = fx
            .manager
            .start("0", "base:v1", &boot_config(), &NetworkConfig::Default)
            .unwrap();
        fx.engine.set_fail_remove(true);
        fs::write(fx.removed(), "not a directory").unwrap();

        let err = fx.manager.stop(&started.instance).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Aggregate);
        let kinds: Vec<_> = err.errors().iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec![ErrorKind::ContainerTeardownFailed, ErrorKind::Io]);
        assert!(fx.containers().join("machine-0").is_dir());
    }

    #[test]
    fn test_stop_resolves_by_name_without_cached_id() {
        let fx = fixture();
        fx.manager
            .start("8", "base:v1", &boot_config(), &NetworkConfig::Default)
            .unwrap();

        fx.manager.stop(&Instance::new("machine-8")).unwrap();
        assert!(fx.engine.containers().is_empty());
    }

    #[test]
    fn test_stop_with_failed_listing() {
        let fx = fixture();
        fx.engine.set_fail_list(true);

        let err = fx.manager.stop(&Instance::new("machine-0")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EngineQuery);
        assert_eq!(err.step(), Some(Step::ResolveForStop));
    }

    #[test]
    fn test_failed_listing_still_relocates_workspace() {
        let fx = fixture();
        let started = fx
            .manager
            .start("0", "base:v1", &boot_config(), &NetworkConfig::Default)
            .unwrap();
        fx.engine.set_fail_list(true);

        let err = fx.manager.stop(&started.instance).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EngineQuery);
        assert!(!fx.containers().join("machine-0").exists());
        assert!(fx.removed().join("machine-0").is_dir());
        assert!(fx.manager.workspaces().teardown_pending("machine-0").unwrap());

        fx.engine.set_fail_list(false);
        fx.manager.stop(&started.instance).unwrap();
        assert!(fx.engine.containers().is_empty());
        assert!(!fx.manager.workspaces().teardown_pending("machine-0").unwrap());
    }

    #[test]
    fn test_stop_tears_down_every_container_with_the_name() {
        let fx = fixture();
        for id in ["first", "second"] {
            let mut container = listed("machine-5", "Up 1 minute");
            container.id = id.to_string();
            container.created = 10;
            fx.engine.push_container(container);
        }
        fx.manager.workspaces().create("machine-5").unwrap();

        fx.manager.stop(&Instance::new("machine-5")).unwrap();
        assert!(fx.engine.containers().is_empty());
        let calls = fx.engine.calls();
        assert!(calls.contains(&"remove first".to_string()));
        assert!(calls.contains(&"remove second".to_string()));
        assert!(!fx.containers().join("machine-5").exists());
        assert!(fx.removed().join("machine-5").is_dir());
    }

    #[test]
    fn test_list_filters_namespace_and_exited() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(dir.path());
        config.name = Some("ns".to_string());
        let engine = Arc::new(MockEngine::with_containers(vec![
            listed("ns-a", "Up 3 minutes"),
            listed("ns-b", "Exited (0)"),
            listed("other-c", "Up 1 hour"),
        ]));
        let fx = build(config, dir, engine);

        let instances = fx.manager.list().unwrap();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].id(), "ns-a");
        assert_eq!(instances[0].engine_id(), Some("id-ns-a"));
    }

    #[test]
    fn test_list_without_namespace_reports_all_running() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());
        let engine = Arc::new(MockEngine::with_containers(vec![
            listed("ns-a", "Up 3 minutes"),
            listed("ns-b", "exited"),
            listed("other-c", "Up 1 hour"),
        ]));
        let fx = build(config, dir, engine);

        let names: Vec<_> = fx
            .manager
            .list()
            .unwrap()
            .into_iter()
            .map(|i| i.name().to_string())
            .collect();
        assert_eq!(names, vec!["ns-a", "other-c"]);
    }

    #[test]
    fn test_list_skips_malformed_entries() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());
        let mut nameless = listed("", "Up");
        nameless.id = "abc".to_string();
        let mut idless = listed("machine-2", "Up");
        idless.id.clear();
        let engine = Arc::new(MockEngine::with_containers(vec![
            nameless,
            idless,
            listed("machine-3", "Up"),
        ]));
        let fx = build(config, dir, engine);

        let instances = fx.manager.list().unwrap();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].name(), "machine-3");
    }

    #[test]
    fn test_list_engine_failure() {
        let fx = fixture();
        fx.engine.set_fail_list(true);

        let err = fx.manager.list().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EngineQuery);
        assert_eq!(err.step(), Some(Step::ListContainers));
    }

    #[test]
    fn test_namespace_prefixes_names() {
        let fx = fixture_with(|config| config.name = Some("ns".to_string()));
        let started = fx
            .manager
            .start_container("1/lxc/0", "base:v1", &boot_config(), &NetworkConfig::Default)
            .unwrap();
        assert_eq!(started.instance.id(), "ns-machine-1-lxc-0");
        assert!(fx.containers().join("ns-machine-1-lxc-0").is_dir());

        let running = fx.manager.list_containers().unwrap();
        assert_eq!(running, vec![started.instance.clone()]);

        fx.manager.stop_container(&started.instance).unwrap();
        assert!(fx.manager.list_containers().unwrap().is_empty());
    }

    #[test]
    fn test_monotonic_ports_are_never_reused() {
        let fx = fixture();
        let first = fx
            .manager
            .start("0", "base:v1", &boot_config(), &NetworkConfig::Default)
            .unwrap();
        fx.manager.stop(&first.instance).unwrap();
        let second = fx
            .manager
            .start("1", "base:v1", &boot_config(), &NetworkConfig::Default)
            .unwrap();
        assert_eq!(first.port.get(), 49999);
        assert_eq!(second.port.get(), 49998);
    }

    #[test]
    fn test_recycle_policy_reuses_released_port() {
        let fx = fixture_with(|config| config.ports.release = ReleasePolicy::Recycle);
        let first = fx
            .manager
            .start("0", "base:v1", &boot_config(), &NetworkConfig::Default)
            .unwrap();
        let other = fx
            .manager
            .start("1", "base:v1", &boot_config(), &NetworkConfig::Default)
            .unwrap();
        fx.manager.stop(&first.instance).unwrap();

        let reused = fx
            .manager
            .start("2", "base:v1", &boot_config(), &NetworkConfig::Default)
            .unwrap();
        assert_eq!(reused.port, first.port);
        assert_ne!(reused.port, other.port);
    }

    #[test]
    fn test_recycle_releases_port_after_retried_teardown() {
        let fx = fixture_with(|config| config.ports.release = ReleasePolicy::Recycle);
        let first = fx
            .manager
            .start("0", "base:v1", &boot_config(), &NetworkConfig::Default)
            .unwrap();
        fx.manager
            .start("1", "base:v1", &boot_config(), &NetworkConfig::Default)
            .unwrap();

        fx.engine.set_fail_remove(true);
        fx.manager.stop(&first.instance).unwrap_err();
        assert!(!fx.containers().join("machine-0").exists());
        assert_eq!(
            fx.manager.workspaces().pending_port("machine-0").unwrap(),
            Some(first.port)
        );

        fx.engine.set_fail_remove(false);
        fx.manager.stop(&first.instance).unwrap();
        let reused = fx
            .manager
            .start("2", "base:v1", &boot_config(), &NetworkConfig::Default)
            .unwrap();
        assert_eq!(reused.port, first.port);
    }

    #[test]
    fn test_network_is_passed_to_engine() {
        let fx = fixture();
        let network: NetworkConfig = "bridge:lxcbr0".parse().unwrap();
        fx.manager
            .start("0", "base:v1", &boot_config(), &network)
            .unwrap();
        let runs = fx.engine.runs();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].network, NetworkConfig::Bridge("lxcbr0".to_string()));
        let args = runs[0].to_args();
        let flag = args.iter().position(|a| a == "--network").unwrap();
        assert_eq!(args[flag + 1], "lxcbr0");
    }
}
