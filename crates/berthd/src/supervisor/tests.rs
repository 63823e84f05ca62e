//! Behaviour tests for the supervisor, driven against recording fakes.
//!
//! Every collaborator journals its calls into a shared log so the tests
//! can assert phase step ordering and fail-fast cut-offs without touching
//! the network.

use std::cell::RefCell;
use std::fs;
use std::rc::Rc;

use berth_config::AuthSettings;
use camino::Utf8PathBuf;
use serde_json::{Value, json};
use tempfile::TempDir;

use super::{HostError, Phase, Subsystems, Supervisor, TeardownPolicy};
use crate::database::{Database, DatabaseTypeRegistry};
use crate::subsystems::{DaemonSubsystem, PortServer, SubsystemError, UserSubsystem};

type Journal = Rc<RefCell<Vec<String>>>;

fn entries(journal: &Journal) -> Vec<String> {
    journal.borrow().clone()
}

// ---------------------------------------------------------------------------
// Recording fakes
// ---------------------------------------------------------------------------

struct FakeServer {
    name: &'static str,
    journal: Journal,
    fail_start: bool,
    fail_close: bool,
}

impl FakeServer {
    fn record(&self, event: &str) {
        self.journal.borrow_mut().push(format!("{}.{event}", self.name));
    }
}

impl PortServer for FakeServer {
    fn initialize(&mut self) -> Result<(), SubsystemError> {
        self.record("initialize");
        Ok(())
    }

    fn mount(&mut self, segment: &str) -> Result<(), SubsystemError> {
        self.record(&format!("mount {segment}"));
        Ok(())
    }

    fn unmount(&mut self, segment: &str) -> Result<(), SubsystemError> {
        self.record(&format!("unmount {segment}"));
        Ok(())
    }

    fn start(&mut self, _port: u16) -> Result<(), SubsystemError> {
        if self.fail_start {
            return Err(SubsystemError::new(self.name, "start", "injected failure"));
        }
        self.record("start");
        Ok(())
    }

    fn close(&mut self) -> Result<(), SubsystemError> {
        if self.fail_close {
            return Err(SubsystemError::new(self.name, "close", "injected failure"));
        }
        self.record("close");
        Ok(())
    }
}

struct FakeUsers {
    journal: Journal,
}

impl UserSubsystem for FakeUsers {
    fn initialize(
        &mut self,
        _database: &dyn Database,
        _api: &mut dyn PortServer,
        _auth: &AuthSettings,
    ) -> Result<(), SubsystemError> {
        self.journal.borrow_mut().push(String::from("users.initialize"));
        Ok(())
    }

    fn load(&mut self, _database: &dyn Database) -> Result<(), SubsystemError> {
        self.journal.borrow_mut().push(String::from("users.load"));
        Ok(())
    }
}

struct FakeDaemons {
    journal: Journal,
}

impl DaemonSubsystem for FakeDaemons {
    fn initialize(
        &mut self,
        _database: &dyn Database,
        _daemon_server: &mut dyn PortServer,
        _api: &mut dyn PortServer,
    ) -> Result<(), SubsystemError> {
        self.journal
            .borrow_mut()
            .push(String::from("daemons.initialize"));
        Ok(())
    }

    fn load(&mut self, _database: &dyn Database) -> Result<(), SubsystemError> {
        self.journal.borrow_mut().push(String::from("daemons.load"));
        Ok(())
    }
}

struct FakeDatabase {
    journal: Journal,
}

impl Database for FakeDatabase {
    fn load(&mut self) -> Result<(), SubsystemError> {
        self.journal.borrow_mut().push(String::from("database.load"));
        Ok(())
    }

    fn close(&mut self) -> Result<(), SubsystemError> {
        self.journal.borrow_mut().push(String::from("database.close"));
        Ok(())
    }

    fn records(&self, _collection: &str) -> Result<Vec<Value>, SubsystemError> {
        Ok(Vec::new())
    }
}

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FixtureOptions {
    policy: TeardownPolicy,
    fail_api_close: bool,
    fail_daemon_start: bool,
    config: Option<String>,
    plugin: Option<(&'static str, String)>,
}

struct HostFixture {
    _dir: TempDir,
    root: Utf8PathBuf,
    journal: Journal,
    supervisor: Supervisor,
}

fn manifest_text(name: &str) -> String {
    json!({
        "name": name,
        "version": "1.0",
        "parts": {},
        "panel": {"platform": "any", "lang": "js", "index": "panel.js"},
        "machine": {"platform": "linux", "lang": "js", "index": "machine.js"}
    })
    .to_string()
}

fn build_host(options: FixtureOptions) -> HostFixture {
    let dir = TempDir::new().expect("create temp dir");
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp path");

    fs::create_dir(root.join("plugins").as_std_path()).expect("create plugin root");
    if let Some((entry, manifest)) = &options.plugin {
        let plugin_dir = root.join("plugins").join(entry);
        fs::create_dir_all(plugin_dir.as_std_path()).expect("create plugin dir");
        fs::write(plugin_dir.join("plugin.json").as_std_path(), manifest)
            .expect("write plugin manifest");
    }

    let config = options
        .config
        .unwrap_or_else(|| json!({"database": {"type": "memory"}}).to_string());
    fs::write(root.join("config.json").as_std_path(), config).expect("write config");

    let journal: Journal = Rc::new(RefCell::new(Vec::new()));

    let mut database_types = DatabaseTypeRegistry::new();
    let constructor_journal = Rc::clone(&journal);
    database_types.register(
        "memory",
        Box::new(move |_, _| {
            constructor_journal
                .borrow_mut()
                .push(String::from("database.open"));
            Ok(Box::new(FakeDatabase {
                journal: Rc::clone(&constructor_journal),
            }))
        }),
    );

    let subsystems = Subsystems {
        api_server: Box::new(FakeServer {
            name: "api",
            journal: Rc::clone(&journal),
            fail_start: false,
            fail_close: options.fail_api_close,
        }),
        daemon_server: Box::new(FakeServer {
            name: "daemon",
            journal: Rc::clone(&journal),
            fail_start: options.fail_daemon_start,
            fail_close: false,
        }),
        users: Box::new(FakeUsers {
            journal: Rc::clone(&journal),
        }),
        daemons: Box::new(FakeDaemons {
            journal: Rc::clone(&journal),
        }),
        database_types,
    };

    let supervisor = Supervisor::new(root.clone(), subsystems).with_teardown_policy(options.policy);
    HostFixture {
        _dir: dir,
        root,
        journal,
        supervisor,
    }
}

// ---------------------------------------------------------------------------
// initialize
// ---------------------------------------------------------------------------

#[test]
fn initialize_wires_subsystems_in_order() {
    let mut host = build_host(FixtureOptions::default());

    host.supervisor.initialize().expect("initialize succeeds");

    assert_eq!(
        entries(&host.journal),
        [
            "api.initialize",
            "daemon.initialize",
            "database.open",
            "users.initialize",
            "daemons.initialize",
        ]
    );
    assert_eq!(host.supervisor.phase(), Phase::Ready);
}

#[test]
fn initialize_twice_is_rejected() {
    let mut host = build_host(FixtureOptions::default());

    host.supervisor.initialize().expect("first initialize");
    let err = host
        .supervisor
        .initialize()
        .expect_err("second initialize must fail");

    assert!(matches!(err, HostError::PhaseOrder(_)));
    assert!(err.to_string().contains("initialize"));
}

#[test]
fn invalid_log_level_fails_before_any_subsystem_is_touched() {
    let mut host = build_host(FixtureOptions {
        config: Some(
            json!({"database": {"type": "memory"}, "logLevel": "chatty"}).to_string(),
        ),
        ..FixtureOptions::default()
    });

    let err = host
        .supervisor
        .initialize()
        .expect_err("invalid level must fail");

    assert!(matches!(
        err,
        HostError::Config(berth_config::ConfigError::UnknownLogLevel { .. })
    ));
    assert!(entries(&host.journal).is_empty());
    assert_eq!(host.supervisor.phase(), Phase::Initializing);
}

#[test]
fn initialize_registers_discovered_plugins() {
    let mut host = build_host(FixtureOptions {
        plugin: Some(("foo", manifest_text("foo"))),
        ..FixtureOptions::default()
    });

    host.supervisor.initialize().expect("initialize succeeds");

    let plugins = host.supervisor.plugins().expect("registry exists");
    assert_eq!(plugins.len(), 1);
    assert!(plugins.get("foo").is_some());
}

// ---------------------------------------------------------------------------
// start
// ---------------------------------------------------------------------------

#[test]
fn start_runs_steps_in_order_and_enables_plugins() {
    let mut host = build_host(FixtureOptions {
        plugin: Some(("foo", manifest_text("foo"))),
        ..FixtureOptions::default()
    });

    host.supervisor.initialize().expect("initialize succeeds");
    host.journal.borrow_mut().clear();
    host.supervisor.start().expect("start succeeds");

    assert_eq!(
        entries(&host.journal),
        [
            "database.load",
            "users.load",
            "daemons.load",
            "daemon.start",
            "api.start",
            "api.mount plugins/foo",
            "daemon.mount plugins/foo",
        ]
    );
    assert_eq!(host.supervisor.phase(), Phase::Running);
}

#[test]
fn start_before_initialize_is_rejected() {
    let mut host = build_host(FixtureOptions::default());

    let err = host.supervisor.start().expect_err("start must fail");
    assert!(matches!(err, HostError::PhaseOrder(_)));
}

#[test]
fn start_failure_aborts_remaining_steps() {
    let mut host = build_host(FixtureOptions {
        fail_daemon_start: true,
        ..FixtureOptions::default()
    });

    host.supervisor.initialize().expect("initialize succeeds");
    let err = host.supervisor.start().expect_err("start must fail");

    assert!(matches!(err, HostError::Subsystem(_)));
    assert!(!entries(&host.journal).contains(&String::from("api.start")));
    assert_eq!(host.supervisor.phase(), Phase::Starting);

    // A host that never reached Running cannot be stopped.
    let err = host
        .supervisor
        .stop("test")
        .expect_err("stop must be rejected");
    assert!(matches!(err, HostError::PhaseOrder(_)));
}

// ---------------------------------------------------------------------------
// stop
// ---------------------------------------------------------------------------

fn run_to_running(host: &mut HostFixture) {
    host.supervisor.initialize().expect("initialize succeeds");
    host.supervisor.start().expect("start succeeds");
    host.journal.borrow_mut().clear();
}

#[test]
fn stop_tears_down_in_reverse_order() {
    let mut host = build_host(FixtureOptions {
        plugin: Some(("foo", manifest_text("foo"))),
        ..FixtureOptions::default()
    });
    run_to_running(&mut host);

    host.supervisor.stop("shutdown requested").expect("stop succeeds");

    assert_eq!(
        entries(&host.journal),
        [
            "api.unmount plugins/foo",
            "daemon.unmount plugins/foo",
            "api.close",
            "daemon.close",
            "database.close",
        ]
    );
    assert_eq!(host.supervisor.phase(), Phase::Stopped);
    let plugins = host.supervisor.plugins().expect("registry exists");
    assert!(plugins.is_empty());
}

#[test]
fn stop_before_start_is_rejected() {
    let mut host = build_host(FixtureOptions::default());
    host.supervisor.initialize().expect("initialize succeeds");

    let err = host
        .supervisor
        .stop("too early")
        .expect_err("stop must fail");
    assert!(matches!(err, HostError::PhaseOrder(_)));
}

#[test]
fn best_effort_stop_attempts_every_step_and_aggregates_failures() {
    let mut host = build_host(FixtureOptions {
        fail_api_close: true,
        policy: TeardownPolicy::BestEffort,
        ..FixtureOptions::default()
    });
    run_to_running(&mut host);

    let err = host
        .supervisor
        .stop("failure drill")
        .expect_err("stop reports the failure");

    match err {
        HostError::Teardown { failures } => assert_eq!(failures.len(), 1),
        other => panic!("expected aggregated teardown error, got {other}"),
    }
    // Later steps still ran despite the API close failure.
    let journal = entries(&host.journal);
    assert!(journal.contains(&String::from("daemon.close")));
    assert!(journal.contains(&String::from("database.close")));
    assert_eq!(host.supervisor.phase(), Phase::Stopped);

    // The configuration save ran too: the minimal fixture document was
    // rewritten with the full snapshot.
    let saved = fs::read_to_string(host.root.join("config.json").as_std_path())
        .expect("read saved config");
    let document: Value = serde_json::from_str(&saved).expect("saved config is JSON");
    assert_eq!(document["api"]["port"], 8080);
}

#[test]
fn fail_fast_stop_aborts_remaining_teardown_steps() {
    let mut host = build_host(FixtureOptions {
        fail_api_close: true,
        policy: TeardownPolicy::FailFast,
        ..FixtureOptions::default()
    });
    run_to_running(&mut host);

    let original_config = fs::read_to_string(host.root.join("config.json").as_std_path())
        .expect("read original config");

    let err = host
        .supervisor
        .stop("failure drill")
        .expect_err("stop surfaces the failure");
    assert!(matches!(err, HostError::Subsystem(_)));

    // Every step after the failing API close was skipped.
    let journal = entries(&host.journal);
    assert!(!journal.contains(&String::from("daemon.close")));
    assert!(!journal.contains(&String::from("database.close")));
    let unchanged = fs::read_to_string(host.root.join("config.json").as_std_path())
        .expect("read config again");
    assert_eq!(unchanged, original_config);
    assert_eq!(host.supervisor.phase(), Phase::Stopping);
}
