//! The managed-daemon registry subsystem.

use serde_json::Value;
use tracing::{info, warn};

use crate::database::Database;
use crate::subsystems::{DaemonSubsystem, PortServer, SubsystemError};

const DAEMONS_TARGET: &str = "berth::daemons";

/// One managed daemon known to the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonRecord {
    name: String,
    address: Option<String>,
}

impl DaemonRecord {
    /// Unique daemon name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Last known network address, when one has been recorded.
    #[must_use]
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }
}

/// System implementation of the managed-daemon registry.
///
/// Initialisation claims the `daemons` segment on both servers: machines
/// connect through the daemon server, while the panel inspects them
/// through the API server.
#[derive(Debug, Default)]
pub struct DaemonDirectory {
    daemons: Vec<DaemonRecord>,
}

impl DaemonDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Daemons loaded from the database.
    #[must_use]
    pub fn daemons(&self) -> &[DaemonRecord] {
        &self.daemons
    }
}

impl DaemonSubsystem for DaemonDirectory {
    fn initialize(
        &mut self,
        _database: &dyn Database,
        daemon_server: &mut dyn PortServer,
        api: &mut dyn PortServer,
    ) -> Result<(), SubsystemError> {
        daemon_server.mount("daemons")?;
        api.mount("daemons")?;
        Ok(())
    }

    fn load(&mut self, database: &dyn Database) -> Result<(), SubsystemError> {
        let records = database.records("daemons")?;
        self.daemons = records
            .iter()
            .filter_map(|record| match record.get("name").and_then(Value::as_str) {
                Some(name) if !name.is_empty() => Some(DaemonRecord {
                    name: name.to_owned(),
                    address: record
                        .get("address")
                        .and_then(Value::as_str)
                        .map(str::to_owned),
                }),
                _ => {
                    warn!(target: DAEMONS_TARGET, ?record, "skipping malformed daemon record");
                    None
                }
            })
            .collect();
        info!(target: DAEMONS_TARGET, count = self.daemons.len(), "daemons loaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::{DaemonDirectory, DaemonSubsystem};
    use crate::database::Database;
    use crate::subsystems::SubsystemError;
    use crate::transport::NetServer;

    struct StubDatabase {
        daemons: Vec<Value>,
    }

    impl Database for StubDatabase {
        fn load(&mut self) -> Result<(), SubsystemError> {
            Ok(())
        }

        fn close(&mut self) -> Result<(), SubsystemError> {
            Ok(())
        }

        fn records(&self, collection: &str) -> Result<Vec<Value>, SubsystemError> {
            if collection == "daemons" {
                Ok(self.daemons.clone())
            } else {
                Ok(Vec::new())
            }
        }
    }

    #[test]
    fn initialize_claims_segments_on_both_servers() {
        let mut directory = DaemonDirectory::new();
        let mut daemon_server = NetServer::new("daemon");
        let mut api = NetServer::new("api");
        let database = StubDatabase {
            daemons: Vec::new(),
        };

        directory
            .initialize(&database, &mut daemon_server, &mut api)
            .expect("initialize daemons");
        assert!(daemon_server.segments().contains("daemons"));
        assert!(api.segments().contains("daemons"));
    }

    #[test]
    fn load_reads_names_and_optional_addresses() {
        let mut directory = DaemonDirectory::new();
        let database = StubDatabase {
            daemons: vec![
                json!({"name": "worker-1", "address": "10.0.0.5:9000"}),
                json!({"name": "worker-2"}),
                json!({"address": "unnamed"}),
            ],
        };

        directory.load(&database).expect("load daemons");
        assert_eq!(directory.daemons().len(), 2);
        let first = directory.daemons().first().expect("first daemon");
        assert_eq!(first.name(), "worker-1");
        assert_eq!(first.address(), Some("10.0.0.5:9000"));
    }
}
