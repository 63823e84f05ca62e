//! The user registry subsystem.

use berth_config::AuthSettings;
use serde_json::Value;
use tracing::{info, warn};

use crate::database::Database;
use crate::subsystems::{PortServer, SubsystemError, UserSubsystem};

const USERS_TARGET: &str = "berth::users";

/// One known panel user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    username: String,
}

impl UserRecord {
    /// The user's login name.
    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_str()
    }
}

/// System implementation of the user registry.
///
/// Initialisation validates the auth material and claims the `users` API
/// segment; loading pulls the `users` collection from the database,
/// skipping malformed records with a logged warning rather than failing
/// the whole load.
#[derive(Debug, Default)]
pub struct UserDirectory {
    auth: Option<AuthSettings>,
    users: Vec<UserRecord>,
}

impl UserDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Users loaded from the database.
    #[must_use]
    pub fn users(&self) -> &[UserRecord] {
        &self.users
    }

    /// Auth material received during initialisation.
    #[must_use]
    pub const fn auth(&self) -> Option<&AuthSettings> {
        self.auth.as_ref()
    }
}

impl UserSubsystem for UserDirectory {
    fn initialize(
        &mut self,
        _database: &dyn Database,
        api: &mut dyn PortServer,
        auth: &AuthSettings,
    ) -> Result<(), SubsystemError> {
        if auth.secret().is_empty() {
            return Err(SubsystemError::new(
                "users",
                "initialize",
                "auth secret must not be empty",
            ));
        }
        if auth.expires_in().is_empty() {
            return Err(SubsystemError::new(
                "users",
                "initialize",
                "token lifetime must not be empty",
            ));
        }
        api.mount("users")?;
        self.auth = Some(auth.clone());
        Ok(())
    }

    fn load(&mut self, database: &dyn Database) -> Result<(), SubsystemError> {
        let records = database.records("users")?;
        self.users = records
            .iter()
            .filter_map(|record| match record.get("username").and_then(Value::as_str) {
                Some(username) if !username.is_empty() => Some(UserRecord {
                    username: username.to_owned(),
                }),
                _ => {
                    warn!(target: USERS_TARGET, ?record, "skipping malformed user record");
                    None
                }
            })
            .collect();
        info!(target: USERS_TARGET, count = self.users.len(), "users loaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use berth_config::Settings;
    use serde_json::{Value, json};

    use super::{UserDirectory, UserSubsystem};
    use crate::database::Database;
    use crate::subsystems::SubsystemError;
    use crate::transport::NetServer;

    struct StubDatabase {
        users: Vec<Value>,
    }

    impl Database for StubDatabase {
        fn load(&mut self) -> Result<(), SubsystemError> {
            Ok(())
        }

        fn close(&mut self) -> Result<(), SubsystemError> {
            Ok(())
        }

        fn records(&self, collection: &str) -> Result<Vec<Value>, SubsystemError> {
            if collection == "users" {
                Ok(self.users.clone())
            } else {
                Ok(Vec::new())
            }
        }
    }

    fn auth_settings(secret: &str) -> berth_config::AuthSettings {
        let settings: Settings = serde_json::from_str(
            &json!({"api": {"auth": {"secret": secret, "expiresIn": "5d"}}}).to_string(),
        )
        .expect("settings parse");
        settings.api().auth().clone()
    }

    #[test]
    fn initialize_claims_the_users_segment() {
        let mut directory = UserDirectory::new();
        let mut api = NetServer::new("api");
        let database = StubDatabase { users: Vec::new() };

        directory
            .initialize(&database, &mut api, &auth_settings("a-secret"))
            .expect("initialize users");
        assert!(api.segments().contains("users"));
        assert!(directory.auth().is_some());
    }

    #[test]
    fn initialize_rejects_empty_secret() {
        let mut directory = UserDirectory::new();
        let mut api = NetServer::new("api");
        let database = StubDatabase { users: Vec::new() };

        let err = directory
            .initialize(&database, &mut api, &auth_settings(""))
            .expect_err("empty secret must fail");
        assert_eq!(err.subsystem(), "users");
    }

    #[test]
    fn load_skips_malformed_records() {
        let mut directory = UserDirectory::new();
        let database = StubDatabase {
            users: vec![
                json!({"username": "ada"}),
                json!({"username": 42}),
                json!({"name": "no-username"}),
                json!({"username": "grace"}),
            ],
        };

        directory.load(&database).expect("load users");
        let usernames: Vec<&str> = directory
            .users()
            .iter()
            .map(super::UserRecord::username)
            .collect();
        assert_eq!(usernames, ["ada", "grace"]);
    }
}
