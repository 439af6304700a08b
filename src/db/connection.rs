//! Connection credentials and connection management.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::backend::{Connection, DatabaseClient};
use crate::error::BridgeError;

/// The three values needed to log on to a datasource.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub datasource_name: String,
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(
        datasource_name: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            datasource_name: datasource_name.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Build credentials from startup arguments: datasource, username, password.
    ///
    /// Missing trailing arguments stay empty; extra arguments are ignored.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Self {
        let arg = |i: usize| args.get(i).map(|s| s.as_ref().to_string()).unwrap_or_default();
        Self {
            datasource_name: arg(0),
            username: arg(1),
            password: arg(2),
        }
    }

    /// Replace one field by its configuration name.
    ///
    /// Returns false if `name` is not a credential field.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> bool {
        let field = match name {
            "datasource_name" | "datasourceName" | "odbcName" => &mut self.datasource_name,
            "username" => &mut self.username,
            "password" => &mut self.password,
            _ => return false,
        };
        *field = value.into();
        true
    }
}

// The password never reaches logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("datasource_name", &self.datasource_name)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Log on through `client`, converting a client failure into `BridgeError::Connection`.
pub fn open_connection(
    client: &mut dyn DatabaseClient,
    credentials: &Credentials,
) -> Result<Box<dyn Connection>, BridgeError> {
    client
        .connect(credentials)
        .map_err(|source| BridgeError::Connection {
            datasource: credentials.datasource_name.clone(),
            source,
        })
}
