use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// The port transmission-daemon listens on out of the box.
pub const DEFAULT_PORT: u16 = 9091;

pub const DEFAULT_HOST: &str = "localhost";

/// Where to find a transmission instance, and how to log in to it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Connection {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl Default for Connection {
    fn default() -> Self {
        Connection {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            user: None,
            password: None,
        }
    }
}

/// Connection settings given on the command line. Anything set here
/// wins over the config file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnectionOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl Connection {
    pub fn with_overrides(self, overrides: &ConnectionOverrides) -> Self {
        Connection {
            host: overrides.host.clone().unwrap_or(self.host),
            port: overrides.port.unwrap_or(self.port),
            user: overrides.user.clone().or(self.user),
            password: overrides.password.clone().or(self.password),
        }
    }

    /// The daemon's RPC endpoint.
    pub fn rpc_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&format!(
            "http://{}:{}/transmission/rpc",
            self.host, self.port
        ))
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Connection({})", self)
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.user, &self.password) {
            (Some(user), Some(_password)) => {
                write!(f, "{}:{} # u:{}:***", self.host, self.port, user)
            }
            (Some(user), None) => write!(f, "{}:{} # u:{}", self.host, self.port, user),
            (None, _) => write!(f, "{}:{}", self.host, self.port),
        }
    }
}
