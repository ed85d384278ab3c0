use std::fmt;

use log::debug;

use crate::config::{
    ConfigSource, DEFAULT_HOST, DEFAULT_PORT, HOST_VAR, PASSWORD_VAR, PORT_VAR, USERNAME_VAR,
};
use crate::error::BackupError;

/// Connection credentials for a single run
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub host: String,
    pub port: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

/// Resolve credentials from `source`, applying host and port defaults.
///
/// Fails with [`BackupError::MissingCredentials`] naming every missing
/// required variable.
pub fn resolve(source: &impl ConfigSource) -> Result<Credentials, BackupError> {
    let username = source.var(USERNAME_VAR);
    let password = source.var(PASSWORD_VAR);

    let (username, password) = match (username, password) {
        (Some(username), Some(password)) => (username, password),
        (username, password) => {
            let mut missing = Vec::new();
            if username.is_none() {
                missing.push(USERNAME_VAR);
            }
            if password.is_none() {
                missing.push(PASSWORD_VAR);
            }
            return Err(BackupError::MissingCredentials { missing });
        }
    };

    let host = source.var(HOST_VAR).unwrap_or_else(|| {
        debug!("{} not set, using default host", HOST_VAR);
        DEFAULT_HOST.to_string()
    });
    let port = source.var(PORT_VAR).unwrap_or_else(|| {
        debug!("{} not set, using default port", PORT_VAR);
        DEFAULT_PORT.to_string()
    });

    Ok(Credentials {
        username,
        password,
        host,
        port,
    })
}
