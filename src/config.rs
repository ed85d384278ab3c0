use std::collections::HashMap;

pub const USERNAME_VAR: &str = "MONGODB_USERNAME";
pub const PASSWORD_VAR: &str = "MONGODB_PASSWORD";
pub const HOST_VAR: &str = "MONGODB_HOST";
pub const PORT_VAR: &str = "MONGODB_PORT";

pub const DEFAULT_HOST: &str = "192.168.1.10";
pub const DEFAULT_PORT: &str = "27018";

/// A read-only key/value source for run configuration
pub trait ConfigSource {
    /// Look up `key`. Empty values are reported as absent.
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads from the process environment
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl ConfigSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|value| !value.is_empty())
    }
}

/// In-memory source, mostly for tests and embedding
#[derive(Debug, Default, Clone)]
pub struct MapSource {
    values: HashMap<String, String>,
}

impl MapSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl<K, V> FromIterator<(K, V)> for MapSource
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl ConfigSource for MapSource {
    fn var(&self, key: &str) -> Option<String> {
        self.values.get(key).filter(|value| !value.is_empty()).cloned()
    }
}
