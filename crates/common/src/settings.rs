use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Server {
    pub port: u16,
    pub max_bundle_size: u64,
    pub public_key: Option<String>,
    pub private_key: Option<String>,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            port: 3000,
            max_bundle_size: 50 * 1024 * 1024,
            public_key: None,
            private_key: None,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logger {
    pub directory: String,
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Database {
    pub db_uri: String,
    pub max_connections: u32,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            db_uri: "postgres://localhost/ota".into(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ObjectStorage {
    pub endpoint: Option<String>,
    pub bucket: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Public URL prefix under which uploaded bundles are downloadable.
    pub public_base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Releases {
    pub max_sequence_attempts: u32,
}

impl Default for Releases {
    fn default() -> Self {
        Self {
            max_sequence_attempts: 5,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Settings {
    pub server: Server,
    pub logger: Logger,
    pub database: Database,
    pub object_storage: ObjectStorage,
    pub releases: Releases,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_config_dir("config")
    }

    pub fn with_config_dir(config_dir: &str) -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .add_source(File::with_name(&format!("{config_dir}/default")).required(false))
            .add_source(File::with_name(&format!("{config_dir}/{run_mode}")).required(false))
            .add_source(File::with_name(&format!("{config_dir}/local")).required(false))
            .add_source(Environment::default().separator("__"));

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_defaults_without_config_files() {
        let settings = Settings::with_config_dir("does-not-exist").expect("settings");

        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.server.max_bundle_size, 50 * 1024 * 1024);
        assert_eq!(settings.releases.max_sequence_attempts, 5);
        assert!(settings.server.public_key.is_none());
    }

    #[test]
    #[serial]
    fn test_environment_overrides() {
        // SAFETY: serialized with every other test touching the environment
        unsafe {
            env::set_var("RELEASES__MAX_SEQUENCE_ATTEMPTS", "9");
        }
        let settings = Settings::with_config_dir("does-not-exist");
        unsafe {
            env::remove_var("RELEASES__MAX_SEQUENCE_ATTEMPTS");
        }

        assert_eq!(settings.expect("settings").releases.max_sequence_attempts, 9);
    }
}
