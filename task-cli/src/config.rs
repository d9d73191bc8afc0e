use serde::{Deserialize, Serialize};
use std::path::Path;
use todo_list::HttpStoreConfig;

const DEFAULT_CONFIG_FILE: &str = "task-cli/config";
const ENV_PREFIX: &str = "TODO";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub max_retries: u32,
    /// Work against a local demo list instead of the API.
    #[serde(default)]
    pub offline: bool,
}

fn default_base_url() -> String {
    HttpStoreConfig::default().base_url
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: None,
            max_retries: 0,
            offline: false,
        }
    }
}

impl Config {
    /// Loads the config file (the given one, or `task-cli/config` if present)
    /// and then `TODO_*` environment variables on top.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        let settings = config::Config::builder()
            .add_source(file)
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn store_config(&self) -> HttpStoreConfig {
        HttpStoreConfig {
            base_url: self.base_url.clone(),
            timeout_secs: self.timeout_secs,
            max_retries: self.max_retries,
        }
    }
}
