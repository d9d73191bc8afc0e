pub mod config {
    use serde::Deserialize;

    #[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
    pub struct Config {
        #[serde(default = "default_port")]
        pub port: u16,
        /// Start with the demo chores instead of an empty collection.
        #[serde(default)]
        pub seed_demo_tasks: bool,
    }

    impl Default for Config {
        fn default() -> Self {
            Self {
                port: default_port(),
                seed_demo_tasks: false,
            }
        }
    }

    impl Config {
        /// Loads configuration from environment variables.
        pub fn from_env() -> anyhow::Result<Self> {
            let settings = config::Config::builder()
                .add_source(config::Environment::default().try_parsing(true))
                .build()?;

            let config: Config = settings.try_deserialize()?;
            Ok(config)
        }
    }

    fn default_port() -> u16 {
        5000
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn deserializes_with_defaults() {
            // Arrange
            let settings = config::Config::builder().build().unwrap();

            // Act
            let config: Config = settings.try_deserialize().unwrap();

            // Assert
            assert_eq!(config, Config::default());
            assert_eq!(config.port, 5000);
        }

        #[test]
        fn deserializes_overrides() {
            let settings = config::Config::builder()
                .set_override("port", 8081)
                .unwrap()
                .set_override("seed_demo_tasks", true)
                .unwrap()
                .build()
                .unwrap();

            let config: Config = settings.try_deserialize().unwrap();

            assert_eq!(config.port, 8081);
            assert!(config.seed_demo_tasks);
        }
    }
}

pub mod todo;
pub mod web;
