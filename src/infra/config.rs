//! For reading application configuration.

use serde::Deserialize;

/// Application configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Cross-origin resource sharing configuration.
    pub cors: CorsConfig,
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct ServerConfig {
    /// Server address.
    pub http_address: String,
    /// Server http port.
    pub http_port: u16,
}

/// Cross-origin resource sharing configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct CorsConfig {
    /// Origins allowed to make credentialed cross-origin requests.
    pub allowed_origins: Vec<String>,
}

/// Retrieve [`Config`] from the default configuration file.
#[tracing::instrument]
pub fn load_config() -> color_eyre::Result<Config> {
    let config = config::Config::builder()
        .add_source(config::File::with_name("config"))
        .add_source(config::Environment::with_prefix("app").separator("__"))
        .build()?
        .try_deserialize()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::load_config;

    #[test]
    fn config_file_lists_the_allowed_origins() {
        let config = load_config().unwrap();
        assert_eq!(
            vec![
                "http://localhost:8000",
                "http://127.0.0.1:8000",
                "https://chrwittm.github.io",
            ],
            config.cors.allowed_origins
        );
    }
}
