use std::collections::HashMap;

use batchgate_result::{create_error, Result};
use cached::proc_macro::cached;
use config::{builder::DefaultState, Config, ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct Gateway {
    pub host: String,
    pub base_api: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    pub endpoints: Vec<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Coalescer {
    pub window_ms: u64,
    pub ids_param: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    pub gateway: Gateway,
    pub coalescer: Coalescer,
}

fn builder() -> ConfigBuilder<DefaultState> {
    Config::builder()
        .add_source(File::from_str(
            include_str!("../Batchgate.toml"),
            FileFormat::Toml,
        ))
        .add_source(File::new("Batchgate.toml", FileFormat::Toml).required(false))
        .add_source(
            Environment::with_prefix("BATCHGATE")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("gateway.endpoints")
                .try_parsing(true),
        )
}

/// Build the layered configuration: embedded defaults, local file, environment
pub fn read() -> Result<Config> {
    builder().build().map_err(|error| {
        create_error!(InvalidConfiguration {
            error: error.to_string()
        })
    })
}

#[cached(time = 30, result = true)]
pub async fn config() -> Result<Settings> {
    read()?.try_deserialize::<Settings>().map_err(|error| {
        create_error!(InvalidConfiguration {
            error: error.to_string()
        })
    })
}

/// Configure logging and common Rust variables
pub fn setup_logging(application: &'static str) {
    dotenv::dotenv().ok();

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }

    if pretty_env_logger::try_init().is_err() {
        return;
    }

    log::info!("Starting {application} [version {}]", env!("CARGO_PKG_VERSION"));
}

#[macro_export]
macro_rules! configure {
    ($application: ident) => {
        $crate::setup_logging(stringify!($application));
    };
}

#[cfg(test)]
mod tests {
    use crate::{config, read, Settings};

    #[tokio::test]
    async fn it_works() {
        let settings = config().await.expect("`Settings`");
        assert!(!settings.gateway.host.is_empty());
    }

    #[test]
    fn defaults_and_environment_overrides() {
        let settings: Settings = read().unwrap().try_deserialize().unwrap();
        assert_eq!(settings.coalescer.window_ms, 100);
        assert_eq!(settings.coalescer.ids_param, "ids");
        assert_eq!(settings.gateway.endpoints, vec!["/file-batch-api"]);
        assert!(settings.gateway.headers.is_empty());

        std::env::set_var("BATCHGATE__COALESCER__WINDOW_MS", "250");
        std::env::set_var("BATCHGATE__GATEWAY__ENDPOINTS", "/a,/b");
        let settings: Settings = read().unwrap().try_deserialize().unwrap();
        std::env::remove_var("BATCHGATE__COALESCER__WINDOW_MS");
        std::env::remove_var("BATCHGATE__GATEWAY__ENDPOINTS");

        assert_eq!(settings.coalescer.window_ms, 250);
        assert_eq!(settings.gateway.endpoints, vec!["/a", "/b"]);
    }
}
