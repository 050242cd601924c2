use std::fs;

use directories::ProjectDirs;
use figment::{
    providers::{Format, Serialized, Toml},
    Figment,
};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

pub static CONFIG: OnceCell<Config> = OnceCell::new();

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoggingConfig {
    pub wordgate: String,
    pub hyper: String,
}

impl LoggingConfig {
    const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
    const WORDGATE_LEVEL: &str = "info";
    const HYPER_LEVEL: &str = "warn";

    fn default() -> Self {
        LoggingConfig {
            wordgate: Self::WORDGATE_LEVEL.to_string(),
            hyper: Self::HYPER_LEVEL.to_string(),
        }
    }

    fn ensure_valid(&mut self) {
        // Ensure that specified log levels are valid. If not:
        //      - inform the user
        //      - use the default

        let mut str_original = self.wordgate.clone();
        self.wordgate = self.wordgate.trim().to_ascii_lowercase();
        if !Self::LOG_LEVELS.contains(&self.wordgate.as_str()) {
            eprintln!(
                "Config error: wordgate log level of '{}' is invalid - using default of '{}'",
                str_original,
                Self::WORDGATE_LEVEL
            );
            self.wordgate = Self::WORDGATE_LEVEL.to_owned();
        }

        str_original = self.hyper.clone();
        self.hyper = self.hyper.trim().to_ascii_lowercase();
        if !Self::LOG_LEVELS.contains(&self.hyper.as_str()) {
            eprintln!(
                "Config error: hyper log level of '{}' is invalid - using default of '{}'",
                str_original,
                Self::HYPER_LEVEL
            );
            self.hyper = Self::HYPER_LEVEL.to_owned();
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    const HOST: &str = "127.0.0.1";
    const PORT: u16 = 8028;

    fn default() -> Self {
        ServerConfig {
            host: Self::HOST.to_string(),
            port: Self::PORT,
        }
    }

    fn ensure_valid(&mut self) {
        self.host = self.host.trim().to_string();
        if self.host.is_empty() {
            eprintln!(
                "Config error: server host is empty - using default of '{}'",
                Self::HOST
            );
            self.host = Self::HOST.to_owned();
        }

        if self.port == 0 {
            eprintln!(
                "Config error: server port of 0 is invalid - using default of '{}'",
                Self::PORT
            );
            self.port = Self::PORT;
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AdminConfig {
    /// Email-form identity recorded against creates, deletes, and patches.
    pub email: String,
}

impl AdminConfig {
    const EMAIL: &str = "admin@wordgate.local";

    fn default() -> Self {
        AdminConfig {
            email: Self::EMAIL.to_string(),
        }
    }

    fn ensure_valid(&mut self) {
        self.email = self.email.trim().to_string();
        if self.email.is_empty() {
            eprintln!(
                "Config error: admin email is empty - using default of '{}'",
                Self::EMAIL
            );
            self.email = Self::EMAIL.to_owned();
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    pub logging: LoggingConfig,
    pub server: ServerConfig,
    pub admin: AdminConfig,
}

impl Config {
    /// Loads the configuration from a TOML file located in the app's data
    /// directory. If the file is missing or fails to parse, defaults are used.
    /// Additionally, writes the default config to disk if no file exists.
    pub fn load_config(project_dirs: &ProjectDirs) -> Self {
        let config_path = project_dirs.data_local_dir().join("config.toml");

        let default_config = Config {
            logging: LoggingConfig::default(),
            server: ServerConfig::default(),
            admin: AdminConfig::default(),
        };

        // If the config file doesn't exist, write the default configuration to disk.
        if !config_path.exists() {
            if let Some(parent) = config_path.parent() {
                if let Err(e) = fs::create_dir_all(parent) {
                    eprintln!(
                        "Failed to create configuration directory {}: {}",
                        parent.display(),
                        e
                    );
                }
            }
            if let Ok(toml_string) = toml::to_string_pretty(&default_config) {
                if let Err(e) = fs::write(&config_path, toml_string) {
                    eprintln!(
                        "Failed to write default config to {}: {}",
                        config_path.display(),
                        e
                    );
                }
            } else {
                eprintln!("Failed to serialize default config.");
            }
        }

        // Build a Figment instance that uses the defaults merged with the TOML file (if it exists)
        let figment = Figment::from(Serialized::defaults(default_config.clone()))
            .merge(Toml::file(&config_path));

        // Attempt to extract the configuration; on error, log a message and fall back to defaults.
        let mut config = figment.extract().unwrap_or_else(|err| {
            eprintln!(
                "Could not load config file {}: {}. Using default configuration.",
                config_path.display(),
                err
            );
            default_config
        });

        config.ensure_valid();

        config
    }

    /// Module log-level specification consumed by the logger at startup.
    pub fn log_spec(&self) -> String {
        format!(
            "wordgate={}, hyper={}",
            self.logging.wordgate, self.logging.hyper
        )
    }

    fn ensure_valid(&mut self) {
        self.logging.ensure_valid();
        self.server.ensure_valid();
        self.admin.ensure_valid();
    }
}
