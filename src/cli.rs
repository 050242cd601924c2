use clap::{Parser, Subcommand};
use directories::ProjectDirs;
use flexi_logger::{Logger, LoggerHandle};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

use crate::client::SqliteWordsApi;
use crate::config::{Config, CONFIG};
use crate::database::Database;
use crate::error::WordgateError;
use crate::server::WebServer;

const DB_FILENAME: &str = "wordgate.db";

#[derive(Parser)]
#[command(
    name = "wordgate",
    version,
    about = "Wordgate: restricted word administration console"
)]
pub struct Cli {
    /// Database file directory (default: platform data directory)
    #[arg(long = "dbpath", short = 'd')]
    pub dbpath: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the admin web server (default if no command specified)
    Serve,
}

impl Cli {
    pub fn handle_command_line() -> Result<(), WordgateError> {
        let args = Cli::parse();

        let project_dirs = ProjectDirs::from("", "", "wordgate").ok_or_else(|| {
            WordgateError::Error("Could not determine the platform data directory".to_string())
        })?;

        let config = Config::load_config(&project_dirs);
        let _logger = Self::init_logging(&config)?;
        let _ = CONFIG.set(config);

        // Default to Serve if no command specified
        match args.command.unwrap_or(Command::Serve) {
            Command::Serve => Self::start_server(args.dbpath.as_deref(), &project_dirs),
        }
    }

    fn init_logging(config: &Config) -> Result<LoggerHandle, WordgateError> {
        Logger::try_with_str(config.log_spec())
            .map_err(|e| WordgateError::Error(format!("Invalid log specification: {e}")))?
            .start()
            .map_err(|e| WordgateError::Error(format!("Failed to start logger: {e}")))
    }

    fn database_path(dbpath: Option<&str>, project_dirs: &ProjectDirs) -> PathBuf {
        match dbpath {
            Some(dir) => PathBuf::from(dir).join(DB_FILENAME),
            None => project_dirs.data_local_dir().join(DB_FILENAME),
        }
    }

    fn start_server(dbpath: Option<&str>, project_dirs: &ProjectDirs) -> Result<(), WordgateError> {
        let config = CONFIG
            .get()
            .ok_or_else(|| WordgateError::Error("Configuration not loaded".to_string()))?;

        let db_path = Self::database_path(dbpath, project_dirs);
        let database = Database::open(&db_path)?;
        info!("Database opened at {}", db_path.display());

        let api = Arc::new(SqliteWordsApi::new(database, config.admin.email.clone()));

        let host = config.server.host.clone();
        let port = config.server.port;
        info!("Starting server on {}:{}", host, port);

        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| WordgateError::Error(format!("Failed to create runtime: {}", e)))?;

        rt.block_on(async {
            let web_server = WebServer::new(host, port);
            web_server.start(api).await
        })
    }
}
