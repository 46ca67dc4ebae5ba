//! The Juice Trace CLI application.
//!
//! Loads configuration, initialises logging, opens the shared store and
//! dispatches commands.

use crate::cli::{CliArgs, Command};
use crate::config::TraceConfig;
use crate::{config_handlers, trace_handlers};
use juicetrace_core::{Result, TraceEngine};
use juicetrace_storage::{RetryWrapper, SqliteStore};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// ============================================================================
// JuiceTraceCli
// ============================================================================

/// CLI application state.
pub struct JuiceTraceCli {
    name: String,
    config: Arc<TraceConfig>,
    version: String,
}

impl JuiceTraceCli {
    /// Create from CLI args, loading config from file/env.
    pub fn from_args(name: impl Into<String>, args: &CliArgs) -> Result<Self> {
        let config = TraceConfig::load(args.config.as_deref())?;
        Ok(Self::new(name, config))
    }

    /// Create a new CLI application.
    pub fn new(name: impl Into<String>, config: TraceConfig) -> Self {
        Self {
            name: name.into(),
            config: Arc::new(config),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Override the version string.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// The loaded configuration.
    pub fn config(&self) -> &TraceConfig {
        &self.config
    }

    /// Initialise tracing-based logging.
    ///
    /// Uses `RUST_LOG` env var if set, otherwise defaults based on verbosity flags.
    pub fn init_logging(&self, verbose: bool, quiet: bool) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if quiet {
            EnvFilter::new("warn")
        } else if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        };

        // A subscriber may already be installed (e.g. in tests).
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    /// Open the configured store and build an engine over it.
    ///
    /// The pool is created once here and shared by every request.
    pub async fn open_engine(&self) -> Result<TraceEngine> {
        let database = &self.config.database;
        let store = SqliteStore::connect(&database.store_options()).await?;

        if database.retry_attempts > 0 {
            info!(retry_attempts = database.retry_attempts, "store retries enabled");
            let store = RetryWrapper::new(store).with_max_retries(database.retry_attempts);
            Ok(TraceEngine::from_store(Arc::new(store)))
        } else {
            Ok(TraceEngine::from_store(Arc::new(store)))
        }
    }

    /// Run the CLI with the given arguments.
    pub async fn run(&self, args: CliArgs) -> Result<()> {
        self.init_logging(args.verbose, args.quiet);
        let mut out = std::io::stdout();

        match args.command {
            Some(Command::Version) => {
                println!("{} {}", self.name, self.version);
                Ok(())
            }
            Some(Command::Parse { code, json }) => {
                trace_handlers::handle_parse(&mut out, &code, json)
            }
            Some(Command::Config(config_cmd)) => {
                config_handlers::handle_config_command(args.config.as_deref(), config_cmd.command)
            }
            Some(Command::Trace {
                product,
                code,
                json,
            }) => {
                let engine = self.open_engine().await?;
                trace_handlers::handle_trace(&mut out, &engine, &product, &code, json).await
            }
            Some(Command::Products { json }) => {
                let engine = self.open_engine().await?;
                trace_handlers::handle_products(&mut out, &engine, json).await
            }
            Some(Command::Health) => {
                let engine = self.open_engine().await?;
                trace_handlers::handle_health(&mut out, &self.name, &engine).await
            }
            Some(Command::Serve { port }) => self.serve(port).await,
            None => {
                println!("{} {}: use --help for usage", self.name, self.version);
                Ok(())
            }
        }
    }

    /// Serve the HTTP API until Ctrl-C.
    async fn serve(&self, port: Option<u16>) -> Result<()> {
        let mut server = self.config.server.clone();
        if let Some(port) = port {
            server.port = port;
        }
        let addr = server.bind_addr()?;
        let engine = self.open_engine().await?;

        info!(name = %self.name, version = %self.version, %addr, "starting server");
        juicetrace_api::serve(engine, addr, shutdown_signal()).await
    }
}

/// Resolves on Ctrl-C.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested"),
        Err(err) => {
            warn!(error = %err, "cannot listen for Ctrl-C; serving until killed");
            std::future::pending::<()>().await;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
